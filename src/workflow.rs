//! Form workflow service
//!
//! Binds the lifecycle engine to the forms backend for one logged-in user.
//! Transitions are confirm-then-apply: the caller only ever receives the
//! record the server stored, so a failed request leaves its local copy
//! untouched.

use crate::api::{ApiError, EmailRequest, FormsApi, ListQuery};
use crate::forms::InspectionRecord;
use crate::lifecycle::derived::{self, AuditEntry};
use crate::lifecycle::permissions::{Capability, PermissionSet};
use crate::lifecycle::types::{Action, FormKind, FormStatus, Role, TransitionContext, User};
use crate::lifecycle::{apply_edit, execute, permissions_for, LifecycleError, Transition};
use crate::observability::{api_metrics, OperationTimer};
use crate::session::Session;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("not logged in; run `inspection-forms login` first")]
    NotLoggedIn,

    #[error("another save or transition is already in progress")]
    Busy,

    #[error("{role} may not {operation} a {status} {kind} form")]
    NotPermitted {
        kind: FormKind,
        role: Role,
        status: FormStatus,
        operation: &'static str,
    },

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl WorkflowError {
    pub fn is_permission_error(&self) -> bool {
        match self {
            WorkflowError::NotPermitted { .. } => true,
            WorkflowError::Lifecycle(err) => err.is_permission_error(),
            _ => false,
        }
    }

    pub fn is_validation_error(&self) -> bool {
        match self {
            WorkflowError::Lifecycle(err) => err.is_validation_error(),
            WorkflowError::Api(ApiError::InvalidEmail(_)) => true,
            _ => false,
        }
    }

    pub fn is_network_error(&self) -> bool {
        matches!(self, WorkflowError::Api(err) if err.is_network() || err.status().is_some())
    }
}

/// Clears the in-flight flag when the guarded request finishes
pub(crate) struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One user's view of the forms backend
pub struct FormWorkflow<A: FormsApi> {
    api: A,
    user: User,
    in_flight: AtomicBool,
}

impl<A: FormsApi> FormWorkflow<A> {
    pub fn new(api: A, user: User) -> Self {
        Self {
            api,
            user,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn from_session(api: A, session: Option<Session>) -> Result<Self, WorkflowError> {
        let session = session.ok_or(WorkflowError::NotLoggedIn)?;
        Ok(Self::new(api, session.user))
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub(crate) fn begin(&self) -> Result<InFlight<'_>, WorkflowError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| WorkflowError::Busy)?;
        Ok(InFlight(&self.in_flight))
    }

    /// Records relevant to the user's role
    pub async fn list(&self, kind: FormKind) -> Result<Vec<InspectionRecord>, WorkflowError> {
        let query = ListQuery::for_role(self.user.role, &self.user.name);
        Ok(self.api.list(kind, query).await?)
    }

    pub async fn list_by_status(
        &self,
        kind: FormKind,
        status: FormStatus,
    ) -> Result<Vec<InspectionRecord>, WorkflowError> {
        Ok(self.api.list(kind, ListQuery::ByStatus(status)).await?)
    }

    /// Users known to the backend, optionally narrowed to one role
    pub async fn users(&self, role: Option<Role>) -> Result<Vec<User>, WorkflowError> {
        let users = match role {
            Some(role) => self.api.users_by_role(role).await?,
            None => self.api.list_users().await?,
        };
        Ok(users)
    }

    pub async fn load(&self, kind: FormKind, id: &str) -> Result<InspectionRecord, WorkflowError> {
        Ok(self.api.get(kind, id).await?)
    }

    /// Unsaved blank record created by the current user
    pub fn new_blank(&self, kind: FormKind, today: NaiveDate) -> InspectionRecord {
        let mut record = InspectionRecord::blank(kind, today);
        record.envelope.created_by = Some(self.user.name.clone());
        record
    }

    pub fn permissions(&self, record: &InspectionRecord) -> PermissionSet {
        permissions_for(record, self.user.role)
    }

    pub fn history(&self, record: &InspectionRecord) -> Vec<AuditEntry> {
        derived::audit_history(&record.envelope)
    }

    /// Apply a field edit locally; nothing is sent until [`save`](Self::save)
    pub fn edit(
        &self,
        record: &InspectionRecord,
        patch: &Map<String, Value>,
    ) -> Result<InspectionRecord, WorkflowError> {
        Ok(apply_edit(record, patch, &self.user)?)
    }

    /// Persist field edits without changing status
    pub async fn save(&self, record: &InspectionRecord) -> Result<InspectionRecord, WorkflowError> {
        if self.permissions(record).is_read_only() {
            return Err(self.not_permitted(record, "save"));
        }
        let _guard = self.begin()?;
        self.persist(record).await
    }

    /// Run a transition and persist the result
    pub async fn perform(
        &self,
        record: &InspectionRecord,
        action: Action,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Transition, WorkflowError> {
        let _guard = self.begin()?;
        let timer = OperationTimer::new(action.as_str());

        let mut ctx = TransitionContext::new(&self.user, now);
        ctx.comment = comment;
        let transition = execute(record, action, &ctx)?;

        let saved = self.persist(&transition.record).await.inspect_err(|err| {
            warn!(
                kind = %record.kind(),
                action = %action,
                error = %err,
                "Transition not persisted; local record unchanged"
            );
        })?;
        api_metrics().record_transition();
        timer.finish();

        Ok(Transition {
            record: saved,
            audit: transition.audit,
        })
    }

    pub async fn download_pdf(&self, record: &InspectionRecord) -> Result<Vec<u8>, WorkflowError> {
        if !self.permissions(record).allows(Capability::DownloadPdf) {
            return Err(self.not_permitted(record, "download"));
        }
        let id = record.id().ok_or(ApiError::MissingId(record.kind()))?;
        Ok(self.api.download_pdf(record.kind(), id, &self.user.name).await?)
    }

    pub async fn email_pdf(
        &self,
        record: &InspectionRecord,
        request: &EmailRequest,
    ) -> Result<(), WorkflowError> {
        if !self.permissions(record).allows(Capability::EmailPdf) {
            return Err(self.not_permitted(record, "email"));
        }
        request.validate()?;
        let id = record.id().ok_or(ApiError::MissingId(record.kind()))?;
        self.api
            .email_pdf(record.kind(), id, &self.user.name, request)
            .await?;
        Ok(())
    }

    async fn persist(&self, record: &InspectionRecord) -> Result<InspectionRecord, WorkflowError> {
        let saved = match record.id() {
            Some(_) => self.api.update(record).await?,
            None => self.api.create(record).await?,
        };
        info!(
            kind = %saved.kind(),
            record_id = ?saved.id(),
            status = %saved.status(),
            user = %self.user.name,
            "Form record persisted"
        );
        Ok(saved)
    }

    fn not_permitted(&self, record: &InspectionRecord, operation: &'static str) -> WorkflowError {
        WorkflowError::NotPermitted {
            kind: record.kind(),
            role: self.user.role,
            status: record.status(),
            operation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockFormsApi;
    use chrono::TimeZone;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn stored(record: &InspectionRecord, id: &str) -> InspectionRecord {
        let mut saved = record.clone();
        saved.envelope.id = Some(id.to_string());
        saved
    }

    #[tokio::test]
    async fn test_first_save_creates_then_updates() {
        let mut api = MockFormsApi::new();
        api.expect_create()
            .times(1)
            .returning(|record| Ok(stored(record, "11")));
        api.expect_update()
            .times(1)
            .withf(|record| record.id() == Some("11"))
            .returning(|record| Ok(record.clone()));

        let workflow = FormWorkflow::new(api, User::new("Alice", Role::Operator));
        let draft = workflow.new_blank(FormKind::Printing, today());
        assert_eq!(draft.envelope.created_by.as_deref(), Some("Alice"));

        let saved = workflow.perform(&draft, Action::SaveDraft, None, now()).await.unwrap();
        assert_eq!(saved.record.id(), Some("11"));

        let submitted = workflow
            .perform(&saved.record, Action::Submit, None, now())
            .await
            .unwrap();
        assert_eq!(submitted.record.status(), FormStatus::Submitted);
    }

    #[tokio::test]
    async fn test_failed_persist_reports_network_error() {
        let mut api = MockFormsApi::new();
        api.expect_update().times(1).returning(|_| {
            Err(ApiError::Http {
                status: 503,
                message: "Service Unavailable".to_string(),
            })
        });

        let workflow = FormWorkflow::new(api, User::new("Carol", Role::Avp));
        let mut record = InspectionRecord::blank(FormKind::Coating, today());
        record.envelope.id = Some("4".to_string());
        record.envelope.status = FormStatus::Submitted;

        let err = workflow
            .perform(&record, Action::Approve, None, now())
            .await
            .unwrap_err();
        assert!(err.is_network_error());
        assert_eq!(record.status(), FormStatus::Submitted);
        assert!(record.envelope.reviewed_by.is_none());
    }

    #[tokio::test]
    async fn test_second_request_while_in_flight_is_busy() {
        let api = MockFormsApi::new();
        let workflow = FormWorkflow::new(api, User::new("Alice", Role::Operator));
        let draft = workflow.new_blank(FormKind::Coating, today());

        let guard = workflow.begin().unwrap();
        assert!(matches!(
            workflow.perform(&draft, Action::Submit, None, now()).await,
            Err(WorkflowError::Busy)
        ));
        assert!(matches!(workflow.save(&draft).await, Err(WorkflowError::Busy)));
        drop(guard);
        assert!(workflow.begin().is_ok());
    }

    #[tokio::test]
    async fn test_rejections_never_reach_the_api() {
        // no expectations: any API call panics
        let api = MockFormsApi::new();
        let workflow = FormWorkflow::new(api, User::new("Bob", Role::Qa));
        let mut record = InspectionRecord::blank(FormKind::Quality, today());
        record.envelope.id = Some("9".to_string());
        record.envelope.status = FormStatus::Submitted;

        let err = workflow
            .perform(&record, Action::QaReject, Some("  ".to_string()), now())
            .await
            .unwrap_err();
        assert!(err.is_validation_error());

        let err = workflow
            .perform(&record, Action::Approve, None, now())
            .await
            .unwrap_err();
        assert!(err.is_permission_error());

        let err = workflow
            .email_pdf(&record, &EmailRequest::new("qa@example.com"))
            .await
            .unwrap_err();
        assert!(err.is_permission_error());
    }

    #[tokio::test]
    async fn test_pdf_requires_permission_and_id() {
        let mut api = MockFormsApi::new();
        api.expect_download_pdf()
            .withf(|kind, id, user| *kind == FormKind::Printing && id == "5" && user == "Mona")
            .times(1)
            .returning(|_, _, _| Ok(b"%PDF-1.4".to_vec()));

        let workflow = FormWorkflow::new(api, User::new("Mona", Role::Master));
        let mut record = InspectionRecord::blank(FormKind::Printing, today());
        assert!(matches!(
            workflow.download_pdf(&record).await,
            Err(WorkflowError::Api(ApiError::MissingId(FormKind::Printing)))
        ));

        record.envelope.id = Some("5".to_string());
        assert_eq!(workflow.download_pdf(&record).await.unwrap(), b"%PDF-1.4".to_vec());

        let err = workflow
            .email_pdf(&record, &EmailRequest::new("qa@example.com"))
            .await
            .unwrap_err();
        assert!(err.is_permission_error());
    }

    #[tokio::test]
    async fn test_list_uses_role_query() {
        let mut api = MockFormsApi::new();
        api.expect_list()
            .withf(|kind, query| {
                *kind == FormKind::LineClearance
                    && *query == ListQuery::ByStatus(FormStatus::Submitted)
            })
            .times(1)
            .returning(|_, _| Ok(Vec::new()));

        let workflow = FormWorkflow::new(api, User::new("Bob", Role::Qa));
        assert!(workflow.list(FormKind::LineClearance).await.unwrap().is_empty());
        assert!(matches!(
            FormWorkflow::from_session(MockFormsApi::new(), None),
            Err(WorkflowError::NotLoggedIn)
        ));
    }

    #[tokio::test]
    async fn test_users_lookup_by_role_or_all() {
        let mut api = MockFormsApi::new();
        api.expect_users_by_role()
            .withf(|role| *role == Role::Avp)
            .times(1)
            .returning(|_| Ok(vec![User::new("Carol", Role::Avp)]));
        api.expect_list_users()
            .times(1)
            .returning(|| Ok(vec![User::new("Alice", Role::Operator), User::new("Carol", Role::Avp)]));

        let workflow = FormWorkflow::new(api, User::new("Mona", Role::Master));
        let approvers = workflow.users(Some(Role::Avp)).await.unwrap();
        assert_eq!(approvers, vec![User::new("Carol", Role::Avp)]);
        assert_eq!(workflow.users(None).await.unwrap().len(), 2);
    }
}
