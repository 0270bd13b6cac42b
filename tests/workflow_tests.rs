//! End-to-end approval flows through the workflow service
//!
//! The backend is a mockall double that stores whatever it is sent, so each
//! step sees the record the previous actor persisted.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use inspection_forms::api::{ApiError, EmailRequest, FormsApi, ListQuery};
use inspection_forms::forms::Payload;
use inspection_forms::{
    Action, FormKind, FormStatus, FormWorkflow, InspectionRecord, Role, User, WorkflowError,
};
use mockall::mock;
use serde_json::json;
use std::sync::{Arc, Mutex};

mock! {
    pub Backend {}

    #[async_trait]
    impl FormsApi for Backend {
        async fn login(&self, username: &str, password: &str) -> Result<User, ApiError>;
        async fn list_users(&self) -> Result<Vec<User>, ApiError>;
        async fn users_by_role(&self, role: Role) -> Result<Vec<User>, ApiError>;
        async fn list(&self, kind: FormKind, query: ListQuery) -> Result<Vec<InspectionRecord>, ApiError>;
        async fn get(&self, kind: FormKind, id: &str) -> Result<InspectionRecord, ApiError>;
        async fn create(&self, record: &InspectionRecord) -> Result<InspectionRecord, ApiError>;
        async fn update(&self, record: &InspectionRecord) -> Result<InspectionRecord, ApiError>;
        async fn download_pdf(&self, kind: FormKind, id: &str, user_name: &str) -> Result<Vec<u8>, ApiError>;
        async fn email_pdf(
            &self,
            kind: FormKind,
            id: &str,
            user_name: &str,
            request: &EmailRequest,
        ) -> Result<(), ApiError>;
    }
}

type Store = Arc<Mutex<Option<InspectionRecord>>>;

/// Backend double that assigns id "1" on create and echoes updates
fn storing_backend(store: &Store) -> MockBackend {
    let mut backend = MockBackend::new();

    let created = Arc::clone(store);
    backend.expect_create().returning(move |record| {
        let mut saved = record.clone();
        saved.envelope.id = Some("1".to_string());
        saved.envelope.created_at = Some(t0());
        *created.lock().unwrap() = Some(saved.clone());
        Ok(saved)
    });

    let updated = Arc::clone(store);
    backend.expect_update().returning(move |record| {
        *updated.lock().unwrap() = Some(record.clone());
        Ok(record.clone())
    });

    let loaded = Arc::clone(store);
    backend.expect_get().returning(move |_, _| {
        loaded
            .lock()
            .unwrap()
            .clone()
            .ok_or(ApiError::Http {
                status: 404,
                message: "Not Found".to_string(),
            })
    });

    backend
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
}

fn patch(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_coating_reject_resubmit_approve() {
    let store: Store = Arc::new(Mutex::new(None));
    let alice = FormWorkflow::new(storing_backend(&store), User::new("Alice", Role::Operator));
    let bob = FormWorkflow::new(storing_backend(&store), User::new("Bob", Role::Qa));
    let carol = FormWorkflow::new(storing_backend(&store), User::new("Carol", Role::Avp));

    let t1 = t0() + Duration::hours(1);
    let t2 = t1 + Duration::hours(1);
    let t3 = t2 + Duration::hours(1);

    // Alice fills in a draft and submits it
    let draft = alice.new_blank(FormKind::Coating, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    let draft = alice
        .edit(
            &draft,
            &patch(json!({"coatingDetails": [
                {"name": "Clear Extn", "weight": "5"},
                {"name": "Red Dye", "weight": "2"}
            ]})),
        )
        .unwrap();
    let saved = alice.perform(&draft, Action::SaveDraft, None, t0()).await.unwrap();
    assert_eq!(saved.record.id(), Some("1"));

    let submitted = alice
        .perform(&saved.record, Action::Submit, None, t1)
        .await
        .unwrap();
    assert_eq!(submitted.record.status(), FormStatus::Submitted);
    assert_eq!(submitted.record.envelope.submitted_by.as_deref(), Some("Alice"));
    assert_eq!(submitted.record.envelope.submitted_at, Some(t1));

    // Bob sends it back
    let queued = bob.load(FormKind::Coating, "1").await.unwrap();
    let rejected = bob
        .perform(&queued, Action::QaReject, Some("wrong batch".to_string()), t2)
        .await
        .unwrap();
    assert_eq!(rejected.record.status(), FormStatus::Rejected);
    assert_eq!(rejected.record.envelope.reviewed_by.as_deref(), Some("Bob"));
    assert_eq!(rejected.record.envelope.comments.as_deref(), Some("wrong batch"));

    // Alice resubmits without touching the submission stamps
    let returned = alice.load(FormKind::Coating, "1").await.unwrap();
    let resubmitted = alice
        .perform(&returned, Action::Submit, None, t2 + Duration::minutes(20))
        .await
        .unwrap();
    assert_eq!(resubmitted.record.envelope.submitted_at, Some(t1));

    // Carol approves without a comment
    let pending = carol.load(FormKind::Coating, "1").await.unwrap();
    assert!(carol.permissions(&pending).can_approve());
    let approved = carol
        .perform(&pending, Action::Approve, None, t3)
        .await
        .unwrap();

    let record = approved.record;
    assert_eq!(record.status(), FormStatus::Approved);
    assert_eq!(record.envelope.reviewed_by.as_deref(), Some("Carol"));
    assert_eq!(record.envelope.reviewed_at, Some(t3));
    assert_eq!(record.envelope.comments.as_deref(), Some("wrong batch"));
    assert_eq!(record.envelope.submitted_by.as_deref(), Some("Alice"));
    assert_eq!(record.payload.composition().as_deref(), Some("Clear Extn 5 Red Dye 2"));

    let actions: Vec<_> = carol.history(&record).iter().map(|e| e.action).collect();
    assert_eq!(actions, vec!["Created", "Submitted", "Approved"]);

    // nothing left to do for anyone but distribution
    for workflow in [&alice, &bob, &carol] {
        let permissions = workflow.permissions(&record);
        assert!(permissions.actions().is_empty());
        assert!(permissions.can_download_pdf());
        assert!(permissions.can_email_pdf());
    }
}

#[tokio::test]
async fn test_quality_submit_validation_stops_before_the_backend() {
    // only create is expected; a rejected submit must not call update
    let store: Store = Arc::new(Mutex::new(None));
    let mut backend = MockBackend::new();
    let created = Arc::clone(&store);
    backend.expect_create().times(1).returning(move |record| {
        let mut saved = record.clone();
        saved.envelope.id = Some("1".to_string());
        *created.lock().unwrap() = Some(saved.clone());
        Ok(saved)
    });

    let alice = FormWorkflow::new(backend, User::new("Alice", Role::Operator));
    let draft = alice.new_blank(FormKind::Quality, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    let saved = alice.perform(&draft, Action::SaveDraft, None, t0()).await.unwrap();

    let err = alice
        .perform(&saved.record, Action::Submit, None, t0())
        .await
        .unwrap_err();
    assert!(err.is_validation_error());
    assert!(err.to_string().contains("batchNumber"));
    assert_eq!(saved.record.status(), FormStatus::Draft);
}

#[tokio::test]
async fn test_qa_forwards_printing_form_with_signature() {
    let store: Store = Arc::new(Mutex::new(None));
    let alice = FormWorkflow::new(storing_backend(&store), User::new("Alice Moss", Role::Operator));
    let bob = FormWorkflow::new(storing_backend(&store), User::new("Bob", Role::Qa));

    let draft = alice.new_blank(FormKind::Printing, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    let saved = alice.perform(&draft, Action::SaveDraft, None, t0()).await.unwrap();
    alice.perform(&saved.record, Action::Submit, None, t0()).await.unwrap();

    let queued = bob.load(FormKind::Printing, "1").await.unwrap();
    let edited = bob
        .edit(&queued, &patch(json!({"finalApprovalTime": "10:30:00 AM"})))
        .unwrap();
    let forwarded = bob.perform(&edited, Action::QaSubmit, None, t0()).await.unwrap();

    assert_eq!(forwarded.record.status(), FormStatus::Submitted);
    let Payload::Printing(report) = &forwarded.record.payload else {
        panic!("expected a printing payload");
    };
    assert_eq!(report.production_operator, "Alice Moss");
    assert_eq!(report.operator_signature, "signed_by_alice_moss");
    assert_eq!(report.qa_executive, "Bob");
    assert_eq!(report.final_approval_time, "10:30:00 AM");

    // QA may not touch operator details while reviewing
    let err = bob
        .edit(&forwarded.record, &patch(json!({"customer": "Someone Else"})))
        .unwrap_err();
    assert!(err.is_permission_error());
    assert!(matches!(err, WorkflowError::Lifecycle(_)));
}
