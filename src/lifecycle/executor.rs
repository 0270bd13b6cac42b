//! Transition executor
//!
//! Produces the next record for a requested action. Checks run in a fixed
//! order (permission, status precondition, required input) and nothing is
//! mutated unless every check passes.

use super::permissions::{self, PermissionSet};
use super::types::{Action, FieldGroup, FormKind, FormStatus, Role, TransitionContext, TransitionRecord, User};
use crate::forms::{FormError, InspectionRecord, SignatureSlot};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LifecycleError {
    #[error("{role} may not {action} a {status} {kind} form")]
    ActionNotPermitted {
        kind: FormKind,
        role: Role,
        status: FormStatus,
        action: Action,
    },

    #[error("{role} may not edit {group} ('{field}') on a {status} {kind} form")]
    EditNotPermitted {
        kind: FormKind,
        role: Role,
        status: FormStatus,
        group: FieldGroup,
        field: String,
    },

    #[error("cannot {action} a form in status {from}")]
    InvalidTransition { action: Action, from: FormStatus },

    #[error("{0}")]
    Validation(String),
}

impl LifecycleError {
    pub fn is_permission_error(&self) -> bool {
        matches!(
            self,
            LifecycleError::ActionNotPermitted { .. } | LifecycleError::EditNotPermitted { .. }
        )
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, LifecycleError::Validation(_))
    }
}

impl From<FormError> for LifecycleError {
    fn from(err: FormError) -> Self {
        LifecycleError::Validation(err.to_string())
    }
}

/// Result of an applied transition
#[derive(Debug, Clone)]
pub struct Transition {
    pub record: InspectionRecord,
    pub audit: TransitionRecord,
}

/// Capabilities of `role` on this record
pub fn permissions_for(record: &InspectionRecord, role: Role) -> PermissionSet {
    permissions::resolve(record.kind(), role, record.status())
}

/// Statuses an action may start from
fn precondition(action: Action) -> &'static [FormStatus] {
    match action {
        Action::SaveDraft => &FormStatus::ALL,
        Action::Submit => &[FormStatus::Draft, FormStatus::Rejected],
        Action::QaSubmit | Action::QaReject | Action::Approve | Action::Reject => {
            &[FormStatus::Submitted]
        }
    }
}

fn next_status(action: Action) -> FormStatus {
    match action {
        Action::SaveDraft => FormStatus::Draft,
        Action::Submit | Action::QaSubmit => FormStatus::Submitted,
        Action::Approve => FormStatus::Approved,
        Action::QaReject | Action::Reject => FormStatus::Rejected,
    }
}

/// Apply a field edit of top-level wire keys on behalf of `actor`
pub fn apply_edit(
    record: &InspectionRecord,
    patch: &Map<String, Value>,
    actor: &User,
) -> Result<InspectionRecord, LifecycleError> {
    let permissions = permissions_for(record, actor.role);
    for (field, group) in record.payload.classify_patch(patch)? {
        if !permissions.can_edit(group) {
            return Err(LifecycleError::EditNotPermitted {
                kind: record.kind(),
                role: actor.role,
                status: record.status(),
                group,
                field,
            });
        }
    }

    let payload = record.payload.apply_patch(patch)?;
    debug!(
        kind = %record.kind(),
        fields = patch.len(),
        actor = %actor.name,
        "Applied field edit"
    );
    Ok(InspectionRecord {
        envelope: record.envelope.clone(),
        payload,
    })
}

/// Compute the record that results from `action`
pub fn execute(
    record: &InspectionRecord,
    action: Action,
    ctx: &TransitionContext<'_>,
) -> Result<Transition, LifecycleError> {
    let from = record.status();
    let actor = ctx.actor;

    if !permissions_for(record, actor.role).allows_action(action) {
        return Err(LifecycleError::ActionNotPermitted {
            kind: record.kind(),
            role: actor.role,
            status: from,
            action,
        });
    }

    if !precondition(action).contains(&from) {
        return Err(LifecycleError::InvalidTransition { action, from });
    }

    let reason = ctx.trimmed_comment();
    if action.requires_reason() && reason.is_none() {
        return Err(LifecycleError::Validation(
            "a rejection reason is required".to_string(),
        ));
    }

    if action == Action::Submit {
        let missing = record.payload.missing_required_fields();
        if !missing.is_empty() {
            return Err(LifecycleError::Validation(format!(
                "required fields are missing: {}",
                missing.join(", ")
            )));
        }
    }

    let mut next = record.clone();
    let to = next_status(action);
    next.envelope.status = to;
    let signature = actor.signature_token();

    match action {
        Action::SaveDraft => {}
        Action::Submit => {
            if next.envelope.submitted_by.is_none() {
                next.envelope.submitted_by = Some(actor.name.clone());
            }
            if next.envelope.submitted_at.is_none() {
                next.envelope.submitted_at = Some(ctx.now);
            }
            if let Some(slot) = next.payload.signature_mut(SignatureSlot::Operator) {
                if slot.is_empty() {
                    slot.sign(&actor.name, signature);
                }
            }
        }
        Action::QaSubmit => {
            if let Some(slot) = next.payload.signature_mut(SignatureSlot::Qa) {
                slot.sign(&actor.name, signature);
            }
        }
        Action::QaReject | Action::Reject => {
            next.envelope.reviewed_by = Some(actor.name.clone());
            next.envelope.reviewed_at = Some(ctx.now);
            next.envelope.comments = reason.map(str::to_string);
        }
        Action::Approve => {
            next.envelope.reviewed_by = Some(actor.name.clone());
            next.envelope.reviewed_at = Some(ctx.now);
            if let Some(comment) = reason {
                next.envelope.comments = Some(comment.to_string());
            }
            if let Some(slot) = next.payload.signature_mut(SignatureSlot::Approver) {
                slot.sign(&actor.name, signature);
            }
            next.payload.stamp_approval_time(ctx.now);
        }
    }
    next.payload.recompute_derived();

    let audit = TransitionRecord {
        action,
        from,
        to,
        actor: actor.name.clone(),
        at: ctx.now,
    };

    info!(
        kind = %record.kind(),
        record_id = ?record.id(),
        action = %audit.action,
        from_status = %audit.from,
        to_status = %audit.to,
        actor = %audit.actor,
        "Form lifecycle transition"
    );

    Ok(Transition { record: next, audit })
}
