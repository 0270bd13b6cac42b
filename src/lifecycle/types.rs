// Core types for the inspection form lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Role of the acting user. Parsed case-insensitively at the boundary so the
/// rest of the engine never re-normalises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Operator,
    Qa,
    Avp,
    Master,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Operator, Role::Qa, Role::Avp, Role::Master];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Operator => "operator",
            Role::Qa => "qa",
            Role::Avp => "avp",
            Role::Master => "master",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role '{0}' (expected operator, qa, avp or master)")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "operator" => Ok(Role::Operator),
            "qa" => Ok(Role::Qa),
            "avp" => Ok(Role::Avp),
            "master" => Ok(Role::Master),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record status as persisted by the backend (upper-case on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FormStatus {
    #[default]
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl FormStatus {
    pub const ALL: [FormStatus; 4] = [
        FormStatus::Draft,
        FormStatus::Submitted,
        FormStatus::Approved,
        FormStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormStatus::Draft => "DRAFT",
            FormStatus::Submitted => "SUBMITTED",
            FormStatus::Approved => "APPROVED",
            FormStatus::Rejected => "REJECTED",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Operator may edit and (re)submit from these states
    pub fn is_operator_editable(&self) -> bool {
        matches!(self, FormStatus::Draft | FormStatus::Rejected)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown status '{0}' (expected DRAFT, SUBMITTED, APPROVED or REJECTED)")]
pub struct UnknownStatus(pub String);

impl FromStr for FormStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(FormStatus::Draft),
            "SUBMITTED" => Ok(FormStatus::Submitted),
            "APPROVED" => Ok(FormStatus::Approved),
            "REJECTED" => Ok(FormStatus::Rejected),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for FormStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for FormStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The form kinds served by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormKind {
    Coating,
    Printing,
    LineClearance,
    Quality,
    Inspection,
}

impl FormKind {
    pub const ALL: [FormKind; 5] = [
        FormKind::Coating,
        FormKind::Printing,
        FormKind::LineClearance,
        FormKind::Quality,
        FormKind::Inspection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormKind::Coating => "coating",
            FormKind::Printing => "printing",
            FormKind::LineClearance => "clearance",
            FormKind::Quality => "quality",
            FormKind::Inspection => "inspection",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown form kind '{0}' (expected coating, printing, clearance, quality or inspection)")]
pub struct UnknownKind(pub String);

impl FromStr for FormKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coating" => Ok(FormKind::Coating),
            "printing" => Ok(FormKind::Printing),
            "clearance" | "line-clearance" => Ok(FormKind::LineClearance),
            "quality" | "iqc" => Ok(FormKind::Quality),
            "inspection" => Ok(FormKind::Inspection),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated user as returned by the login endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, deserialize_with = "crate::forms::wire::id_as_string")]
    pub id: Option<String>,
    pub name: String,
    pub role: Role,
}

impl User {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            id: None,
            name: name.into(),
            role,
        }
    }

    /// Synthetic signature token stamped into signature fields
    pub fn signature_token(&self) -> String {
        let snake: Vec<String> = self
            .name
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        format!("signed_by_{}", snake.join("_"))
    }
}

/// Transition actions a user can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    SaveDraft,
    Submit,
    QaSubmit,
    QaReject,
    Approve,
    Reject,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::SaveDraft,
        Action::Submit,
        Action::QaSubmit,
        Action::QaReject,
        Action::Approve,
        Action::Reject,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::SaveDraft => "saveDraft",
            Action::Submit => "submit",
            Action::QaSubmit => "qaSubmit",
            Action::QaReject => "qaReject",
            Action::Approve => "approve",
            Action::Reject => "reject",
        }
    }

    pub fn requires_reason(&self) -> bool {
        matches!(self, Action::QaReject | Action::Reject)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input supplied with a transition request
#[derive(Debug, Clone)]
pub struct TransitionContext<'a> {
    pub actor: &'a User,
    pub now: DateTime<Utc>,
    /// Rejection reason or optional approval comment
    pub comment: Option<String>,
}

impl<'a> TransitionContext<'a> {
    pub fn new(actor: &'a User, now: DateTime<Utc>) -> Self {
        Self {
            actor,
            now,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// The trimmed comment, if any non-blank text was supplied
    pub fn trimmed_comment(&self) -> Option<&str> {
        self.comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Audit entry for an applied transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub action: Action,
    pub from: FormStatus,
    pub to: FormStatus,
    pub actor: String,
    pub at: DateTime<Utc>,
}

/// Editable field groups gated by the permission set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldGroup {
    DocumentInfo,
    Details,
    LineItems,
    ReviewFields,
}

impl fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FieldGroup::DocumentInfo => "document info",
            FieldGroup::Details => "details",
            FieldGroup::LineItems => "line items",
            FieldGroup::ReviewFields => "review fields",
        };
        f.write_str(label)
    }
}
