//! Permission resolution
//!
//! Editability and available actions are a pure function of
//! `(kind, role, status)`. Each form kind carries its own lookup table indexed
//! by `[role][status]`; there is no branching logic outside the tables.

use super::types::{Action, FieldGroup, FormKind, FormStatus, Role};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// A single grantable capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Capability {
    EditDocumentInfo = 1 << 0,
    EditDetails = 1 << 1,
    EditLineItems = 1 << 2,
    EditReviewFields = 1 << 3,
    Submit = 1 << 4,
    QaSubmit = 1 << 5,
    QaReject = 1 << 6,
    Approve = 1 << 7,
    Reject = 1 << 8,
    SaveDraft = 1 << 9,
    DownloadPdf = 1 << 10,
    EmailPdf = 1 << 11,
}

impl Capability {
    pub const ALL: [Capability; 12] = [
        Capability::EditDocumentInfo,
        Capability::EditDetails,
        Capability::EditLineItems,
        Capability::EditReviewFields,
        Capability::Submit,
        Capability::QaSubmit,
        Capability::QaReject,
        Capability::Approve,
        Capability::Reject,
        Capability::SaveDraft,
        Capability::DownloadPdf,
        Capability::EmailPdf,
    ];

    /// Wire name as consumed by UI code
    pub fn name(&self) -> &'static str {
        match self {
            Capability::EditDocumentInfo => "canEditDocumentInfo",
            Capability::EditDetails => "canEditDetails",
            Capability::EditLineItems => "canEditLineItems",
            Capability::EditReviewFields => "canEditReviewFields",
            Capability::Submit => "canSubmit",
            Capability::QaSubmit => "canQASubmit",
            Capability::QaReject => "canQAReject",
            Capability::Approve => "canApprove",
            Capability::Reject => "canReject",
            Capability::SaveDraft => "canSaveDraft",
            Capability::DownloadPdf => "canDownloadPdf",
            Capability::EmailPdf => "canEmailPdf",
        }
    }

    const fn bit(self) -> u16 {
        self as u16
    }
}

impl From<Action> for Capability {
    fn from(action: Action) -> Self {
        match action {
            Action::SaveDraft => Capability::SaveDraft,
            Action::Submit => Capability::Submit,
            Action::QaSubmit => Capability::QaSubmit,
            Action::QaReject => Capability::QaReject,
            Action::Approve => Capability::Approve,
            Action::Reject => Capability::Reject,
        }
    }
}

impl From<FieldGroup> for Capability {
    fn from(group: FieldGroup) -> Self {
        match group {
            FieldGroup::DocumentInfo => Capability::EditDocumentInfo,
            FieldGroup::Details => Capability::EditDetails,
            FieldGroup::LineItems => Capability::EditLineItems,
            FieldGroup::ReviewFields => Capability::EditReviewFields,
        }
    }
}

/// Boolean capability bundle for one `(role, status)` cell
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PermissionSet(u16);

impl PermissionSet {
    pub const NONE: PermissionSet = PermissionSet(0);

    pub const fn of(caps: &[Capability]) -> Self {
        let mut bits = 0u16;
        let mut i = 0;
        while i < caps.len() {
            bits |= caps[i].bit();
            i += 1;
        }
        PermissionSet(bits)
    }

    pub const fn union(self, other: PermissionSet) -> Self {
        PermissionSet(self.0 | other.0)
    }

    pub fn allows(&self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub fn allows_action(&self, action: Action) -> bool {
        self.allows(action.into())
    }

    pub fn can_edit(&self, group: FieldGroup) -> bool {
        self.allows(group.into())
    }

    pub fn is_read_only(&self) -> bool {
        !(self.can_edit_document_info()
            || self.can_edit_details()
            || self.can_edit_line_items()
            || self.can_edit_review_fields())
    }

    pub fn granted(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|c| self.allows(*c))
    }

    /// Actions enabled by this set, in presentation order
    pub fn actions(&self) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|a| self.allows_action(*a))
            .collect()
    }

    pub fn can_edit_document_info(&self) -> bool {
        self.allows(Capability::EditDocumentInfo)
    }

    pub fn can_edit_details(&self) -> bool {
        self.allows(Capability::EditDetails)
    }

    pub fn can_edit_line_items(&self) -> bool {
        self.allows(Capability::EditLineItems)
    }

    pub fn can_edit_review_fields(&self) -> bool {
        self.allows(Capability::EditReviewFields)
    }

    pub fn can_submit(&self) -> bool {
        self.allows(Capability::Submit)
    }

    pub fn can_qa_submit(&self) -> bool {
        self.allows(Capability::QaSubmit)
    }

    pub fn can_qa_reject(&self) -> bool {
        self.allows(Capability::QaReject)
    }

    pub fn can_approve(&self) -> bool {
        self.allows(Capability::Approve)
    }

    pub fn can_reject(&self) -> bool {
        self.allows(Capability::Reject)
    }

    pub fn can_save_draft(&self) -> bool {
        self.allows(Capability::SaveDraft)
    }

    pub fn can_download_pdf(&self) -> bool {
        self.allows(Capability::DownloadPdf)
    }

    pub fn can_email_pdf(&self) -> bool {
        self.allows(Capability::EmailPdf)
    }
}

impl std::fmt::Debug for PermissionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set()
            .entries(self.granted().map(|c| c.name()))
            .finish()
    }
}

impl Serialize for PermissionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PermissionSet", Capability::ALL.len())?;
        for capability in Capability::ALL {
            state.serialize_field(capability.name(), &self.allows(capability))?;
        }
        state.end()
    }
}

use Capability::*;

const ALL_EDITS: PermissionSet =
    PermissionSet::of(&[EditDocumentInfo, EditDetails, EditLineItems, EditReviewFields]);
const OPERATOR_EDIT: PermissionSet = ALL_EDITS.union(PermissionSet::of(&[SaveDraft, Submit]));
const QA_REVIEW: PermissionSet = PermissionSet::of(&[EditReviewFields, QaSubmit, QaReject]);
const AVP_REVIEW: PermissionSet = PermissionSet::of(&[Approve, Reject]);
const DOWNLOAD: PermissionSet = PermissionSet::of(&[DownloadPdf]);
const DISTRIBUTE: PermissionSet = PermissionSet::of(&[DownloadPdf, EmailPdf]);
const SUPER_OPERATOR: PermissionSet = ALL_EDITS.union(PermissionSet::of(&[SaveDraft, DownloadPdf, EmailPdf]));
const NONE: PermissionSet = PermissionSet::NONE;

/// Rows are roles (operator, qa, avp, master); columns are statuses
/// (DRAFT, SUBMITTED, APPROVED, REJECTED).
pub type PermissionTable = [[PermissionSet; 4]; 4];

/// Coating and line clearance: master acts as a super-operator in every status
pub const SUPERVISED_TABLE: PermissionTable = [
    [OPERATOR_EDIT, NONE, DISTRIBUTE, OPERATOR_EDIT],
    [NONE, QA_REVIEW, DISTRIBUTE, NONE],
    [NONE, AVP_REVIEW, DISTRIBUTE, NONE],
    [SUPER_OPERATOR, SUPER_OPERATOR, SUPER_OPERATOR, SUPER_OPERATOR],
];

/// Printing and general inspection: master is read-only but can always download
pub const READ_ONLY_MASTER_TABLE: PermissionTable = [
    [OPERATOR_EDIT, NONE, DISTRIBUTE, OPERATOR_EDIT],
    [NONE, QA_REVIEW, DISTRIBUTE, NONE],
    [NONE, AVP_REVIEW, DISTRIBUTE, NONE],
    [DOWNLOAD, DOWNLOAD, DISTRIBUTE, DOWNLOAD],
];

const MASTER_DRAFTING: PermissionSet = ALL_EDITS.union(PermissionSet::of(&[SaveDraft, DownloadPdf]));

/// Incoming quality: reviewers may download while the report is under review
pub const QUALITY_TABLE: PermissionTable = [
    [OPERATOR_EDIT, NONE, DISTRIBUTE, OPERATOR_EDIT],
    [NONE, QA_REVIEW.union(DOWNLOAD), DISTRIBUTE, NONE],
    [NONE, AVP_REVIEW.union(DOWNLOAD), DISTRIBUTE, NONE],
    [
        MASTER_DRAFTING,
        PermissionSet::of(&[EditReviewFields, DownloadPdf]),
        DISTRIBUTE,
        MASTER_DRAFTING,
    ],
];

pub fn permission_table(kind: FormKind) -> &'static PermissionTable {
    match kind {
        FormKind::Coating | FormKind::LineClearance => &SUPERVISED_TABLE,
        FormKind::Printing | FormKind::Inspection => &READ_ONLY_MASTER_TABLE,
        FormKind::Quality => &QUALITY_TABLE,
    }
}

/// Resolve the capability set for a role acting on a record in `status`
pub fn resolve(kind: FormKind, role: Role, status: FormStatus) -> PermissionSet {
    permission_table(kind)[role.index()][status.index()]
}
