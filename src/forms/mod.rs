//! Typed form records and their backend wire shape
//!
//! A record is a common lifecycle envelope plus one kind-specific payload.
//! On the wire both halves are merged into a single flat camelCase object.

pub mod clearance;
pub mod coating;
pub mod common;
pub mod inspection;
pub mod printing;
pub mod quality;
pub mod wire;

use crate::lifecycle::types::{FieldGroup, FormKind, FormStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use clearance::LineClearanceReport;
pub use coating::CoatingReport;
pub use inspection::InspectionReport;
pub use printing::PrintingReport;
pub use quality::QualityReport;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("expected a JSON object for a {0} record")]
    NotAnObject(FormKind),
    #[error("'{field}' is not a field of the {kind} form")]
    UnknownField { kind: FormKind, field: String },
    #[error("'{0}' is managed by the approval workflow and cannot be edited directly")]
    EnvelopeField(String),
    #[error("invalid {kind} record: {source}")]
    Decode {
        kind: FormKind,
        #[source]
        source: serde_json::Error,
    },
}

/// Lifecycle fields common to every kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Envelope {
    #[serde(deserialize_with = "wire::id_as_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub status: FormStatus,
    #[serde(deserialize_with = "wire::blank_as_none", skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<String>,
    #[serde(deserialize_with = "wire::lenient_datetime", skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "wire::blank_as_none", skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(deserialize_with = "wire::lenient_datetime", skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "wire::blank_as_none", skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(deserialize_with = "wire::lenient_datetime", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "wire::blank_as_none", skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl Envelope {
    pub const KEYS: &'static [&'static str] = &[
        "id",
        "status",
        "submittedBy",
        "submittedAt",
        "reviewedBy",
        "reviewedAt",
        "comments",
        "createdAt",
        "createdBy",
    ];
}

/// Signature slots stamped by the approval workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureSlot {
    Operator,
    Qa,
    Approver,
}

/// Mutable view of one name/signature pair
pub struct SignatureFields<'a> {
    pub name: &'a mut String,
    pub token: &'a mut String,
}

impl<'a> SignatureFields<'a> {
    pub fn new(name: &'a mut String, token: &'a mut String) -> Self {
        Self { name, token }
    }

    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty()
    }

    pub fn sign(self, signer: &str, token: String) {
        *self.name = signer.to_string();
        *self.token = token;
    }
}

/// Per-kind schema: field map, templates, signature slots and derived fields
pub trait FormSchema: Serialize + DeserializeOwned + Clone + std::fmt::Debug + Send + Sync {
    const KIND: FormKind;

    /// Date fields trimmed to `YYYY-MM-DD` when loaded
    const DATE_FIELDS: &'static [&'static str];

    /// Whether the backend expects those date fields as midnight datetimes
    const SENDS_DATETIMES: bool = false;

    /// Blank record with the plant's default header values and rows
    fn blank(today: NaiveDate) -> Self;

    /// Field group a top-level wire key belongs to
    fn field_group(key: &str) -> Option<FieldGroup>;

    /// Date the document number is derived from
    fn reference_date(&self) -> Option<&str>;

    fn signature_mut(&mut self, slot: SignatureSlot) -> Option<SignatureFields<'_>>;

    fn stamp_approval_time(&mut self, _now: DateTime<Utc>) {}

    /// Composition of the record's line items, for kinds that have one
    fn composition(&self) -> Option<String> {
        None
    }

    /// Recompute every field derived from other fields
    fn recompute_derived(&mut self);

    /// Wire names of required fields that are still blank
    fn missing_required_fields(&self) -> Vec<&'static str> {
        Vec::new()
    }
}

/// Kind-specific payload
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Coating(CoatingReport),
    Printing(PrintingReport),
    LineClearance(LineClearanceReport),
    Quality(QualityReport),
    Inspection(InspectionReport),
}

macro_rules! with_schema {
    ($payload:expr, $report:ident => $body:expr) => {
        match $payload {
            Payload::Coating($report) => $body,
            Payload::Printing($report) => $body,
            Payload::LineClearance($report) => $body,
            Payload::Quality($report) => $body,
            Payload::Inspection($report) => $body,
        }
    };
}

fn encode<S: FormSchema>(report: &S) -> Result<Map<String, Value>, FormError> {
    let value = serde_json::to_value(report).map_err(|source| FormError::Decode {
        kind: S::KIND,
        source,
    })?;
    match value {
        Value::Object(mut map) => {
            if S::SENDS_DATETIMES {
                wire::expand_date_fields(&mut map, S::DATE_FIELDS);
            }
            Ok(map)
        }
        _ => Err(FormError::NotAnObject(S::KIND)),
    }
}

fn decode<S: FormSchema>(mut map: Map<String, Value>) -> Result<S, FormError> {
    wire::truncate_date_fields(&mut map, S::DATE_FIELDS);
    serde_json::from_value(Value::Object(map)).map_err(|source| FormError::Decode {
        kind: S::KIND,
        source,
    })
}

fn patched<S: FormSchema>(report: &S, patch: &Map<String, Value>) -> Result<S, FormError> {
    let mut map = encode(report)?;
    wire::truncate_date_fields(&mut map, S::DATE_FIELDS);
    let mut overlay = Value::Object(patch.clone());
    wire::strip_nulls(&mut overlay);
    if let Value::Object(overlay) = overlay {
        wire::merge_objects(&mut map, overlay);
    }
    let mut updated: S = decode(map)?;
    updated.recompute_derived();
    Ok(updated)
}

impl Payload {
    pub fn blank(kind: FormKind, today: NaiveDate) -> Self {
        match kind {
            FormKind::Coating => Payload::Coating(CoatingReport::blank(today)),
            FormKind::Printing => Payload::Printing(PrintingReport::blank(today)),
            FormKind::LineClearance => Payload::LineClearance(LineClearanceReport::blank(today)),
            FormKind::Quality => Payload::Quality(QualityReport::blank(today)),
            FormKind::Inspection => Payload::Inspection(InspectionReport::blank(today)),
        }
    }

    pub fn kind(&self) -> FormKind {
        match self {
            Payload::Coating(_) => FormKind::Coating,
            Payload::Printing(_) => FormKind::Printing,
            Payload::LineClearance(_) => FormKind::LineClearance,
            Payload::Quality(_) => FormKind::Quality,
            Payload::Inspection(_) => FormKind::Inspection,
        }
    }

    pub fn from_map(kind: FormKind, map: Map<String, Value>) -> Result<Self, FormError> {
        Ok(match kind {
            FormKind::Coating => Payload::Coating(decode(map)?),
            FormKind::Printing => Payload::Printing(decode(map)?),
            FormKind::LineClearance => Payload::LineClearance(decode(map)?),
            FormKind::Quality => Payload::Quality(decode(map)?),
            FormKind::Inspection => Payload::Inspection(decode(map)?),
        })
    }

    pub fn to_map(&self) -> Result<Map<String, Value>, FormError> {
        with_schema!(self, report => encode(report))
    }

    pub fn field_group(&self, key: &str) -> Option<FieldGroup> {
        match self {
            Payload::Coating(_) => CoatingReport::field_group(key),
            Payload::Printing(_) => PrintingReport::field_group(key),
            Payload::LineClearance(_) => LineClearanceReport::field_group(key),
            Payload::Quality(_) => QualityReport::field_group(key),
            Payload::Inspection(_) => InspectionReport::field_group(key),
        }
    }

    /// Classify every key of an edit, rejecting lifecycle and unknown keys
    pub fn classify_patch(
        &self,
        patch: &Map<String, Value>,
    ) -> Result<Vec<(String, FieldGroup)>, FormError> {
        patch
            .keys()
            .map(|key| {
                if Envelope::KEYS.contains(&key.as_str()) {
                    return Err(FormError::EnvelopeField(key.clone()));
                }
                self.field_group(key)
                    .map(|group| (key.clone(), group))
                    .ok_or_else(|| FormError::UnknownField {
                        kind: self.kind(),
                        field: key.clone(),
                    })
            })
            .collect()
    }

    /// Apply a top-level patch and recompute derived fields
    pub fn apply_patch(&self, patch: &Map<String, Value>) -> Result<Self, FormError> {
        Ok(match self {
            Payload::Coating(r) => Payload::Coating(patched(r, patch)?),
            Payload::Printing(r) => Payload::Printing(patched(r, patch)?),
            Payload::LineClearance(r) => Payload::LineClearance(patched(r, patch)?),
            Payload::Quality(r) => Payload::Quality(patched(r, patch)?),
            Payload::Inspection(r) => Payload::Inspection(patched(r, patch)?),
        })
    }

    pub fn reference_date(&self) -> Option<&str> {
        with_schema!(self, report => report.reference_date())
    }

    pub fn signature_mut(&mut self, slot: SignatureSlot) -> Option<SignatureFields<'_>> {
        with_schema!(self, report => report.signature_mut(slot))
    }

    pub fn stamp_approval_time(&mut self, now: DateTime<Utc>) {
        with_schema!(self, report => report.stamp_approval_time(now))
    }

    pub fn composition(&self) -> Option<String> {
        with_schema!(self, report => report.composition())
    }

    pub fn recompute_derived(&mut self) {
        with_schema!(self, report => report.recompute_derived())
    }

    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        with_schema!(self, report => report.missing_required_fields())
    }
}

/// A form record: lifecycle envelope plus typed payload
#[derive(Debug, Clone, PartialEq)]
pub struct InspectionRecord {
    pub envelope: Envelope,
    pub payload: Payload,
}

impl InspectionRecord {
    /// Fresh DRAFT record with template defaults and derived fields filled in
    pub fn blank(kind: FormKind, today: NaiveDate) -> Self {
        let mut payload = Payload::blank(kind, today);
        payload.recompute_derived();
        Self {
            envelope: Envelope::default(),
            payload,
        }
    }

    pub fn kind(&self) -> FormKind {
        self.payload.kind()
    }

    pub fn id(&self) -> Option<&str> {
        self.envelope.id.as_deref()
    }

    pub fn status(&self) -> FormStatus {
        self.envelope.status
    }

    pub fn from_wire(kind: FormKind, mut value: Value) -> Result<Self, FormError> {
        wire::strip_nulls(&mut value);
        let Value::Object(map) = value else {
            return Err(FormError::NotAnObject(kind));
        };
        let envelope: Envelope = serde_json::from_value(Value::Object(map.clone()))
            .map_err(|source| FormError::Decode { kind, source })?;
        let payload = Payload::from_map(kind, map)?;
        Ok(Self { envelope, payload })
    }

    pub fn to_wire(&self) -> Result<Value, FormError> {
        let mut map = self.payload.to_map()?;
        let envelope = serde_json::to_value(&self.envelope).map_err(|source| FormError::Decode {
            kind: self.kind(),
            source,
        })?;
        if let Value::Object(envelope) = envelope {
            wire::merge_objects(&mut map, envelope);
        }
        Ok(Value::Object(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn test_wire_round_trip_keeps_envelope_and_payload() {
        let value = json!({
            "id": 12,
            "status": "SUBMITTED",
            "submittedBy": "Alice",
            "submittedAt": "2024-05-01T09:00:00",
            "reviewedBy": "",
            "comments": null,
            "inspectionDate": "2024-05-01T00:00:00",
            "coatingDetails": [{"lacquerType": "Clear Extn", "quantity": 5}],
            "qaSignature": null
        });
        let record = InspectionRecord::from_wire(FormKind::Coating, value).unwrap();
        assert_eq!(record.id(), Some("12"));
        assert_eq!(record.status(), FormStatus::Submitted);
        assert_eq!(record.envelope.submitted_by.as_deref(), Some("Alice"));
        assert!(record.envelope.reviewed_by.is_none());

        let Payload::Coating(report) = &record.payload else {
            panic!("expected coating payload");
        };
        assert_eq!(report.details.inspection_date, "2024-05-01");
        assert_eq!(report.coating_details[0].quantity, "5");

        let wire = record.to_wire().unwrap();
        assert_eq!(wire["status"], "SUBMITTED");
        assert_eq!(wire["inspectionDate"], "2024-05-01T00:00:00");
        assert_eq!(wire["id"], "12");
    }

    #[test]
    fn test_minute_precision_stamp_survives_resubmission() {
        use crate::lifecycle::{execute, Action, Role, TransitionContext, User};
        use chrono::TimeZone;

        let value = json!({
            "id": 3,
            "status": "REJECTED",
            "submittedBy": "Alice",
            "submittedAt": "2024-05-01T10:15",
            "reviewedBy": "Bob",
            "reviewedAt": "2024-05-01 11:30",
            "comments": "wrong batch"
        });
        let record = InspectionRecord::from_wire(FormKind::Coating, value).unwrap();
        let first_submit = Utc.with_ymd_and_hms(2024, 5, 1, 10, 15, 0).unwrap();
        assert_eq!(record.envelope.submitted_at, Some(first_submit));

        let alice = User::new("Alice", Role::Operator);
        let later = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let resubmitted = execute(&record, Action::Submit, &TransitionContext::new(&alice, later)).unwrap();
        assert_eq!(resubmitted.record.envelope.submitted_at, Some(first_submit));

        let wire = resubmitted.record.to_wire().unwrap();
        assert_eq!(wire["submittedAt"], "2024-05-01T10:15:00Z");
    }

    #[test]
    fn test_numeric_text_fields_load_as_strings() {
        let value = json!({"status": "SUBMITTED", "batchNumber": 12345, "shift": 2});
        let record = InspectionRecord::from_wire(FormKind::Quality, value).unwrap();
        let Payload::Quality(report) = &record.payload else {
            panic!("expected quality payload");
        };
        assert_eq!(report.batch_number, "12345");
        assert_eq!(report.shift, "2");

        let value = json!({"status": "DRAFT", "sizeNo": 50, "lineNo": 3, "sampleSize": 125});
        let record = InspectionRecord::from_wire(FormKind::Coating, value).unwrap();
        let Payload::Coating(report) = &record.payload else {
            panic!("expected coating payload");
        };
        assert_eq!(report.details.size_no, "50");
        assert_eq!(report.details.sample_size, "125");

        let value = json!({"status": "DRAFT", "line": "PRINTING", "unit": 4});
        assert!(InspectionRecord::from_wire(FormKind::LineClearance, value).is_ok());
    }

    #[test]
    fn test_unreadable_envelope_stamp_fails_to_load() {
        let value = json!({"status": "SUBMITTED", "submittedAt": "sometime in May"});
        assert!(matches!(
            InspectionRecord::from_wire(FormKind::Printing, value),
            Err(FormError::Decode { .. })
        ));
    }

    #[test]
    fn test_patch_classification_rejects_lifecycle_keys() {
        let record = InspectionRecord::blank(FormKind::Printing, today());
        let patch = json!({"status": "APPROVED"}).as_object().cloned().unwrap();
        assert!(matches!(
            record.payload.classify_patch(&patch),
            Err(FormError::EnvelopeField(_))
        ));

        let patch = json!({"nonsense": 1}).as_object().cloned().unwrap();
        assert!(matches!(
            record.payload.classify_patch(&patch),
            Err(FormError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_patch_with_wrong_shape_is_rejected() {
        let record = InspectionRecord::blank(FormKind::Printing, today());
        let patch = json!({"inks": "not a list"}).as_object().cloned().unwrap();
        assert!(matches!(
            record.payload.apply_patch(&patch),
            Err(FormError::Decode { .. })
        ));
    }

    #[test]
    fn test_blank_records_start_as_draft() {
        for kind in FormKind::ALL {
            let record = InspectionRecord::blank(kind, today());
            assert_eq!(record.status(), FormStatus::Draft);
            assert!(record.id().is_none());
            assert_eq!(record.kind(), kind);
        }
    }
}
