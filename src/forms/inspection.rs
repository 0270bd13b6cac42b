use super::coating::{clock_time, header_dates, InspectionDetails};
use super::common::{lookup_group, mirror_composition, Characteristic, DocumentHeader, MaterialLine};
use super::printing::{OPERATOR_SIGNATURE_KEYS, REVIEW_KEYS};
use super::wire::lenient_string;
use super::{FormSchema, SignatureFields, SignatureSlot};
use crate::lifecycle::derived;
use crate::lifecycle::types::{FieldGroup, FormKind};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// General first-article inspection form (coating or printing variant)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InspectionReport {
    #[serde(flatten)]
    pub header: DocumentHeader,
    #[serde(flatten)]
    pub details: InspectionDetails,
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub scope: String,
    pub lacquers: Vec<MaterialLine>,
    pub inks: Vec<MaterialLine>,
    pub characteristics: Vec<Characteristic>,
    #[serde(deserialize_with = "lenient_string")]
    pub production_operator: String,
    #[serde(deserialize_with = "lenient_string")]
    pub operator_signature: String,
    #[serde(deserialize_with = "lenient_string")]
    pub qa_executive: String,
    #[serde(deserialize_with = "lenient_string")]
    pub qa_signature: String,
    #[serde(deserialize_with = "lenient_string")]
    pub final_approval_time: String,
}

const DEFAULT_LACQUERS: &[&str] = &[
    "Clear Extn",
    "Red Dye",
    "Black Dye",
    "Pink Dye",
    "Violet Dye",
    "Matt Bath",
    "Hardener",
    "",
];

const TITLE_KEYS: &[&str] = &["title", "scope"];
const LINE_ITEM_KEYS: &[&str] = &["lacquers", "inks"];

impl FormSchema for InspectionReport {
    const KIND: FormKind = FormKind::Inspection;
    const DATE_FIELDS: &'static [&'static str] = &["issueDate", "reviewedDate", "inspectionDate"];

    fn blank(today: NaiveDate) -> Self {
        let (issue_date, reviewed_date) = header_dates(today);
        let mut characteristics = Characteristic::observed_list(&[
            "Colour Shade",
            "(Colour Height)",
            "Any Visual defect",
            "MEK Test",
            "Cross Cut Test (Tape Test)",
            "Coating Thickness",
            "Temperature",
            "Viscosity",
            "Batch Composition",
        ]);
        characteristics[5] = Characteristic::thickness(6, "Coating Thickness");

        Self {
            header: DocumentHeader::standard(&issue_date, &reviewed_date),
            details: InspectionDetails {
                inspection_date: issue_date.clone(),
                product: "100 mL Bag Pke.".to_string(),
                shift: "C".to_string(),
                variant: "Pink matt".to_string(),
                line_no: "02".to_string(),
                sample_size: "08 Nos.".to_string(),
                ..InspectionDetails::default()
            },
            title: "FIRST ARTICLE INSPECTION REPORT - COATING".to_string(),
            scope: "AGI / DEC / COATING".to_string(),
            lacquers: DEFAULT_LACQUERS
                .iter()
                .enumerate()
                .map(|(i, name)| MaterialLine::named(i as u32 + 1, name))
                .collect(),
            characteristics,
            ..Self::default()
        }
    }

    fn field_group(key: &str) -> Option<FieldGroup> {
        lookup_group(
            key,
            &[
                (DocumentHeader::KEYS, FieldGroup::DocumentInfo),
                (TITLE_KEYS, FieldGroup::DocumentInfo),
                (InspectionDetails::KEYS, FieldGroup::Details),
                (OPERATOR_SIGNATURE_KEYS, FieldGroup::Details),
                (LINE_ITEM_KEYS, FieldGroup::LineItems),
                (REVIEW_KEYS, FieldGroup::ReviewFields),
            ],
        )
    }

    fn reference_date(&self) -> Option<&str> {
        Some(self.details.inspection_date.as_str())
    }

    fn signature_mut(&mut self, slot: SignatureSlot) -> Option<SignatureFields<'_>> {
        match slot {
            SignatureSlot::Operator => Some(SignatureFields::new(
                &mut self.production_operator,
                &mut self.operator_signature,
            )),
            SignatureSlot::Qa => Some(SignatureFields::new(
                &mut self.qa_executive,
                &mut self.qa_signature,
            )),
            SignatureSlot::Approver => None,
        }
    }

    fn stamp_approval_time(&mut self, now: DateTime<Utc>) {
        self.final_approval_time = clock_time(now);
    }

    fn composition(&self) -> Option<String> {
        Some(derived::composition(self.lacquers.iter().chain(&self.inks)))
    }

    fn recompute_derived(&mut self) {
        let composition = derived::composition(self.lacquers.iter().chain(&self.inks));
        mirror_composition(&mut self.characteristics, &composition);
    }
}
