use super::coating::{clock_time, header_dates, InspectionDetails};
use super::common::{lookup_group, mirror_composition, Characteristic, DocumentHeader, MaterialLine};
use super::wire::lenient_string;
use super::{FormSchema, SignatureFields, SignatureSlot};
use crate::lifecycle::derived;
use crate::lifecycle::types::{FieldGroup, FormKind};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// First-article printing inspection report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrintingReport {
    #[serde(flatten)]
    pub header: DocumentHeader,
    #[serde(flatten)]
    pub details: InspectionDetails,
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

pub(crate) const OPERATOR_SIGNATURE_KEYS: &[&str] = &["productionOperator", "operatorSignature"];
pub(crate) const REVIEW_KEYS: &[&str] = &[
    "characteristics",
    "qaExecutive",
    "qaSignature",
    "finalApprovalTime",
];

const LINE_ITEM_KEYS: &[&str] = &["inks"];

fn printing_characteristics() -> Vec<Characteristic> {
    vec![
        Characteristic::observed(1, "Colour Shade"),
        Characteristic::position(2, "Printing Position"),
        Characteristic::observed(3, "Deposition of ink"),
        Characteristic::observed(4, "Marking Sample"),
        Characteristic::observed(5, "Art work / Positive"),
        Characteristic::observed(6, "Run File"),
        Characteristic::observed(7, "Printing Ink (Type)"),
        Characteristic::observed(8, "Any Visual Defect"),
        Characteristic::observed(9, "Batch Composition"),
    ]
}

impl FormSchema for PrintingReport {
    const KIND: FormKind = FormKind::Printing;
    const DATE_FIELDS: &'static [&'static str] = &["issueDate", "reviewedDate", "inspectionDate"];

    fn blank(today: NaiveDate) -> Self {
        let (issue_date, reviewed_date) = header_dates(today);
        Self {
            header: DocumentHeader::standard(&issue_date, &reviewed_date),
            details: InspectionDetails {
                inspection_date: issue_date.clone(),
                product: "100 mL Jar".to_string(),
                mc_no: "CNC 03".to_string(),
                shift: "B".to_string(),
                variant: "BLUE HORSE AND TANK".to_string(),
                line_no: "03".to_string(),
                size_no: "R-001".to_string(),
                sample_size: "08 Nos.".to_string(),
                ..InspectionDetails::default()
            },
            inks: vec![MaterialLine::named(1, ""), MaterialLine::named(2, "")],
            characteristics: printing_characteristics(),
            ..Self::default()
        }
    }

    fn field_group(key: &str) -> Option<FieldGroup> {
        lookup_group(
            key,
            &[
                (DocumentHeader::KEYS, FieldGroup::DocumentInfo),
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
        Some(derived::composition(&self.inks))
    }

    fn recompute_derived(&mut self) {
        let composition = derived::composition(&self.inks);
        mirror_composition(&mut self.characteristics, &composition);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_template_has_position_row() {
        let report = PrintingReport::blank(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(report.details.mc_no, "CNC 03");
        assert_eq!(report.inks.len(), 2);
        let position = &report.characteristics[1];
        assert_eq!(position.vertical.as_deref(), Some(""));
        assert!(position.body_thickness.is_none());
    }

    #[test]
    fn test_ink_composition_mirrors_into_characteristics() {
        let mut report = PrintingReport::blank(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        report.inks[0].name = "Black Ink".to_string();
        report.inks[0].weight = "1.5".to_string();
        report.inks[1].name = "Blue Ink".to_string();
        report.recompute_derived();
        assert_eq!(report.characteristics[8].observation, "Black Ink 1.5");
    }

    #[test]
    fn test_printing_has_no_approver_signature() {
        let mut report = PrintingReport::default();
        assert!(report.signature_mut(SignatureSlot::Approver).is_none());
        assert_eq!(PrintingReport::field_group("mcNo"), Some(FieldGroup::Details));
    }
}
