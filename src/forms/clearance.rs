use super::coating::header_dates;
use super::common::{lookup_group, CheckPoint, ControlledHeader};
use super::wire::lenient_string;
use super::{FormSchema, SignatureFields, SignatureSlot};
use crate::lifecycle::derived;
use crate::lifecycle::types::{FieldGroup, FormKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Line clearance report raised on a job or variant changeover
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineClearanceReport {
    #[serde(flatten)]
    pub header: ControlledHeader,
    #[serde(deserialize_with = "lenient_string")]
    pub unit: String,
    #[serde(deserialize_with = "lenient_string")]
    pub report_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub shift: String,
    #[serde(deserialize_with = "lenient_string")]
    pub line: String,
    #[serde(deserialize_with = "lenient_string")]
    pub product_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub existing_variant_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub existing_variant_description: String,
    #[serde(deserialize_with = "lenient_string")]
    pub new_variant_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub new_variant_description: String,
    #[serde(deserialize_with = "lenient_string")]
    pub existing_variant_stop_time: String,
    #[serde(deserialize_with = "lenient_string")]
    pub new_variant_start_time: String,
    pub check_points: Vec<CheckPoint>,
    #[serde(deserialize_with = "lenient_string")]
    pub production_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub production_signature: String,
    #[serde(deserialize_with = "lenient_string")]
    pub quality_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub quality_signature: String,
    #[serde(deserialize_with = "lenient_string")]
    pub responsible_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub responsible_signature: String,
    #[serde(deserialize_with = "lenient_string")]
    pub production_area: String,
}

const UNIT_KEYS: &[&str] = &["unit"];
const DETAIL_KEYS: &[&str] = &[
    "reportDate",
    "shift",
    "line",
    "productName",
    "existingVariantName",
    "existingVariantDescription",
    "newVariantName",
    "newVariantDescription",
    "existingVariantStopTime",
    "newVariantStartTime",
    "productionName",
    "productionSignature",
];
const LINE_ITEM_KEYS: &[&str] = &["checkPoints"];
const REVIEW_KEYS: &[&str] = &[
    "qualityName",
    "qualitySignature",
    "responsibleName",
    "responsibleSignature",
];

const DEFAULT_CHECKPOINTS: &[(&str, &str)] = &[
    (
        "Ensure no Rejection / OK bottles of existing Job / Variant kept at Coating Loading / Unloading area.",
        "Quality Engineer",
    ),
    (
        "Ensure no Rejection / OK bottles of existing Job / Variant kept at Printing Production area (All M/c at lehr Loading end).",
        "Printing Operator",
    ),
    (
        "Ensure no Rejection / OK bottles of existing Job / Variant kept at Lehr end Inspection area and below Lehr Conveyor.",
        "Executive",
    ),
    (
        "Ensure no Rejection / OK bottles of existing Job / Variant kept at QC laboratory.",
        "Executive",
    ),
    (
        "Ensure all box Labels of existing Job / Variant are withdrawn or Removed.",
        "Executive",
    ),
    (
        "Ensure all empty boxes / Trays / Partitions of existing Job / Variant are withdrawn or removed.",
        "Executive",
    ),
    (
        "Ensure all Final Pallet cards of existing Job / Variant are withdrawn or removed.",
        "Production Engineer",
    ),
    (
        "Ensure all existing Job / Variant are withdrawn or Removed from Offline sorting / Resorting area.",
        "Production Engineer",
    ),
];

impl FormSchema for LineClearanceReport {
    const KIND: FormKind = FormKind::LineClearance;
    const DATE_FIELDS: &'static [&'static str] = &["reportDate", "effectiveDate", "reviewedOn"];
    const SENDS_DATETIMES: bool = true;

    fn blank(today: NaiveDate) -> Self {
        let (effective_date, reviewed_on) = header_dates(today);
        Self {
            header: ControlledHeader {
                revision: "00".to_string(),
                effective_date: effective_date.clone(),
                reviewed_on,
                page: "1/1".to_string(),
                title: "LINE CLEARANCE REPORT".to_string(),
                scope: "AGI / DEC / COATING & PRINTING".to_string(),
                ..ControlledHeader::default()
            },
            unit: "AGI Speciality Glass Division".to_string(),
            report_date: effective_date,
            check_points: DEFAULT_CHECKPOINTS
                .iter()
                .enumerate()
                .map(|(i, (description, responsibility))| CheckPoint {
                    id: Some(i as u32 + 1),
                    description: description.to_string(),
                    responsibility: responsibility.to_string(),
                    remarks: String::new(),
                })
                .collect(),
            ..Self::default()
        }
    }

    fn field_group(key: &str) -> Option<FieldGroup> {
        lookup_group(
            key,
            &[
                (ControlledHeader::KEYS, FieldGroup::DocumentInfo),
                (UNIT_KEYS, FieldGroup::DocumentInfo),
                (DETAIL_KEYS, FieldGroup::Details),
                (LINE_ITEM_KEYS, FieldGroup::LineItems),
                (REVIEW_KEYS, FieldGroup::ReviewFields),
            ],
        )
    }

    fn reference_date(&self) -> Option<&str> {
        Some(self.report_date.as_str())
    }

    fn signature_mut(&mut self, slot: SignatureSlot) -> Option<SignatureFields<'_>> {
        Some(match slot {
            SignatureSlot::Operator => {
                SignatureFields::new(&mut self.production_name, &mut self.production_signature)
            }
            SignatureSlot::Qa => {
                SignatureFields::new(&mut self.quality_name, &mut self.quality_signature)
            }
            SignatureSlot::Approver => {
                SignatureFields::new(&mut self.responsible_name, &mut self.responsible_signature)
            }
        })
    }

    fn recompute_derived(&mut self) {
        if let Some(area) = derived::production_area(&self.line) {
            self.production_area = area.to_string();
        }
    }
}
