use super::common::{
    lookup_group, mirror_composition, Characteristic, CoatingDetail, DocumentHeader,
};
use super::wire::lenient_string;
use super::{FormSchema, SignatureFields, SignatureSlot};
use crate::lifecycle::derived;
use crate::lifecycle::types::{FieldGroup, FormKind};
use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Run details shared by the first-article inspection reports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InspectionDetails {
    #[serde(deserialize_with = "lenient_string")]
    pub inspection_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub product: String,
    #[serde(deserialize_with = "lenient_string")]
    pub size_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub shift: String,
    #[serde(deserialize_with = "lenient_string")]
    pub variant: String,
    #[serde(deserialize_with = "lenient_string")]
    pub line_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub customer: String,
    #[serde(deserialize_with = "lenient_string")]
    pub sample_size: String,
    #[serde(deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
    pub mc_no: String,
}

impl InspectionDetails {
    pub const KEYS: &'static [&'static str] = &[
        "inspectionDate",
        "product",
        "sizeNo",
        "shift",
        "variant",
        "lineNo",
        "customer",
        "sampleSize",
        "mcNo",
    ];
}

/// Header dates default to today and a three-year review horizon
pub(crate) fn header_dates(today: NaiveDate) -> (String, String) {
    let review = today
        .checked_add_months(Months::new(36))
        .unwrap_or(today);
    (
        today.format("%Y-%m-%d").to_string(),
        review.format("%Y-%m-%d").to_string(),
    )
}

pub(crate) fn clock_time(now: DateTime<Utc>) -> String {
    now.format("%-I:%M:%S %p").to_string()
}

/// First-article coating inspection report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoatingReport {
    #[serde(flatten)]
    pub header: DocumentHeader,
    #[serde(flatten)]
    pub details: InspectionDetails,
    pub coating_details: Vec<CoatingDetail>,
    pub characteristics: Vec<Characteristic>,
    #[serde(deserialize_with = "lenient_string")]
    pub operator_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub operator_signature: String,
    #[serde(deserialize_with = "lenient_string")]
    pub qa_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub qa_signature: String,
    #[serde(deserialize_with = "lenient_string")]
    pub approval_time: String,
    #[serde(deserialize_with = "lenient_string")]
    pub batch_composition: String,
    #[serde(deserialize_with = "lenient_string")]
    pub color_shade: String,
    #[serde(deserialize_with = "lenient_string")]
    pub color_height: String,
    #[serde(deserialize_with = "lenient_string")]
    pub visual_defect: String,
    #[serde(deserialize_with = "lenient_string")]
    pub mek_test: String,
    #[serde(deserialize_with = "lenient_string")]
    pub cross_cut_test: String,
    #[serde(deserialize_with = "lenient_string")]
    pub coating_thickness_body: String,
    #[serde(deserialize_with = "lenient_string")]
    pub coating_thickness_bottom: String,
    #[serde(deserialize_with = "lenient_string")]
    pub temperature: String,
    #[serde(deserialize_with = "lenient_string")]
    pub viscosity: String,
}

const SIGNATURE_KEYS: &[&str] = &["operatorName", "operatorSignature"];
const REVIEW_KEYS: &[&str] = &["characteristics", "qaName", "qaSignature", "approvalTime"];
const LINE_ITEM_KEYS: &[&str] = &["coatingDetails"];

impl CoatingReport {
    fn default_characteristics() -> Vec<Characteristic> {
        vec![
            Characteristic::observed(1, "Colour Shade"),
            Characteristic::observed(2, "Colour Height"),
            Characteristic::observed(3, "Any Visual defect"),
            Characteristic::observed(4, "MEK Test"),
            Characteristic::observed(5, "Cross Cut Test (Tape Test)"),
            Characteristic::thickness(6, "Coating Thickness"),
            Characteristic::observed(7, "Temperature"),
            Characteristic::observed(8, "Viscosity"),
            Characteristic::observed(9, "Batch Composition"),
        ]
    }

    fn default_coating_details() -> Vec<CoatingDetail> {
        ["Clear Extn", "Red Dye"]
            .iter()
            .enumerate()
            .map(|(i, lacquer)| CoatingDetail {
                id: Some(i as u32 + 1),
                lacquer_type: lacquer.to_string(),
                ..CoatingDetail::default()
            })
            .collect()
    }

    /// Copy characteristic observations into the flat columns the backend indexes
    fn mirror_characteristics(&mut self) {
        for row in &self.characteristics {
            let key: String = row
                .name
                .to_lowercase()
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            let observation = row.observation.clone();
            if key == "colourshade" || key == "colorshade" {
                self.color_shade = observation;
            } else if key == "colourheight" || key == "colorheight" {
                self.color_height = observation;
            } else if key.contains("visual") {
                self.visual_defect = observation;
            } else if key.contains("mek") {
                self.mek_test = observation;
            } else if key.contains("crosscut") || key.contains("tape") {
                self.cross_cut_test = observation;
            } else if key.contains("thickness") {
                self.coating_thickness_body = row.body_thickness.clone().unwrap_or_default();
                self.coating_thickness_bottom = row.bottom_thickness.clone().unwrap_or_default();
            } else if key.contains("temperature") {
                self.temperature = observation;
            } else if key.contains("viscosity") {
                self.viscosity = observation;
            }
        }
    }
}

impl FormSchema for CoatingReport {
    const KIND: FormKind = FormKind::Coating;
    const DATE_FIELDS: &'static [&'static str] = &["issueDate", "reviewedDate", "inspectionDate"];
    const SENDS_DATETIMES: bool = true;

    fn blank(today: NaiveDate) -> Self {
        let (issue_date, reviewed_date) = header_dates(today);
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
            coating_details: Self::default_coating_details(),
            characteristics: Self::default_characteristics(),
            ..Self::default()
        }
    }

    fn field_group(key: &str) -> Option<FieldGroup> {
        if key == "mcNo" {
            return None;
        }
        lookup_group(
            key,
            &[
                (DocumentHeader::KEYS, FieldGroup::DocumentInfo),
                (InspectionDetails::KEYS, FieldGroup::Details),
                (SIGNATURE_KEYS, FieldGroup::Details),
                (LINE_ITEM_KEYS, FieldGroup::LineItems),
                (REVIEW_KEYS, FieldGroup::ReviewFields),
            ],
        )
    }

    fn reference_date(&self) -> Option<&str> {
        Some(self.details.inspection_date.as_str())
    }

    fn signature_mut(&mut self, slot: SignatureSlot) -> Option<SignatureFields<'_>> {
        Some(match slot {
            SignatureSlot::Operator => {
                SignatureFields::new(&mut self.operator_name, &mut self.operator_signature)
            }
            SignatureSlot::Qa | SignatureSlot::Approver => {
                SignatureFields::new(&mut self.qa_name, &mut self.qa_signature)
            }
        })
    }

    fn stamp_approval_time(&mut self, now: DateTime<Utc>) {
        self.approval_time = clock_time(now);
    }

    fn composition(&self) -> Option<String> {
        Some(derived::composition(&self.coating_details))
    }

    fn recompute_derived(&mut self) {
        let composition = derived::composition(&self.coating_details);
        mirror_composition(&mut self.characteristics, &composition);
        self.batch_composition = composition;
        self.mirror_characteristics();
    }
}
