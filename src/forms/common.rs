//! Row and header shapes shared by several form kinds

use super::wire::{lenient_count, lenient_string};
use crate::lifecycle::types::FieldGroup;
use serde::{Deserialize, Serialize};

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Header block of the first-article inspection reports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentHeader {
    #[serde(deserialize_with = "lenient_string")]
    pub document_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub issuance_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub issue_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub reviewed_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub page: String,
    #[serde(deserialize_with = "lenient_string")]
    pub prepared_by: String,
    #[serde(deserialize_with = "lenient_string")]
    pub approved_by: String,
    #[serde(deserialize_with = "lenient_string")]
    pub issued: String,
}

impl DocumentHeader {
    pub const KEYS: &'static [&'static str] = &[
        "documentNo",
        "issuanceNo",
        "issueDate",
        "reviewedDate",
        "page",
        "preparedBy",
        "approvedBy",
        "issued",
    ];

    pub fn standard(issue_date: &str, reviewed_date: &str) -> Self {
        Self {
            document_no: String::new(),
            issuance_no: "00".to_string(),
            issue_date: issue_date.to_string(),
            reviewed_date: reviewed_date.to_string(),
            page: "1 of 1".to_string(),
            prepared_by: "QQM QC".to_string(),
            approved_by: "AVP-QA & SYS".to_string(),
            issued: "AVP-QA & SYS".to_string(),
        }
    }
}

/// Header block of controlled documents (line clearance, IQC)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControlledHeader {
    #[serde(deserialize_with = "lenient_string")]
    pub document_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub revision: String,
    #[serde(deserialize_with = "lenient_string")]
    pub effective_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub reviewed_on: String,
    #[serde(deserialize_with = "lenient_string")]
    pub page: String,
    #[serde(deserialize_with = "lenient_string")]
    pub prepared_by: String,
    #[serde(deserialize_with = "lenient_string")]
    pub approved_by: String,
    #[serde(deserialize_with = "lenient_string")]
    pub issued: String,
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub scope: String,
}

impl ControlledHeader {
    pub const KEYS: &'static [&'static str] = &[
        "documentNo",
        "revision",
        "effectiveDate",
        "reviewedOn",
        "page",
        "preparedBy",
        "approvedBy",
        "issued",
        "title",
        "scope",
    ];
}

/// Lacquer or ink consumed by a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MaterialLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub weight: String,
    #[serde(deserialize_with = "lenient_string")]
    pub batch_no: String,
    #[serde(deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
    pub quantity: String,
    #[serde(deserialize_with = "lenient_string")]
    pub expiry_date: String,
}

impl MaterialLine {
    pub fn named(id: u32, name: &str) -> Self {
        Self {
            id: Some(id),
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// Lacquer row of the coating report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoatingDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[serde(alias = "name", deserialize_with = "lenient_string")]
    pub lacquer_type: String,
    #[serde(deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
    pub weight: String,
    #[serde(deserialize_with = "lenient_string")]
    pub batch_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub quantity: String,
    #[serde(deserialize_with = "lenient_string")]
    pub expiry_date: String,
}

/// Anything that contributes a `name value` pair to a composition string
pub trait CompositionLine {
    fn line_name(&self) -> &str;

    /// First non-blank of weight, batch number and quantity
    fn line_value(&self) -> Option<&str>;
}

fn first_filled<'a>(candidates: [&'a str; 3]) -> Option<&'a str> {
    candidates.into_iter().find(|s| !is_blank(s))
}

impl CompositionLine for MaterialLine {
    fn line_name(&self) -> &str {
        &self.name
    }

    fn line_value(&self) -> Option<&str> {
        first_filled([&self.weight, &self.batch_no, &self.quantity])
    }
}

impl CompositionLine for CoatingDetail {
    fn line_name(&self) -> &str {
        &self.lacquer_type
    }

    fn line_value(&self) -> Option<&str> {
        first_filled([&self.weight, &self.batch_no, &self.quantity])
    }
}

pub const BATCH_COMPOSITION: &str = "Batch Composition";

/// Characteristic check; sub-fields only appear on the rows that use them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Characteristic {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub observation: String,
    #[serde(deserialize_with = "lenient_string")]
    pub comments: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_thickness: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom_thickness: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal: Option<String>,
}

impl Characteristic {
    pub fn observed(id: u32, name: &str) -> Self {
        Self {
            id: Some(id),
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn thickness(id: u32, name: &str) -> Self {
        Self {
            body_thickness: Some(String::new()),
            bottom_thickness: Some(String::new()),
            ..Self::observed(id, name)
        }
    }

    pub fn position(id: u32, name: &str) -> Self {
        Self {
            vertical: Some(String::new()),
            horizontal: Some(String::new()),
            ..Self::observed(id, name)
        }
    }

    pub fn observed_list(names: &[&str]) -> Vec<Self> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| Self::observed(i as u32 + 1, name))
            .collect()
    }
}

/// Write the composition into the "Batch Composition" characteristic row
pub fn mirror_composition(characteristics: &mut [Characteristic], composition: &str) {
    if let Some(row) = characteristics
        .iter_mut()
        .find(|c| c.name == BATCH_COMPOSITION)
    {
        row.observation = composition.to_string();
    }
}

/// Defect tally for one audit category of an IQC report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuditRow {
    #[serde(deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(deserialize_with = "lenient_count")]
    pub count: u32,
    #[serde(deserialize_with = "lenient_string")]
    pub defect_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestResult {
    #[serde(deserialize_with = "lenient_string")]
    pub test_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub specification: String,
    #[serde(deserialize_with = "lenient_string")]
    pub result: String,
    #[serde(deserialize_with = "lenient_string")]
    pub checked_by: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckPoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "lenient_string")]
    pub responsibility: String,
    #[serde(deserialize_with = "lenient_string")]
    pub remarks: String,
}

/// Look a key up in a list of `(keys, group)` pairs
pub fn lookup_group(key: &str, groups: &[(&[&str], FieldGroup)]) -> Option<FieldGroup> {
    groups
        .iter()
        .find(|(keys, _)| keys.contains(&key))
        .map(|(_, group)| *group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_material_line_value_precedence() {
        let line: MaterialLine =
            serde_json::from_value(json!({"name": "Black Ink", "weight": "", "batchNo": "B7", "quantity": 3}))
                .unwrap();
        assert_eq!(line.line_value(), Some("B7"));
        assert_eq!(line.quantity, "3");
    }

    #[test]
    fn test_coating_detail_accepts_generic_names() {
        let detail: CoatingDetail =
            serde_json::from_value(json!({"name": "Clear Extn", "weight": "5"})).unwrap();
        assert_eq!(detail.line_name(), "Clear Extn");
        assert_eq!(detail.line_value(), Some("5"));
    }

    #[test]
    fn test_characteristic_sub_fields_are_omitted_when_unused() {
        let row = serde_json::to_value(Characteristic::observed(1, "Colour Shade")).unwrap();
        assert!(row.get("bodyThickness").is_none());
        let row = serde_json::to_value(Characteristic::position(2, "Printing Position")).unwrap();
        assert_eq!(row["vertical"], "");
    }
}
