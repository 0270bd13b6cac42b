use super::coating::header_dates;
use super::common::{lookup_group, AuditRow, ControlledHeader, TestResult};
use super::wire::lenient_string;
use super::{FormSchema, SignatureFields, SignatureSlot};
use crate::lifecycle::derived;
use crate::lifecycle::types::{FieldGroup, FormKind};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Incoming quality control (IQC) inspection report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QualityReport {
    #[serde(flatten)]
    pub header: ControlledHeader,
    #[serde(deserialize_with = "lenient_string")]
    pub iqc_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub shift: String,
    #[serde(deserialize_with = "lenient_string")]
    pub product_variant_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub product_received_from: String,
    #[serde(deserialize_with = "lenient_string")]
    pub supplier_shift: String,
    #[serde(deserialize_with = "lenient_string")]
    pub product_received_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub product_received_quantity: String,
    #[serde(deserialize_with = "lenient_string")]
    pub quantity_audited: String,
    #[serde(deserialize_with = "lenient_string")]
    pub batch_number: String,
    pub audit_results: Vec<AuditRow>,
    pub test_results: Vec<TestResult>,
    #[serde(deserialize_with = "lenient_string")]
    pub quality_decision: String,
    #[serde(deserialize_with = "lenient_string")]
    pub operator_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub operator_signature: String,
    #[serde(deserialize_with = "lenient_string")]
    pub quality_manager_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub quality_manager_signature: String,
    #[serde(deserialize_with = "lenient_string")]
    pub signature_date: String,
}

const DETAIL_KEYS: &[&str] = &[
    "iqcDate",
    "shift",
    "productVariantName",
    "productReceivedFrom",
    "supplierShift",
    "productReceivedDate",
    "productReceivedQuantity",
    "quantityAudited",
    "batchNumber",
    "qualityDecision",
    "operatorName",
    "operatorSignature",
];
const LINE_ITEM_KEYS: &[&str] = &["auditResults"];
const REVIEW_KEYS: &[&str] = &[
    "testResults",
    "qualityManagerName",
    "qualityManagerSignature",
    "signatureDate",
];

const AUDIT_CATEGORIES: &[&str] = &["OK", "CRITICAL", "MAJOR-A", "MAJOR-B", "MINOR"];

const DEFAULT_TESTS: &[(&str, &str)] = &[
    ("SURFACE pH", "MIN - 6.0 and MAX - 7.5"),
    ("SURFACE TENSION", "MIN - 34 mN/m"),
    ("PRINTING POSITION", ""),
    ("POSITIVE MATCH", "OK / NOT OK"),
    ("NAIL TEST", "OK / NOT OK"),
    ("SCOTCH TAPE TEST", "OK / NOT OK"),
    ("MEK TEST", "OK / NOT OK"),
    ("COMPATIBILITY TEST", "OK / NOT OK"),
    ("CROSS CUT TEST", "Level 2 - Max"),
];

impl QualityReport {
    pub fn audit_total(&self) -> u64 {
        derived::audit_total(&self.audit_results)
    }
}

impl FormSchema for QualityReport {
    const KIND: FormKind = FormKind::Quality;
    const DATE_FIELDS: &'static [&'static str] =
        &["effectiveDate", "reviewedOn", "iqcDate", "productReceivedDate"];

    fn blank(today: NaiveDate) -> Self {
        let (effective_date, reviewed_on) = header_dates(today);
        Self {
            header: ControlledHeader {
                document_no: derived::iqc_document_number(today, &mut rand::rng()),
                revision: "00".to_string(),
                effective_date: effective_date.clone(),
                reviewed_on,
                page: "1 of 2".to_string(),
                prepared_by: "QC".to_string(),
                approved_by: "QA Head".to_string(),
                issued: "QA Head".to_string(),
                title: "INCOMING QUALITY INSPECTION REPORT".to_string(),
                scope: "AGI / DEC / IQC".to_string(),
            },
            iqc_date: effective_date.clone(),
            shift: "A".to_string(),
            product_received_date: effective_date,
            audit_results: AUDIT_CATEGORIES
                .iter()
                .map(|category| AuditRow {
                    category: category.to_string(),
                    ..AuditRow::default()
                })
                .collect(),
            test_results: DEFAULT_TESTS
                .iter()
                .map(|(name, specification)| TestResult {
                    test_name: name.to_string(),
                    specification: specification.to_string(),
                    ..TestResult::default()
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
                (DETAIL_KEYS, FieldGroup::Details),
                (LINE_ITEM_KEYS, FieldGroup::LineItems),
                (REVIEW_KEYS, FieldGroup::ReviewFields),
            ],
        )
    }

    fn reference_date(&self) -> Option<&str> {
        Some(self.iqc_date.as_str())
    }

    fn signature_mut(&mut self, slot: SignatureSlot) -> Option<SignatureFields<'_>> {
        Some(match slot {
            SignatureSlot::Operator => {
                SignatureFields::new(&mut self.operator_name, &mut self.operator_signature)
            }
            SignatureSlot::Qa | SignatureSlot::Approver => SignatureFields::new(
                &mut self.quality_manager_name,
                &mut self.quality_manager_signature,
            ),
        })
    }

    fn stamp_approval_time(&mut self, now: DateTime<Utc>) {
        self.signature_date = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    }

    fn recompute_derived(&mut self) {}

    fn missing_required_fields(&self) -> Vec<&'static str> {
        let text_fields = [
            ("iqcDate", &self.iqc_date),
            ("productVariantName", &self.product_variant_name),
            ("productReceivedFrom", &self.product_received_from),
            ("productReceivedDate", &self.product_received_date),
            ("productReceivedQuantity", &self.product_received_quantity),
            ("quantityAudited", &self.quantity_audited),
            ("batchNumber", &self.batch_number),
        ];
        let mut missing: Vec<&'static str> = text_fields
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect();
        if self.audit_total() == 0 {
            missing.push("auditResults");
        }
        if self.quality_decision.trim().is_empty() {
            missing.push("qualityDecision");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_report() -> QualityReport {
        let mut report = QualityReport::blank(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        report.product_variant_name = "Amber 50ml".to_string();
        report.product_received_from = "Supplier A".to_string();
        report.product_received_quantity = "1200".to_string();
        report.quantity_audited = "80".to_string();
        report.batch_number = "B-77".to_string();
        report.audit_results[0].count = 78;
        report.audit_results[4].count = 2;
        report.quality_decision = "ACCEPTED".to_string();
        report
    }

    #[test]
    fn test_blank_template() {
        let report = QualityReport::blank(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert!(report.header.document_no.starts_with("AGI-IQC-24-"));
        assert_eq!(report.audit_results.len(), 5);
        assert_eq!(report.test_results.len(), 9);
        assert_eq!(report.test_results[8].specification, "Level 2 - Max");
    }

    #[test]
    fn test_required_fields() {
        let report = complete_report();
        assert!(report.missing_required_fields().is_empty());
        assert_eq!(report.audit_total(), 80);

        let mut report = complete_report();
        report.batch_number = " ".to_string();
        report.audit_results.iter_mut().for_each(|row| row.count = 0);
        assert_eq!(report.missing_required_fields(), vec!["batchNumber", "auditResults"]);
    }

    #[test]
    fn test_large_audit_counts_do_not_overflow() {
        let mut report = complete_report();
        report.audit_results.iter_mut().for_each(|row| row.count = 0);
        report.audit_results[0].count = 4_000_000_000;
        report.audit_results[1].count = 1_000_000_000;
        assert_eq!(report.audit_total(), 5_000_000_000);
        assert!(report.missing_required_fields().is_empty());
    }

    #[test]
    fn test_signature_date_is_iso() {
        let mut report = QualityReport::default();
        let now = DateTime::parse_from_rfc3339("2024-05-01T14:05:09Z")
            .unwrap()
            .with_timezone(&Utc);
        report.stamp_approval_time(now);
        assert_eq!(report.signature_date, "2024-05-01T14:05:09.000Z");
    }
}
