//! Fields computed from other fields of a record

use super::types::{FormKind, FormStatus};
use crate::forms::common::{AuditRow, CompositionLine};
use crate::forms::Envelope;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rand::Rng;
use serde::Serialize;

/// Space-joined `name value` pairs of every line with both a name and a value
pub fn composition<'a, L, I>(lines: I) -> String
where
    L: CompositionLine + 'a,
    I: IntoIterator<Item = &'a L>,
{
    lines
        .into_iter()
        .filter(|line| !line.line_name().trim().is_empty())
        .filter_map(|line| {
            line.line_value()
                .map(|value| format!("{} {}", line.line_name(), value))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Sum of audit counts
pub fn audit_total(rows: &[AuditRow]) -> u64 {
    rows.iter().map(|row| u64::from(row.count)).sum()
}

fn type_code(kind: FormKind) -> String {
    match kind {
        FormKind::Coating => "CTF".to_string(),
        FormKind::Printing => "PTF".to_string(),
        FormKind::LineClearance => "LCF".to_string(),
        other => other.as_str().chars().take(3).collect::<String>().to_uppercase(),
    }
}

/// Display number `AGI-IMS-<TYPE3>-<Mon>-<DD>` for list views
pub fn document_number(kind: FormKind, reference_date: Option<&str>) -> String {
    let parsed = reference_date
        .and_then(|raw| raw.get(..10))
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok());
    match parsed {
        Some(date) => format!("AGI-IMS-{}-{}", type_code(kind), date.format("%b-%d")),
        None => "AGI-IMS-N/A".to_string(),
    }
}

/// Number assigned to a new IQC report: `AGI-IQC-<YY>-<4 digits>`
pub fn iqc_document_number<R: Rng>(today: NaiveDate, rng: &mut R) -> String {
    format!(
        "AGI-IQC-{:02}-{}",
        today.year().rem_euclid(100),
        rng.random_range(1000..10000)
    )
}

/// Production area implied by the clearance line, when the line names one
pub fn production_area(line: &str) -> Option<&'static str> {
    match line {
        "COATING" => Some("COATING"),
        "PRINTING" => Some("PRINTING"),
        "BOTH" => Some("BOTH"),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub action: &'static str,
    pub at: Option<DateTime<Utc>>,
    pub user: String,
    pub details: String,
}

/// Created / Submitted / Approved-or-Rejected history from the envelope stamps
pub fn audit_history(envelope: &Envelope) -> Vec<AuditEntry> {
    let mut history = vec![AuditEntry {
        action: "Created",
        at: envelope.created_at,
        user: envelope
            .created_by
            .clone()
            .unwrap_or_else(|| "System".to_string()),
        details: "Form created".to_string(),
    }];

    if let (Some(user), Some(at)) = (&envelope.submitted_by, envelope.submitted_at) {
        history.push(AuditEntry {
            action: "Submitted",
            at: Some(at),
            user: user.clone(),
            details: "Submitted for approval".to_string(),
        });
    }

    if let (Some(user), Some(at)) = (&envelope.reviewed_by, envelope.reviewed_at) {
        let action = if envelope.status == FormStatus::Approved {
            "Approved"
        } else {
            "Rejected"
        };
        history.push(AuditEntry {
            action,
            at: Some(at),
            user: user.clone(),
            details: envelope
                .comments
                .clone()
                .unwrap_or_else(|| format!("{action} by reviewer")),
        });
    }

    history
}
