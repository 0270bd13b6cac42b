use crate::api::FormsApiClient;
use crate::cli::RecordArgs;
use crate::config::{config, InspectionFormsConfig};
use crate::forms::InspectionRecord;
use crate::lifecycle::derived;
use crate::session::SessionStore;
use crate::telemetry::create_form_span;
use crate::workflow::FormWorkflow;
use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};

pub mod auth;
pub mod edit;
pub mod list;
pub mod permissions;
pub mod print;
pub mod show;
pub mod transition;

pub use auth::{LoginCommand, LogoutCommand, UsersCommand, WhoamiCommand};
pub use edit::{EditCommand, NewCommand};
pub use list::ListCommand;
pub use permissions::PermissionsCommand;
pub use print::{EmailCommand, PdfCommand};
pub use show::{HistoryCommand, ShowCommand};
pub use transition::TransitionCommand;

pub fn session_store(settings: &InspectionFormsConfig) -> SessionStore {
    SessionStore::new(settings.session.path.clone())
}

/// Workflow for the logged-in user against the configured backend
pub async fn open_workflow() -> Result<FormWorkflow<FormsApiClient>> {
    let settings = config()?;
    let session = session_store(settings).load().await?;
    let client = FormsApiClient::new(&settings.api)?;
    Ok(FormWorkflow::from_session(client, session)?)
}

/// Span for a command acting on one stored form
pub fn record_span(operation: &str, record: &RecordArgs) -> tracing::Span {
    create_form_span(operation, record.kind.as_str(), Some(&record.id))
}

/// Parse a `--set` argument into a field patch
pub fn parse_patch(raw: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(raw).context("--set must be valid JSON")?;
    match value {
        Value::Object(map) => Ok(map),
        _ => bail!("--set must be a JSON object of field names to values"),
    }
}

/// One-line summary used by list views
pub fn summary_line(record: &InspectionRecord) -> String {
    let number = derived::document_number(record.kind(), record.payload.reference_date());
    let submitter = record
        .envelope
        .submitted_by
        .as_deref()
        .or(record.envelope.created_by.as_deref())
        .unwrap_or("-");
    format!(
        "#{:<6} {:<24} {:<10} {}",
        record.id().unwrap_or("new"),
        number,
        record.status(),
        submitter
    )
}
