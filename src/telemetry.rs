use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Initialize structured JSON logging on stderr
///
/// `RUST_LOG` wins over the configured level when it is set.
pub fn init_telemetry(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .try_init()?;

    tracing::debug!("Inspection forms telemetry initialized with structured logging");
    Ok(())
}

/// Generate a correlation ID for linking related operations
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create a span carrying the form a command operates on
///
/// Correlation ids come from the enclosing workflow span.
pub fn create_form_span(operation: &str, kind: &str, record_id: Option<&str>) -> tracing::Span {
    tracing::info_span!(
        "form_operation",
        operation = operation,
        form.kind = kind,
        form.id = record_id
    )
}
