// Inspection Forms Library - QA form lifecycle engine and backend client
// This exposes the core components for testing and integration

pub mod api;
pub mod cli;
pub mod config;
pub mod forms;
pub mod lifecycle;
pub mod observability;
pub mod session;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use api::{ApiError, EmailRequest, FormsApi, FormsApiClient, ListQuery};
pub use config::{config, init_config, InspectionFormsConfig};
pub use forms::{Envelope, FormError, InspectionRecord, Payload};
pub use lifecycle::{
    apply_edit, execute, permissions_for, resolve, Action, Capability, FieldGroup, FormKind,
    FormStatus, LifecycleError, PermissionSet, Role, Transition, TransitionContext,
    TransitionRecord, User,
};
pub use observability::{api_metrics, ApiMetrics, OperationTimer};
pub use session::{Session, SessionStore};
pub use telemetry::{generate_correlation_id, init_telemetry};
pub use workflow::{FormWorkflow, WorkflowError};
