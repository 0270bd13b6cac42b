// Form Lifecycle Module - Permission Tables and Transition Executor
//
// Editability and actions are resolved from (kind, role, status) lookup
// tables; transitions are pure functions from one record to the next.

pub mod types;
pub mod permissions;
pub mod derived;
pub mod executor;


pub use types::{Action, FieldGroup, FormKind, FormStatus, Role, TransitionContext, TransitionRecord, User};
pub use permissions::{resolve, Capability, PermissionSet};
pub use executor::{apply_edit, execute, permissions_for, LifecycleError, Transition};
