pub mod client;
pub mod email;
pub mod errors;
pub mod routes;

pub use client::{FormsApi, FormsApiClient};
#[cfg(any(test, feature = "testing"))]
pub use client::MockFormsApi;
pub use email::EmailRequest;
pub use errors::ApiError;
pub use routes::{ListQuery, Routes};
