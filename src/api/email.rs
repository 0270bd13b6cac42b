use super::errors::ApiError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const DEFAULT_SUBJECT: &str = "Inspection Form PDF";
pub const DEFAULT_BODY: &str = "Please find attached the inspection form PDF.";

static EMAIL_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$"));

/// Body of an email-pdf request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRequest {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl EmailRequest {
    pub fn new(to: impl Into<String>) -> Self {
        Self {
            to: to.into().trim().to_string(),
            subject: DEFAULT_SUBJECT.to_string(),
            body: DEFAULT_BODY.to_string(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if is_valid_address(&self.to) {
            Ok(())
        } else {
            Err(ApiError::InvalidEmail(self.to.clone()))
        }
    }
}

pub fn is_valid_address(address: &str) -> bool {
    match EMAIL_PATTERN.as_ref() {
        Ok(pattern) => pattern.is_match(address),
        Err(_) => false,
    }
}
