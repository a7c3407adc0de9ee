use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Business error codes surfaced to the caller with a specific message.
pub mod codes {
    pub const DRAFT_FAILED: &str = "draft_failed";
    pub const NO_RATES: &str = "no_rates";
    pub const SAME_ROUTE: &str = "same_route";
}

/// A single field-scoped validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Validation failures for one wizard step.
///
/// Field-scoped so the caller can attach each message to the offending
/// input; never propagated past the wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// First message recorded against `field`, if any.
    pub fn field(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", fields.join("; "))
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// Field-scoped input problems; recoverable by user correction.
    #[error("validation failed ({0})")]
    Validation(ValidationErrors),

    /// Collaborator unreachable, timed out, or returned non-2xx.
    #[error("{service} request failed: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    /// Well-formed request the collaborator rejected for a domain reason.
    #[error("{code}: {message}")]
    Business {
        code: &'static str,
        message: String,
    },

    /// Wizard precondition violation; raised before any network call.
    #[error("invalid wizard state: {0}")]
    State(String),
}

impl Error {
    pub fn transport(service: &'static str, message: impl Into<String>) -> Self {
        Error::Transport {
            service,
            message: message.into(),
        }
    }

    pub fn business(code: &'static str, message: impl Into<String>) -> Self {
        Error::Business {
            code,
            message: message.into(),
        }
    }

    pub fn is_business(&self, wanted: &str) -> bool {
        matches!(self, Error::Business { code, .. } if *code == wanted)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
