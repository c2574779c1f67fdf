use rust_decimal::Decimal;

/// Errors raised by the calculators and the category catalog.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CalcError {
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("insufficient quantity: {available} available, {required} required")]
    InsufficientQuantity {
        available: Decimal,
        required: Decimal,
    },
    #[error("category '{category}' not found in regime '{regime}'")]
    NotFound { regime: String, category: String },
}

impl CalcError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CalcError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        CalcError::Configuration(message.into())
    }

    /// The offending input field, for validation failures.
    pub fn field(&self) -> Option<&str> {
        match self {
            CalcError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

pub type CalcResult<T> = Result<T, CalcError>;
