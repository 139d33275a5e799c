//! Input validation boundary
//!
//! Inputs arrive from forms and JSON bodies, so nothing about them is
//! trusted. Every field is checked and all failures are reported
//! together.

use finlit_config::constants::limits;
use serde::Serialize;
use thiserror::Error;

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// All field errors for one input record
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("invalid input: {}", format_errors(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

fn format_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Whether `field` is among the rejected fields
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

/// Inputs that can check their own ranges
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Collects field errors across one record
#[derive(Debug, Default)]
pub(crate) struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reject(&mut self, field: &str, message: String) {
        self.errors.push(FieldError::new(field, message));
    }

    /// No field rejected so far
    pub(crate) fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Finite, strictly positive, bounded amount
    pub(crate) fn positive_amount(&mut self, field: &str, value: f64) -> &mut Self {
        if !value.is_finite() {
            self.reject(field, "must be a number".into());
        } else if value <= 0.0 {
            self.reject(field, "must be greater than zero".into());
        } else if value > limits::MAX_AMOUNT {
            self.reject(field, format!("must not exceed {}", limits::MAX_AMOUNT));
        }
        self
    }

    /// Finite, zero or positive, bounded amount
    pub(crate) fn non_negative_amount(&mut self, field: &str, value: f64) -> &mut Self {
        if !value.is_finite() {
            self.reject(field, "must be a number".into());
        } else if value < 0.0 {
            self.reject(field, "must not be negative".into());
        } else if value > limits::MAX_AMOUNT {
            self.reject(field, format!("must not exceed {}", limits::MAX_AMOUNT));
        }
        self
    }

    /// Annual rate in (0, 100]
    pub(crate) fn rate(&mut self, field: &str, value: f64) -> &mut Self {
        if !value.is_finite() {
            self.reject(field, "must be a number".into());
        } else if value <= 0.0 || value > limits::MAX_RATE_PERCENT {
            self.reject(
                field,
                format!("must be greater than 0 and at most {}", limits::MAX_RATE_PERCENT),
            );
        }
        self
    }

    /// Annual rate in [0, 100]
    pub(crate) fn rate_allow_zero(&mut self, field: &str, value: f64) -> &mut Self {
        if !value.is_finite() {
            self.reject(field, "must be a number".into());
        } else if !(0.0..=limits::MAX_RATE_PERCENT).contains(&value) {
            self.reject(
                field,
                format!("must be between 0 and {}", limits::MAX_RATE_PERCENT),
            );
        }
        self
    }

    /// Whole number in [min, max]
    pub(crate) fn whole_range(&mut self, field: &str, value: u32, min: u32, max: u32) -> &mut Self {
        if value < min || value > max {
            self.reject(field, format!("must be between {} and {}", min, max));
        }
        self
    }

    pub(crate) fn finish(&mut self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                errors: std::mem::take(&mut self.errors),
            })
        }
    }
}
