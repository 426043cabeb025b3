//! Structured error types shared across ACTDB crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`ActError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (schedule point, zone, line, ...).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for activation post-processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum ActError {
    /// Duty cycle outside (0, 1], non-positive pulse count or burn time.
    #[error("invalid schedule parameter: {0}")]
    InvalidScheduleParameter(ErrorInfo),
    /// Flux source contained no numeric tokens.
    #[error("empty flux data: {0}")]
    EmptyFluxData(ErrorInfo),
    /// Flux token count does not fit the group structure or zone layout.
    #[error("misaligned flux data: {0}")]
    MisalignedFluxData(ErrorInfo),
    /// A flux token could not be read as a finite, non-negative number.
    #[error("flux parse error: {0}")]
    FluxParse(ErrorInfo),
    /// A zone carries zero total flux so its shape is undefined.
    #[error("zero flux: {0}")]
    ZeroFlux(ErrorInfo),
    /// Group structure boundaries are unusable.
    #[error("group structure error: {0}")]
    InvalidGroupStructure(ErrorInfo),
    /// Activation table shape or lookup errors.
    #[error("table error: {0}")]
    Table(ErrorInfo),
    /// Configuration loading and validation errors.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Sink write failures.
    #[error("persistence error: {0}")]
    Persistence(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl ActError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            ActError::InvalidScheduleParameter(info)
            | ActError::EmptyFluxData(info)
            | ActError::MisalignedFluxData(info)
            | ActError::FluxParse(info)
            | ActError::ZeroFlux(info)
            | ActError::InvalidGroupStructure(info)
            | ActError::Table(info)
            | ActError::Config(info)
            | ActError::Persistence(info) => info,
        }
    }

    /// Returns the context value recorded under `key`, if any.
    pub fn context(&self, key: &str) -> Option<&str> {
        self.info().context.get(key).map(String::as_str)
    }
}
