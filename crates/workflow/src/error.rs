use std::fmt;

use scenario::FieldError;

use crate::pipeline::{StepName, StepRecord};

/// Failure of a pipeline run or coordinator lookup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid scenario: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("missing input: {key}")]
    MissingInput { key: &'static str },

    #[error("{service} call failed: {source:#}")]
    Upstream {
        service: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("persistence failed: {0:#}")]
    Persistence(#[source] anyhow::Error),

    #[error("step '{step}' failed: {source}")]
    StepFailed {
        step: StepName,
        #[source]
        source: Box<Error>,
        /// Timings of every step up to and including the failed one.
        steps: Vec<StepRecord>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    MissingInput,
    Upstream,
    NotFound,
    Persistence,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::MissingInput => "missing_input",
            ErrorKind::Upstream => "upstream_service_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Persistence => "persistence_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Error::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn upstream(service: &'static str, source: anyhow::Error) -> Self {
        Error::Upstream { service, source }
    }

    /// Root kind, looking through `StepFailed`.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::MissingInput { .. } => ErrorKind::MissingInput,
            Error::Upstream { .. } => ErrorKind::Upstream,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Persistence(_) => ErrorKind::Persistence,
            Error::StepFailed { source, .. } => source.kind(),
        }
    }

    pub fn failed_step(&self) -> Option<StepName> {
        match self {
            Error::StepFailed { step, .. } => Some(*step),
            _ => None,
        }
    }

    pub fn step_records(&self) -> &[StepRecord] {
        match self {
            Error::StepFailed { steps, .. } => steps,
            _ => &[],
        }
    }

    /// Field errors of a rejected payload; empty for every other kind.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Error::Validation(fields) => fields,
            Error::StepFailed { source, .. } => source.field_errors(),
            _ => &[],
        }
    }
}

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, Error>;
