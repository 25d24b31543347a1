//! Runtime error types.

use std::fmt::{Display, Formatter, Result as FmtResult};

use thiserror::Error;

use crate::types::Position;

/// A sandbox resource that can run out during execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    LoopIterations,
    Steps,
    Depth,
    OutputBytes,
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Resource::LoopIterations => "loop iteration",
            Resource::Steps => "evaluation step",
            Resource::Depth => "nesting depth",
            Resource::OutputBytes => "output size",
        })
    }
}

/// What went wrong while executing a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeErrorKind {
    /// A filter name that the registry did not contain at compile time.
    #[error("unknown filter '{name}'{}", did_you_mean(suggestions))]
    UndefinedFilter {
        name: String,
        suggestions: Vec<String>,
    },

    /// An operation received a value of the wrong kind.
    #[error("{operation} expects {expected}, found {found}")]
    TypeMismatch {
        operation: String,
        expected: String,
        found: String,
    },

    /// `for` over something that is neither a sequence nor a mapping.
    #[error("cannot iterate over {found}")]
    IterationOverNonIterable { found: String },

    /// A sandbox limit was hit.
    #[error("{resource} limit of {limit} exceeded")]
    ResourceLimitExceeded { resource: Resource, limit: usize },

    /// An argument had the right kind but an unusable value, or the wrong
    /// count.
    #[error("{operation}: {message}")]
    InvalidArgument { operation: String, message: String },
}

impl RuntimeErrorKind {
    pub fn type_mismatch(
        operation: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        RuntimeErrorKind::TypeMismatch {
            operation: operation.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn invalid_argument(operation: impl Into<String>, message: impl Into<String>) -> Self {
        RuntimeErrorKind::InvalidArgument {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn limit(resource: Resource, limit: usize) -> Self {
        RuntimeErrorKind::ResourceLimitExceeded { resource, limit }
    }

    /// Attach a source position.
    pub fn at(self, position: Position) -> RuntimeError {
        RuntimeError {
            kind: self,
            position: Some(position),
        }
    }
}

fn did_you_mean(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(", did you mean: {}?", suggestions.join(", "))
    }
}

/// An error that aborted template execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}{}", position.map(|p| format!(" at {p}")).unwrap_or_default())]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub position: Option<Position>,
}

impl From<RuntimeErrorKind> for RuntimeError {
    fn from(kind: RuntimeErrorKind) -> Self {
        RuntimeError {
            kind,
            position: None,
        }
    }
}

/// Names from `available` close to `key` by edit distance, closest first.
///
/// Short keys (three characters or fewer) allow a distance of 1, longer
/// keys a distance of 2. At most three names are returned.
pub fn compute_suggestions(key: &str, available: &[String]) -> Vec<String> {
    let max_distance = if key.chars().count() <= 3 { 1 } else { 2 };
    let mut scored: Vec<(usize, &String)> = available
        .iter()
        .map(|name| (strsim::levenshtein(key, name), name))
        .filter(|(distance, _)| *distance <= max_distance)
        .collect();
    scored.sort();
    scored.into_iter().take(3).map(|(_, name)| name.clone()).collect()
}
