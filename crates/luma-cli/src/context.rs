//! Building the render context from a JSON file and `--set` assignments.

use std::fs::read_to_string;
use std::io;
use std::path::{Path, PathBuf};

use luma::{Mapping, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("cannot read context file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid JSON in context file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("context file {path} must hold a JSON object, found {found}")]
    NotAnObject { path: PathBuf, found: &'static str },

    #[error("invalid assignment '{0}': expected key.path=value")]
    Assignment(String),

    #[error("cannot set '{path}': '{segment}' is a {found}, not a mapping")]
    NotAMapping {
        path: String,
        segment: String,
        found: &'static str,
    },
}

impl ContextError {
    /// Whether the error comes from a file that could not be read at all.
    pub fn is_missing_input(&self) -> bool {
        matches!(self, ContextError::Read { .. })
    }
}

/// A parsed `--set key.path=value` argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub path: Vec<String>,
    pub value: Value,
}

/// Parse `key.path=value`. The value is read as JSON when possible and
/// taken as a plain string otherwise.
pub fn parse_assignment(s: &str) -> Result<Assignment, ContextError> {
    let Some((key, raw)) = s.split_once('=') else {
        return Err(ContextError::Assignment(s.to_string()));
    };
    let path: Vec<String> = key.split('.').map(str::to_string).collect();
    if path.iter().any(String::is_empty) {
        return Err(ContextError::Assignment(s.to_string()));
    }
    let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::from(raw));
    Ok(Assignment { path, value })
}

/// Read a JSON object from `path`.
pub fn load_context(path: &Path) -> Result<Value, ContextError> {
    let text = read_to_string(path).map_err(|source| ContextError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&text).map_err(|source| ContextError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Mapping(_) => Ok(value),
        other => Err(ContextError::NotAnObject {
            path: path.to_path_buf(),
            found: other.kind_name(),
        }),
    }
}

/// Build the context: the file's object (or an empty one) with every
/// assignment applied in order.
pub fn build_context(
    file: Option<&Path>,
    assignments: &[Assignment],
) -> Result<Value, ContextError> {
    let mut context = match file {
        Some(path) => load_context(path)?,
        None => Value::Mapping(Mapping::new()),
    };
    for assignment in assignments {
        assign(&mut context, assignment)?;
    }
    Ok(context)
}

/// Set the value at `assignment.path`, creating intermediate mappings.
fn assign(context: &mut Value, assignment: &Assignment) -> Result<(), ContextError> {
    let Some((last, parents)) = assignment.path.split_last() else {
        return Ok(());
    };
    let mut current = context;
    for segment in parents {
        current = match current {
            Value::Mapping(map) => map
                .entry(segment.clone())
                .or_insert_with(|| Value::Mapping(Mapping::new())),
            other => return Err(not_a_mapping(assignment, segment, other)),
        };
    }
    match current {
        Value::Mapping(map) => {
            map.insert(last.clone(), assignment.value.clone());
            Ok(())
        }
        other => Err(not_a_mapping(assignment, last, other)),
    }
}

fn not_a_mapping(assignment: &Assignment, segment: &str, found: &Value) -> ContextError {
    ContextError::NotAMapping {
        path: assignment.path.join("."),
        segment: segment.to_string(),
        found: found.kind_name(),
    }
}
