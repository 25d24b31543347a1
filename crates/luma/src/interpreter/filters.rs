//! Filter registry.

use indexmap::IndexMap;

use crate::interpreter::builtins::BUILTINS;
use crate::interpreter::error::{RuntimeErrorKind, compute_suggestions};
use crate::types::Value;

/// Filter function signature.
///
/// Takes:
/// - `value`: the value on the left of the pipe
/// - `args`: the literal arguments in the filter call
///
/// Returns the new value, or the error kind to report at the filter's
/// position. Filters must be pure.
pub type FilterFn = fn(&Value, &[Value]) -> Result<Value, RuntimeErrorKind>;

/// Registry of filters, owned by one engine.
///
/// Names are resolved against the registry when a template is compiled, so
/// filters must be registered before compiling the templates that use them.
///
/// # Example
///
/// ```
/// use luma::{FilterRegistry, RuntimeErrorKind, Value};
///
/// fn shout(value: &Value, _args: &[Value]) -> Result<Value, RuntimeErrorKind> {
///     Ok(format!("{value}!").into())
/// }
///
/// let mut filters = FilterRegistry::new();
/// filters.register("shout", shout);
/// assert!(filters.contains("shout"));
/// assert!(filters.contains("upper"));
/// ```
#[derive(Debug, Clone)]
pub struct FilterRegistry {
    filters: IndexMap<String, FilterFn>,
}

impl FilterRegistry {
    /// Create a registry holding the built-in filters.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for (name, filter, _) in BUILTINS {
            registry.register(*name, *filter);
        }
        registry
    }

    /// Create a registry with no filters at all.
    pub fn empty() -> Self {
        Self {
            filters: IndexMap::new(),
        }
    }

    /// Register a filter, replacing and returning any filter of the same
    /// name.
    pub fn register(&mut self, name: impl Into<String>, filter: FilterFn) -> Option<FilterFn> {
        self.filters.insert(name.into(), filter)
    }

    pub fn get(&self, name: &str) -> Option<FilterFn> {
        self.filters.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Filter names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Registered names close to `name`, for "did you mean" hints.
    pub fn suggestions(&self, name: &str) -> Vec<String> {
        let available: Vec<String> = self.filters.keys().cloned().collect();
        compute_suggestions(name, &available)
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
