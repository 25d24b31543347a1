use std::fmt::{Display, Formatter, Result as FmtResult, Write};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An ordered, string-keyed mapping of values.
///
/// Iteration follows insertion order, which is the order two-variable `for`
/// loops visit entries in.
pub type Mapping = IndexMap<String, Value>;

/// A runtime value: context data, literals, and intermediate results.
///
/// `Undefined` is produced when a variable path does not resolve. It is
/// distinct from `Null`: `default` replaces it, and it renders as an empty
/// string.
///
/// # Example
///
/// ```
/// use luma::Value;
///
/// let count: Value = 42.into();
/// let name: Value = "Alice".into();
/// let items: Value = vec!["a", "b"].into();
///
/// assert_eq!(count.to_string(), "42");
/// assert_eq!(name.to_string(), "Alice");
/// assert_eq!(items.to_string(), r#"["a", "b"]"#);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(Mapping),
    /// The result of resolving a missing path. Serializes as `null`.
    #[default]
    Undefined,
}

impl Value {
    /// Name of this value's kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
            Value::Undefined => "undefined",
        }
    }

    /// Truthiness used by `if`, `and`, `or` and `!`.
    ///
    /// `false`, `null`, undefined, the empty string and zero are falsy.
    /// Everything else, including empty sequences and mappings, is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null | Value::Undefined => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Sequence(_) | Value::Mapping(_) => true,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key if this value is a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Approximate number of bytes held by this value, counting strings,
    /// keys and one byte per container entry. Scalars count as zero.
    pub(crate) fn footprint(&self) -> usize {
        match self {
            Value::String(s) => s.len(),
            Value::Sequence(items) => items.iter().map(|item| 1 + item.footprint()).sum(),
            Value::Mapping(map) => map
                .iter()
                .map(|(key, item)| 1 + key.len() + item.footprint())
                .sum(),
            _ => 0,
        }
    }

    /// Approximate number of bytes this value renders to.
    ///
    /// Exact for scalars; containers are not walked.
    pub(crate) fn text_len(&self) -> usize {
        match self {
            Value::String(s) => s.len(),
            _ => 0,
        }
    }
}

/// Format a number the way templates print it.
///
/// Integral values print without a fractional part and negative zero
/// prints as `0`.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        "0".to_string()
    } else {
        format!("{n}")
    }
}

/// Write a value nested inside a container, in JSON-compatible flow form.
fn write_nested(out: &mut Formatter<'_>, value: &Value) -> FmtResult {
    match value {
        Value::Null | Value::Undefined => out.write_str("null"),
        Value::String(s) => write_quoted(out, s),
        other => write!(out, "{other}"),
    }
}

/// Write `s` as a double-quoted string with `"`, `\` and control
/// characters escaped.
fn write_quoted(out: &mut impl Write, s: &str) -> FmtResult {
    out.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => out.write_str("\\\"")?,
            '\\' => out.write_str("\\\\")?,
            '\n' => out.write_str("\\n")?,
            '\r' => out.write_str("\\r")?,
            '\t' => out.write_str("\\t")?,
            c if c.is_control() => write!(out, "\\u{:04x}", u32::from(c))?,
            c => out.write_char(c)?,
        }
    }
    out.write_char('"')
}

/// The textual form written by interpolation.
impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Value::Null | Value::Undefined => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::Sequence(items) => {
                f.write_char('[')?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_nested(f, item)?;
                }
                f.write_char(']')
            }
            Value::Mapping(map) => {
                f.write_char('{')?;
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_quoted(f, key)?;
                    f.write_str(": ")?;
                    write_nested(f, item)?;
                }
                f.write_char('}')
            }
        }
    }
}

// From implementations for common types

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Mapping(map)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<V: Into<Value>> FromIterator<(String, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        Value::Mapping(iter.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_numbers_print_without_fraction() {
        assert_eq!(Value::from(3.0).to_string(), "3");
        assert_eq!(Value::from(-0.0).to_string(), "0");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
    }

    #[test]
    fn null_and_undefined_print_empty() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Undefined.to_string(), "");
    }

    #[test]
    fn containers_print_in_flow_form() {
        let map: Value = [
            ("name".to_string(), Value::from("web")),
            ("ports".to_string(), Value::from(vec![80, 443])),
            ("extra".to_string(), Value::Null),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            map.to_string(),
            r#"{"name": "web", "ports": [80, 443], "extra": null}"#
        );
    }

    #[test]
    fn footprint_counts_nested_strings() {
        assert_eq!(Value::from(12).footprint(), 0);
        assert_eq!(Value::from("abcd").footprint(), 4);
        assert_eq!(Value::from(vec!["ab", "cd"]).footprint(), 6);
        let map: Value = [("key".to_string(), Value::from(vec!["xy"]))].into_iter().collect();
        assert_eq!(map.footprint(), 1 + 3 + 1 + 2);
    }

    #[test]
    fn truthiness() {
        assert!(!Value::from(0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::Undefined.is_truthy());
        assert!(Value::Sequence(vec![]).is_truthy());
        assert!(Value::from("0").is_truthy());
    }
}
