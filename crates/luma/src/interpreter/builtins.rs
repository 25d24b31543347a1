//! Built-in filters.
//!
//! Every filter is a plain function over a borrowed input and literal
//! arguments. Filters that can grow their input compute the result size up
//! front and refuse to build strings over [`MAX_FILTER_OUTPUT`].

use unicode_segmentation::UnicodeSegmentation;

use crate::interpreter::error::{Resource, RuntimeErrorKind};
use crate::interpreter::filters::FilterFn;
use crate::types::Value;

/// Largest string a built-in filter will produce.
pub const MAX_FILTER_OUTPUT: usize = 16 * 1024 * 1024;

/// Largest width accepted by `indent`.
pub const MAX_INDENT_WIDTH: usize = 1024;

/// Built-in filters with a one-line description each, in registration order.
pub const BUILTINS: &[(&str, FilterFn, &str)] = &[
    ("upper", upper, "convert a string to uppercase"),
    ("lower", lower, "convert a string to lowercase"),
    ("capitalize", capitalize, "uppercase the first character, lowercase the rest"),
    ("title", title, "capitalize every word"),
    ("trim", trim, "strip leading and trailing whitespace"),
    ("length", length, "number of characters, items or entries"),
    ("default", default, "fallback for undefined (or, with `true`, falsy) values"),
    ("join", join, "join a sequence with a separator"),
    ("sort", sort, "sort numbers or strings, optionally in reverse"),
    ("reverse", reverse, "reverse a sequence or a string"),
    ("first", first, "first item or character"),
    ("last", last, "last item or character"),
    ("sum", sum, "sum of a sequence of numbers"),
    ("abs", abs, "absolute value"),
    ("round", round, "round half away from zero to a precision"),
    ("int", int, "convert to an integer"),
    ("float", float, "convert to a number"),
    ("string", string, "textual form of a value"),
    ("escape", escape, "HTML-escape & < > \" '"),
    ("safe", safe, "mark as safe (no-op, no autoescaping)"),
    ("replace", replace, "replace every occurrence of a substring"),
    ("indent", indent, "indent lines after the first"),
    ("quote", quote, "wrap in double quotes"),
];

/// Description of a built-in filter.
pub fn describe(name: &str) -> Option<&'static str> {
    BUILTINS
        .iter()
        .find(|(builtin, _, _)| *builtin == name)
        .map(|(_, _, description)| *description)
}

// -- argument helpers --

fn arity(name: &str, args: &[Value], max: usize) -> Result<(), RuntimeErrorKind> {
    if args.len() > max {
        return Err(RuntimeErrorKind::invalid_argument(
            name,
            format!("expected at most {max} arguments, got {}", args.len()),
        ));
    }
    Ok(())
}

fn input_str<'v>(name: &str, value: &'v Value) -> Result<&'v str, RuntimeErrorKind> {
    value
        .as_str()
        .ok_or_else(|| RuntimeErrorKind::type_mismatch(name, "a string", value.kind_name()))
}

fn input_number(name: &str, value: &Value) -> Result<f64, RuntimeErrorKind> {
    value
        .as_number()
        .ok_or_else(|| RuntimeErrorKind::type_mismatch(name, "a number", value.kind_name()))
}

fn input_sequence<'v>(name: &str, value: &'v Value) -> Result<&'v [Value], RuntimeErrorKind> {
    value
        .as_sequence()
        .ok_or_else(|| RuntimeErrorKind::type_mismatch(name, "a sequence", value.kind_name()))
}

fn bool_arg(name: &str, args: &[Value], index: usize) -> Result<bool, RuntimeErrorKind> {
    match args.get(index) {
        None => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(RuntimeErrorKind::invalid_argument(
            name,
            format!("argument {} must be a boolean, got {}", index + 1, other.kind_name()),
        )),
    }
}

fn str_arg<'a>(
    name: &str,
    args: &'a [Value],
    index: usize,
    default: Option<&'a str>,
) -> Result<&'a str, RuntimeErrorKind> {
    match (args.get(index), default) {
        (Some(Value::String(s)), _) => Ok(s),
        (None, Some(default)) => Ok(default),
        (None, None) => Err(RuntimeErrorKind::invalid_argument(
            name,
            format!("missing argument {}", index + 1),
        )),
        (Some(other), _) => Err(RuntimeErrorKind::invalid_argument(
            name,
            format!("argument {} must be a string, got {}", index + 1, other.kind_name()),
        )),
    }
}

/// A non-negative integral argument no larger than `max`.
fn count_arg(
    name: &str,
    args: &[Value],
    index: usize,
    default: usize,
    max: usize,
) -> Result<usize, RuntimeErrorKind> {
    match args.get(index) {
        None => Ok(default),
        Some(Value::Number(n)) if n.fract() == 0.0 && *n >= 0.0 && *n <= max as f64 => {
            Ok(*n as usize)
        }
        Some(other) => Err(RuntimeErrorKind::invalid_argument(
            name,
            format!(
                "argument {} must be an integer between 0 and {max}, got {other}",
                index + 1
            ),
        )),
    }
}

fn check_size(len: usize) -> Result<(), RuntimeErrorKind> {
    if len > MAX_FILTER_OUTPUT {
        return Err(RuntimeErrorKind::limit(
            Resource::OutputBytes,
            MAX_FILTER_OUTPUT,
        ));
    }
    Ok(())
}

// -- string filters --

fn upper(value: &Value, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    arity("upper", args, 0)?;
    Ok(input_str("upper", value)?.to_uppercase().into())
}

fn lower(value: &Value, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    arity("lower", args, 0)?;
    Ok(input_str("lower", value)?.to_lowercase().into())
}

fn capitalize(value: &Value, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    arity("capitalize", args, 0)?;
    let s = input_str("capitalize", value)?;
    let mut graphemes = s.graphemes(true);
    let Some(head) = graphemes.next() else {
        return Ok(Value::String(String::new()));
    };
    let mut out = head.to_uppercase();
    out.push_str(&graphemes.as_str().to_lowercase());
    Ok(out.into())
}

fn title(value: &Value, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    arity("title", args, 0)?;
    let s = input_str("title", value)?;
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if in_word {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        in_word = c.is_alphanumeric() || c == '\'';
    }
    Ok(out.into())
}

fn trim(value: &Value, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    arity("trim", args, 0)?;
    Ok(input_str("trim", value)?.trim().into())
}

fn escape(value: &Value, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    arity("escape", args, 0)?;
    let text = value.to_string();
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    check_size(out.len())?;
    Ok(out.into())
}

fn safe(value: &Value, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    arity("safe", args, 0)?;
    Ok(value.clone())
}

fn replace(value: &Value, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    arity("replace", args, 2)?;
    let s = input_str("replace", value)?;
    let old = str_arg("replace", args, 0, None)?;
    let new = str_arg("replace", args, 1, None)?;
    if old.is_empty() {
        return Err(RuntimeErrorKind::invalid_argument(
            "replace",
            "the substring to replace must not be empty",
        ));
    }
    let count = s.matches(old).count();
    check_size(s.len() - count * old.len() + count * new.len())?;
    Ok(s.replace(old, new).into())
}

fn indent(value: &Value, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    arity("indent", args, 2)?;
    let s = input_str("indent", value)?;
    let width = count_arg("indent", args, 0, 4, MAX_INDENT_WIDTH)?;
    let first = bool_arg("indent", args, 1)?;

    let lines = s.split('\n').count();
    check_size(s.len() + lines * width)?;

    let pad = " ".repeat(width);
    let mut out = String::with_capacity(s.len() + lines * width);
    for (i, line) in s.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if (i > 0 || first) && !line.trim().is_empty() {
            out.push_str(&pad);
        }
        out.push_str(line);
    }
    Ok(out.into())
}

fn quote(value: &Value, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    arity("quote", args, 0)?;
    let text = value.to_string();
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    check_size(out.len())?;
    Ok(out.into())
}

fn string(value: &Value, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    arity("string", args, 0)?;
    Ok(value.to_string().into())
}

// -- collection filters --

fn length(value: &Value, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    arity("length", args, 0)?;
    let len = match value {
        Value::String(s) => s.graphemes(true).count(),
        Value::Sequence(items) => items.len(),
        Value::Mapping(map) => map.len(),
        other => {
            return Err(RuntimeErrorKind::type_mismatch(
                "length",
                "a string, sequence or mapping",
                other.kind_name(),
            ));
        }
    };
    Ok(len.into())
}

fn default(value: &Value, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    arity("default", args, 2)?;
    let use_fallback = value.is_undefined() || (bool_arg("default", args, 1)? && !value.is_truthy());
    if use_fallback {
        Ok(args
            .first()
            .cloned()
            .unwrap_or_else(|| Value::String(String::new())))
    } else {
        Ok(value.clone())
    }
}

fn join(value: &Value, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    arity("join", args, 1)?;
    let items = input_sequence("join", value)?;
    let separator = str_arg("join", args, 0, Some(""))?;
    let parts: Vec<String> = items.iter().map(Value::to_string).collect();
    let len = parts.iter().map(String::len).sum::<usize>()
        + separator.len() * parts.len().saturating_sub(1);
    check_size(len)?;
    Ok(parts.join(separator).into())
}

fn sort(value: &Value, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    arity("sort", args, 1)?;
    let items = input_sequence("sort", value)?;
    let reverse = bool_arg("sort", args, 0)?;

    let mut sorted: Vec<Value> = if let Some(mut numbers) =
        items.iter().map(Value::as_number).collect::<Option<Vec<f64>>>()
    {
        numbers.sort_by(f64::total_cmp);
        numbers.into_iter().map(Value::Number).collect()
    } else if let Some(mut strings) = items.iter().map(Value::as_str).collect::<Option<Vec<&str>>>() {
        strings.sort_unstable();
        strings.into_iter().map(Value::from).collect()
    } else {
        let found = items
            .iter()
            .find(|item| item.as_str().is_none())
            .map_or("mixed values", Value::kind_name);
        return Err(RuntimeErrorKind::type_mismatch(
            "sort",
            "a sequence of numbers or of strings",
            found,
        ));
    };
    if reverse {
        sorted.reverse();
    }
    Ok(Value::Sequence(sorted))
}

fn reverse(value: &Value, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    arity("reverse", args, 0)?;
    match value {
        Value::Sequence(items) => Ok(Value::Sequence(items.iter().rev().cloned().collect())),
        Value::String(s) => Ok(s.graphemes(true).rev().collect::<String>().into()),
        other => Err(RuntimeErrorKind::type_mismatch(
            "reverse",
            "a sequence or string",
            other.kind_name(),
        )),
    }
}

fn first(value: &Value, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    arity("first", args, 0)?;
    match value {
        Value::Sequence(items) => Ok(items.first().cloned().unwrap_or_default()),
        Value::String(s) => Ok(s.graphemes(true).next().map(Value::from).unwrap_or_default()),
        other => Err(RuntimeErrorKind::type_mismatch(
            "first",
            "a sequence or string",
            other.kind_name(),
        )),
    }
}

fn last(value: &Value, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    arity("last", args, 0)?;
    match value {
        Value::Sequence(items) => Ok(items.last().cloned().unwrap_or_default()),
        Value::String(s) => Ok(s
            .graphemes(true)
            .next_back()
            .map(Value::from)
            .unwrap_or_default()),
        other => Err(RuntimeErrorKind::type_mismatch(
            "last",
            "a sequence or string",
            other.kind_name(),
        )),
    }
}

fn sum(value: &Value, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    arity("sum", args, 0)?;
    let mut total = 0.0;
    for item in input_sequence("sum", value)? {
        total += item.as_number().ok_or_else(|| {
            RuntimeErrorKind::type_mismatch("sum", "a sequence of numbers", item.kind_name())
        })?;
    }
    Ok(total.into())
}

// -- numeric filters --

fn abs(value: &Value, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    arity("abs", args, 0)?;
    Ok(input_number("abs", value)?.abs().into())
}

fn round(value: &Value, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    arity("round", args, 1)?;
    let n = input_number("round", value)?;
    let precision = count_arg("round", args, 0, 0, 15)?;
    let scale = 10f64.powi(i32::try_from(precision).unwrap_or(15));
    Ok(((n * scale).round() / scale).into())
}

/// Numeric reading of a number, bool or numeric string.
fn to_number(name: &str, value: &Value) -> Result<f64, RuntimeErrorKind> {
    match value {
        Value::Number(n) => Ok(*n),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
            RuntimeErrorKind::invalid_argument(name, format!("'{s}' is not a number"))
        }),
        other => Err(RuntimeErrorKind::type_mismatch(
            name,
            "a number, bool or numeric string",
            other.kind_name(),
        )),
    }
}

fn int(value: &Value, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    arity("int", args, 0)?;
    Ok(to_number("int", value)?.trunc().into())
}

fn float(value: &Value, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    arity("float", args, 0)?;
    Ok(to_number("float", value)?.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mapping;

    fn mapping(entries: &[(&str, Value)]) -> Value {
        Value::Mapping(
            entries
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect::<Mapping>(),
        )
    }

    fn s(text: &str) -> Value {
        Value::from(text)
    }

    #[test]
    fn capitalize_and_title_follow_words() {
        assert_eq!(capitalize(&s("hELLO wORLD"), &[]), Ok(s("Hello world")));
        assert_eq!(title(&s("hello big-world"), &[]), Ok(s("Hello Big-World")));
    }

    #[test]
    fn default_only_replaces_undefined_unless_asked() {
        let fallback = [s("x")];
        assert_eq!(default(&Value::Undefined, &fallback), Ok(s("x")));
        assert_eq!(default(&s(""), &fallback), Ok(s("")));
        assert_eq!(default(&s(""), &[s("x"), Value::Bool(true)]), Ok(s("x")));
        assert_eq!(default(&Value::Null, &fallback), Ok(Value::Null));
    }

    #[test]
    fn length_counts_graphemes_and_entries() {
        assert_eq!(length(&s("héllo"), &[]), Ok(Value::Number(5.0)));
        let map = mapping(&[("a", 1.into()), ("b", 2.into())]);
        assert_eq!(length(&map, &[]), Ok(Value::Number(2.0)));
    }

    #[test]
    fn sort_rejects_mixed_sequences() {
        let mixed = Value::from(vec![Value::from(1), s("a")]);
        assert!(matches!(
            sort(&mixed, &[]),
            Err(RuntimeErrorKind::TypeMismatch { .. })
        ));
        let numbers = Value::from(vec![3, 1, 2]);
        assert_eq!(
            sort(&numbers, &[Value::Bool(true)]),
            Ok(Value::from(vec![3, 2, 1]))
        );
    }

    #[test]
    fn round_is_half_away_from_zero() {
        assert_eq!(round(&Value::from(2.5), &[]), Ok(Value::from(3.0)));
        assert_eq!(round(&Value::from(-2.5), &[]), Ok(Value::from(-3.0)));
        assert_eq!(
            round(&Value::from(1.2345), &[Value::from(2)]),
            Ok(Value::from(1.23))
        );
    }

    #[test]
    fn indent_skips_first_and_blank_lines() {
        assert_eq!(
            indent(&s("a\n\nb"), &[Value::from(2)]),
            Ok(s("a\n\n  b"))
        );
        assert_eq!(
            indent(&s("a\nb"), &[Value::from(1), Value::Bool(true)]),
            Ok(s(" a\n b"))
        );
        assert!(indent(&s("a"), &[Value::from(5000)]).is_err());
    }

    #[test]
    fn replace_refuses_oversized_results() {
        let big = Value::from("a".repeat(1024 * 1024));
        let err = replace(&big, &[s("a"), s(&"b".repeat(32))]).unwrap_err();
        assert!(matches!(
            err,
            RuntimeErrorKind::ResourceLimitExceeded {
                resource: Resource::OutputBytes,
                ..
            }
        ));
    }

    #[test]
    fn conversions_accept_numeric_strings() {
        assert_eq!(int(&s(" 42.9 "), &[]), Ok(Value::from(42)));
        assert_eq!(float(&Value::Bool(true), &[]), Ok(Value::from(1)));
        assert!(matches!(
            int(&s("abc"), &[]),
            Err(RuntimeErrorKind::InvalidArgument { .. })
        ));
    }

    #[test]
    fn escape_and_quote() {
        assert_eq!(
            escape(&s("<a href=\"x\">&</a>"), &[]),
            Ok(s("&lt;a href=&#34;x&#34;&gt;&amp;&lt;/a&gt;"))
        );
        assert_eq!(quote(&s(r#"say "hi""#), &[]), Ok(s(r#""say \"hi\"""#)));
    }
}
