//! Miette diagnostics for template errors.

use std::path::Path;

use luma::{Error, Position, Resource, RuntimeErrorKind, UnknownFilter};
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// A template error labelled at its source position.
#[derive(Debug, Error, Diagnostic)]
#[error("{kind} error: {message}")]
#[diagnostic(code(luma::template))]
pub struct LumaDiagnostic {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: Option<SourceSpan>,

    kind: &'static str,

    message: String,

    #[help]
    help: Option<String>,
}

impl LumaDiagnostic {
    pub fn from_error(path: &Path, content: &str, err: &Error) -> Self {
        let kind = match err {
            Error::Lex(_) => "lex",
            Error::Parse(_) => "parse",
            Error::Runtime(_) => "runtime",
        };
        LumaDiagnostic {
            src: NamedSource::new(path.display().to_string(), content.to_string()),
            span: err.position().map(|position| span_at(content, position)),
            kind,
            message: err.message(),
            help: help_for(err),
        }
    }
}

/// A filter name that will fail if the template reaches it.
#[derive(Debug, Error, Diagnostic)]
#[error("unknown filter '{name}'")]
#[diagnostic(code(luma::unknown_filter), severity(Warning))]
pub struct UnknownFilterWarning {
    #[source_code]
    src: NamedSource<String>,

    #[label("not registered")]
    span: SourceSpan,

    name: String,

    #[help]
    help: Option<String>,
}

impl UnknownFilterWarning {
    pub fn new(path: &Path, content: &str, filter: &UnknownFilter) -> Self {
        let help = (!filter.suggestions.is_empty())
            .then(|| format!("did you mean: {}?", filter.suggestions.join(", ")));
        UnknownFilterWarning {
            src: NamedSource::new(path.display().to_string(), content.to_string()),
            span: span_at(content, filter.position),
            name: filter.name.clone(),
            help,
        }
    }
}

/// A one-character span at `position`, clamped to the source.
fn span_at(content: &str, position: Position) -> SourceSpan {
    let offset = position.offset.min(content.len());
    let len = content
        .get(offset..)
        .and_then(|rest| rest.chars().next())
        .map_or(0, char::len_utf8);
    (offset, len).into()
}

fn help_for(err: &Error) -> Option<String> {
    let Error::Runtime(runtime) = err else {
        return None;
    };
    match &runtime.kind {
        RuntimeErrorKind::ResourceLimitExceeded { resource, .. } => {
            let flag = match resource {
                Resource::LoopIterations => "--max-loop-iterations",
                Resource::Steps => "--max-steps",
                Resource::Depth => "--max-depth",
                Resource::OutputBytes => return None,
            };
            Some(format!("raise the limit with {flag} if the template is trusted"))
        }
        RuntimeErrorKind::IterationOverNonIterable { .. } => {
            Some("`for` iterates over sequences, or mappings with `pairs(...)`".to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_covers_one_character() {
        let content = "a\n${ é }";
        let span = span_at(content, Position::new(5, 2, 4));
        assert_eq!((span.offset(), span.len()), (5, 2));
    }

    #[test]
    fn span_is_clamped_to_source() {
        let span = span_at("abc", Position::new(10, 1, 11));
        assert_eq!((span.offset(), span.len()), (3, 0));
    }

    #[test]
    fn diagnostic_keeps_message_without_position() {
        let content = "@if x\n";
        let err = luma::parse(content).unwrap_err();
        let diagnostic = LumaDiagnostic::from_error(Path::new("t.yaml"), content, &err);
        assert_eq!(
            diagnostic.to_string(),
            "parse error: expected `@end`, found end of input"
        );
    }
}
