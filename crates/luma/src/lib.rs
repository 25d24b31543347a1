//! Luma: a sandboxed templating engine for YAML manifests and configuration
//! files.
//!
//! Templates are written in one of two dialects. The native dialect uses
//! `${ expr }` interpolation, `$name` shorthands and `@if`/`@for`/`@let`
//! directive lines; the Jinja-compatible dialect uses `{{ }}`, `{% %}` and
//! `{# #}`. Source goes through [`lexer`], [`parser`] and [`compiler`] into a
//! [`CompiledTemplate`], which the [`interpreter`] executes against a
//! [`Value`] context under the engine's [`Limits`].
//!
//! ```
//! use luma::context;
//!
//! let source = "@for host in hosts\n- ${ host | upper }\n@end\n";
//! let output = luma::render(source, &context! { "hosts" => vec!["a", "b"] }).unwrap();
//! assert_eq!(output, "- A\n- B\n");
//! ```

pub mod compiler;
pub mod engine;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod types;

pub use compiler::{CompiledTemplate, UnknownFilter};
pub use engine::Engine;
pub use error::Error;
pub use interpreter::{
    FilterFn, FilterRegistry, Limits, Resource, RuntimeError, RuntimeErrorKind,
    compute_suggestions,
};
pub use lexer::{Dialect, LexError, Syntax};
pub use parser::{ParseError, Template};
pub use types::{Mapping, Position, Value};

/// Lex and parse `source` with a default engine.
pub fn parse(source: &str) -> Result<Template, Error> {
    Engine::new().parse(source)
}

/// Compile `source` with a default engine.
pub fn compile(source: &str) -> Result<CompiledTemplate, Error> {
    Engine::new().compile(source)
}

/// Compile and execute `source` with a default engine.
pub fn render(source: &str, context: &Value) -> Result<String, Error> {
    Engine::new().render(source, context)
}

/// Creates a mapping [`Value`] from key-value pairs, for use as a context.
///
/// Values are converted via `Into<Value>`, so numbers, strings, vectors and
/// nested `context!` calls can be passed directly.
///
/// # Example
///
/// ```
/// use luma::{Value, context};
///
/// let ctx = context! { "port" => 8080, "tags" => vec!["web"] };
/// assert_eq!(ctx.get("port"), Some(&Value::Number(8080.0)));
/// assert_eq!(context! {}, Value::Mapping(Default::default()));
/// ```
#[macro_export]
macro_rules! context {
    {} => {
        $crate::Value::Mapping($crate::Mapping::new())
    };
    { $($key:expr => $value:expr),+ $(,)? } => {
        {
            let mut map = $crate::Mapping::new();
            $(
                map.insert(
                    ::std::string::ToString::to_string(&$key),
                    ::std::convert::Into::<$crate::Value>::into($value),
                );
            )+
            $crate::Value::Mapping(map)
        }
    };
}
