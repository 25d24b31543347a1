//! The engine: configuration shared by every template it compiles.

use std::sync::Arc;

use bon::Builder;
use tracing::{debug, trace};

use crate::compiler::{CompileOptions, CompiledTemplate, compile_template};
use crate::error::Error;
use crate::interpreter::{FilterFn, FilterRegistry, Limits, RuntimeError};
use crate::lexer::{Dialect, Syntax, tokenize_with};
use crate::parser::{Template, parse_tokens};
use crate::types::{Mapping, Value};

/// A template engine instance.
///
/// An engine owns a filter registry, a set of globals, the syntax selection
/// and the sandbox limits. Templates compiled by an engine capture all four,
/// so later changes to the engine do not affect them. There is no global
/// engine state: two engines never see each other's filters.
///
/// # Example
///
/// ```
/// use luma::{Engine, Limits, Syntax, Value, context};
///
/// let mut engine = Engine::builder()
///     .syntax(Syntax::Jinja)
///     .limits(Limits::builder().max_loop_iterations(100).build())
///     .build();
/// engine.add_global("env", "prod");
///
/// let output = engine
///     .render("{{ env }}:{{ port }}", &context! { "port" => 8080 })
///     .unwrap();
/// assert_eq!(output, "prod:8080");
/// ```
#[derive(Debug, Clone, Builder)]
pub struct Engine {
    /// Which dialect to lex templates in.
    #[builder(default)]
    syntax: Syntax,

    /// Sandbox limits given to every compiled template.
    #[builder(default)]
    limits: Limits,

    #[builder(skip)]
    filters: FilterRegistry,

    /// Names visible to every template after the context root.
    #[builder(skip)]
    globals: Arc<Mapping>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::builder().build()
    }
}

impl Engine {
    /// Create an engine with automatic dialect detection, default limits and
    /// the built-in filters.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn syntax(&self) -> Syntax {
        self.syntax
    }

    pub fn set_syntax(&mut self, syntax: Syntax) {
        self.syntax = syntax;
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn set_limits(&mut self, limits: Limits) {
        self.limits = limits;
    }

    // =========================================================================
    // Filters and globals
    // =========================================================================

    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterRegistry {
        &mut self.filters
    }

    /// Register a filter for templates compiled from now on.
    pub fn register_filter(&mut self, name: impl Into<String>, filter: FilterFn) {
        let name = name.into();
        if self.filters.register(name.clone(), filter).is_some() {
            debug!(filter = %name, "replaced existing filter");
        }
    }

    /// Make `value` visible to templates compiled from now on under `name`.
    ///
    /// Context entries shadow globals of the same name.
    pub fn add_global(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        Arc::make_mut(&mut self.globals).insert(name.into(), value.into());
    }

    pub fn globals(&self) -> &Mapping {
        &self.globals
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    /// Lex and parse `source` without compiling it.
    pub fn parse(&self, source: &str) -> Result<Template, Error> {
        let (template, _) = self.parse_with_dialect(source)?;
        Ok(template)
    }

    /// Lex, parse and compile `source`.
    pub fn compile(&self, source: &str) -> Result<CompiledTemplate, Error> {
        let (template, dialect) = self.parse_with_dialect(source)?;
        Ok(self.lower(&template, dialect, source))
    }

    /// Compile an already parsed template.
    ///
    /// The result has no source text attached.
    pub fn compile_template(&self, template: &Template, dialect: Dialect) -> CompiledTemplate {
        self.lower(template, dialect, "")
    }

    /// Execute a compiled template. Equivalent to
    /// [`CompiledTemplate::execute`].
    pub fn execute(
        &self,
        template: &CompiledTemplate,
        context: &Value,
    ) -> Result<String, RuntimeError> {
        let result = template.execute(context);
        match &result {
            Ok(output) => trace!(bytes = output.len(), "rendered template"),
            Err(error) => debug!(%error, "template execution aborted"),
        }
        result
    }

    /// Compile and execute `source` in one call.
    pub fn render(&self, source: &str, context: &Value) -> Result<String, Error> {
        let template = self.compile(source)?;
        Ok(self.execute(&template, context)?)
    }

    fn parse_with_dialect(&self, source: &str) -> Result<(Template, Dialect), Error> {
        let stream = tokenize_with(source, self.syntax)?;
        trace!(
            dialect = %stream.dialect,
            tokens = stream.tokens.len(),
            "tokenized template"
        );
        let template = parse_tokens(&stream)?;
        Ok((template, stream.dialect))
    }

    fn lower(&self, template: &Template, dialect: Dialect, source: &str) -> CompiledTemplate {
        let compiled = compile_template(
            template,
            CompileOptions {
                source,
                dialect,
                filters: &self.filters,
                limits: self.limits,
                globals: Arc::clone(&self.globals),
            },
        );
        debug!(
            %dialect,
            unknown_filters = compiled.unknown_filters().len(),
            "compiled template"
        );
        compiled
    }
}
