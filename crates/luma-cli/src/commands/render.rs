//! Implementation of the `luma render` command.

use std::fs::read_to_string;
use std::path::PathBuf;

use clap::Args;
use luma::{Engine, Limits, Syntax};
use miette::{Report, Result};
use serde::Serialize;
use tracing::debug;

use crate::context::{build_context, parse_assignment, Assignment, ContextError};
use crate::output::LumaDiagnostic;

/// Arguments for the render command.
#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Template file to render.
    pub template: PathBuf,

    /// JSON file holding the context object.
    #[arg(short, long)]
    pub context: Option<PathBuf>,

    /// Set a context value, e.g. `image.tag=v2` (repeatable). Values are
    /// parsed as JSON when possible.
    #[arg(short, long = "set", value_parser = parse_set)]
    pub set: Vec<Assignment>,

    /// Template dialect: auto, native or jinja.
    #[arg(long, default_value = "auto")]
    pub syntax: Syntax,

    /// Maximum evaluation steps.
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Maximum iterations of a single loop.
    #[arg(long)]
    pub max_loop_iterations: Option<usize>,

    /// Maximum nesting depth during evaluation.
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

fn parse_set(s: &str) -> Result<Assignment, String> {
    parse_assignment(s).map_err(|e| e.to_string())
}

/// JSON output for render results.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RenderJson {
    Output {
        output: String,
    },
    Error {
        error: String,
        line: Option<usize>,
        column: Option<usize>,
    },
}

impl RenderArgs {
    fn engine(&self) -> Engine {
        let limits = Limits::builder()
            .maybe_max_steps(self.max_steps)
            .maybe_max_loop_iterations(self.max_loop_iterations)
            .maybe_max_depth(self.max_depth)
            .build();
        Engine::builder().syntax(self.syntax).limits(limits).build()
    }
}

/// Why a render did not produce output.
#[derive(Debug)]
pub enum RenderFailure {
    Unreadable(String),
    Context(ContextError),
    Template { source: String, error: luma::Error },
}

/// Render the template named by `args` to a string.
pub fn render_to_string(args: &RenderArgs) -> Result<String, RenderFailure> {
    let source = read_to_string(&args.template)
        .map_err(|e| RenderFailure::Unreadable(format!("{}: {e}", args.template.display())))?;
    let context =
        build_context(args.context.as_deref(), &args.set).map_err(RenderFailure::Context)?;
    let engine = args.engine();
    debug!(template = %args.template.display(), syntax = %args.syntax, "rendering");
    engine
        .render(&source, &context)
        .map_err(|error| RenderFailure::Template { source, error })
}

/// Run the render command.
pub fn run_render(args: RenderArgs) -> Result<i32> {
    match render_to_string(&args) {
        Ok(output) => {
            if args.json {
                print_json(&RenderJson::Output { output })?;
            } else {
                print!("{output}");
            }
            Ok(exitcode::OK)
        }
        Err(RenderFailure::Unreadable(message)) => {
            eprintln!("Cannot read template {message}");
            Ok(exitcode::NOINPUT)
        }
        Err(RenderFailure::Context(e)) => {
            eprintln!("Context error: {e}");
            if e.is_missing_input() {
                Ok(exitcode::NOINPUT)
            } else {
                Ok(exitcode::DATAERR)
            }
        }
        Err(RenderFailure::Template { source, error }) => {
            if args.json {
                let position = error.position();
                print_json(&RenderJson::Error {
                    error: error.to_string(),
                    line: position.map(|p| p.line),
                    column: position.map(|p| p.column),
                })?;
            } else {
                let diagnostic = LumaDiagnostic::from_error(&args.template, &source, &error);
                eprintln!("{:?}", Report::new(diagnostic));
            }
            Ok(exitcode::DATAERR)
        }
    }
}

fn print_json(value: &RenderJson) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| miette::miette!("cannot serialize output: {e}"))?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn args(template: PathBuf) -> RenderArgs {
        RenderArgs {
            template,
            context: None,
            set: Vec::new(),
            syntax: Syntax::Auto,
            max_steps: None,
            max_loop_iterations: None,
            max_depth: None,
            json: false,
        }
    }

    #[test]
    fn renders_with_context_file_and_overrides() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("deploy.yaml");
        fs::write(
            &template,
            "image: $image.name:$image.tag\n@for p in ports\n- $p\n@end\n",
        )
        .unwrap();
        let context = dir.path().join("values.json");
        fs::write(&context, r#"{"image": {"name": "web", "tag": "v1"}, "ports": [80]}"#).unwrap();

        let mut args = args(template);
        args.context = Some(context);
        args.set = vec![parse_assignment("image.tag=v2").unwrap()];
        let output = render_to_string(&args).unwrap();
        assert_eq!(output, "image: web:v2\n- 80\n");
    }

    #[test]
    fn limits_come_from_flags() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("loop.txt");
        fs::write(&template, "@for x in xs\n$x\n@end\n").unwrap();

        let mut args = args(template);
        args.set = vec![parse_assignment("xs=[1,2,3]").unwrap()];
        args.max_loop_iterations = Some(2);
        let Err(RenderFailure::Template { error, .. }) = render_to_string(&args) else {
            panic!("expected a template error");
        };
        assert!(error.to_string().contains("loop iteration limit of 2 exceeded"));
    }

    #[test]
    fn missing_template_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let args = args(dir.path().join("missing.yaml"));
        assert!(matches!(
            render_to_string(&args),
            Err(RenderFailure::Unreadable(_))
        ));
        assert_eq!(run_render(args).unwrap(), exitcode::NOINPUT);
    }

    #[test]
    fn template_errors_exit_with_dataerr() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("bad.yaml");
        fs::write(&template, "@if x\n").unwrap();
        assert_eq!(run_render(args(template)).unwrap(), exitcode::DATAERR);
    }
}
