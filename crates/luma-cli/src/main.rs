//! Luma CLI entry point.
//!
//! Provides command-line tools for working with Luma templates:
//! - `luma render` - Render a template against a JSON context
//! - `luma check` - Validate template syntax and filter names
//! - `luma filters` - List the built-in filters

mod commands;
mod config;
mod context;
mod logging;
mod output;

use std::process::exit;

use clap::{Parser, Subcommand, ValueEnum};
use commands::{run_check, run_filters, run_render, CheckArgs, FiltersArgs, RenderArgs};
use config::LogLevel;
use logging::init_logging;
use miette::MietteHandlerOpts;

/// Luma template tools.
#[derive(Debug, Parser)]
#[command(name = "luma")]
#[command(about = "Render and check Luma templates", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Color output control
    #[arg(long, value_enum, default_value_t = ColorWhen::Auto, global = true)]
    pub color: ColorWhen,

    /// Log level for engine events on stderr
    #[arg(long, env = "LUMA_LOG", default_value = "warn", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

/// When to use colored output.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorWhen {
    Auto,
    Always,
    Never,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render a template to stdout
    Render(RenderArgs),
    /// Check template syntax
    Check(CheckArgs),
    /// List available filters
    Filters(FiltersArgs),
}

/// Set up color output based on user preference.
fn setup_colors(color_when: ColorWhen) -> Option<bool> {
    match color_when {
        ColorWhen::Auto => None,
        ColorWhen::Always => {
            owo_colors::set_override(true);
            Some(true)
        }
        ColorWhen::Never => {
            owo_colors::set_override(false);
            Some(false)
        }
    }
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    let forced_color = setup_colors(cli.color);
    init_logging(cli.log_level);

    miette::set_hook(Box::new(move |_| {
        let mut opts = MietteHandlerOpts::new()
            .terminal_links(true)
            .unicode(true)
            .context_lines(2);
        if let Some(color) = forced_color {
            opts = opts.color(color);
        }
        Box::new(opts.build())
    }))?;

    let result = match cli.command {
        Commands::Render(args) => run_render(args),
        Commands::Check(args) => run_check(args),
        Commands::Filters(args) => run_filters(args),
    };

    match result {
        Ok(code) => exit(code),
        Err(e) => {
            eprintln!("{e:?}");
            exit(exitcode::SOFTWARE);
        }
    }
}
