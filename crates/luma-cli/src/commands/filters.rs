//! Implementation of the `luma filters` command.

use clap::Args;
use luma::interpreter::describe;
use luma::Engine;
use miette::Result;
use serde::Serialize;

use crate::output::table::{format_filter_table, FilterRow};

/// Arguments for the filters command.
#[derive(Debug, Args)]
pub struct FiltersArgs {
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct FilterJson<'a> {
    name: &'a str,
    description: &'a str,
}

/// Run the filters command.
pub fn run_filters(args: FiltersArgs) -> Result<i32> {
    let engine = Engine::new();
    let filters: Vec<FilterJson<'_>> = engine
        .filters()
        .names()
        .map(|name| FilterJson {
            name,
            description: describe(name).unwrap_or_default(),
        })
        .collect();

    if args.json {
        let text = serde_json::to_string_pretty(&filters)
            .map_err(|e| miette::miette!("cannot serialize filters: {e}"))?;
        println!("{text}");
    } else {
        let rows: Vec<FilterRow> = filters
            .iter()
            .map(|filter| FilterRow {
                name: filter.name.to_string(),
                description: filter.description.to_string(),
            })
            .collect();
        println!("{}", format_filter_table(&rows));
    }
    Ok(exitcode::OK)
}
