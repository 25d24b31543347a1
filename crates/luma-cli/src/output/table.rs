//! Table formatting for CLI output.

use comfy_table::{presets, ContentArrangement, Table};

/// One row of the `luma filters` listing.
pub struct FilterRow {
    pub name: String,
    pub description: String,
}

/// Format registered filters as a table.
pub fn format_filter_table(rows: &[FilterRow]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_BORDERS_ONLY);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Filter", "Description"]);

    for row in rows {
        table.add_row(vec![row.name.clone(), row.description.clone()]);
    }

    table
}

/// Per-file outcome of `luma check`.
pub struct CheckRow {
    pub file: String,
    pub dialect: String,
    pub status: String,
}

/// Format a `luma check` summary as a table.
pub fn format_check_table(rows: &[CheckRow]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_BORDERS_ONLY);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["File", "Dialect", "Status"]);

    for row in rows {
        table.add_row(vec![row.file.clone(), row.dialect.clone(), row.status.clone()]);
    }

    table
}
