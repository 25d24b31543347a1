//! CLI command implementations.

mod check;
mod filters;
mod render;

pub use check::{run_check, CheckArgs};
pub use filters::{run_filters, FiltersArgs};
pub use render::{run_render, RenderArgs};
