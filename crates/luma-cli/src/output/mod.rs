//! Terminal output: diagnostics and tables.

pub mod diagnostic;
pub mod table;

pub use diagnostic::{LumaDiagnostic, UnknownFilterWarning};
