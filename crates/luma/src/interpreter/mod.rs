//! Luma interpreter: filters, sandbox limits and the evaluator that runs
//! compiled programs.
//!
//! The evaluator never touches the AST. It executes the lowered program
//! produced by [`crate::compiler`], resolving variables through a stack of
//! scopes and charging every unit of work against the template's
//! [`Limits`].

mod builtins;
mod context;
mod error;
mod evaluator;
mod filters;
mod limits;

pub use builtins::{BUILTINS, MAX_FILTER_OUTPUT, MAX_INDENT_WIDTH, describe};
pub use error::{Resource, RuntimeError, RuntimeErrorKind, compute_suggestions};
pub use evaluator::BYTES_PER_STEP;
pub(crate) use evaluator::execute_program;
pub use filters::{FilterFn, FilterRegistry};
pub use limits::Limits;
