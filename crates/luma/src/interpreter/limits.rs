//! Sandbox limits applied to every template execution.

use bon::Builder;

use crate::interpreter::error::{Resource, RuntimeErrorKind};

/// Resource ceilings for one `execute` call.
///
/// Every limit has a default suitable for rendering configuration files
/// from untrusted templates:
///
/// ```
/// use luma::Limits;
///
/// let limits = Limits::builder().max_steps(5_000).build();
/// assert_eq!(limits.max_steps, 5_000);
/// assert_eq!(limits.max_loop_iterations, 10_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Builder)]
pub struct Limits {
    /// Iterations allowed for a single `for` loop.
    #[builder(default = 10_000)]
    pub max_loop_iterations: usize,

    /// Total evaluation steps: executed nodes, evaluated operations and loop
    /// iterations, plus one step per
    /// [`BYTES_PER_STEP`](crate::interpreter::BYTES_PER_STEP) bytes of data
    /// copied or produced.
    #[builder(default = 1_000_000)]
    pub max_steps: usize,

    /// Nesting of blocks plus nested expression evaluation.
    #[builder(default = 64)]
    pub max_depth: usize,

    /// Size in bytes of the rendered output and of any intermediate string.
    #[builder(default = 16 * 1024 * 1024)]
    pub max_output_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits::builder().build()
    }
}

impl Limits {
    /// Limits that never trigger in practice; for trusted templates.
    pub fn unlimited() -> Self {
        Limits {
            max_loop_iterations: usize::MAX,
            max_steps: usize::MAX,
            max_depth: 1024,
            max_output_bytes: usize::MAX,
        }
    }

    pub(crate) fn check_output(&self, len: usize) -> Result<(), RuntimeErrorKind> {
        if len > self.max_output_bytes {
            return Err(RuntimeErrorKind::limit(
                Resource::OutputBytes,
                self.max_output_bytes,
            ));
        }
        Ok(())
    }
}
