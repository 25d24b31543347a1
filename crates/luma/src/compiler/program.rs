//! The lowered form executed by the evaluator.
//!
//! Compared with the AST, text runs are merged, interpolation pipelines are
//! folded into their expression, filter names are bound to functions, and
//! `and`/`or`/`~` chains are flattened into single operations.

use crate::interpreter::FilterFn;
use crate::parser::{BinaryOp, PathSegment};
use crate::types::{Position, Value};

/// A sequence of instructions.
pub type Block = Vec<Instr>;

/// A template-level instruction.
#[derive(Debug, Clone)]
pub enum Instr {
    /// Static text.
    Text(String),
    /// Evaluate and write the textual form.
    Emit(Op),
    /// Run the block of the first branch whose condition is truthy, or
    /// `else_block` when none is.
    If {
        branches: Vec<(Op, Block)>,
        else_block: Block,
        position: Position,
    },
    For {
        item: String,
        key: Option<String>,
        iterable: Op,
        body: Block,
        else_block: Block,
        position: Position,
    },
    Let {
        name: String,
        value: Op,
        position: Position,
    },
}

impl Instr {
    pub fn position(&self) -> Option<Position> {
        match self {
            Instr::Text(_) => None,
            Instr::Emit(op) => Some(op.position),
            Instr::If { position, .. } | Instr::For { position, .. } | Instr::Let { position, .. } => {
                Some(*position)
            }
        }
    }
}

/// An expression operation with the position of the expression it came
/// from.
#[derive(Debug, Clone)]
pub struct Op {
    pub kind: OpKind,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub enum OpKind {
    Const(Value),
    /// Resolve a name through the scopes, then walk the segments.
    Load {
        root: String,
        segments: Vec<PathSegment>,
    },
    /// Short-circuit `and`: the first falsy operand, or the last one.
    And(Vec<Op>),
    /// Short-circuit `or`: the first truthy operand, or the last one.
    Or(Vec<Op>),
    Not(Box<Op>),
    Negate(Box<Op>),
    /// A left-associative chain of arithmetic and comparison operators:
    /// `first`, then each operator applied with its operand in turn. Never
    /// `And` or `Or`.
    Binary {
        first: Box<Op>,
        rest: Vec<(BinaryOp, Op)>,
    },
    /// Concatenate textual forms.
    Concat(Vec<Op>),
    /// Apply filters left to right.
    Pipeline {
        base: Box<Op>,
        filters: Vec<BoundFilter>,
    },
}

/// A filter call with its name bound at compile time.
#[derive(Debug, Clone)]
pub struct BoundFilter {
    pub name: String,
    pub args: Vec<Value>,
    pub position: Position,
    pub target: FilterTarget,
}

#[derive(Debug, Clone)]
pub enum FilterTarget {
    Resolved(FilterFn),
    /// The registry had no such filter; executing this call fails.
    Unresolved { suggestions: Vec<String> },
}
