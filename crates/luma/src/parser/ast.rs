//! Public AST types for Luma templates.
//!
//! Both dialects parse into the same tree, so everything after the parser is
//! dialect-neutral. These types are public to enable external tooling.

use crate::types::{Position, Value};

/// A parsed template: a sequence of nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub nodes: Vec<Node>,
}

/// A node in a template body.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text, emitted as is.
    Text(String),
    /// `$path`, `${ expr }` or `{{ expr }}`, with its trailing filter
    /// pipeline split off.
    Interpolation {
        expr: Expr,
        filters: Vec<FilterCall>,
        position: Position,
    },
    /// `if` followed by its `elif` branches, in source order.
    ///
    /// `branches` is never empty; the first entry is the `if` itself.
    If {
        branches: Vec<Branch>,
        else_body: Option<Vec<Node>>,
        position: Position,
    },
    /// `for item in expr` or `for key, item in pairs(expr)`.
    ///
    /// `else_body` renders when the iterable is empty.
    For {
        item: String,
        key: Option<String>,
        iterable: Expr,
        body: Vec<Node>,
        else_body: Option<Vec<Node>>,
        position: Position,
    },
    /// `@let name = expr` or `{% set name = expr %}`.
    Let {
        name: String,
        value: Expr,
        position: Position,
    },
}

/// One conditional branch of an `if` block.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub condition: Expr,
    pub body: Vec<Node>,
    /// Position of the `if` or `elif` tag.
    pub position: Position,
}

/// An expression with the position of its first token.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Value),
    /// A variable followed by field and index accesses.
    Path {
        root: String,
        segments: Vec<PathSegment>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `left ~ right`: concatenation of textual forms.
    Concat(Box<Expr>, Box<Expr>),
    /// `base | filter(args)`.
    Filter {
        base: Box<Expr>,
        filter: FilterCall,
    },
}

/// One step of a variable path after its root name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// `.name`
    Field(String),
    /// `[0]`
    Index(usize),
    /// `["key"]`
    Key(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "or",
            BinaryOp::And => "and",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!` or `not`
    Not,
    /// `-`
    Negate,
}

/// A filter application: name plus literal arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCall {
    pub name: String,
    pub args: Vec<Value>,
    pub position: Position,
}
