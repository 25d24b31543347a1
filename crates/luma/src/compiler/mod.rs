//! Compiler: lowers a parsed [`Template`] into a [`CompiledTemplate`].
//!
//! Lowering is pure. It never evaluates expressions and never needs a
//! context; everything that can be decided from the template text and the
//! engine's filter registry is decided here, once.

mod program;

use std::slice;
use std::sync::Arc;

pub(crate) use program::{Block, BoundFilter, FilterTarget, Instr, Op, OpKind};

use crate::interpreter::{FilterRegistry, Limits, RuntimeError, execute_program};
use crate::lexer::Dialect;
use crate::parser::{BinaryOp, Expr, ExprKind, FilterCall, Node, Template, UnaryOp};
use crate::types::{Mapping, Position, Value};

/// A filter name the registry did not know when the template was compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFilter {
    pub name: String,
    pub position: Position,
    pub suggestions: Vec<String>,
}

/// An immutable, reusable, thread-safe compiled template.
///
/// A compiled template carries everything it needs to run: bound filter
/// functions, the engine's sandbox limits and globals. It can be cloned
/// cheaply and executed concurrently from any number of threads.
///
/// # Example
///
/// ```
/// use luma::{Engine, context};
///
/// let engine = Engine::new();
/// let template = engine.compile("Hello, $name!").unwrap();
/// assert_eq!(template.execute(&context! { "name" => "World" }).unwrap(), "Hello, World!");
/// assert_eq!(template.execute(&context! { "name" => "Luma" }).unwrap(), "Hello, Luma!");
/// ```
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    source: Arc<str>,
    dialect: Dialect,
    program: Arc<Block>,
    limits: Limits,
    globals: Arc<Mapping>,
    unknown_filters: Arc<[UnknownFilter]>,
}

impl CompiledTemplate {
    /// Render against `context`. Output is all or nothing.
    pub fn execute(&self, context: &Value) -> Result<String, RuntimeError> {
        execute_program(&self.program, context, &self.globals, &self.limits)
    }

    /// The source text this template was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Filter names that will fail with `UndefinedFilter` if reached.
    pub fn unknown_filters(&self) -> &[UnknownFilter] {
        &self.unknown_filters
    }
}

/// Everything a compilation needs besides the template itself.
pub(crate) struct CompileOptions<'a> {
    pub source: &'a str,
    pub dialect: Dialect,
    pub filters: &'a FilterRegistry,
    pub limits: Limits,
    pub globals: Arc<Mapping>,
}

/// Lower `template` into a compiled template.
pub(crate) fn compile_template(template: &Template, options: CompileOptions<'_>) -> CompiledTemplate {
    let mut compiler = Compiler {
        filters: options.filters,
        unknown: Vec::new(),
    };
    let program = compiler.lower_block(&template.nodes);
    CompiledTemplate {
        source: Arc::from(options.source),
        dialect: options.dialect,
        program: Arc::new(program),
        limits: options.limits,
        globals: options.globals,
        unknown_filters: compiler.unknown.into(),
    }
}

struct Compiler<'a> {
    filters: &'a FilterRegistry,
    unknown: Vec<UnknownFilter>,
}

impl Compiler<'_> {
    fn lower_block(&mut self, nodes: &[Node]) -> Block {
        let mut block = Block::with_capacity(nodes.len());
        for node in nodes {
            match node {
                Node::Text(text) if text.is_empty() => {}
                Node::Text(text) => {
                    if let Some(Instr::Text(previous)) = block.last_mut() {
                        previous.push_str(text);
                    } else {
                        block.push(Instr::Text(text.clone()));
                    }
                }
                Node::Interpolation { expr, filters, .. } => {
                    let op = self.lower_expr(expr);
                    block.push(Instr::Emit(self.with_filters(op, filters)));
                }
                Node::If {
                    branches,
                    else_body,
                    position,
                } => block.push(Instr::If {
                    branches: branches
                        .iter()
                        .map(|branch| {
                            (self.lower_expr(&branch.condition), self.lower_block(&branch.body))
                        })
                        .collect(),
                    else_block: self.lower_optional(else_body.as_deref()),
                    position: *position,
                }),
                Node::For {
                    item,
                    key,
                    iterable,
                    body,
                    else_body,
                    position,
                } => block.push(Instr::For {
                    item: item.clone(),
                    key: key.clone(),
                    iterable: self.lower_expr(iterable),
                    body: self.lower_block(body),
                    else_block: self.lower_optional(else_body.as_deref()),
                    position: *position,
                }),
                Node::Let {
                    name,
                    value,
                    position,
                } => block.push(Instr::Let {
                    name: name.clone(),
                    value: self.lower_expr(value),
                    position: *position,
                }),
            }
        }
        block
    }

    fn lower_optional(&mut self, nodes: Option<&[Node]>) -> Block {
        nodes.map(|nodes| self.lower_block(nodes)).unwrap_or_default()
    }

    fn lower_expr(&mut self, expr: &Expr) -> Op {
        let position = expr.position;
        let kind = match &expr.kind {
            ExprKind::Literal(value) => OpKind::Const(value.clone()),
            ExprKind::Path { root, segments } => OpKind::Load {
                root: root.clone(),
                segments: segments.clone(),
            },
            ExprKind::Binary {
                op: BinaryOp::And,
                left,
                right,
            } => OpKind::And(self.flatten(left, right, |kind| match kind {
                OpKind::And(ops) => Ok(ops),
                other => Err(other),
            })),
            ExprKind::Binary {
                op: BinaryOp::Or,
                left,
                right,
            } => OpKind::Or(self.flatten(left, right, |kind| match kind {
                OpKind::Or(ops) => Ok(ops),
                other => Err(other),
            })),
            ExprKind::Binary { op, left, right } => {
                let left = self.lower_expr(left);
                let right = self.lower_expr(right);
                match left.kind {
                    OpKind::Binary { first, mut rest } => {
                        rest.push((*op, right));
                        OpKind::Binary { first, rest }
                    }
                    kind => OpKind::Binary {
                        first: Box::new(Op {
                            kind,
                            position: left.position,
                        }),
                        rest: vec![(*op, right)],
                    },
                }
            }
            ExprKind::Unary {
                op: UnaryOp::Not,
                operand,
            } => OpKind::Not(Box::new(self.lower_expr(operand))),
            ExprKind::Unary {
                op: UnaryOp::Negate,
                operand,
            } => OpKind::Negate(Box::new(self.lower_expr(operand))),
            ExprKind::Concat(left, right) => OpKind::Concat(self.flatten(left, right, |kind| {
                match kind {
                    OpKind::Concat(ops) => Ok(ops),
                    other => Err(other),
                }
            })),
            ExprKind::Filter { base, filter } => {
                let base = self.lower_expr(base);
                return self.with_filters(base, slice::from_ref(filter));
            }
        };
        Op { kind, position }
    }

    /// Lower both operands of an associative operator, splicing in operands
    /// that are already the same operation.
    fn flatten(
        &mut self,
        left: &Expr,
        right: &Expr,
        same: fn(OpKind) -> Result<Vec<Op>, OpKind>,
    ) -> Vec<Op> {
        let mut ops = Vec::new();
        for operand in [left, right] {
            let op = self.lower_expr(operand);
            match same(op.kind) {
                Ok(inner) => ops.extend(inner),
                Err(kind) => ops.push(Op {
                    kind,
                    position: op.position,
                }),
            }
        }
        ops
    }

    /// Append filter calls to `op`, extending an existing pipeline.
    fn with_filters(&mut self, op: Op, calls: &[FilterCall]) -> Op {
        if calls.is_empty() {
            return op;
        }
        let bound = calls.iter().map(|call| self.bind(call));
        match op.kind {
            OpKind::Pipeline { base, mut filters } => {
                filters.extend(bound);
                Op {
                    kind: OpKind::Pipeline { base, filters },
                    position: op.position,
                }
            }
            kind => Op {
                kind: OpKind::Pipeline {
                    base: Box::new(Op {
                        kind,
                        position: op.position,
                    }),
                    filters: bound.collect(),
                },
                position: op.position,
            },
        }
    }

    fn bind(&mut self, call: &FilterCall) -> BoundFilter {
        let target = match self.filters.get(&call.name) {
            Some(filter) => FilterTarget::Resolved(filter),
            None => {
                let suggestions = self.filters.suggestions(&call.name);
                self.unknown.push(UnknownFilter {
                    name: call.name.clone(),
                    position: call.position,
                    suggestions: suggestions.clone(),
                });
                FilterTarget::Unresolved { suggestions }
            }
        };
        BoundFilter {
            name: call.name.clone(),
            args: call.args.clone(),
            position: call.position,
            target,
        }
    }
}
