//! Sandboxed evaluator for compiled programs.
//!
//! Execution is a pure function of the program, the context and the
//! engine's globals. Every instruction, operation, loop iteration and filter
//! call costs one step, plus one step per [`BYTES_PER_STEP`] bytes of any
//! value copied or produced. Blocks and nested operations count towards the
//! depth limit; every string built along the way is held to the output
//! size limit.

use std::collections::HashMap;

use crate::compiler::{Block, BoundFilter, FilterTarget, Instr, Op, OpKind};
use crate::interpreter::context::Scopes;
use crate::interpreter::error::{Resource, RuntimeError, RuntimeErrorKind};
use crate::interpreter::limits::Limits;
use crate::parser::{BinaryOp, PathSegment};
use crate::types::{Mapping, Position, Value};

/// Bytes of copied or produced data that cost one extra step.
pub const BYTES_PER_STEP: usize = 1024;

/// Execute `program` against `context`, producing the complete output.
pub(crate) fn execute_program(
    program: &Block,
    context: &Value,
    globals: &Mapping,
    limits: &Limits,
) -> Result<String, RuntimeError> {
    let mut machine = Machine {
        limits,
        scopes: Scopes::new(context, globals),
        steps: 0,
        depth: 0,
        out: String::new(),
    };
    machine.run_block(program)?;
    Ok(machine.out)
}

struct Machine<'a> {
    limits: &'a Limits,
    scopes: Scopes<'a>,
    steps: usize,
    depth: usize,
    out: String,
}

impl Machine<'_> {
    // -- sandbox accounting --

    fn spend(&mut self, steps: usize, position: Option<Position>) -> Result<(), RuntimeError> {
        self.steps = self.steps.saturating_add(steps);
        if self.steps > self.limits.max_steps {
            return Err(limit_error(Resource::Steps, self.limits.max_steps, position));
        }
        Ok(())
    }

    fn step(&mut self, position: Option<Position>) -> Result<(), RuntimeError> {
        self.spend(1, position)
    }

    /// Charge for `bytes` of data copied or produced.
    fn charge(&mut self, bytes: usize, position: Option<Position>) -> Result<(), RuntimeError> {
        self.spend(bytes.div_euclid(BYTES_PER_STEP), position)
    }

    fn enter(&mut self, position: Option<Position>) -> Result<(), RuntimeError> {
        if self.depth >= self.limits.max_depth {
            return Err(limit_error(Resource::Depth, self.limits.max_depth, position));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn check_len(&self, len: usize, position: Option<Position>) -> Result<(), RuntimeError> {
        self.limits.check_output(len).map_err(|kind| RuntimeError { kind, position })
    }

    fn write(&mut self, text: &str, position: Option<Position>) -> Result<(), RuntimeError> {
        self.check_len(self.out.len() + text.len(), position)?;
        self.out.push_str(text);
        Ok(())
    }

    // -- instructions --

    fn run_block(&mut self, block: &[Instr]) -> Result<(), RuntimeError> {
        for instr in block {
            self.run(instr)?;
        }
        Ok(())
    }

    fn run(&mut self, instr: &Instr) -> Result<(), RuntimeError> {
        self.step(instr.position())?;
        match instr {
            Instr::Text(text) => self.write(text, None),
            Instr::Emit(op) => {
                let value = self.eval(op)?;
                if matches!(value, Value::Null | Value::Undefined) {
                    return Ok(());
                }
                let text = value.to_string();
                self.charge(text.len(), Some(op.position))?;
                self.write(&text, Some(op.position))
            }
            Instr::If {
                branches,
                else_block,
                position,
            } => {
                let mut block = else_block;
                for (condition, body) in branches {
                    if self.eval(condition)?.is_truthy() {
                        block = body;
                        break;
                    }
                }
                self.enter(Some(*position))?;
                let result = self.run_block(block);
                self.leave();
                result
            }
            Instr::For {
                item,
                key,
                iterable,
                body,
                else_block,
                position,
            } => {
                let iterable = self.eval(iterable)?;
                self.run_for(item, key.as_deref(), iterable, body, else_block, *position)
            }
            Instr::Let { name, value, .. } => {
                let value = self.eval(value)?;
                self.scopes.bind(name.clone(), value);
                Ok(())
            }
        }
    }

    fn run_for(
        &mut self,
        item: &str,
        key: Option<&str>,
        iterable: Value,
        body: &[Instr],
        else_block: &[Instr],
        position: Position,
    ) -> Result<(), RuntimeError> {
        let entries: Vec<(Option<String>, Value)> = match (iterable, key) {
            (Value::Sequence(items), None) => items.into_iter().map(|item| (None, item)).collect(),
            (Value::Mapping(map), Some(_)) => {
                map.into_iter().map(|(k, v)| (Some(k), v)).collect()
            }
            (Value::Sequence(_), Some(_)) => {
                return Err(RuntimeErrorKind::type_mismatch(
                    "`for` with two variables",
                    "a mapping",
                    "sequence",
                )
                .at(position));
            }
            (Value::Mapping(_), None) => {
                return Err(RuntimeErrorKind::type_mismatch(
                    "`for` with one variable",
                    "a sequence (iterate mappings with `pairs`)",
                    "mapping",
                )
                .at(position));
            }
            (other, _) => {
                return Err(RuntimeErrorKind::IterationOverNonIterable {
                    found: other.kind_name().to_string(),
                }
                .at(position));
            }
        };

        let length = entries.len();
        if length > self.limits.max_loop_iterations {
            return Err(limit_error(
                Resource::LoopIterations,
                self.limits.max_loop_iterations,
                Some(position),
            ));
        }

        self.enter(Some(position))?;
        let result = if length == 0 {
            self.run_block(else_block)
        } else {
            self.iterate(item, key, entries, body, position)
        };
        self.leave();
        result
    }

    fn iterate(
        &mut self,
        item: &str,
        key: Option<&str>,
        entries: Vec<(Option<String>, Value)>,
        body: &[Instr],
        position: Position,
    ) -> Result<(), RuntimeError> {
        let length = entries.len();
        for (index, (entry_key, entry)) in entries.into_iter().enumerate() {
            self.step(Some(position))?;
            let mut frame = HashMap::new();
            frame.insert("loop".to_string(), loop_info(index, length));
            if let (Some(name), Some(entry_key)) = (key, entry_key) {
                frame.insert(name.to_string(), Value::String(entry_key));
            }
            frame.insert(item.to_string(), entry);

            self.scopes.push(frame);
            let result = self.run_block(body);
            self.scopes.pop();
            result?;
        }
        Ok(())
    }

    // -- operations --

    fn eval(&mut self, op: &Op) -> Result<Value, RuntimeError> {
        let position = Some(op.position);
        self.step(position)?;
        self.enter(position)?;
        let result = self.eval_kind(op);
        self.leave();
        result
    }

    fn eval_kind(&mut self, op: &Op) -> Result<Value, RuntimeError> {
        match &op.kind {
            OpKind::Const(value) => {
                self.charge(value.footprint(), Some(op.position))?;
                Ok(value.clone())
            }
            OpKind::Load { root, segments } => {
                let value = self.load(root, segments);
                self.charge(value.footprint(), Some(op.position))?;
                Ok(value)
            }
            OpKind::And(ops) => {
                let mut last = Value::Bool(true);
                for operand in ops {
                    last = self.eval(operand)?;
                    if !last.is_truthy() {
                        break;
                    }
                }
                Ok(last)
            }
            OpKind::Or(ops) => {
                let mut last = Value::Bool(false);
                for operand in ops {
                    last = self.eval(operand)?;
                    if last.is_truthy() {
                        break;
                    }
                }
                Ok(last)
            }
            OpKind::Not(operand) => Ok(Value::Bool(!self.eval(operand)?.is_truthy())),
            OpKind::Negate(operand) => match self.eval(operand)? {
                Value::Number(n) => Ok(Value::Number(-n)),
                other => Err(RuntimeErrorKind::type_mismatch(
                    "negation",
                    "a number",
                    other.kind_name(),
                )
                .at(op.position)),
            },
            OpKind::Binary { first, rest } => {
                let mut value = self.eval(first)?;
                for (binary, operand) in rest {
                    let right = self.eval(operand)?;
                    self.step(Some(op.position))?;
                    value = binary_op(*binary, &value, &right)
                        .map_err(|kind| kind.at(op.position))?;
                }
                Ok(value)
            }
            OpKind::Concat(ops) => {
                let mut text = String::new();
                for operand in ops {
                    let part = self.eval(operand)?.to_string();
                    self.charge(part.len(), Some(op.position))?;
                    self.check_len(text.len() + part.len(), Some(op.position))?;
                    text.push_str(&part);
                }
                Ok(Value::String(text))
            }
            OpKind::Pipeline { base, filters } => {
                let mut value = self.eval(base)?;
                for filter in filters {
                    value = self.apply(filter, &value)?;
                }
                Ok(value)
            }
        }
    }

    fn apply(&mut self, filter: &BoundFilter, value: &Value) -> Result<Value, RuntimeError> {
        self.step(Some(filter.position))?;
        let result = match &filter.target {
            FilterTarget::Resolved(function) => function(value, &filter.args),
            FilterTarget::Unresolved { suggestions } => Err(RuntimeErrorKind::UndefinedFilter {
                name: filter.name.clone(),
                suggestions: suggestions.clone(),
            }),
        };
        let value = result.map_err(|kind| kind.at(filter.position))?;
        self.check_len(value.text_len(), Some(filter.position))?;
        self.charge(value.footprint(), Some(filter.position))?;
        Ok(value)
    }

    /// Resolve a variable path. Anything missing along the way yields
    /// `Undefined`.
    fn load(&self, root: &str, segments: &[PathSegment]) -> Value {
        let mut current = self.scopes.lookup(root);
        for segment in segments {
            current = current.and_then(|value| match (segment, value) {
                (PathSegment::Field(name) | PathSegment::Key(name), Value::Mapping(map)) => {
                    map.get(name)
                }
                (PathSegment::Index(index), Value::Sequence(items)) => items.get(*index),
                _ => None,
            });
        }
        current.cloned().unwrap_or_default()
    }
}

fn limit_error(resource: Resource, limit: usize, position: Option<Position>) -> RuntimeError {
    RuntimeError {
        kind: RuntimeErrorKind::limit(resource, limit),
        position,
    }
}

/// The `loop` mapping bound in each iteration.
fn loop_info(index: usize, length: usize) -> Value {
    let mut info = Mapping::new();
    info.insert("index".to_string(), Value::from(index + 1));
    info.insert("index0".to_string(), Value::from(index));
    info.insert("first".to_string(), Value::Bool(index == 0));
    info.insert("last".to_string(), Value::Bool(index + 1 == length));
    info.insert("length".to_string(), Value::from(length));
    Value::Mapping(info)
}

fn binary_op(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    match op {
        BinaryOp::Equal => Ok(Value::Bool(left == right)),
        BinaryOp::NotEqual => Ok(Value::Bool(left != right)),
        BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => {
            compare(op, left, right)
        }
        BinaryOp::Add
        | BinaryOp::Subtract
        | BinaryOp::Multiply
        | BinaryOp::Divide
        | BinaryOp::Modulo => arithmetic(op, left, right),
        BinaryOp::And | BinaryOp::Or => Err(RuntimeErrorKind::invalid_argument(
            op.symbol(),
            "logical operators are evaluated by short-circuit operations",
        )),
    }
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    let ordering = match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => {
            return Err(RuntimeErrorKind::type_mismatch(
                format!("comparison `{}`", op.symbol()),
                "two numbers or two strings",
                format!("{} and {}", left.kind_name(), right.kind_name()),
            ));
        }
    };
    let Some(ordering) = ordering else {
        return Ok(Value::Bool(false));
    };
    Ok(Value::Bool(match op {
        BinaryOp::Less => ordering.is_lt(),
        BinaryOp::LessEqual => ordering.is_le(),
        BinaryOp::Greater => ordering.is_gt(),
        _ => ordering.is_ge(),
    }))
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    let (Value::Number(a), Value::Number(b)) = (left, right) else {
        return Err(RuntimeErrorKind::type_mismatch(
            format!("operator `{}`", op.symbol()),
            "two numbers",
            format!("{} and {}", left.kind_name(), right.kind_name()),
        ));
    };
    let (a, b) = (*a, *b);
    if matches!(op, BinaryOp::Divide | BinaryOp::Modulo) && b == 0.0 {
        return Err(RuntimeErrorKind::invalid_argument(
            format!("operator `{}`", op.symbol()),
            "division by zero",
        ));
    }
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Subtract => a - b,
        BinaryOp::Multiply => a * b,
        BinaryOp::Divide => a / b,
        // Floored modulo: the result takes the sign of the divisor.
        _ => a - b * (a / b).floor(),
    };
    Ok(Value::Number(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(n: f64) -> Value {
        Value::Number(n)
    }

    #[test]
    fn modulo_takes_the_sign_of_the_divisor() {
        assert_eq!(binary_op(BinaryOp::Modulo, &number(7.0), &number(3.0)), Ok(number(1.0)));
        assert_eq!(binary_op(BinaryOp::Modulo, &number(-7.0), &number(3.0)), Ok(number(2.0)));
        assert_eq!(binary_op(BinaryOp::Modulo, &number(7.0), &number(-3.0)), Ok(number(-2.0)));
    }

    #[test]
    fn division_by_zero_is_an_invalid_argument() {
        let error = binary_op(BinaryOp::Divide, &number(1.0), &number(0.0)).unwrap_err();
        assert!(matches!(error, RuntimeErrorKind::InvalidArgument { .. }));
    }

    #[test]
    fn ordering_requires_matching_kinds() {
        assert_eq!(
            binary_op(BinaryOp::Less, &Value::from("a"), &Value::from("b")),
            Ok(Value::Bool(true))
        );
        let error = binary_op(BinaryOp::Less, &number(1.0), &Value::from("b")).unwrap_err();
        assert_eq!(
            error.to_string(),
            "comparison `<` expects two numbers or two strings, found number and string"
        );
    }

    #[test]
    fn equality_is_structural() {
        let left = Value::from(vec![1, 2]);
        let right = Value::from(vec![1, 2]);
        assert_eq!(binary_op(BinaryOp::Equal, &left, &right), Ok(Value::Bool(true)));
        assert_eq!(
            binary_op(BinaryOp::NotEqual, &number(1.0), &Value::from("1")),
            Ok(Value::Bool(true))
        );
    }
}
