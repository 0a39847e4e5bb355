//! Expression evaluation for the VM.

use nml_foundation::{RuntimeError, Value, ValueType};

use super::{Request, Vm};
use crate::ast::{AssignOp, Expr, Node, Ref, Target, Verbcall};
use crate::operator::{BinOp, OP_ORDER};
use crate::vm::CallArgs;

/// How execution continues after a statement.
pub(super) enum Flow {
    /// Enter the statement's block.
    Descend,
    /// Move to the following statement.
    Next,
}

/// Why evaluation stopped early.
pub(super) enum Interrupt {
    /// Waiting for the host.
    Suspend(Request),
    /// Failed.
    Fail(RuntimeError),
}

impl From<RuntimeError> for Interrupt {
    fn from(err: RuntimeError) -> Self {
        Self::Fail(err)
    }
}

type Eval<T> = Result<T, Interrupt>;

/// One resolved element of an expression.
#[derive(Clone, Debug)]
enum Operand {
    Op(BinOp),
    Val(Value),
}

impl Vm {
    /// Answers `request` from the reply log, or suspends on it.
    fn await_reply(&mut self, request: Request) -> Eval<Value> {
        match self.replies.get(self.cursor) {
            Some(value) => {
                self.cursor += 1;
                Ok(value.clone())
            }
            None => Err(Interrupt::Suspend(request)),
        }
    }

    pub(super) fn eval_expr(&mut self, expr: &[Node]) -> Eval<Value> {
        let operands = self.operands(expr)?;
        reduce(operands, starts_with_number(expr)).map_err(Interrupt::from)
    }

    /// Resolves every non-operator node, left to right.
    fn operands(&mut self, expr: &[Node]) -> Eval<Vec<Operand>> {
        let mut operands = Vec::with_capacity(expr.len());
        for node in expr {
            let operand = match node.operator() {
                Some(op) => Operand::Op(op),
                None => Operand::Val(self.resolve_value(node)?),
            };
            operands.push(operand);
        }
        Ok(operands)
    }

    fn resolve_value(&mut self, node: &Node) -> Eval<Value> {
        let value = match node {
            Node::Str(s) => Value::Str(s.clone()),
            Node::Number(n) => Value::Number(*n),
            Node::Bool(b) => Value::Bool(*b),
            Node::Null => Value::Null,
            Node::Word(word) => Value::Str(word.clone()),
            Node::Object(id) => Value::Object(*id),
            Node::Alias(name) => self.await_reply(Request::ResolveAlias { name: name.clone() })?,
            Node::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.resolve_value(item)?);
                }
                Value::Array(values)
            }
            Node::List(expr) => match expr.as_slice() {
                [single] => self.resolve_value(single)?,
                _ => self.eval_expr(expr)?,
            },
            Node::Var(r) => {
                let value = self.locals.get(&r.name).cloned().unwrap_or(Value::Null);
                self.index_into(value, r)?
            }
            Node::Prop(r) => {
                let value = self.await_reply(Request::GetProp {
                    object: self.owner,
                    name: r.name.clone(),
                })?;
                self.index_into(value, r)?
            }
            Node::Call(call) => self.call_verb(call)?,
        };
        Ok(value)
    }

    fn index_into(&mut self, value: Value, r: &Ref) -> Eval<Value> {
        let Some(index_expr) = &r.index else {
            return Ok(value);
        };
        let index = self.eval_expr(index_expr)?;
        let Value::Array(items) = value else {
            return Err(RuntimeError::NonIndexable(value.value_type()).into());
        };
        let i = array_index(&index)?;
        items.get(i).cloned().ok_or_else(|| {
            RuntimeError::IndexOutOfBounds {
                index: i,
                length: items.len(),
            }
            .into()
        })
    }

    pub(super) fn call_verb(&mut self, call: &Verbcall) -> Eval<Value> {
        let operands = self.operands(&call.params)?;

        let direct_obj = match call.direct_range() {
            Some(range) => Some(reduce(
                operands[range.clone()].to_vec(),
                starts_with_number(&call.params[range]),
            )?),
            None => None,
        };
        let indirect_obj = match call.indirect_range() {
            Some(range) => Some(reduce(
                operands[range.clone()].to_vec(),
                starts_with_number(&call.params[range]),
            )?),
            None => None,
        };

        let params = call
            .params
            .iter()
            .zip(operands)
            .map(|(node, operand)| match operand {
                Operand::Val(value) => value,
                Operand::Op(op) => Value::Str(node.as_word().unwrap_or(op.symbol()).to_string()),
            })
            .collect();

        let args = CallArgs {
            verb: call.verb.clone(),
            direct_obj,
            preposition: call.preposition.clone(),
            indirect_obj,
            params,
            caller: self.owner,
        };
        self.await_reply(Request::Call {
            object: self.owner,
            args,
        })
    }

    pub(super) fn assign(&mut self, op: AssignOp, dst: &Target, src: &Expr) -> Eval<()> {
        let value = self.eval_expr(src)?;
        let r = dst.reference();
        let index = match &r.index {
            Some(expr) => Some(array_index(&self.eval_expr(expr)?)?),
            None => None,
        };

        let current = if op != AssignOp::Set || index.is_some() {
            Some(match dst {
                Target::Var(_) => self.locals.get(&r.name).cloned().unwrap_or(Value::Null),
                Target::Prop(_) => self.await_reply(Request::GetProp {
                    object: self.owner,
                    name: r.name.clone(),
                })?,
            })
        } else {
            None
        };

        let new_value = match (index, current) {
            (Some(i), Some(whole)) => store_at(whole, i, op, value)?,
            (None, Some(old)) => combine(op, Some(old), value)?,
            (_, None) => value,
        };

        match dst {
            Target::Var(_) => {
                self.locals.insert(r.name.clone(), new_value);
            }
            Target::Prop(_) => {
                self.await_reply(Request::SetProp {
                    object: self.owner,
                    name: r.name.clone(),
                    value: new_value,
                })?;
            }
        }
        Ok(())
    }
}

fn starts_with_number(expr: &[Node]) -> bool {
    matches!(expr.first(), Some(Node::Number(_)))
}

fn array_index(index: &Value) -> Result<usize, RuntimeError> {
    index
        .as_index()
        .ok_or_else(|| RuntimeError::type_mismatch("[]", ValueType::Array, index.value_type()))
}

/// Applies `op` to the old and new value; plain `=` just takes the new one.
fn combine(op: AssignOp, old: Option<Value>, value: Value) -> Result<Value, RuntimeError> {
    match (op.binop(), old) {
        (Some(binop), Some(old)) => binop.apply(old, value),
        (Some(binop), None) => Err(RuntimeError::type_mismatch(
            binop.symbol(),
            ValueType::Null,
            value.value_type(),
        )),
        (None, _) => Ok(value),
    }
}

/// Writes element `i` of an array value. Writing one past the end appends.
fn store_at(whole: Value, i: usize, op: AssignOp, value: Value) -> Result<Value, RuntimeError> {
    let Value::Array(mut items) = whole else {
        return Err(RuntimeError::NonIndexable(whole.value_type()));
    };
    let length = items.len();
    let old = items.get(i).cloned();
    if old.is_none() && op != AssignOp::Set {
        return Err(RuntimeError::IndexOutOfBounds { index: i, length });
    }
    let element = combine(op, old, value)?;
    if i < length {
        items[i] = element;
    } else if i == length {
        items.push(element);
    } else {
        return Err(RuntimeError::IndexOutOfBounds { index: i, length });
    }
    Ok(Value::Array(items))
}

/// Reduces resolved operands to one value.
///
/// Without operators, a single operand is its own value and several are
/// joined with spaces into a string. A list starting with a number literal
/// must contain operators.
fn reduce(operands: Vec<Operand>, numeric_start: bool) -> Result<Value, RuntimeError> {
    let has_operator = operands.iter().any(|o| matches!(o, Operand::Op(_)));

    if !has_operator {
        let mut values: Vec<Value> = operands
            .into_iter()
            .filter_map(|o| match o {
                Operand::Val(v) => Some(v),
                Operand::Op(_) => None,
            })
            .collect();
        return match values.len() {
            0 => Ok(Value::Null),
            1 => Ok(values.swap_remove(0)),
            _ if numeric_start => Err(RuntimeError::MalformedExpression(
                "a list starting with a number needs operators".to_string(),
            )),
            _ => Ok(Value::Str(
                values
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" "),
            )),
        };
    }

    let mut values = Vec::new();
    let mut ops = Vec::new();
    for (position, operand) in operands.into_iter().enumerate() {
        match (position % 2, operand) {
            (0, Operand::Val(value)) => values.push(value),
            (1, Operand::Op(op)) => ops.push(op),
            (_, Operand::Op(op)) => {
                return Err(RuntimeError::MalformedExpression(format!(
                    "operator {} has no left operand",
                    op.symbol()
                )));
            }
            (_, Operand::Val(value)) => {
                return Err(RuntimeError::MalformedExpression(format!(
                    "expected an operator before {value}"
                )));
            }
        }
    }
    if values.len() != ops.len() + 1 {
        return Err(RuntimeError::MalformedExpression(
            "expression ends with an operator".to_string(),
        ));
    }

    for tier in OP_ORDER {
        let mut i = 0;
        while i < ops.len() {
            if tier.contains(&ops[i]) {
                let op = ops.remove(i);
                let right = values.remove(i + 1);
                let left = std::mem::replace(&mut values[i], Value::Null);
                values[i] = op.apply(left, right)?;
            } else {
                i += 1;
            }
        }
    }

    Ok(values.swap_remove(0))
}
