//! Binary operators and their operand rules.
//!
//! Operators are plain barewords in source; the evaluator recognizes them by
//! symbol. Precedence comes from [`OP_ORDER`]: each tier is folded left to
//! right before the next tier is considered.

use nml_foundation::{RuntimeError, Value, ValueType};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A binary operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BinOp {
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `in`
    In,
    /// `&&` or `and`
    And,
    /// `||` or `or`
    Or,
}

/// Precedence tiers, tightest first.
pub const OP_ORDER: &[&[BinOp]] = &[
    &[BinOp::Mul, BinOp::Div],
    &[BinOp::Add, BinOp::Sub],
    &[
        BinOp::Eq,
        BinOp::Ne,
        BinOp::Lt,
        BinOp::Gt,
        BinOp::Le,
        BinOp::Ge,
        BinOp::In,
    ],
    &[BinOp::And, BinOp::Or],
];

/// Assignment symbols. Reserved alongside operators.
pub const ASSIGN_SYMBOLS: &[&str] = &["=", "+=", "-=", "*=", "/="];

impl BinOp {
    /// Parses an operator word.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "*" => Self::Mul,
            "/" => Self::Div,
            "+" => Self::Add,
            "-" => Self::Sub,
            "==" => Self::Eq,
            "!=" => Self::Ne,
            "<" => Self::Lt,
            ">" => Self::Gt,
            "<=" => Self::Le,
            ">=" => Self::Ge,
            "in" => Self::In,
            "&&" | "and" => Self::And,
            "||" | "or" => Self::Or,
            _ => return None,
        };
        Some(op)
    }

    /// Returns the canonical symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Mul => "*",
            Self::Div => "/",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::In => "in",
            Self::And => "&&",
            Self::Or => "||",
        }
    }

    /// Returns true if the operator accepts these operand types.
    #[must_use]
    pub const fn accepts(self, left: ValueType, right: ValueType) -> bool {
        use ValueType as T;
        match self {
            Self::Add => matches!(
                (left, right),
                (T::Number, T::Number) | (T::String, T::Number | T::String | T::Array | T::Null)
            ),
            Self::Sub | Self::Mul | Self::Div => matches!((left, right), (T::Number, T::Number)),
            Self::Lt | Self::Gt | Self::Le | Self::Ge => {
                matches!((left, right), (T::Number, T::Number) | (T::String, T::String))
            }
            Self::In => matches!((left, right), (_, T::Array) | (T::String, T::String)),
            Self::Eq | Self::Ne | Self::And | Self::Or => true,
        }
    }

    /// Applies the operator.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::TypeMismatch`] when the operand types are not
    /// accepted, and [`RuntimeError::DivisionByZero`] for `x / 0`.
    pub fn apply(self, left: Value, right: Value) -> Result<Value, RuntimeError> {
        if !self.accepts(left.value_type(), right.value_type()) {
            return Err(RuntimeError::type_mismatch(
                self.symbol(),
                left.value_type(),
                right.value_type(),
            ));
        }

        let value = match (self, left, right) {
            (Self::Add, Value::Number(a), Value::Number(b)) => Value::Number(a + b),
            (Self::Add, Value::Str(mut a), b) => {
                a.push_str(&b.to_string());
                Value::Str(a)
            }
            (Self::Sub, Value::Number(a), Value::Number(b)) => Value::Number(a - b),
            (Self::Mul, Value::Number(a), Value::Number(b)) => Value::Number(a * b),
            (Self::Div, Value::Number(_), Value::Number(b)) if b == 0.0 => {
                return Err(RuntimeError::DivisionByZero);
            }
            (Self::Div, Value::Number(a), Value::Number(b)) => Value::Number(a / b),
            (Self::Eq, a, b) => Value::Bool(a == b),
            (Self::Ne, a, b) => Value::Bool(a != b),
            (Self::Lt | Self::Gt | Self::Le | Self::Ge, a, b) => Value::Bool(compare(self, &a, &b)),
            (Self::In, needle, Value::Array(items)) => Value::Bool(items.contains(&needle)),
            (Self::In, Value::Str(needle), Value::Str(haystack)) => {
                Value::Bool(haystack.contains(&needle))
            }
            (Self::And, a, b) => Value::Bool(a.is_truthy() && b.is_truthy()),
            (Self::Or, a, b) => Value::Bool(a.is_truthy() || b.is_truthy()),
            (op, a, b) => {
                return Err(RuntimeError::type_mismatch(
                    op.symbol(),
                    a.value_type(),
                    b.value_type(),
                ));
            }
        };
        Ok(value)
    }
}

fn compare(op: BinOp, left: &Value, right: &Value) -> bool {
    let ordering = match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => None,
    };
    let Some(ordering) = ordering else {
        return false;
    };
    match op {
        BinOp::Lt => ordering.is_lt(),
        BinOp::Gt => ordering.is_gt(),
        BinOp::Le => ordering.is_le(),
        BinOp::Ge => ordering.is_ge(),
        _ => false,
    }
}

/// Returns true for words the grouper must not treat as verb names.
#[must_use]
pub fn is_reserved(word: &str) -> bool {
    BinOp::from_symbol(word).is_some() || ASSIGN_SYMBOLS.contains(&word)
}
