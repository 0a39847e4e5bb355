//! Abstract syntax tree for NML.
//!
//! A compiled script is a `Vec<Statement>`. Statements hold expressions,
//! which are flat lists of [`Node`]s: operands interleaved with operator
//! words, reduced by the interpreter at run time.

use std::ops::Range;

use nml_foundation::ObjectId;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::operator::BinOp;

/// An expression: operands and operator words in source order.
pub type Expr = Vec<Node>;

/// A grouped token.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Node {
    /// String literal.
    Str(String),
    /// Numeric literal.
    Number(f64),
    /// Boolean literal.
    Bool(bool),
    /// `null`.
    Null,
    /// Bareword. Operator words are barewords until evaluation.
    Word(String),
    /// Local variable reference.
    Var(Ref),
    /// Property reference on the executing object.
    Prop(Ref),
    /// Object reference.
    Object(ObjectId),
    /// Object-id alias, resolved through the collaborator.
    Alias(String),
    /// Array literal; each element is resolved on its own.
    Array(Vec<Node>),
    /// Parenthesized sub-expression.
    List(Expr),
    /// Nested verb call `name(args)`.
    Call(Box<Verbcall>),
}

impl Node {
    /// Returns the operator this node stands for, if it is an operator word.
    #[must_use]
    pub fn operator(&self) -> Option<BinOp> {
        match self {
            Self::Word(word) => BinOp::from_symbol(word),
            _ => None,
        }
    }

    /// Returns the text of a bareword node.
    #[must_use]
    pub fn as_word(&self) -> Option<&str> {
        match self {
            Self::Word(word) => Some(word),
            _ => None,
        }
    }
}

/// A named reference with an optional index expression.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ref {
    /// Variable or property name.
    pub name: String,
    /// Index expression for `$name[...]`.
    pub index: Option<Expr>,
}

impl Ref {
    /// Creates an unindexed reference.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
        }
    }

    /// Creates an indexed reference.
    #[must_use]
    pub fn indexed(name: impl Into<String>, index: Expr) -> Self {
        Self {
            name: name.into(),
            index: Some(index),
        }
    }
}

/// A verb invocation split around its preposition.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Verbcall {
    /// The verb name.
    pub verb: String,
    /// Words between the verb and the preposition.
    pub direct_obj: Option<Expr>,
    /// The splitting preposition phrase.
    pub preposition: Option<String>,
    /// Words after the preposition.
    pub indirect_obj: Option<Expr>,
    /// Everything after the verb, untouched.
    pub params: Expr,
}

impl Verbcall {
    /// Position of the direct object within `params`.
    #[must_use]
    pub fn direct_range(&self) -> Option<Range<usize>> {
        let direct = self.direct_obj.as_ref()?;
        let tail = self.indirect_obj.as_ref().map_or(0, Vec::len)
            + self
                .preposition
                .as_ref()
                .map_or(0, |p| p.split_whitespace().count());
        let end = self.params.len().checked_sub(tail)?;
        Some(end.checked_sub(direct.len())?..end)
    }

    /// Position of the indirect object within `params`.
    #[must_use]
    pub fn indirect_range(&self) -> Option<Range<usize>> {
        let indirect = self.indirect_obj.as_ref()?;
        let len = self.params.len();
        Some(len.checked_sub(indirect.len())?..len)
    }
}

/// Assignment operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AssignOp {
    /// `=`
    Set,
    /// `+=`
    Add,
    /// `-=`
    Sub,
    /// `*=`
    Mul,
    /// `/=`
    Div,
}

impl AssignOp {
    /// Parses an assignment symbol.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(Self::Set),
            "+=" => Some(Self::Add),
            "-=" => Some(Self::Sub),
            "*=" => Some(Self::Mul),
            "/=" => Some(Self::Div),
            _ => None,
        }
    }

    /// Returns the source symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Set => "=",
            Self::Add => "+=",
            Self::Sub => "-=",
            Self::Mul => "*=",
            Self::Div => "/=",
        }
    }

    /// The arithmetic operator a compound assignment applies.
    #[must_use]
    pub const fn binop(self) -> Option<BinOp> {
        match self {
            Self::Set => None,
            Self::Add => Some(BinOp::Add),
            Self::Sub => Some(BinOp::Sub),
            Self::Mul => Some(BinOp::Mul),
            Self::Div => Some(BinOp::Div),
        }
    }
}

/// The left-hand side of an assignment.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Target {
    /// Local variable.
    Var(Ref),
    /// Property on the executing object.
    Prop(Ref),
}

impl Target {
    /// The reference being assigned.
    #[must_use]
    pub const fn reference(&self) -> &Ref {
        match self {
            Self::Var(r) | Self::Prop(r) => r,
        }
    }
}

/// A compiled statement.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Statement {
    /// `if <condition>` ... `end`
    If {
        /// Condition expression.
        condition: Expr,
        /// Body statements.
        block: Vec<Statement>,
    },
    /// `while <condition>` ... `end`
    While {
        /// Condition expression.
        condition: Expr,
        /// Body statements.
        block: Vec<Statement>,
    },
    /// `<target> <op> <expr>`
    Assign {
        /// Assignment operator.
        op: AssignOp,
        /// Assignment destination.
        dst: Target,
        /// Value expression.
        src: Expr,
    },
    /// A verb call statement.
    Call(Verbcall),
}

impl Statement {
    /// The nested statements of an `if` or `while`.
    #[must_use]
    pub fn block(&self) -> Option<&[Statement]> {
        match self {
            Self::If { block, .. } | Self::While { block, .. } => Some(block),
            _ => None,
        }
    }

    /// Returns a short name for the statement kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::If { .. } => "if",
            Self::While { .. } => "while",
            Self::Assign { .. } => "assign",
            Self::Call(_) => "call",
        }
    }
}

/// Looks up the statement addressed by an instruction path.
///
/// Each element of `path` indexes into the current block; the statement it
/// finds becomes the container for the next element. Returns `None` when any
/// index is out of range or descends into a statement with no block.
#[must_use]
pub fn find_ins<'a>(path: &[usize], ast: &'a [Statement]) -> Option<&'a Statement> {
    let (last, parents) = path.split_last()?;
    let mut block = ast;
    for &index in parents {
        block = block.get(index)?.block()?;
    }
    block.get(*last)
}

/// Returns the block containing the statement at `path`.
///
/// The empty path's block is the root.
#[must_use]
pub fn enclosing_block<'a>(path: &[usize], ast: &'a [Statement]) -> Option<&'a [Statement]> {
    match path.split_last() {
        None => Some(ast),
        Some((_, parents)) => {
            if parents.is_empty() {
                Some(ast)
            } else {
                find_ins(parents, ast)?.block()
            }
        }
    }
}
