//! Token types for NML.
//!
//! Tokens are the output of the lexer and input to the grouper. Brackets
//! are already matched at this stage: `[...]` and `(...)` arrive as nested
//! [`Token::Array`] and [`Token::Group`] values.

use nml_foundation::ObjectId;

/// A token (lexical component) of one source line.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// String literal like `'hello there'`.
    Str(String),
    /// Numeric literal like `4` or `-2.5`.
    Number(f64),
    /// `true` or `false`.
    Bool(bool),
    /// `null`.
    Null,
    /// Any other unquoted word, including operator symbols.
    Bareword(String),
    /// Local variable reference `$name` or `$name[index]`.
    Var {
        /// Variable name without the sigil.
        name: String,
        /// Tokens of the index specifier, if any.
        index: Option<Vec<Token>>,
    },
    /// Object property reference `%name` or `%name[index]`.
    Prop {
        /// Property name without the sigil.
        name: String,
        /// Tokens of the index specifier, if any.
        index: Option<Vec<Token>>,
    },
    /// Object reference `#1f`.
    Object(ObjectId),
    /// Object-id alias `##ROOT`, resolved at run time.
    ObjectAlias(String),
    /// Comment text (without the leading `;`).
    Comment(String),
    /// Array literal `[a b c]`.
    Array(Vec<Token>),
    /// Parenthesized group `(a b c)`.
    Group(Vec<Token>),
}

impl Token {
    /// Returns the text of a bareword token.
    #[must_use]
    pub fn as_bareword(&self) -> Option<&str> {
        match self {
            Self::Bareword(word) => Some(word),
            _ => None,
        }
    }

    /// Returns true if this token is a comment.
    #[must_use]
    pub const fn is_comment(&self) -> bool {
        matches!(self, Self::Comment(_))
    }

    /// Returns true if this token is a bareword equal to `word`.
    #[must_use]
    pub fn is_word(&self, word: &str) -> bool {
        self.as_bareword() == Some(word)
    }

    /// Returns a human-readable name for this token kind.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Number(_) => "number",
            Self::Bool(_) => "bool",
            Self::Null => "null",
            Self::Bareword(_) => "bareword",
            Self::Var { .. } => "var",
            Self::Prop { .. } => "prop",
            Self::Object(_) => "object",
            Self::ObjectAlias(_) => "object alias",
            Self::Comment(_) => "comment",
            Self::Array(_) => "array",
            Self::Group(_) => "group",
        }
    }
}

/// Removes trailing comment tokens from a line.
pub(crate) fn strip_comment(tokens: &mut Vec<Token>) {
    while tokens.last().is_some_and(Token::is_comment) {
        tokens.pop();
    }
}
