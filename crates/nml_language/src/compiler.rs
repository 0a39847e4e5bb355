//! Statement assembler: source text to a block-structured AST.
//!
//! Each line is lexed and grouped on its own. `if` and `while` open a block
//! that collects following statements until the matching `end`.

use nml_foundation::SyntaxError;

use crate::ast::{Expr, Statement};
use crate::group::{parse_group, parse_statement};
use crate::lexer::lex_line;
use crate::token::{Token, strip_comment};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BlockKind {
    If,
    While,
}

impl BlockKind {
    const fn keyword(self) -> &'static str {
        match self {
            Self::If => "if",
            Self::While => "while",
        }
    }
}

/// A block waiting for its `end`.
struct OpenBlock {
    kind: BlockKind,
    condition: Expr,
    body: Vec<Statement>,
}

impl OpenBlock {
    fn close(self) -> Statement {
        match self.kind {
            BlockKind::If => Statement::If {
                condition: self.condition,
                block: self.body,
            },
            BlockKind::While => Statement::While {
                condition: self.condition,
                block: self.body,
            },
        }
    }
}

/// Compiles NML source into a list of root statements.
///
/// Blank lines and comment-only lines are skipped.
///
/// # Errors
///
/// Returns the first [`SyntaxError`] in the source. Block errors are
/// `no blocks to end` for a stray `end`, a usage message for `if`/`while`
/// without a condition, and `N block(s) are still open.` when the source
/// ends inside a block.
pub fn code_to_ast(source: &str) -> Result<Vec<Statement>, SyntaxError> {
    let mut root = Vec::new();
    let mut open: Vec<OpenBlock> = Vec::new();
    let mut line_count = 0;

    for (index, text) in source.lines().enumerate() {
        let line = index + 1;
        line_count = line;

        let mut tokens = lex_line(text.trim(), line)?;
        strip_comment(&mut tokens);
        if tokens.is_empty() {
            continue;
        }

        let keyword = match tokens.first().and_then(Token::as_bareword) {
            Some("if") => Some(BlockKind::If),
            Some("while") => Some(BlockKind::While),
            Some("end") => {
                let block = open
                    .pop()
                    .ok_or_else(|| SyntaxError::new(line, "no blocks to end"))?;
                push_statement(&mut root, &mut open, block.close());
                continue;
            }
            _ => None,
        };

        if let Some(kind) = keyword {
            let condition_tokens = tokens.split_off(1);
            if condition_tokens.is_empty() {
                let kw = kind.keyword();
                return Err(SyntaxError::new(line, format!("{kw} usage: {kw} <expr>")));
            }
            open.push(OpenBlock {
                kind,
                condition: parse_group(condition_tokens, 1, line)?,
                body: Vec::new(),
            });
            continue;
        }

        let statement = parse_statement(tokens, line)?;
        push_statement(&mut root, &mut open, statement);
    }

    if !open.is_empty() {
        return Err(SyntaxError::new(
            line_count,
            format!("{} block(s) are still open.", open.len()),
        ));
    }

    Ok(root)
}

fn push_statement(root: &mut Vec<Statement>, open: &mut [OpenBlock], statement: Statement) {
    match open.last_mut() {
        Some(block) => block.body.push(statement),
        None => root.push(statement),
    }
}

/// Compiles a single expression, as it would appear in a condition.
///
/// # Errors
///
/// Returns a [`SyntaxError`] if the text does not lex.
pub fn compile_expr(source: &str) -> Result<Expr, SyntaxError> {
    let mut tokens = lex_line(source.trim(), 1)?;
    strip_comment(&mut tokens);
    parse_group(tokens, 1, 1)
}
