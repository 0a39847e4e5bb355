//! Grouper: turns token lists into expressions and statements.
//!
//! Grouping recurses through arrays, groups, and index specifiers. A group
//! directly after a non-reserved bareword is a nested verb call
//! (`max(1 2)`). At the top level of a statement, a leading bareword makes
//! the whole line a verb call.

use nml_foundation::SyntaxError;

use crate::ast::{AssignOp, Expr, Node, Ref, Statement, Target};
use crate::operator::is_reserved;
use crate::preposition::verbcall_from_line;
use crate::token::{Token, strip_comment};

/// Groups a token list into an expression.
///
/// At `level` 0 a list starting with a non-reserved bareword becomes a
/// single [`Node::Call`]. Nested levels never do, except where a bareword
/// is immediately followed by a group.
///
/// # Errors
///
/// Propagates errors from nested index and argument groups.
pub fn parse_group(tokens: Vec<Token>, level: usize, line: usize) -> Result<Expr, SyntaxError> {
    let mut nodes = Vec::with_capacity(tokens.len());
    let mut tokens = tokens.into_iter().peekable();

    while let Some(token) = tokens.next() {
        let node = match token {
            Token::Comment(_) => continue,
            Token::Bareword(word) if !is_reserved(&word) => {
                match tokens.next_if(|next| matches!(next, Token::Group(_))) {
                    Some(Token::Group(args)) => fold_call(word, args, level, line)?,
                    _ => Node::Word(word),
                }
            }
            other => group_token(other, level, line)?,
        };
        nodes.push(node);
    }

    if level == 0 && nodes.first().and_then(Node::as_word).is_some_and(|w| !is_reserved(w)) {
        if let Some(call) = verbcall_from_line(&nodes) {
            return Ok(vec![Node::Call(Box::new(call))]);
        }
    }

    Ok(nodes)
}

/// `name(args)` becomes a call whose line is the name followed by the args.
fn fold_call(name: String, args: Vec<Token>, level: usize, line: usize) -> Result<Node, SyntaxError> {
    let mut call_line = vec![Node::Word(name)];
    call_line.extend(parse_group(args, level + 1, line)?);
    Ok(match verbcall_from_line(&call_line) {
        Some(call) => Node::Call(Box::new(call)),
        None => Node::List(call_line),
    })
}

fn group_token(token: Token, level: usize, line: usize) -> Result<Node, SyntaxError> {
    let node = match token {
        Token::Str(s) => Node::Str(s),
        Token::Number(n) => Node::Number(n),
        Token::Bool(b) => Node::Bool(b),
        Token::Null => Node::Null,
        Token::Bareword(word) => Node::Word(word),
        Token::Var { name, index } => Node::Var(group_ref(name, index, level, line)?),
        Token::Prop { name, index } => Node::Prop(group_ref(name, index, level, line)?),
        Token::Object(id) => Node::Object(id),
        Token::ObjectAlias(name) => Node::Alias(name),
        Token::Array(items) => Node::Array(parse_group(items, level + 1, line)?),
        Token::Group(items) => Node::List(parse_group(items, level + 1, line)?),
        Token::Comment(_) => Node::Null,
    };
    Ok(node)
}

fn group_ref(
    name: String,
    index: Option<Vec<Token>>,
    level: usize,
    line: usize,
) -> Result<Ref, SyntaxError> {
    let index = index
        .map(|tokens| parse_group(tokens, level + 1, line))
        .transpose()?;
    Ok(Ref { name, index })
}

/// Groups the tokens of one non-block line into a statement.
///
/// A line whose second token is an assignment symbol is an assignment;
/// anything else must be a verb call.
///
/// # Errors
///
/// Returns a [`SyntaxError`] for assignments to something other than a
/// variable or property, assignments without a right-hand side, and lines
/// that are neither an assignment nor a verb call.
pub fn parse_statement(mut tokens: Vec<Token>, line: usize) -> Result<Statement, SyntaxError> {
    strip_comment(&mut tokens);

    let assign_op = tokens
        .get(1)
        .and_then(Token::as_bareword)
        .and_then(AssignOp::from_symbol);

    if let Some(op) = assign_op {
        let mut rest = tokens.split_off(1);
        let src_tokens = rest.split_off(1);
        let Some(dst_token) = tokens.pop() else {
            return Err(SyntaxError::new(line, "an assignment must have two sides"));
        };
        let dst = match dst_token {
            Token::Var { name, index } => Target::Var(group_ref(name, index, 1, line)?),
            Token::Prop { name, index } => Target::Prop(group_ref(name, index, 1, line)?),
            _ => {
                return Err(SyntaxError::new(
                    line,
                    "type on left of assignment cannot be set",
                ));
            }
        };
        if src_tokens.is_empty() {
            return Err(SyntaxError::new(line, "an assignment must have two sides"));
        }
        let src = parse_group(src_tokens, 1, line)?;
        return Ok(Statement::Assign { op, dst, src });
    }

    let first = tokens.first().map(Token::name);
    let mut expr = parse_group(tokens, 0, line)?;
    match (expr.pop(), expr.is_empty()) {
        (Some(Node::Call(call)), true) => Ok(Statement::Call(*call)),
        _ => Err(SyntaxError::new(
            line,
            format!(
                "expected a verb call or an assignment, found {}",
                first.unwrap_or("nothing")
            ),
        )),
    }
}
