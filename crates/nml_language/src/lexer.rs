//! Lexer for NML.
//!
//! The lexer is a character-level state machine over a single source line.
//! Open brackets push a new token context; closing brackets pop it and emit
//! the finished [`Token::Array`], [`Token::Group`], or indexed reference into
//! the enclosing context. Statements never span lines, so any context still
//! open at the end of the line is an error.

use nml_foundation::{ObjectId, SyntaxError};

use crate::token::Token;

/// Tokenizes one line of source, reporting errors against line 1.
///
/// # Errors
///
/// Returns a [`SyntaxError`] for unterminated strings, malformed object ids,
/// missing names after a sigil, and unbalanced brackets.
pub fn parse_line(line: &str) -> Result<Vec<Token>, SyntaxError> {
    lex_line(line, 1)
}

/// Tokenizes one line of source, reporting errors against `line_no`.
///
/// # Errors
///
/// See [`parse_line`].
pub fn lex_line(line: &str, line_no: usize) -> Result<Vec<Token>, SyntaxError> {
    Lexer::new(line, line_no).tokenize()
}

/// What the lexer is currently accumulating.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Default,
    Bareword,
    Str,
    Var,
    Prop,
    ObjectId,
    ObjectAlias,
    Comment,
}

/// The bracket a token context was opened by.
#[derive(Clone, Debug)]
enum Opener {
    Root,
    Array,
    Group,
    Index { prop: bool, name: String },
}

#[derive(Debug)]
struct Context {
    opener: Opener,
    tokens: Vec<Token>,
}

impl Context {
    const fn new(opener: Opener) -> Self {
        Self {
            opener,
            tokens: Vec::new(),
        }
    }
}

/// Lexer for a single NML source line.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    state: State,
    buffer: String,
    /// Set when a bareword was opened with a backslash; it never becomes a keyword
    /// or number.
    forced: bool,
    contexts: Vec<Context>,
}

impl Lexer {
    /// Creates a lexer for `source`, which is reported as line `line`.
    #[must_use]
    pub fn new(source: &str, line: usize) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line,
            state: State::Default,
            buffer: String::new(),
            forced: false,
            contexts: vec![Context::new(Opener::Root)],
        }
    }

    /// Consumes the lexer and returns the tokens of the line.
    ///
    /// # Errors
    ///
    /// See [`parse_line`].
    pub fn tokenize(mut self) -> Result<Vec<Token>, SyntaxError> {
        while let Some(c) = self.peek() {
            match self.state {
                State::Default => self.scan_default(c)?,
                State::Bareword => self.scan_bareword(c),
                State::Str => self.scan_string(c),
                State::Var | State::Prop => self.scan_reference(c)?,
                State::ObjectId | State::ObjectAlias => {
                    if self.is_terminator(c) {
                        self.finish()?;
                    } else {
                        self.buffer.push(c);
                        self.pos += 1;
                    }
                }
                State::Comment => {
                    self.buffer.push(c);
                    self.pos += 1;
                }
            }
        }

        if self.state == State::Str {
            return Err(self.error("unterminated string literal"));
        }
        self.finish()?;

        if self.contexts.len() > 1 {
            let message = match self.contexts.last().map(|ctx| &ctx.opener) {
                Some(Opener::Group) => "unclosed '('",
                _ => "unclosed '['",
            };
            return Err(self.error(message));
        }

        Ok(self.contexts.pop().map(|ctx| ctx.tokens).unwrap_or_default())
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(self.line, message)
    }

    /// Commas only separate items inside brackets; at the top level they
    /// belong to the word they appear in.
    fn nested(&self) -> bool {
        self.contexts.len() > 1
    }

    fn is_terminator(&self, c: char) -> bool {
        c.is_whitespace() || matches!(c, ']' | '(' | ')') || (c == ',' && self.nested())
    }

    fn emit(&mut self, token: Token) {
        if let Some(ctx) = self.contexts.last_mut() {
            ctx.tokens.push(token);
        }
    }

    fn scan_default(&mut self, c: char) -> Result<(), SyntaxError> {
        match c {
            '\'' => {
                self.state = State::Str;
                self.pos += 1;
            }
            '$' => {
                self.state = State::Var;
                self.pos += 1;
            }
            '%' => {
                self.state = State::Prop;
                self.pos += 1;
            }
            '#' => {
                if self.chars.get(self.pos + 1) == Some(&'#') {
                    self.state = State::ObjectAlias;
                    self.pos += 2;
                } else {
                    self.state = State::ObjectId;
                    self.pos += 1;
                }
            }
            ';' => {
                self.state = State::Comment;
                self.pos += 1;
            }
            '[' => {
                self.contexts.push(Context::new(Opener::Array));
                self.pos += 1;
            }
            '(' => {
                self.contexts.push(Context::new(Opener::Group));
                self.pos += 1;
            }
            ']' => {
                self.close_bracket()?;
                self.pos += 1;
            }
            ')' => {
                self.close_paren()?;
                self.pos += 1;
            }
            c if c.is_whitespace() || c == ',' => self.pos += 1,
            // Leading backslash: the next character starts a bareword
            // whatever it is.
            '\\' => {
                self.state = State::Bareword;
                self.forced = true;
                self.push_escaped();
            }
            _ => self.state = State::Bareword,
        }
        Ok(())
    }

    fn scan_bareword(&mut self, c: char) {
        if self.is_terminator(c) {
            self.finish_bareword();
        } else if c == '\\' {
            self.push_escaped();
        } else {
            self.buffer.push(c);
            self.pos += 1;
        }
    }

    fn push_escaped(&mut self) {
        match self.chars.get(self.pos + 1) {
            Some(&next) => {
                self.buffer.push(next);
                self.pos += 2;
            }
            None => {
                self.buffer.push('\\');
                self.pos += 1;
            }
        }
    }

    fn scan_string(&mut self, c: char) {
        match c {
            '\\' if matches!(self.chars.get(self.pos + 1).copied(), Some('\'' | '\\')) => {
                self.push_escaped();
            }
            '\'' => {
                let text = std::mem::take(&mut self.buffer);
                self.emit(Token::Str(text));
                self.state = State::Default;
                self.pos += 1;
            }
            _ => {
                self.buffer.push(c);
                self.pos += 1;
            }
        }
    }

    fn scan_reference(&mut self, c: char) -> Result<(), SyntaxError> {
        if c == '[' {
            if self.buffer.is_empty() {
                return Err(self.missing_name());
            }
            let opener = Opener::Index {
                prop: self.state == State::Prop,
                name: std::mem::take(&mut self.buffer),
            };
            self.contexts.push(Context::new(opener));
            self.state = State::Default;
            self.pos += 1;
        } else if self.is_terminator(c) {
            self.finish()?;
        } else {
            self.buffer.push(c);
            self.pos += 1;
        }
        Ok(())
    }

    fn missing_name(&self) -> SyntaxError {
        let sigil = if self.state == State::Prop { '%' } else { '$' };
        self.error(format!("missing name after '{sigil}'"))
    }

    /// Emits whatever is being accumulated and returns to the default state.
    fn finish(&mut self) -> Result<(), SyntaxError> {
        match self.state {
            State::Default => {}
            State::Bareword => self.finish_bareword(),
            State::Str => return Err(self.error("unterminated string literal")),
            State::Var | State::Prop => {
                if self.buffer.is_empty() {
                    return Err(self.missing_name());
                }
                let name = std::mem::take(&mut self.buffer);
                let token = if self.state == State::Prop {
                    Token::Prop { name, index: None }
                } else {
                    Token::Var { name, index: None }
                };
                self.emit(token);
            }
            State::ObjectId => {
                let text = std::mem::take(&mut self.buffer);
                let id = ObjectId::from_hex(&text)
                    .ok_or_else(|| self.error(format!("malformed object id '#{text}'")))?;
                self.emit(Token::Object(id));
            }
            State::ObjectAlias => {
                if self.buffer.is_empty() {
                    return Err(self.error("missing alias name after '##'"));
                }
                let name = std::mem::take(&mut self.buffer);
                self.emit(Token::ObjectAlias(name));
            }
            State::Comment => {
                let text = std::mem::take(&mut self.buffer);
                self.emit(Token::Comment(text));
            }
        }
        self.state = State::Default;
        Ok(())
    }

    fn finish_bareword(&mut self) {
        let word = std::mem::take(&mut self.buffer);
        let token = if self.forced {
            Token::Bareword(word)
        } else {
            classify_bareword(word)
        };
        self.forced = false;
        self.emit(token);
        self.state = State::Default;
    }

    fn close_bracket(&mut self) -> Result<(), SyntaxError> {
        match self.contexts.last().map(|ctx| &ctx.opener) {
            Some(Opener::Array | Opener::Index { .. }) => {}
            Some(Opener::Group) => return Err(self.error("']' cannot close '('")),
            _ => return Err(self.error("unmatched ']'")),
        }
        let Some(ctx) = self.contexts.pop() else {
            return Err(self.error("unmatched ']'"));
        };
        let token = match ctx.opener {
            Opener::Index { prop: true, name } => Token::Prop {
                name,
                index: Some(ctx.tokens),
            },
            Opener::Index { prop: false, name } => Token::Var {
                name,
                index: Some(ctx.tokens),
            },
            _ => Token::Array(ctx.tokens),
        };
        self.emit(token);
        Ok(())
    }

    fn close_paren(&mut self) -> Result<(), SyntaxError> {
        match self.contexts.last().map(|ctx| &ctx.opener) {
            Some(Opener::Group) => {}
            Some(Opener::Array | Opener::Index { .. }) => {
                return Err(self.error("')' cannot close '['"));
            }
            _ => return Err(self.error("unmatched ')'")),
        }
        if let Some(ctx) = self.contexts.pop() {
            self.emit(Token::Group(ctx.tokens));
        }
        Ok(())
    }
}

/// Turns finished bareword text into a keyword, number, or bareword token.
fn classify_bareword(word: String) -> Token {
    match word.as_str() {
        "true" => Token::Bool(true),
        "false" => Token::Bool(false),
        "null" => Token::Null,
        text => match parse_number(text) {
            Some(n) => Token::Number(n),
            None => Token::Bareword(word),
        },
    }
}

/// Parses integer and decimal literals.
///
/// Words like `inf` or `nan` that `f64::from_str` would accept stay words.
#[allow(clippy::cast_precision_loss)]
fn parse_number(text: &str) -> Option<f64> {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let unsigned = unsigned.strip_prefix('.').unwrap_or(unsigned);
    let numeric_start = unsigned.starts_with(|c: char| c.is_ascii_digit());
    if !numeric_start {
        return None;
    }
    if let Ok(n) = text.parse::<i64>() {
        return Some(n as f64);
    }
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}
