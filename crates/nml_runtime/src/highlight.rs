//! Syntax highlighting for the REPL.

use std::borrow::Cow;
use std::iter::Peekable;
use std::str::Chars;

const RESET: &str = "\x1b[0m";
const COMMENT: &str = "\x1b[2;3m";
const STRING: &str = "\x1b[33m";
const NUMBER: &str = "\x1b[35m";
const VAR: &str = "\x1b[34m";
const PROP: &str = "\x1b[36m";
const OBJECT: &str = "\x1b[1;35m";
const KEYWORD: &str = "\x1b[32m";
const LITERAL: &str = "\x1b[34m";
const COMMAND: &str = "\x1b[1;32m";
const DELIMITER: &str = "\x1b[1m";

/// Highlighter for NML source lines.
#[derive(Clone, Copy, Debug, Default)]
pub struct NmlHighlighter;

impl NmlHighlighter {
    /// Creates a highlighter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Highlights a line of input.
    #[allow(clippy::unused_self)]
    #[must_use]
    pub fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.trim_start().starts_with('.') {
            return Cow::Owned(format!("{COMMAND}{line}{RESET}"));
        }

        let mut out = String::with_capacity(line.len() * 2);
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                ';' => {
                    out.push_str(COMMENT);
                    out.push(c);
                    out.extend(chars.by_ref());
                    out.push_str(RESET);
                }
                '\'' => {
                    out.push_str(STRING);
                    out.push(c);
                    string_body(&mut chars, &mut out);
                    out.push_str(RESET);
                }
                '$' => painted(&mut out, VAR, c, &mut chars, is_name_char),
                '%' => painted(&mut out, PROP, c, &mut chars, is_name_char),
                '#' => painted(&mut out, OBJECT, c, &mut chars, |n| {
                    n == '#' || n.is_ascii_alphanumeric() || n == '_'
                }),
                '-' if chars.peek().is_some_and(char::is_ascii_digit) => {
                    painted(&mut out, NUMBER, c, &mut chars, is_number_char);
                }
                c if c.is_ascii_digit() => painted(&mut out, NUMBER, c, &mut chars, is_number_char),
                '(' | ')' | '[' | ']' => {
                    out.push_str(DELIMITER);
                    out.push(c);
                    out.push_str(RESET);
                }
                c if c.is_alphabetic() => {
                    let mut word = String::from(c);
                    while let Some(next) = chars.next_if(|&n| is_name_char(n)) {
                        word.push(next);
                    }
                    match word_color(&word) {
                        Some(color) => {
                            out.push_str(color);
                            out.push_str(&word);
                            out.push_str(RESET);
                        }
                        None => out.push_str(&word),
                    }
                }
                _ => out.push(c),
            }
        }

        Cow::Owned(out)
    }
}

fn painted(
    out: &mut String,
    color: &str,
    first: char,
    chars: &mut Peekable<Chars<'_>>,
    continues: impl Fn(char) -> bool,
) {
    out.push_str(color);
    out.push(first);
    while let Some(next) = chars.next_if(|&n| continues(n)) {
        out.push(next);
    }
    out.push_str(RESET);
}

fn string_body(chars: &mut Peekable<Chars<'_>>, out: &mut String) {
    while let Some(c) = chars.next() {
        out.push(c);
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '\'' => return,
            _ => {}
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

fn word_color(word: &str) -> Option<&'static str> {
    match word {
        "if" | "while" | "end" | "and" | "or" => Some(KEYWORD),
        "true" | "false" | "null" => Some(LITERAL),
        _ => None,
    }
}
