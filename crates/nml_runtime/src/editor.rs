//! Line editor abstraction for the REPL.
//!
//! The REPL reads through [`LineEditor`] so tests can feed it scripted
//! input. [`RustylineEditor`] is the interactive implementation.

use std::borrow::Cow;

use nml_foundation::{Error, Result};
use nml_language::PREPOSITIONS;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::HistoryHinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Config, Context, Editor, Helper, Hinter};

use crate::highlight::NmlHighlighter;
use crate::repl::COMMANDS;

/// Result of reading a line from the editor.
#[derive(Debug)]
pub enum ReadResult {
    /// A line was read.
    Line(String),
    /// User pressed Ctrl+C.
    Interrupted,
    /// User pressed Ctrl+D.
    Eof,
}

/// Source of REPL input lines.
pub trait LineEditor {
    /// Reads a line with the given prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from the terminal fails.
    fn read_line(&mut self, prompt: &str) -> Result<ReadResult>;

    /// Adds a line to history.
    fn add_history(&mut self, line: &str);
}

#[derive(Helper, Hinter)]
struct NmlHelper {
    completer: WordCompleter,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
    highlighter: NmlHighlighter,
}

impl Completer for NmlHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        Ok(self.completer.complete(line, pos))
    }
}

impl Validator for NmlHelper {}

impl Highlighter for NmlHelper {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        self.highlighter.highlight(line, pos)
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Cow::Owned(format!("\x1b[1;32m{prompt}\x1b[0m"))
        } else {
            Cow::Borrowed(prompt)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[2m{hint}\x1b[0m"))
    }
}

/// Completes REPL commands at the start of a line and NML words elsewhere.
struct WordCompleter {
    words: Vec<String>,
}

impl WordCompleter {
    fn new() -> Self {
        let mut words: Vec<String> = ["if", "while", "end", "and", "or", "true", "false", "null"]
            .iter()
            .map(ToString::to_string)
            .collect();
        // Only single-word prepositions complete usefully.
        words.extend(
            PREPOSITIONS
                .iter()
                .filter(|p| !p.contains(' '))
                .map(ToString::to_string),
        );
        words.sort();
        words.dedup();
        Self { words }
    }

    fn complete(&self, line: &str, pos: usize) -> (usize, Vec<Pair>) {
        let start = line[..pos]
            .rfind(|c: char| c.is_whitespace() || "()[]".contains(c))
            .map_or(0, |i| i + 1);
        let word = &line[start..pos];

        let candidates: Vec<&str> = if start == 0 && word.starts_with('.') {
            COMMANDS.iter().map(|(name, _)| *name).collect()
        } else if word.is_empty() {
            Vec::new()
        } else {
            self.words.iter().map(String::as_str).collect()
        };

        let pairs = candidates
            .into_iter()
            .filter(|c| c.starts_with(word))
            .map(|c| Pair {
                display: c.to_string(),
                replacement: c.to_string(),
            })
            .collect();
        (start, pairs)
    }
}

/// Line editor backed by rustyline.
pub struct RustylineEditor {
    editor: Editor<NmlHelper, DefaultHistory>,
}

impl RustylineEditor {
    /// Creates an editor with history, hints, completion, and highlighting.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be set up.
    pub fn new() -> Result<Self> {
        let config = Config::builder()
            .auto_add_history(false)
            .max_history_size(1000)
            .map_err(|e| Error::Io(e.to_string()))?
            .build();

        let helper = NmlHelper {
            completer: WordCompleter::new(),
            hinter: HistoryHinter::new(),
            highlighter: NmlHighlighter::new(),
        };

        let mut editor = Editor::with_config(config).map_err(|e| Error::Io(e.to_string()))?;
        editor.set_helper(Some(helper));
        Ok(Self { editor })
    }
}

impl LineEditor for RustylineEditor {
    fn read_line(&mut self, prompt: &str) -> Result<ReadResult> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadResult::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadResult::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadResult::Eof),
            Err(e) => Err(Error::Io(e.to_string())),
        }
    }

    fn add_history(&mut self, line: &str) {
        let _ = self.editor.add_history_entry(line);
    }
}
