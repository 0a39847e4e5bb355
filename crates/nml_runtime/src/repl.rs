//! The interactive REPL.
//!
//! Source lines are buffered until a command acts on them. `.run` executes
//! the buffer on the session object and clears it; `.verb NAME` stores it
//! as a verb instead. Every other command leaves the buffer alone, except
//! `.clear`.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use nml_foundation::{Error, Result, Value};
use nml_language::code_to_ast;

use crate::editor::{LineEditor, ReadResult, RustylineEditor};
use crate::session::Session;

/// REPL commands and their help text.
pub const COMMANDS: &[(&str, &str)] = &[
    (".run", "run the buffered lines on ##Me, then clear them"),
    (".ast", "print the compiled buffer"),
    (".verb", "NAME: store the buffer as a verb on ##Me"),
    (".verbs", "list the verbs on ##Me"),
    (".call", "VERB ARGS: call a verb and print its result"),
    (".props", "list the properties on ##Me"),
    (".clear", "discard the buffer"),
    (".trace", "on|off|show: control execution tracing"),
    (".save", "PATH: save the world"),
    (".load", "PATH: load a world"),
    (".help", "show this list"),
    (".quit", "leave the REPL"),
];

const TRACE_SHOW_COUNT: usize = 20;

/// What handling one line produced.
#[derive(Debug)]
pub enum Outcome {
    /// The line was added to the buffer.
    Buffered,
    /// Lines to show the user.
    Output(Vec<String>),
    /// A script failed after writing `output`.
    Failed {
        /// Lines written before the failure.
        output: Vec<String>,
        /// The failure.
        error: Error,
    },
    /// The user asked to leave.
    Quit,
}

/// The interactive REPL.
pub struct Repl<E: LineEditor = RustylineEditor> {
    editor: E,
    session: Session,
    buffer: Vec<String>,
    show_banner: bool,
    prompt: String,
    continuation_prompt: String,
}

impl Repl<RustylineEditor> {
    /// Creates a REPL with the rustyline editor.
    ///
    /// # Errors
    ///
    /// Returns an error if the editor fails to initialize.
    pub fn new() -> Result<Self> {
        Ok(Self::with_editor(RustylineEditor::new()?))
    }
}

impl<E: LineEditor> Repl<E> {
    /// Creates a REPL reading from `editor`.
    pub fn with_editor(editor: E) -> Self {
        Self {
            editor,
            session: Session::new(),
            buffer: Vec::new(),
            show_banner: true,
            prompt: "nml> ".to_string(),
            continuation_prompt: "...> ".to_string(),
        }
    }

    /// Replaces the session.
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    /// Disables the welcome banner.
    #[must_use]
    pub const fn without_banner(mut self) -> Self {
        self.show_banner = false;
        self
    }

    /// The session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// The session, mutably.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Lines waiting in the buffer.
    #[must_use]
    pub fn buffer(&self) -> &[String] {
        &self.buffer
    }

    /// Runs the loop until `.quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the editor fails.
    pub fn run(&mut self) -> Result<()> {
        if self.show_banner {
            print_banner();
        }
        while self.read_eval_print()? {}
        println!();
        Ok(())
    }

    fn read_eval_print(&mut self) -> Result<bool> {
        let prompt = if self.buffer.is_empty() {
            &self.prompt
        } else {
            &self.continuation_prompt
        };

        match self.editor.read_line(prompt)? {
            ReadResult::Line(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history(&line);
                }
                match self.handle_line(&line) {
                    Ok(Outcome::Quit) => return Ok(false),
                    Ok(outcome) => print_outcome(outcome),
                    Err(e) => print_error(&e),
                }
                Ok(true)
            }
            ReadResult::Interrupted => {
                if !self.buffer.is_empty() {
                    self.buffer.clear();
                    println!("buffer cleared");
                }
                Ok(true)
            }
            ReadResult::Eof => Ok(false),
        }
    }

    /// Handles one input line: a command if it starts with `.`, otherwise a
    /// source line for the buffer.
    ///
    /// # Errors
    ///
    /// Compile errors from `.ast` and `.verb`, and file errors from `.save`
    /// and `.load`. Script failures come back as [`Outcome::Failed`].
    pub fn handle_line(&mut self, line: &str) -> Result<Outcome> {
        let trimmed = line.trim();
        if trimmed.starts_with('.') {
            let (name, rest) = trimmed
                .split_once(char::is_whitespace)
                .unwrap_or((trimmed, ""));
            return self.command(name, rest.trim());
        }
        self.buffer.push(line.to_string());
        Ok(Outcome::Buffered)
    }

    fn command(&mut self, name: &str, arg: &str) -> Result<Outcome> {
        let outcome = match name {
            ".run" => {
                let source = self.take_buffer();
                let result = self.session.run_source(&source);
                self.finish_script(result)
            }
            ".ast" => {
                let ast = code_to_ast(&self.source())?;
                Outcome::Output(format!("{ast:#?}").lines().map(String::from).collect())
            }
            ".verb" => {
                if arg.is_empty() {
                    return Ok(message("usage: .verb NAME"));
                }
                self.session.define_verb(arg, &self.source())?;
                self.buffer.clear();
                message(format!("verb {arg} defined on {}", self.session.player()))
            }
            ".verbs" => {
                let names = self.session.world().verb_names(self.session.player());
                if names.is_empty() {
                    message("(no verbs)")
                } else {
                    Outcome::Output(names)
                }
            }
            ".call" => {
                if arg.is_empty() {
                    return Ok(message("usage: .call VERB ARGS"));
                }
                let result = self.session.call_line(arg);
                self.finish_script(result)
            }
            ".props" => {
                let props = self.session.props()?;
                if props.is_empty() {
                    message("(no properties)")
                } else {
                    Outcome::Output(
                        props
                            .into_iter()
                            .map(|(name, value)| format!("{name} = {}", display(&value)))
                            .collect(),
                    )
                }
            }
            ".clear" => {
                self.buffer.clear();
                message("buffer cleared")
            }
            ".trace" => match arg {
                "on" => {
                    self.session.set_trace(true);
                    message("tracing on")
                }
                "off" => {
                    self.session.set_trace(false);
                    message("tracing off")
                }
                "" | "show" => {
                    let text = self.session.tracer().lock().format_recent(TRACE_SHOW_COUNT);
                    Outcome::Output(text.lines().map(String::from).collect())
                }
                _ => message("usage: .trace on|off|show"),
            },
            ".save" => {
                if arg.is_empty() {
                    return Ok(message("usage: .save PATH"));
                }
                self.session.save(arg)?;
                message(format!("saved to {arg}"))
            }
            ".load" => {
                if arg.is_empty() {
                    return Ok(message("usage: .load PATH"));
                }
                self.session.load(arg)?;
                message(format!("loaded {arg}"))
            }
            ".help" => Outcome::Output(
                COMMANDS
                    .iter()
                    .map(|(name, help)| format!("{name:<8} {help}"))
                    .collect(),
            ),
            ".quit" | ".exit" => Outcome::Quit,
            other => message(format!("unknown command {other} (try .help)")),
        };
        Ok(outcome)
    }

    fn source(&self) -> String {
        self.buffer.join("\n")
    }

    fn take_buffer(&mut self) -> String {
        let source = self.source();
        self.buffer.clear();
        source
    }

    fn finish_script(&self, result: Result<Value>) -> Outcome {
        let mut output = self.session.take_output();
        match result {
            Ok(Value::Null) => Outcome::Output(output),
            Ok(value) => {
                output.push(format!("=> {}", display(&value)));
                Outcome::Output(output)
            }
            Err(error) => Outcome::Failed { output, error },
        }
    }

    /// Runs a script file on the session object, printing what it says.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the script fails.
    pub fn eval_file(&mut self, path: &Path) -> Result<Value> {
        let source = fs::read_to_string(path)
            .map_err(|e| Error::Io(format!("failed to read {}: {e}", path.display())))?;
        let result = self.session.run_source(&source);
        for line in self.session.take_output() {
            println!("{line}");
        }
        result
    }
}

fn message(text: impl Into<String>) -> Outcome {
    Outcome::Output(vec![text.into()])
}

/// Strings are quoted so they can be told apart from words.
fn display(value: &Value) -> String {
    match value {
        Value::Str(s) => format!("'{s}'"),
        other => other.to_string(),
    }
}

fn print_outcome(outcome: Outcome) {
    match outcome {
        Outcome::Output(lines) => {
            for line in lines {
                println!("{line}");
            }
        }
        Outcome::Failed { output, error } => {
            for line in output {
                println!("{line}");
            }
            print_error(&error);
        }
        Outcome::Buffered | Outcome::Quit => {}
    }
}

fn print_error(error: &Error) {
    eprintln!("\x1b[31mError: {error}\x1b[0m");
}

fn print_banner() {
    println!("\x1b[1;36mNML\x1b[0m {}", env!("CARGO_PKG_VERSION"));
    println!("Lines are buffered; .run executes them, .help lists commands, Ctrl+D exits.\n");
    let _ = io::stdout().flush();
}
