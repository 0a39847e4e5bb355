//! Integration tests for Layer 3: Runtime
//!
//! Sessions and the REPL driven through their public API.

use nml_foundation::{Error, Result, RuntimeError, Value};
use nml_runtime::{LineEditor, Outcome, ReadResult, Repl, Session, SessionConfig};
use nml_world::TaskConfig;

/// Replays a fixed list of lines, then reports end of input.
struct Script {
    lines: std::vec::IntoIter<String>,
}

impl Script {
    fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .into_iter(),
        }
    }
}

impl LineEditor for Script {
    fn read_line(&mut self, _prompt: &str) -> Result<ReadResult> {
        Ok(self.lines.next().map_or(ReadResult::Eof, ReadResult::Line))
    }

    fn add_history(&mut self, _line: &str) {}
}

fn lines(outcome: Outcome) -> Vec<String> {
    match outcome {
        Outcome::Output(lines) => lines,
        other => panic!("expected output, got {other:?}"),
    }
}

#[test]
fn a_small_adventure() {
    let session = Session::new();
    session
        .define_verb(
            "take",
            "\
if $_directObj in %inventory
  say you already have $_directObj
end
if ($_directObj in %inventory) == false
  %inventory[%count] = $_directObj
  %count += 1
  say taken
end
$_return = %count",
        )
        .unwrap();
    session.run_source("%inventory = []\n%count = 0").unwrap();

    assert_eq!(session.call_line("take lamp").unwrap(), Value::from(1));
    assert_eq!(session.call_line("take sword").unwrap(), Value::from(2));
    assert_eq!(session.call_line("take lamp").unwrap(), Value::from(2));
    assert_eq!(
        session.take_output(),
        vec!["taken", "taken", "you already have lamp"]
    );
}

#[test]
fn verbs_call_verbs_across_the_session() {
    let session = Session::new();
    session
        .define_verb("shout", "$line = $_directObj + '!'\nsay $line")
        .unwrap();
    session
        .define_verb("greet", "shout ('hello ' + $_directObj)\n$_return = true")
        .unwrap();

    assert_eq!(session.call_line("greet world").unwrap(), Value::Bool(true));
    assert_eq!(session.take_output(), vec!["hello world!"]);
}

#[test]
fn runaway_scripts_hit_the_tick_budget() {
    let session = Session::with_config(SessionConfig {
        task: TaskConfig {
            max_ticks: Some(100),
        },
        ..SessionConfig::default()
    });
    let err = session
        .run_source("$i = 0\nwhile $i >= 0\n  $i += 1\nend")
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Runtime(RuntimeError::TickLimitExceeded(100))
    ));

    // The session keeps working afterwards.
    assert_eq!(session.run_source("$_return = 1 + 1").unwrap(), Value::from(2));
}

#[test]
fn repl_defines_and_calls_a_verb() {
    let mut repl = Repl::with_editor(Script::new(&[])).without_banner();
    for line in ["$_return = $_directObj + ' and ' + $_indirectObj"] {
        repl.handle_line(line).unwrap();
    }
    repl.handle_line(".verb join").unwrap();
    assert_eq!(
        lines(repl.handle_line(".call join salt with pepper").unwrap()),
        vec!["=> 'salt and pepper'"]
    );
}

#[test]
fn repl_session_survives_save_and_load() {
    let path = std::env::temp_dir().join(format!("nml_repl_it_{}.msgpack", std::process::id()));
    let path = path.to_string_lossy().into_owned();

    let mut repl = Repl::with_editor(Script::new(&[])).without_banner();
    repl.handle_line("%gold = 12").unwrap();
    repl.handle_line(".run").unwrap();
    repl.handle_line(&format!(".save {path}")).unwrap();

    let mut other = Repl::with_editor(Script::new(&[])).without_banner();
    other.handle_line(&format!(".load {path}")).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(
        lines(other.handle_line(".props").unwrap()),
        vec!["gold = 12"]
    );
}

#[test]
fn repl_run_loop_processes_scripted_input() {
    let editor = Script::new(&["%a = 1", "%b = %a + 1", ".run", "%c = 3"]);
    let mut repl = Repl::with_editor(editor).without_banner();
    repl.run().unwrap();

    let session = repl.session();
    assert_eq!(
        session.props().unwrap(),
        vec![
            ("a".to_string(), Value::from(1)),
            ("b".to_string(), Value::from(2)),
        ]
    );
    // Input ended with a line still buffered.
    assert_eq!(repl.buffer(), &["%c = 3".to_string()]);
}
