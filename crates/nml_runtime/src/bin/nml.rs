//! NML CLI entry point.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use nml_foundation::Value;
use nml_runtime::{Repl, Session, SessionConfig};
use nml_world::{MemoryStore, TaskConfig, load_from_file};

/// CLI configuration parsed from arguments.
#[derive(Default)]
struct CliConfig {
    files: Vec<PathBuf>,
    batch_mode: bool,
    show_help: bool,
    show_version: bool,
    trace: bool,
    max_ticks: Option<u64>,
    seed: Option<u64>,
    load_world: Option<PathBuf>,
    save_world: Option<PathBuf>,
    dump_world: bool,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn value_of<'a>(args: &'a [String], i: &mut usize, flag: &str) -> Result<&'a str, String> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn parse_args(args: &[String]) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let mut config = CliConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => config.show_help = true,
            "-V" | "--version" => config.show_version = true,
            "-b" | "--batch" => config.batch_mode = true,
            "--trace" => config.trace = true,
            "--dump-world" => config.dump_world = true,
            "--max-ticks" => {
                let raw = value_of(args, &mut i, "--max-ticks")?;
                config.max_ticks = Some(
                    raw.parse()
                        .map_err(|_| format!("invalid --max-ticks value: {raw}"))?,
                );
            }
            "--seed" => {
                let raw = value_of(args, &mut i, "--seed")?;
                config.seed = Some(raw.parse().map_err(|_| format!("invalid --seed value: {raw}"))?);
            }
            "--load-world" => {
                config.load_world = Some(PathBuf::from(value_of(args, &mut i, "--load-world")?));
            }
            "--save-world" => {
                config.save_world = Some(PathBuf::from(value_of(args, &mut i, "--save-world")?));
            }
            arg if arg.starts_with('-') => {
                return Err(format!("unknown option: {arg}").into());
            }
            path => config.files.push(PathBuf::from(path)),
        }
        i += 1;
    }

    Ok(config)
}

fn session_config(config: &CliConfig) -> SessionConfig {
    let mut session = SessionConfig {
        trace: config.trace,
        ..SessionConfig::default()
    };
    if let Some(seed) = config.seed {
        session.seed = seed;
    }
    if let Some(max) = config.max_ticks {
        session.task = TaskConfig {
            max_ticks: Some(max),
        };
    }
    session
}

fn run(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = parse_args(&args)?;

    if config.show_help {
        print_help();
        return Ok(());
    }

    if config.show_version {
        println!("nml {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let settings = session_config(&config);
    let session = match &config.load_world {
        Some(path) => Session::with_world(load_from_file(path)?, settings),
        None => Session::with_config(settings),
    };

    let mut repl = Repl::new()?.with_session(session);

    for file in &config.files {
        let value = repl.eval_file(file)?;
        if value != Value::Null {
            println!("=> {value}");
        }
    }

    if config.dump_world {
        dump_world_state(repl.session().world());
    }

    if !config.batch_mode {
        // Files already set the scene.
        if !config.files.is_empty() {
            repl = repl.without_banner();
        }
        repl.run()?;
    }

    if let Some(path) = &config.save_world {
        repl.session().save(path)?;
        eprintln!("world saved to {}", path.display());
    }

    Ok(())
}

fn dump_world_state(world: &MemoryStore) {
    println!("\x1b[1;36m=== World State ===\x1b[0m");
    println!("Seed: {}", world.seed());
    println!("Objects: {}", world.len());

    for (alias, id) in world.aliases() {
        println!("  ##{alias} = {id}");
    }
    for id in world.ids() {
        println!("  {id}");
        if let Ok(props) = world.props(id) {
            for (name, value) in props {
                println!("    %{name} = {value}");
            }
        }
        for verb in world.verb_names(id) {
            println!("    verb {verb}");
        }
    }

    println!();
}

fn print_help() {
    println!(
        "\x1b[1mNML\x1b[0m - Resumable scripting for verbs on world objects

\x1b[1mUSAGE:\x1b[0m
    nml [OPTIONS] [FILES...]

\x1b[1mARGUMENTS:\x1b[0m
    [FILES...]    Scripts to run on ##Me before starting the REPL

\x1b[1mOPTIONS:\x1b[0m
    -h, --help             Print help information
    -V, --version          Print version information
    -b, --batch            Run files and exit (no REPL)
    --seed N               Seed for new object ids
    --load-world PATH      Start from a saved world
    --save-world PATH      Save the world on exit

\x1b[1mDEBUG OPTIONS:\x1b[0m
    --trace                Trace VM steps, requests, and frames
    --max-ticks N          Tick budget for each script
    --dump-world           Dump world state after running files

\x1b[1mEXAMPLES:\x1b[0m
    nml                              Start interactive REPL
    nml setup.nml                    Run setup.nml, then start REPL
    nml -b test.nml                  Run test.nml and exit
    nml --load-world w.msgpack       Resume a saved world

\x1b[1mREPL COMMANDS:\x1b[0m
    .run                 Run the buffered lines
    .verb NAME           Store the buffer as a verb
    .call VERB ARGS      Call a verb
    .help                List every command
    Ctrl+D               Exit REPL
    Ctrl+C               Discard the buffer"
    );
}
