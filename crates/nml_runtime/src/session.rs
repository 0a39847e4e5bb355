//! Session state for the REPL and the CLI.
//!
//! A session owns a world, the object scripts typed at the prompt run on
//! (registered as `##Me`), and a tracer shared by every task it starts.
//! Verbs with no definition in the world fall back to [`NATIVE_VERBS`].

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use futures::executor::block_on;
use nml_foundation::{ObjectId, Result, RuntimeError, SyntaxError, Value};
use nml_language::{
    AssignOp, CallArgs, Node, RETURN_LOCAL, Ref, Reply, Statement, Target, Vm, VmConfig,
    code_to_ast, lex_line, parse_statement,
};
use nml_world::{
    MemoryStore, ObjectStore, Task, TaskConfig, Tracer, TracerConfig, load_from_file,
    save_to_file,
};
use parking_lot::Mutex;
use tracing::debug;

/// Verbs answered by the session when no object in the chain defines them.
pub const NATIVE_VERBS: &[&str] = &["say"];

/// Alias of the session object.
pub const SESSION_ALIAS: &str = "Me";

/// Settings for a [`Session`].
#[derive(Clone, Debug, Default)]
pub struct SessionConfig {
    /// Seed for new object ids.
    pub seed: u64,
    /// Tick budget for each script.
    pub task: TaskConfig,
    /// Interpreter limits for each script.
    pub vm: VmConfig,
    /// Start with tracing on.
    pub trace: bool,
}

/// A [`MemoryStore`] plus the session's native verbs.
#[derive(Debug)]
pub struct SessionStore {
    world: MemoryStore,
    output: Mutex<Vec<String>>,
}

impl SessionStore {
    /// Wraps a world.
    #[must_use]
    pub fn new(world: MemoryStore) -> Self {
        Self {
            world,
            output: Mutex::new(Vec::new()),
        }
    }

    /// The underlying world.
    #[must_use]
    pub const fn world(&self) -> &MemoryStore {
        &self.world
    }

    /// Lines written by `say` since the last call.
    pub fn take_output(&self) -> Vec<String> {
        std::mem::take(&mut *self.output.lock())
    }

    fn native(&self, args: &CallArgs) -> Reply {
        let line = args
            .params
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        debug!(verb = %args.verb, %line, "native verb");
        self.output.lock().push(line);
        Reply::Value(Value::Null)
    }
}

#[async_trait]
impl ObjectStore for SessionStore {
    async fn get_prop(
        &self,
        object: ObjectId,
        name: &str,
    ) -> std::result::Result<Value, RuntimeError> {
        self.world.get_prop(object, name).await
    }

    async fn set_prop(
        &self,
        object: ObjectId,
        name: &str,
        value: Value,
    ) -> std::result::Result<(), RuntimeError> {
        self.world.set_prop(object, name, value).await
    }

    async fn resolve_alias(&self, name: &str) -> std::result::Result<ObjectId, RuntimeError> {
        self.world.resolve_alias(name).await
    }

    async fn find_verb(
        &self,
        object: ObjectId,
        verb: &str,
    ) -> std::result::Result<String, RuntimeError> {
        self.world.find_verb(object, verb).await
    }

    async fn dispatch_call(
        &self,
        object: ObjectId,
        args: CallArgs,
    ) -> std::result::Result<Reply, RuntimeError> {
        match self.resolve_and_call(object, &args).await {
            Ok(vm) => Ok(Reply::Frame(Box::new(vm))),
            Err(RuntimeError::VerbNotFound(_)) if NATIVE_VERBS.contains(&args.verb.as_str()) => {
                Ok(self.native(&args))
            }
            Err(err) => Err(err),
        }
    }
}

/// A world and the object a user drives it from.
pub struct Session {
    store: SessionStore,
    player: ObjectId,
    config: SessionConfig,
    tracer: Arc<Mutex<Tracer>>,
}

impl Session {
    /// Creates a session with an empty world and default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    /// Creates a session with an empty world.
    #[must_use]
    pub fn with_config(config: SessionConfig) -> Self {
        let world = MemoryStore::with_seed(config.seed);
        Self::with_world(world, config)
    }

    /// Creates a session on an existing world, reusing its `##Me` object
    /// if it has one.
    #[must_use]
    pub fn with_world(world: MemoryStore, config: SessionConfig) -> Self {
        let player = session_object(&world);
        let mut tracer_config = TracerConfig::new().to_stderr();
        if config.trace {
            tracer_config = tracer_config.enabled();
        }
        Self {
            store: SessionStore::new(world),
            player,
            config,
            tracer: Arc::new(Mutex::new(Tracer::new(tracer_config))),
        }
    }

    /// The session object.
    #[must_use]
    pub const fn player(&self) -> ObjectId {
        self.player
    }

    /// The world.
    #[must_use]
    pub const fn world(&self) -> &MemoryStore {
        self.store.world()
    }

    /// The store scripts run against.
    #[must_use]
    pub const fn store(&self) -> &SessionStore {
        &self.store
    }

    /// The tracer shared by this session's tasks.
    #[must_use]
    pub fn tracer(&self) -> &Arc<Mutex<Tracer>> {
        &self.tracer
    }

    /// Turns tracing on or off.
    pub fn set_trace(&self, enabled: bool) {
        let mut tracer = self.tracer.lock();
        if enabled {
            tracer.enable();
        } else {
            tracer.disable();
        }
    }

    /// Returns whether tracing is on.
    #[must_use]
    pub fn is_tracing(&self) -> bool {
        self.tracer.lock().is_enabled()
    }

    /// Lines written by `say` since the last call.
    pub fn take_output(&self) -> Vec<String> {
        self.store.take_output()
    }

    /// Compiles and runs a script on the session object and returns its
    /// `$_return`.
    ///
    /// # Errors
    ///
    /// The compile error or the runtime error that stopped the script.
    pub fn run_source(&self, source: &str) -> Result<Value> {
        let vm = Vm::compile(self.player, source)?;
        self.run_vm(vm)
    }

    /// Runs one verb line, such as `look at ##Box`, and returns the verb's
    /// result.
    ///
    /// # Errors
    ///
    /// A syntax error if the line is not a verb call, or the runtime error
    /// that stopped the verb.
    pub fn call_line(&self, line: &str) -> Result<Value> {
        let statement = parse_statement(lex_line(line.trim(), 1)?, 1)?;
        let call = match statement {
            Statement::Call(call) => call,
            other => {
                let message = format!("expected a verb call, found {}", other.kind());
                return Err(SyntaxError::new(1, message).into());
            }
        };
        let ast = vec![Statement::Assign {
            op: AssignOp::Set,
            dst: Target::Var(Ref::new(RETURN_LOCAL)),
            src: vec![Node::Call(Box::new(call))],
        }];
        self.run_vm(Vm::new(self.player, ast))
    }

    fn run_vm(&self, vm: Vm) -> Result<Value> {
        let mut task = Task::new(&self.store, vm)
            .with_config(self.config.task.clone())
            .with_vm_config(self.config.vm.clone())
            .with_tracer(Arc::clone(&self.tracer));
        Ok(block_on(task.run_to_end())?)
    }

    /// Stores `source` as a verb on the session object after checking that
    /// it compiles.
    ///
    /// # Errors
    ///
    /// The compile error, if any.
    pub fn define_verb(&self, name: &str, source: &str) -> Result<()> {
        code_to_ast(source)?;
        self.world().set_verb(self.player, name, source)?;
        Ok(())
    }

    /// Properties set on the session object.
    ///
    /// # Errors
    ///
    /// Fails only if the session object was removed from the world.
    pub fn props(&self) -> Result<Vec<(String, Value)>> {
        Ok(self.world().props(self.player)?)
    }

    /// Saves the world to a file.
    ///
    /// # Errors
    ///
    /// I/O and encoding errors.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_to_file(self.world(), path)
    }

    /// Replaces the world with one loaded from a file. Tracing settings
    /// carry over.
    ///
    /// # Errors
    ///
    /// I/O and decoding errors; the current world is kept on failure.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let world = load_from_file(path)?;
        self.player = session_object(&world);
        self.store = SessionStore::new(world);
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn session_object(world: &MemoryStore) -> ObjectId {
    match world.alias(SESSION_ALIAS) {
        Some(id) if world.contains(id) => id,
        _ => {
            let id = world.create(None);
            world.set_alias(SESSION_ALIAS, id);
            id
        }
    }
}
