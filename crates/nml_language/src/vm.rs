//! Resumable tree-walking interpreter for compiled NML.
//!
//! A [`Vm`] executes one statement per [`Vm::step`]. It owns its locals and
//! an instruction path into the AST, and asks its host for everything else
//! through the [`Request`] protocol.
//!
//! # Suspension and replay
//!
//! A statement that needs the host stops at the first unanswered request.
//! Answers are appended to a per-statement reply log; the next step
//! re-evaluates the statement from the beginning, taking earlier answers
//! from the log in order. Local writes and the final property write of an
//! assignment happen after every read, so they run exactly once.
//!
//! Moving the instruction path forward is its own phase: re-entering a
//! `while` evaluates its condition, which may itself suspend.
//!
//! # Delegation
//!
//! A verb call answered with [`Reply::Frame`] installs a sub-VM. While it is
//! present, `step` and `resume` act on the sub-VM. When the sub-VM reaches
//! the end of its script, its `$_return` local is logged as the call's
//! answer and the parent re-runs the calling statement on its next step.

mod eval;
mod request;


use std::collections::HashMap;
use std::sync::Arc;

use nml_foundation::{ObjectId, RuntimeError, SyntaxError, Value};

use crate::ast::{Statement, enclosing_block, find_ins};
use crate::compiler::code_to_ast;
pub use request::{CallArgs, Reply, Request, Step};

use eval::{Flow, Interrupt};

/// Local that holds a verb's result.
pub const RETURN_LOCAL: &str = "_return";

/// Interpreter limits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VmConfig {
    /// Maximum number of nested verb frames below the root VM.
    pub max_call_depth: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self { max_call_depth: 32 }
    }
}

/// Which part of the current statement a step works on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Execute,
    Advance,
}

/// A suspendable interpreter for one script.
#[derive(Debug)]
pub struct Vm {
    owner: ObjectId,
    ast: Arc<Vec<Statement>>,
    locals: HashMap<String, Value>,
    ip: Vec<usize>,
    phase: Phase,
    sub_vm: Option<Box<Vm>>,
    replies: Vec<Value>,
    cursor: usize,
    awaiting: Option<Request>,
    failure: Option<RuntimeError>,
    finished: bool,
    depth: usize,
    config: VmConfig,
}

impl Vm {
    /// Creates a VM that runs `ast` on behalf of `owner`.
    #[must_use]
    pub fn new(owner: ObjectId, ast: Vec<Statement>) -> Self {
        Self {
            owner,
            ast: Arc::new(ast),
            locals: HashMap::new(),
            ip: vec![0],
            phase: Phase::Execute,
            sub_vm: None,
            replies: Vec::new(),
            cursor: 0,
            awaiting: None,
            failure: None,
            finished: false,
            depth: 0,
            config: VmConfig::default(),
        }
    }

    /// Compiles `source` and creates a VM for it.
    ///
    /// # Errors
    ///
    /// Returns the compile error, if any.
    pub fn compile(owner: ObjectId, source: &str) -> Result<Self, SyntaxError> {
        Ok(Self::new(owner, code_to_ast(source)?))
    }

    /// Creates a VM for a verb body with the call's context locals set:
    /// `$_verb`, `$_directObj`, `$_prepos`, `$_indirectObj`, `$_params`,
    /// and `$_caller`.
    #[must_use]
    pub fn for_call(owner: ObjectId, ast: Vec<Statement>, args: &CallArgs) -> Self {
        let mut vm = Self::new(owner, ast);
        vm.set_local("_verb", Value::Str(args.verb.clone()));
        vm.set_local("_directObj", args.direct_obj.clone().unwrap_or(Value::Null));
        vm.set_local(
            "_prepos",
            args.preposition.clone().map_or(Value::Null, Value::Str),
        );
        vm.set_local(
            "_indirectObj",
            args.indirect_obj.clone().unwrap_or(Value::Null),
        );
        vm.set_local("_params", Value::Array(args.params.clone()));
        vm.set_local("_caller", Value::Object(args.caller));
        vm
    }

    /// Replaces the interpreter limits.
    #[must_use]
    pub fn with_config(mut self, config: VmConfig) -> Self {
        self.config = config;
        self
    }

    /// The object this script runs as.
    #[must_use]
    pub const fn owner(&self) -> ObjectId {
        self.owner
    }

    /// The compiled script.
    #[must_use]
    pub fn ast(&self) -> &[Statement] {
        &self.ast
    }

    /// Path of the next statement to run.
    #[must_use]
    pub fn ip(&self) -> &[usize] {
        &self.ip
    }

    /// All local variables.
    #[must_use]
    pub const fn locals(&self) -> &HashMap<String, Value> {
        &self.locals
    }

    /// Reads a local variable.
    #[must_use]
    pub fn local(&self, name: &str) -> Option<&Value> {
        self.locals.get(name)
    }

    /// Sets a local variable.
    pub fn set_local(&mut self, name: impl Into<String>, value: Value) {
        self.locals.insert(name.into(), value);
    }

    /// The `$_return` local, or null.
    #[must_use]
    pub fn return_value(&self) -> Value {
        self.locals.get(RETURN_LOCAL).cloned().unwrap_or(Value::Null)
    }

    /// The delegated frame, if a verb call is running.
    #[must_use]
    pub fn sub_vm(&self) -> Option<&Vm> {
        self.sub_vm.as_deref()
    }

    /// The frame that currently executes: the deepest sub-VM, or `self`.
    #[must_use]
    pub fn innermost(&self) -> &Vm {
        let mut vm = self;
        while let Some(sub) = vm.sub_vm.as_deref() {
            vm = sub;
        }
        vm
    }

    /// Nesting depth of this frame (0 for a root VM).
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Number of frames from this VM down to the innermost one.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        1 + self.sub_vm.as_ref().map_or(0, |sub| sub.frame_count())
    }

    /// The unanswered request of the innermost frame, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&Request> {
        self.innermost().awaiting.as_ref()
    }

    /// The newest answer logged for the innermost frame's current statement.
    ///
    /// Right after a delegated frame returns, this is the frame's result.
    #[must_use]
    pub fn last_reply(&self) -> Option<&Value> {
        self.innermost().replies.last()
    }

    /// Returns true once the end of the script has been reached.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Executes one statement.
    ///
    /// Returns [`Step::Continue`] when the statement completed and
    /// [`Step::Suspend`] when it is waiting on the host. Stepping again
    /// while a request is unanswered returns the same request.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::EndOfScript`] from the step that completes
    /// the last statement and from every step after it. Any other error
    /// leaves the instruction path on the failing statement.
    pub fn step(&mut self) -> Result<Step, RuntimeError> {
        if let Some(sub) = self.sub_vm.as_mut() {
            return match sub.step() {
                Ok(step) => Ok(step),
                Err(RuntimeError::EndOfScript) => {
                    let value = sub.return_value();
                    self.sub_vm = None;
                    self.replies.push(value);
                    Ok(Step::Continue)
                }
                Err(err) => {
                    self.sub_vm = None;
                    self.reset_statement();
                    Err(err)
                }
            };
        }

        if let Some(err) = self.failure.take() {
            self.reset_statement();
            return Err(err);
        }
        if let Some(request) = &self.awaiting {
            return Ok(Step::Suspend(request.clone()));
        }
        if self.finished {
            return Err(RuntimeError::EndOfScript);
        }

        let ast = Arc::clone(&self.ast);
        self.cursor = 0;

        if self.phase == Phase::Execute {
            match self.execute(&ast) {
                Ok(Flow::Descend) => {
                    self.ip.push(0);
                    self.reset_statement();
                    return Ok(Step::Continue);
                }
                Ok(Flow::Next) => {
                    self.phase = Phase::Advance;
                    self.reset_statement();
                }
                Err(interrupt) => return self.interrupt(interrupt),
            }
        }

        match self.advance(&ast) {
            Ok(next) => {
                self.phase = Phase::Execute;
                self.reset_statement();
                match next {
                    Some(ip) => {
                        self.ip = ip;
                        Ok(Step::Continue)
                    }
                    None => {
                        self.finished = true;
                        Err(RuntimeError::EndOfScript)
                    }
                }
            }
            Err(interrupt) => self.interrupt(interrupt),
        }
    }

    /// Answers the innermost frame's outstanding request.
    ///
    /// An `Err` answer is raised by the next [`step`](Self::step).
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::UnexpectedReply`] if no request is
    /// outstanding.
    pub fn resume(&mut self, reply: Result<Reply, RuntimeError>) -> Result<(), RuntimeError> {
        if let Some(sub) = self.sub_vm.as_mut() {
            return sub.resume(reply);
        }
        let Some(request) = self.awaiting.take() else {
            return Err(RuntimeError::UnexpectedReply(
                "no request is outstanding".to_string(),
            ));
        };

        match (request, reply) {
            (_, Err(err)) => self.failure = Some(err),
            (Request::Call { .. }, Ok(Reply::Frame(mut frame))) => {
                let depth = self.depth + 1;
                if depth > self.config.max_call_depth {
                    self.failure = Some(RuntimeError::CallDepthExceeded(
                        self.config.max_call_depth,
                    ));
                } else {
                    frame.depth = depth;
                    frame.config = self.config.clone();
                    self.sub_vm = Some(frame);
                }
            }
            (Request::SetProp { .. }, Ok(Reply::Done | Reply::Value(_))) => {
                self.replies.push(Value::Null);
            }
            (
                Request::GetProp { .. } | Request::ResolveAlias { .. } | Request::Call { .. },
                Ok(Reply::Value(value)),
            ) => self.replies.push(value),
            (request, Ok(reply)) => {
                self.failure = Some(RuntimeError::UnexpectedReply(format!(
                    "{} cannot be answered with {}",
                    request.kind(),
                    reply_kind(&reply)
                )));
            }
        }
        Ok(())
    }

    /// Steps up to `max_steps` times, stopping early on suspension.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`step`](Self::step), including
    /// [`RuntimeError::EndOfScript`].
    pub fn run(&mut self, max_steps: usize) -> Result<Step, RuntimeError> {
        for _ in 0..max_steps {
            if let Step::Suspend(request) = self.step()? {
                return Ok(Step::Suspend(request));
            }
        }
        Ok(Step::Continue)
    }

    fn interrupt(&mut self, interrupt: Interrupt) -> Result<Step, RuntimeError> {
        match interrupt {
            Interrupt::Suspend(request) => {
                self.awaiting = Some(request.clone());
                Ok(Step::Suspend(request))
            }
            Interrupt::Fail(err) => {
                if err.is_end_of_script() {
                    self.finished = true;
                }
                self.reset_statement();
                Err(err)
            }
        }
    }

    fn reset_statement(&mut self) {
        self.replies.clear();
        self.cursor = 0;
        self.awaiting = None;
    }

    /// Runs the statement at `ip`.
    fn execute(&mut self, ast: &[Statement]) -> Result<Flow, Interrupt> {
        let Some(statement) = find_ins(&self.ip, ast) else {
            return Err(Interrupt::Fail(RuntimeError::EndOfScript));
        };
        match statement {
            Statement::If { condition, block } | Statement::While { condition, block } => {
                let value = self.eval_expr(condition)?;
                if value.is_truthy() && !block.is_empty() {
                    Ok(Flow::Descend)
                } else {
                    Ok(Flow::Next)
                }
            }
            Statement::Assign { op, dst, src } => {
                self.assign(*op, dst, src)?;
                Ok(Flow::Next)
            }
            Statement::Call(call) => {
                self.call_verb(call)?;
                Ok(Flow::Next)
            }
        }
    }

    /// Computes the path after `ip`, re-entering loops whose condition
    /// still holds. `None` means the script is complete.
    fn advance(&mut self, ast: &[Statement]) -> Result<Option<Vec<usize>>, Interrupt> {
        let mut ip = self.ip.clone();
        loop {
            let len = enclosing_block(&ip, ast).map_or(0, <[Statement]>::len);
            let Some(last) = ip.last_mut() else {
                return Ok(None);
            };
            if *last + 1 < len {
                *last += 1;
                return Ok(Some(ip));
            }
            if ip.len() == 1 {
                return Ok(None);
            }
            ip.pop();
            if let Some(Statement::While { condition, .. }) = find_ins(&ip, ast) {
                if self.eval_expr(condition)?.is_truthy() {
                    ip.push(0);
                    return Ok(Some(ip));
                }
            }
        }
    }
}

fn reply_kind(reply: &Reply) -> &'static str {
    match reply {
        Reply::Value(_) => "a value",
        Reply::Done => "done",
        Reply::Frame(_) => "a frame",
    }
}
