//! Running a script against a store.
//!
//! A [`Task`] owns a root [`Vm`] and answers each of its suspensions from an
//! [`ObjectStore`]. One tick is one VM step plus, if the step suspended,
//! serving the request and handing the answer back.

use std::sync::Arc;

use nml_foundation::{ObjectId, RuntimeError, Value};
use nml_language::{CallArgs, Reply, Request, Step, Vm, VmConfig};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::store::{ObjectStore, serve};
use crate::trace::{TraceEvent, Tracer};

/// Limits for a task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskConfig {
    /// Ticks allowed before [`RuntimeError::TickLimitExceeded`]. `None`
    /// runs until the script ends.
    pub max_ticks: Option<u64>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            max_ticks: Some(1_000_000),
        }
    }
}

/// What one tick did.
#[derive(Clone, Debug, PartialEq)]
pub enum Tick {
    /// A statement completed.
    Stepped,
    /// A request of this kind was served and answered.
    Served(&'static str),
    /// The script ended with this `$_return`.
    Finished(Value),
}

/// A script in progress.
pub struct Task<'s, S: ObjectStore + ?Sized> {
    store: &'s S,
    vm: Vm,
    ticks: u64,
    config: TaskConfig,
    tracer: Option<Arc<Mutex<Tracer>>>,
}

impl<'s, S: ObjectStore + ?Sized> Task<'s, S> {
    /// Creates a task that runs `vm` against `store`.
    #[must_use]
    pub fn new(store: &'s S, vm: Vm) -> Self {
        Self {
            store,
            vm,
            ticks: 0,
            config: TaskConfig::default(),
            tracer: None,
        }
    }

    /// Creates a task that runs a verb, as if `args.caller` had called it
    /// on `object`.
    ///
    /// # Errors
    ///
    /// Lookup and compile errors from
    /// [`ObjectStore::resolve_and_call`].
    pub async fn for_call(
        store: &'s S,
        object: ObjectId,
        args: &CallArgs,
    ) -> Result<Self, RuntimeError> {
        let vm = store.resolve_and_call(object, args).await?;
        Ok(Self::new(store, vm))
    }

    /// Replaces the task limits.
    #[must_use]
    pub fn with_config(mut self, config: TaskConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the interpreter limits of the root VM.
    #[must_use]
    pub fn with_vm_config(mut self, config: VmConfig) -> Self {
        self.vm = self.vm.with_config(config);
        self
    }

    /// Records execution into `tracer`.
    #[must_use]
    pub fn with_tracer(mut self, tracer: Arc<Mutex<Tracer>>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// The root VM.
    #[must_use]
    pub const fn vm(&self) -> &Vm {
        &self.vm
    }

    /// Gives up the task and returns its root VM.
    #[must_use]
    pub fn into_vm(self) -> Vm {
        self.vm
    }

    /// Ticks used so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Runs one tick.
    ///
    /// A failed request is not an error here: its error goes back to the VM,
    /// which raises it on the following tick.
    ///
    /// # Errors
    ///
    /// The VM's runtime errors, and [`RuntimeError::TickLimitExceeded`] once
    /// the configured number of ticks has been used.
    pub async fn tick(&mut self) -> Result<Tick, RuntimeError> {
        if let Some(limit) = self.config.max_ticks {
            if self.ticks >= limit {
                warn!(limit, "task ran out of ticks");
                return Err(RuntimeError::TickLimitExceeded(limit));
            }
        }
        self.ticks += 1;
        let frames = self.vm.frame_count();

        match self.vm.step() {
            Ok(Step::Continue) => {
                self.after_step(frames);
                Ok(Tick::Stepped)
            }
            Ok(Step::Suspend(request)) => {
                let kind = request.kind();
                self.serve(request).await?;
                Ok(Tick::Served(kind))
            }
            Err(RuntimeError::EndOfScript) => {
                let value = self.vm.return_value();
                let ticks = self.ticks;
                debug!(ticks, "task finished");
                self.trace(|| TraceEvent::Finished { ticks });
                Ok(Tick::Finished(value))
            }
            Err(err) => {
                warn!(tick = self.ticks, error = %err, "task failed");
                self.trace(|| TraceEvent::Error {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Ticks until the script ends and returns its `$_return`.
    ///
    /// # Errors
    ///
    /// The first error from [`tick`](Self::tick).
    pub async fn run_to_end(&mut self) -> Result<Value, RuntimeError> {
        loop {
            if let Tick::Finished(value) = self.tick().await? {
                return Ok(value);
            }
        }
    }

    fn after_step(&self, frames_before: usize) {
        let inner = self.vm.innermost();
        trace!(tick = self.ticks, depth = inner.depth(), "step");
        if self.vm.frame_count() < frames_before {
            let value = self.vm.last_reply().cloned().unwrap_or(Value::Null);
            self.trace(|| TraceEvent::FrameReturned {
                depth: inner.depth() + 1,
                value,
            });
        }
        self.trace(|| TraceEvent::Step {
            depth: inner.depth(),
            ip: inner.ip().to_vec(),
        });
    }

    async fn serve(&mut self, request: Request) -> Result<(), RuntimeError> {
        let depth = self.vm.innermost().depth();
        debug!(tick = self.ticks, depth, %request, "serving request");
        self.trace(|| TraceEvent::RequestIssued {
            depth,
            request: request.to_string(),
        });

        let verb = match &request {
            Request::Call { args, .. } => Some(args.verb.clone()),
            _ => None,
        };
        let frames = self.vm.frame_count();
        let reply = serve(self.store, request).await;
        if let Err(err) = &reply {
            debug!(error = %err, "request failed");
        }
        let kind = match &reply {
            Ok(Reply::Value(_)) => "value",
            Ok(Reply::Done) => "done",
            Ok(Reply::Frame(_)) => "frame",
            Err(_) => "error",
        };
        self.trace(|| TraceEvent::ReplyDelivered { kind });

        self.vm.resume(reply)?;
        if self.vm.frame_count() > frames {
            let depth = self.vm.innermost().depth();
            self.trace(|| TraceEvent::FramePushed {
                verb: verb.unwrap_or_default(),
                depth,
            });
        }
        Ok(())
    }

    fn trace(&self, event: impl FnOnce() -> TraceEvent) {
        if let Some(tracer) = &self.tracer {
            let mut tracer = tracer.lock();
            if tracer.is_enabled() {
                tracer.set_tick(self.ticks);
                tracer.record(event());
            }
        }
    }
}
