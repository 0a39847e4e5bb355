//! The suspension protocol between a VM and its host.
//!
//! The VM never touches object storage itself. When a statement needs a
//! property, an alias, or another verb, [`Vm::step`](super::Vm::step)
//! returns [`Step::Suspend`] with a [`Request`]; the host answers through
//! [`Vm::resume`](super::Vm::resume) with a [`Reply`].

use std::fmt;

use nml_foundation::{ObjectId, Value};

use super::Vm;

/// Outcome of a successful step.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    /// The VM made progress; step again.
    Continue,
    /// The VM is waiting for the host to answer this request.
    Suspend(Request),
}

/// Something the VM needs from its host.
#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    /// Read a property (with inheritance). Answer with [`Reply::Value`].
    GetProp {
        /// Object to read from.
        object: ObjectId,
        /// Property name.
        name: String,
    },
    /// Write a property. Answer with [`Reply::Done`].
    SetProp {
        /// Object to write to.
        object: ObjectId,
        /// Property name.
        name: String,
        /// New value.
        value: Value,
    },
    /// Resolve a `##NAME` alias. Answer with [`Reply::Value`] holding an
    /// object reference.
    ResolveAlias {
        /// Alias name without the `##`.
        name: String,
    },
    /// Run a verb. Answer with [`Reply::Frame`] holding a VM for the verb
    /// body, or [`Reply::Value`] for a verb the host handles natively.
    Call {
        /// Object whose verb table is searched.
        object: ObjectId,
        /// The call.
        args: CallArgs,
    },
}

impl Request {
    /// Returns a short name for the request kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::GetProp { .. } => "get_prop",
            Self::SetProp { .. } => "set_prop",
            Self::ResolveAlias { .. } => "resolve_alias",
            Self::Call { .. } => "call",
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetProp { object, name } => write!(f, "get {object}.{name}"),
            Self::SetProp {
                object,
                name,
                value,
            } => write!(f, "set {object}.{name} = {value}"),
            Self::ResolveAlias { name } => write!(f, "resolve ##{name}"),
            Self::Call { object, args } => write!(f, "call {object}:{}", args.verb),
        }
    }
}

/// The host's answer to a [`Request`].
#[derive(Debug)]
pub enum Reply {
    /// A value (property contents, alias target, native verb result).
    Value(Value),
    /// The write was performed.
    Done,
    /// Execute this VM as a nested frame; its `$_return` local becomes the
    /// call's value.
    Frame(Box<Vm>),
}

/// Arguments of a verb call, evaluated.
#[derive(Clone, Debug, PartialEq)]
pub struct CallArgs {
    /// The verb name.
    pub verb: String,
    /// Direct object value.
    pub direct_obj: Option<Value>,
    /// Splitting preposition.
    pub preposition: Option<String>,
    /// Indirect object value.
    pub indirect_obj: Option<Value>,
    /// Every word after the verb, each resolved on its own.
    pub params: Vec<Value>,
    /// The object whose script made the call.
    pub caller: ObjectId,
}

impl CallArgs {
    /// Creates arguments for a call with no objects or parameters.
    #[must_use]
    pub fn new(verb: impl Into<String>, caller: ObjectId) -> Self {
        Self {
            verb: verb.into(),
            direct_obj: None,
            preposition: None,
            indirect_obj: None,
            params: Vec::new(),
            caller,
        }
    }

    /// Adds positional parameters.
    #[must_use]
    pub fn with_params(mut self, params: Vec<Value>) -> Self {
        self.params = params;
        self
    }

    /// Sets the direct object.
    #[must_use]
    pub fn with_direct_obj(mut self, value: Value) -> Self {
        self.direct_obj = Some(value);
        self
    }

    /// Sets the preposition and indirect object.
    #[must_use]
    pub fn with_indirect_obj(mut self, preposition: impl Into<String>, value: Value) -> Self {
        self.preposition = Some(preposition.into());
        self.indirect_obj = Some(value);
        self
    }
}
