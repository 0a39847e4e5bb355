//! Trace event and record types.

use nml_foundation::Value;

/// Something that happened while a task ran.
#[derive(Clone, Debug, PartialEq)]
pub enum TraceEvent {
    /// A statement completed in some frame.
    Step {
        /// Frame depth of the innermost frame after the step.
        depth: usize,
        /// Instruction path of the innermost frame after the step.
        ip: Vec<usize>,
    },

    /// The VM suspended on a request.
    RequestIssued {
        /// Frame depth of the requesting frame.
        depth: usize,
        /// The request, as displayed.
        request: String,
    },

    /// The store's answer was handed back to the VM.
    ReplyDelivered {
        /// `value`, `done`, `frame`, or `error`.
        kind: &'static str,
    },

    /// A verb frame was installed.
    FramePushed {
        /// The verb being run.
        verb: String,
        /// Depth of the new frame.
        depth: usize,
    },

    /// A verb frame finished and its result went to the caller.
    FrameReturned {
        /// Depth of the frame that returned.
        depth: usize,
        /// The frame's `$_return`.
        value: Value,
    },

    /// A step failed.
    Error {
        /// The error, as displayed.
        message: String,
    },

    /// The root script reached its end.
    Finished {
        /// Ticks the task used.
        ticks: u64,
    },
}

impl TraceEvent {
    /// Returns the event type name, as used by event filters.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Step { .. } => "step",
            Self::RequestIssued { .. } => "request",
            Self::ReplyDelivered { .. } => "reply",
            Self::FramePushed { .. } => "frame-push",
            Self::FrameReturned { .. } => "frame-return",
            Self::Error { .. } => "error",
            Self::Finished { .. } => "finished",
        }
    }

    /// Returns true for events that change the frame stack.
    #[must_use]
    pub fn is_frame_event(&self) -> bool {
        matches!(self, Self::FramePushed { .. } | Self::FrameReturned { .. })
    }
}

/// A recorded event with its position in the run.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceRecord {
    /// Unique, increasing record id.
    pub id: u64,
    /// Task tick the event happened in.
    pub tick: u64,
    /// Nanoseconds since the tracer was created.
    pub timestamp_ns: u64,
    /// The event.
    pub event: TraceEvent,
}

impl TraceRecord {
    /// Creates a record.
    #[must_use]
    pub fn new(id: u64, tick: u64, timestamp_ns: u64, event: TraceEvent) -> Self {
        Self {
            id,
            tick,
            timestamp_ns,
            event,
        }
    }

    /// Returns the event type name.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }
}
