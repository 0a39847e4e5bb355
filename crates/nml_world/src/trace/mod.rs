//! Execution tracing for tasks.
//!
//! A [`Tracer`] records what a [`Task`](crate::Task) does, tick by tick:
//! steps, requests, replies, and verb frames. Recording is a no-op while
//! tracing is disabled.
//!
//! # Example
//!
//! ```text
//! nml> .trace on
//! nml> .call look
//! T0001 -> call #1a2b:look
//! T0001 <- frame
//! T0001   >> look
//! ```

pub mod buffer;
pub mod format;
pub mod record;

pub use buffer::{TraceBuffer, TraceBufferStats};
pub use format::HumanFormatter;
pub use record::{TraceEvent, TraceRecord};

use std::io::{self, Write};
use std::time::Instant;

/// Configuration for a [`Tracer`].
#[derive(Clone, Debug)]
pub struct TracerConfig {
    /// Whether events are recorded.
    pub enabled: bool,
    /// Maximum records kept.
    pub buffer_size: usize,
    /// Echo each record to stderr as it is recorded.
    pub echo_stderr: bool,
    /// Event types to keep (empty keeps all).
    pub event_filter: Vec<String>,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            buffer_size: 10_000,
            echo_stderr: false,
            event_filter: Vec::new(),
        }
    }
}

impl TracerConfig {
    /// Creates a disabled configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to enable tracing.
    #[must_use]
    pub fn enabled(mut self) -> Self {
        self.enabled = true;
        self
    }

    /// Builder method to set the buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Builder method to echo records to stderr.
    #[must_use]
    pub fn to_stderr(mut self) -> Self {
        self.echo_stderr = true;
        self
    }

    /// Builder method to keep only some event types.
    #[must_use]
    pub fn filter_events(mut self, types: Vec<String>) -> Self {
        self.event_filter = types;
        self
    }
}

/// Records trace events into a ring buffer.
#[derive(Debug)]
pub struct Tracer {
    config: TracerConfig,
    buffer: TraceBuffer,
    current_tick: u64,
    start_time: Instant,
    formatter: HumanFormatter,
}

impl Tracer {
    /// Creates a tracer.
    #[must_use]
    pub fn new(config: TracerConfig) -> Self {
        let buffer = TraceBuffer::new(config.buffer_size);
        Self {
            config,
            buffer,
            current_tick: 0,
            start_time: Instant::now(),
            formatter: HumanFormatter::new(),
        }
    }

    /// Creates a disabled tracer.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(TracerConfig::default())
    }

    /// Returns whether tracing is enabled.
    #[must_use]
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Enables tracing.
    pub fn enable(&mut self) {
        self.config.enabled = true;
    }

    /// Disables tracing.
    pub fn disable(&mut self) {
        self.config.enabled = false;
    }

    /// Turns stderr echo on or off.
    pub fn set_echo(&mut self, echo: bool) {
        self.config.echo_stderr = echo;
    }

    /// Sets the tick stamped on subsequent records.
    pub fn set_tick(&mut self, tick: u64) {
        self.current_tick = tick;
    }

    /// The tick stamped on new records.
    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    /// Records an event if tracing is on and the filter allows it.
    #[inline]
    pub fn record(&mut self, event: TraceEvent) {
        if !self.config.enabled {
            return;
        }
        self.record_internal(event);
    }

    fn record_internal(&mut self, event: TraceEvent) {
        if !self.config.event_filter.is_empty()
            && !self
                .config
                .event_filter
                .iter()
                .any(|t| t == event.event_type())
        {
            return;
        }

        #[allow(clippy::cast_possible_truncation)]
        let timestamp_ns = self.start_time.elapsed().as_nanos() as u64;
        self.buffer.push(self.current_tick, timestamp_ns, event);

        if self.config.echo_stderr {
            if let Some(record) = self.buffer.last() {
                let _ = writeln!(io::stderr(), "{}", self.formatter.format(record));
            }
        }
    }

    /// The recorded events.
    #[must_use]
    pub fn buffer(&self) -> &TraceBuffer {
        &self.buffer
    }

    /// Drops every recorded event.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// The last `count` records, formatted one per line.
    #[must_use]
    pub fn format_recent(&self, count: usize) -> String {
        self.formatter.format_many(&self.buffer.recent(count))
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::disabled()
    }
}
