//! Human-readable trace output.

use std::fmt::Write;

use super::record::{TraceEvent, TraceRecord};

/// Formats trace records one per line.
#[derive(Clone, Debug, Default)]
pub struct HumanFormatter {
    /// Prefix lines with the record id.
    pub show_ids: bool,
}

impl HumanFormatter {
    /// Creates a formatter without ids.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to show record ids.
    #[must_use]
    pub fn with_ids(mut self) -> Self {
        self.show_ids = true;
        self
    }

    /// Formats one record.
    #[must_use]
    pub fn format(&self, record: &TraceRecord) -> String {
        let mut line = String::new();
        if self.show_ids {
            let _ = write!(line, "[{:06}] ", record.id);
        }
        let _ = write!(line, "T{:04} ", record.tick);

        match &record.event {
            TraceEvent::Step { depth, ip } => {
                let path: Vec<String> = ip.iter().map(ToString::to_string).collect();
                let _ = write!(line, "{}step @{}", indent(*depth), path.join("."));
            }
            TraceEvent::RequestIssued { depth, request } => {
                let _ = write!(line, "{}-> {request}", indent(*depth));
            }
            TraceEvent::ReplyDelivered { kind } => {
                let _ = write!(line, "<- {kind}");
            }
            TraceEvent::FramePushed { verb, depth } => {
                let _ = write!(line, "{}>> {verb}", indent(*depth));
            }
            TraceEvent::FrameReturned { depth, value } => {
                let _ = write!(line, "{}<< {value}", indent(*depth));
            }
            TraceEvent::Error { message } => {
                let _ = write!(line, "!! {message}");
            }
            TraceEvent::Finished { ticks } => {
                let _ = write!(line, "== finished after {ticks} tick(s)");
            }
        }
        line
    }

    /// Formats records, one per line.
    #[must_use]
    pub fn format_many(&self, records: &[&TraceRecord]) -> String {
        records
            .iter()
            .map(|r| self.format(r))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}
