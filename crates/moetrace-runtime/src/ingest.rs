use std::io::BufRead;

use anyhow::{Context, Result};
use serde::Serialize;

use moetrace_types::RoutingEvent;

use crate::RecorderService;

#[derive(Debug, Clone, Serialize)]
pub struct IngestStats {
    pub events: usize,
}

/// Replay a JSONL stream of routing events into a recorder, the
/// offline equivalent of the in-process instrumentation hook. Blank
/// lines are ignored; a malformed line fails the whole ingest with its
/// line number, since partial telemetry would skew every analysis.
pub fn ingest_events(service: &mut RecorderService, reader: impl BufRead) -> Result<IngestStats> {
    let mut events = 0;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", line_no + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let event: RoutingEvent = serde_json::from_str(&line)
            .with_context(|| format!("malformed routing event on line {}", line_no + 1))?;
        service
            .log(event)
            .with_context(|| format!("rejected routing event on line {}", line_no + 1))?;
        events += 1;
    }
    Ok(IngestStats { events })
}
