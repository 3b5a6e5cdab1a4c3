use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::trace::event::{EventKind, StepEvent};

enum Sink {
    Disabled,
    File(Mutex<fs::File>),
    Memory(Mutex<Vec<StepEvent>>),
}

/// Append-only diagnostic trail of what a scenario did.
///
/// Every event is mirrored to `tracing`; the JSONL file (or in-memory buffer)
/// is the artifact kept next to failure screenshots. Cloning shares the sink.
#[derive(Clone)]
pub struct StepTrail {
    sink: Arc<Sink>,
}

impl StepTrail {
    /// Trail that only forwards to `tracing`.
    pub fn disabled() -> Self {
        Self { sink: Arc::new(Sink::Disabled) }
    }

    /// Trail that keeps events in memory, for inspection in tests.
    pub fn in_memory() -> Self {
        Self { sink: Arc::new(Sink::Memory(Mutex::new(Vec::new()))) }
    }

    /// Trail appended to a JSONL file. Falls back to `disabled` if the file
    /// cannot be opened.
    pub fn to_file(path: &str) -> Self {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                let _ = fs::create_dir_all(parent);
            }
        }
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => Self { sink: Arc::new(Sink::File(Mutex::new(f))) },
            Err(e) => {
                warn!("could not open step trail '{}': {}", path, e);
                Self::disabled()
            }
        }
    }

    pub fn record(&self, event: StepEvent) {
        match event.kind {
            EventKind::Step => info!(scenario = %event.scenario, "STEP: {}", event.detail),
            _ => debug!(scenario = %event.scenario, kind = ?event.kind, "{}", event.detail),
        }

        match self.sink.as_ref() {
            Sink::Disabled => {}
            Sink::Memory(events) => {
                let mut events = events.lock().unwrap_or_else(|e| e.into_inner());
                events.push(event);
            }
            Sink::File(file) => {
                let json = match serde_json::to_string(&event) {
                    Ok(j) => j,
                    Err(e) => {
                        warn!("failed to serialize step event: {}", e);
                        return;
                    }
                };
                let mut file = file.lock().unwrap_or_else(|e| e.into_inner());
                if let Err(e) = writeln!(file, "{}", json) {
                    warn!("failed to write step event: {}", e);
                }
            }
        }
    }

    /// Events held by an in-memory trail; empty for other sinks.
    pub fn events(&self) -> Vec<StepEvent> {
        match self.sink.as_ref() {
            Sink::Memory(events) => events.lock().unwrap_or_else(|e| e.into_inner()).clone(),
            _ => Vec::new(),
        }
    }
}

impl Default for StepTrail {
    fn default() -> Self {
        Self::disabled()
    }
}
