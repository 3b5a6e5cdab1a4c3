use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Placeholder written instead of secret input.
pub const REDACTED: &str = "<redacted>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Named scenario step (`log_step`)
    Step,
    /// Navigation, click, typing
    Action,
    /// A synchronization point that resolved
    Wait,
    /// Anything else worth keeping in the trail
    Note,
}

/// One line of the step trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepEvent {
    pub timestamp_ms: u128,
    pub scenario: String,
    pub kind: EventKind,
    pub detail: String,
}

impl StepEvent {
    pub fn now(scenario: &str, kind: EventKind, detail: impl Into<String>) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            scenario: scenario.to_string(),
            kind,
            detail: detail.into(),
        }
    }
}
