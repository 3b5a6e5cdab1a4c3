use serde::{Deserialize, Serialize};

use crate::error::E2eResult;
use crate::scenario::context::ScenarioEnv;

/// How a scenario body ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Done,
    /// Not applicable in this environment. The reason is reported.
    Skipped(String),
}

/// A named, independently runnable end-to-end test.
pub trait Scenario {
    fn name(&self) -> &str;

    /// Grouping used as the report class name.
    fn group(&self) -> &str;

    fn run(&self, env: &mut ScenarioEnv<'_>) -> E2eResult<Completion>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    Passed,
    Failed,
    Skipped,
}

/// Final outcome of one scenario across all of its attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub group: String,
    pub status: ScenarioStatus,

    /// Attempts made, retries included.
    pub attempts: u32,

    /// Named steps reached in the last attempt.
    pub steps_run: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Failure class, e.g. "SynchronizationTimeout".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_category: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,

    /// Failure screenshot of the last failed attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,

    pub duration_ms: u128,
}

impl ScenarioResult {
    pub fn passed(&self) -> bool {
        self.status == ScenarioStatus::Passed
    }
}
