use serde::{Deserialize, Serialize};

use crate::scenario::model::{ScenarioResult, ScenarioStatus};

// ============================================================================
// Run report: aggregates scenario results
// ============================================================================

/// Aggregated report for one run of scenarios.
///
/// Built from a `Vec<ScenarioResult>` via `from_results()`. Consumed by the
/// console, JUnit and JSON reporters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub suite_name: String,

    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,

    /// Wall time of the whole run in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,

    pub results: Vec<ScenarioResult>,
}

impl RunReport {
    /// Counts are derived from the results.
    pub fn from_results(suite_name: &str, results: Vec<ScenarioResult>) -> Self {
        let count = |status: ScenarioStatus| results.iter().filter(|r| r.status == status).count();
        let passed = count(ScenarioStatus::Passed);
        let failed = count(ScenarioStatus::Failed);
        let skipped = count(ScenarioStatus::Skipped);
        Self {
            suite_name: suite_name.to_string(),
            total: results.len(),
            passed,
            failed,
            skipped,
            duration_ms: None,
            results,
        }
    }

    pub fn with_duration(mut self, duration_ms: u128) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Skips do not fail a run.
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}
