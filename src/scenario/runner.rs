use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{E2eError, E2eResult, ErrorCategory};
use crate::pages::context::PageContext;
use crate::scenario::context::{ScenarioEnv, SuiteResources};
use crate::scenario::model::{Completion, Scenario, ScenarioResult, ScenarioStatus};
use crate::trace::event::EventKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Per-run policy of the scenario runner.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Extra attempts after a failed one.
    pub retries: u32,
    pub viewport: Viewport,
    /// Where failure screenshots go; `None` disables them.
    pub screenshots_dir: Option<PathBuf>,
    /// Page errors containing any of these are tolerated.
    pub allowed_page_errors: Vec<String>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            retries: 0,
            viewport: Viewport::default(),
            screenshots_dir: None,
            allowed_page_errors: Vec::new(),
        }
    }
}

/// `FAILED-<title>` with whitespace runs turned into `-`, plus the attempt
/// number for retries.
pub fn failure_screenshot_name(title: &str, attempt: u32) -> String {
    let slug = title.split_whitespace().collect::<Vec<_>>().join("-");
    if attempt > 1 {
        format!("FAILED-{} (attempt {}).png", slug, attempt)
    } else {
        format!("FAILED-{}.png", slug)
    }
}

/// Page errors that are not on the allow list.
pub fn disallowed_page_errors(errors: Vec<String>, allowed: &[String]) -> Vec<String> {
    errors
        .into_iter()
        .filter(|e| !allowed.iter().any(|a| !a.is_empty() && e.contains(a.as_str())))
        .collect()
}

/// Executes scenarios one at a time against a shared page context.
pub struct ScenarioRunner {
    settings: RunSettings,
}

impl ScenarioRunner {
    pub fn new(settings: RunSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    pub fn run_all(
        &self,
        scenarios: &[Box<dyn Scenario>],
        page: &mut PageContext,
        resources: &SuiteResources,
    ) -> Vec<ScenarioResult> {
        info!("Starting test run: {} scenarios", scenarios.len());

        let results: Vec<ScenarioResult> = scenarios
            .iter()
            .map(|scenario| self.run(scenario.as_ref(), page, resources))
            .collect();

        let count = |status: ScenarioStatus| results.iter().filter(|r| r.status == status).count();
        info!(
            "Test run complete. Passed: {}, Failed: {}, Skipped: {}",
            count(ScenarioStatus::Passed),
            count(ScenarioStatus::Failed),
            count(ScenarioStatus::Skipped)
        );
        results
    }

    /// Run one scenario, retrying failed attempts up to the configured count.
    ///
    /// Configuration errors are not retried. Every attempt starts from an
    /// anonymous browser context at the configured viewport.
    pub fn run(&self, scenario: &dyn Scenario, page: &mut PageContext, resources: &SuiteResources) -> ScenarioResult {
        let start = Instant::now();
        let max_attempts = self.settings.retries + 1;
        page.set_scenario(scenario.name());
        info!(group = scenario.group(), "Starting test: {}", scenario.name());

        let mut attempt = 0;
        loop {
            attempt += 1;
            let (outcome, steps_run) = self.attempt(scenario, page, resources);

            let mut result = ScenarioResult {
                name: scenario.name().to_string(),
                group: scenario.group().to_string(),
                status: ScenarioStatus::Passed,
                attempts: attempt,
                steps_run,
                error: None,
                error_category: None,
                skip_reason: None,
                screenshot: None,
                duration_ms: 0,
            };

            match outcome {
                Ok(Completion::Done) => {
                    info!("PASS {}", scenario.name());
                }
                Ok(Completion::Skipped(reason)) => {
                    warn!("SKIP {}: {}", scenario.name(), reason);
                    result.status = ScenarioStatus::Skipped;
                    result.skip_reason = Some(reason);
                }
                Err(e) => {
                    error!(category = e.category().as_str(), "Test Failed: {}: {}", scenario.name(), e);
                    page.record(EventKind::Note, format!("attempt {} failed: {}", attempt, e));
                    result.screenshot = self.capture_failure(page, scenario.name(), attempt);

                    let retryable = e.category() != ErrorCategory::Configuration;
                    if retryable && attempt < max_attempts {
                        warn!("retrying '{}' (attempt {} of {})", scenario.name(), attempt + 1, max_attempts);
                        continue;
                    }
                    result.status = ScenarioStatus::Failed;
                    result.error_category = Some(e.category().as_str().to_string());
                    result.error = Some(e.to_string());
                }
            }

            result.duration_ms = start.elapsed().as_millis();
            return result;
        }
    }

    fn attempt(
        &self,
        scenario: &dyn Scenario,
        page: &mut PageContext,
        resources: &SuiteResources,
    ) -> (E2eResult<Completion>, usize) {
        if let Err(e) = self.isolate(page) {
            return (Err(e), 0);
        }

        let mut env = ScenarioEnv::new(page, resources);
        let outcome = scenario.run(&mut env);
        let steps_run = env.steps_run();

        let page_errors = self.check_page_errors(page);
        let outcome = match (outcome, page_errors) {
            (Ok(completion), Ok(())) => Ok(completion),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Err(page_error)) => {
                warn!("also saw: {}", page_error);
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
        };
        (outcome, steps_run)
    }

    /// Fresh anonymous context at the configured viewport.
    fn isolate(&self, page: &mut PageContext) -> E2eResult<()> {
        let Viewport { width, height } = self.settings.viewport;
        page.driver().clear_auth_state()?;
        page.driver().set_viewport(width, height)?;
        let _ = page.driver().take_page_errors()?;
        Ok(())
    }

    fn check_page_errors(&self, page: &mut PageContext) -> E2eResult<()> {
        let errors = page.driver().take_page_errors()?;
        for e in &errors {
            error!("Uncaught Exception: {}", e);
        }
        let disallowed = disallowed_page_errors(errors, &self.settings.allowed_page_errors);
        if disallowed.is_empty() {
            Ok(())
        } else {
            Err(E2eError::PageErrors(disallowed))
        }
    }

    /// Best effort; a failing screenshot never masks the scenario error.
    fn capture_failure(&self, page: &mut PageContext, title: &str, attempt: u32) -> Option<String> {
        let dir = self.settings.screenshots_dir.as_ref()?;
        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!("cannot create screenshot dir '{}': {}", dir.display(), e);
            return None;
        }
        let path = dir.join(failure_screenshot_name(title, attempt));
        let path = path.to_string_lossy().to_string();
        match page.screenshot(&path) {
            Ok(()) => {
                info!("failure screenshot: {}", path);
                Some(path)
            }
            Err(e) => {
                warn!("failure screenshot not taken: {}", e);
                None
            }
        }
    }
}
