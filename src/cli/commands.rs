use std::path::Path;
use std::time::Instant;

use tracing::info;

use crate::actions::ShopActions;
use crate::auth::credentials::Credentials;
use crate::auth::session_cache::SessionCache;
use crate::browser::session::{BrowserSession, LaunchOptions};
use crate::cli::config::{AppConfig, ReportFormat};
use crate::error::E2eResult;
use crate::fixtures::FixtureStore;
use crate::pages::context::PageContext;
use crate::report::console::format_console_report;
use crate::report::json::generate_json_report;
use crate::report::junit::{generate_junit_xml, write_junit};
use crate::report::model::RunReport;
use crate::scenario::context::{ApiSettings, SuiteResources};
use crate::scenario::runner::{RunSettings, ScenarioRunner};
use crate::scenario::suite::{builtin_scenarios, select_scenarios};
use crate::trace::logger::StepTrail;

pub const SUITE_NAME: &str = "storefront";

/// Options of the `run` subcommand.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub scenarios: Vec<String>,
    pub format: ReportFormat,
    pub output: Option<String>,
    pub interactive: bool,
    pub ci: bool,
}

// ============================================================================
// list subcommand
// ============================================================================

pub fn cmd_list() {
    for scenario in builtin_scenarios() {
        println!("[{}] {}", scenario.group(), scenario.name());
    }
}

// ============================================================================
// run subcommand
// ============================================================================

/// Run the selected scenarios and return whether none failed.
pub fn cmd_run(config: &AppConfig, options: &RunOptions) -> Result<bool, Box<dyn std::error::Error>> {
    let scenarios = select_scenarios(&options.scenarios);
    if scenarios.is_empty() {
        eprintln!("No scenarios match: {:?}", options.scenarios);
        return Ok(true);
    }

    let resources = build_resources(config, options.ci)?;
    let runner = ScenarioRunner::new(run_settings(config, options.interactive));

    let session = BrowserSession::launch(&LaunchOptions {
        node: config.browser.node.clone(),
        server_script: config.browser.server_script.clone(),
        headless: !options.interactive,
        page_load_timeout_ms: config.timeouts.page_load_ms,
    })?;
    let mut page = PageContext::new(Box::new(session), &config.base_url, config.timeouts)
        .with_trail(StepTrail::to_file(&config.artifacts.trail_file));

    let start = Instant::now();
    let results = runner.run_all(&scenarios, &mut page, &resources);
    let duration = start.elapsed().as_millis();
    drop(page);

    let report = RunReport::from_results(SUITE_NAME, results).with_duration(duration);
    emit_report(
        &report,
        options.format,
        options.output.as_deref(),
        Path::new(&config.artifacts.results_dir),
    )?;
    Ok(report.all_passed())
}

/// Fixtures, credentials, session cache and API settings for a run.
pub fn build_resources(config: &AppConfig, ci: bool) -> E2eResult<SuiteResources> {
    let fixtures = FixtureStore::load(Path::new(&config.fixtures))?;
    let sessions = match &config.session_cache_file {
        Some(path) => SessionCache::persistent(Path::new(path))?,
        None => SessionCache::new(),
    };
    let credentials = SuiteResources::credentials_from(Credentials::from_env());
    if let Err(missing) = &credentials {
        info!("credentials not configured: {}", missing);
    }

    Ok(SuiteResources {
        actions: ShopActions::new(sessions),
        fixtures,
        credentials,
        api: ApiSettings {
            base_url: config.api_base_url.clone(),
            request_timeout: config.timeouts.request(),
        },
        ci,
    })
}

pub fn run_settings(config: &AppConfig, interactive: bool) -> RunSettings {
    RunSettings {
        retries: config.retries.for_mode(interactive),
        viewport: config.viewport,
        screenshots_dir: config.artifacts.screenshots_dir(),
        allowed_page_errors: config.allowed_page_errors.clone(),
    }
}

/// Print or write the report. JUnit without an explicit output goes to
/// `results_dir` under a content-hashed name.
pub fn emit_report(
    report: &RunReport,
    format: ReportFormat,
    output: Option<&str>,
    results_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = match format {
        ReportFormat::Console => format_console_report(report),
        ReportFormat::Json => generate_json_report(report)?,
        ReportFormat::Junit => match output {
            Some(_) => generate_junit_xml(report),
            None => {
                let path = write_junit(report, results_dir)?;
                println!("JUnit report: {}", path.display());
                return Ok(());
            }
        },
    };

    match output {
        Some(path) => {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, &content)?
        }
        None => print!("{}", content),
    }
    Ok(())
}
