use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::scenario::runner::Viewport;
use crate::wait::Timeouts;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "storefront-e2e",
    version,
    about = "Browser-driven end-to-end checks for the storefront"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: storefront-e2e.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run built-in scenarios
    Run {
        /// Only scenarios whose name contains this (repeatable)
        #[arg(long = "scenario")]
        scenarios: Vec<String>,

        /// Report format
        #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
        format: ReportFormat,

        /// Output file (default: stdout; junit goes to the results dir)
        #[arg(short, long)]
        output: Option<String>,

        /// Interactive mode: no retries, browser shown
        #[arg(long)]
        interactive: bool,
    },

    /// List built-in scenario names
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Junit,
    Json,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `storefront-e2e.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub api_base_url: String,
    pub timeouts: Timeouts,
    pub retries: RetryConfig,
    pub viewport: Viewport,
    pub artifacts: ArtifactsConfig,
    pub browser: BrowserConfig,
    pub fixtures: String,
    /// Persist the session cache here so reuse spans separate runs.
    pub session_cache_file: Option<String>,
    /// Substrings of uncaught page errors that do not fail a scenario.
    pub allowed_page_errors: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.stuller.com".to_string(),
            api_base_url: "https://api.stuller.com".to_string(),
            timeouts: Timeouts::default(),
            retries: RetryConfig::default(),
            viewport: Viewport::default(),
            artifacts: ArtifactsConfig::default(),
            browser: BrowserConfig::default(),
            fixtures: "fixtures/products.json".to_string(),
            session_cache_file: None,
            allowed_page_errors: Vec::new(),
        }
    }
}

/// Retries per failed scenario, by run mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub run_mode: u32,
    pub open_mode: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            run_mode: 2,
            open_mode: 0,
        }
    }
}

impl RetryConfig {
    pub fn for_mode(&self, interactive: bool) -> u32 {
        if interactive { self.open_mode } else { self.run_mode }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// Full-page screenshot on failure
    pub screenshots: bool,
    pub screenshots_dir: String,
    pub results_dir: String,
    pub trail_file: String,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            screenshots: true,
            screenshots_dir: "artifacts/screenshots".to_string(),
            results_dir: "artifacts/results".to_string(),
            trail_file: "artifacts/step-trail.jsonl".to_string(),
        }
    }
}

impl ArtifactsConfig {
    pub fn screenshots_dir(&self) -> Option<PathBuf> {
        self.screenshots.then(|| PathBuf::from(&self.screenshots_dir))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub node: String,
    pub server_script: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            node: "node".to_string(),
            server_script: "node/browser_server.js".to_string(),
        }
    }
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if the file is missing or
/// malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("storefront-e2e.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            warn!("ignoring malformed config '{}': {}", config_path, e);
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

pub const BASE_URL_ENV: &str = "STOREFRONT_BASE_URL";
pub const API_BASE_URL_ENV: &str = "STOREFRONT_API_BASE_URL";

impl AppConfig {
    /// Non-blank `STOREFRONT_BASE_URL` / `STOREFRONT_API_BASE_URL` replace
    /// whatever the config file said.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let value = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(url) = value(BASE_URL_ENV) {
            self.base_url = url;
        }
        if let Some(url) = value(API_BASE_URL_ENV) {
            self.api_base_url = url;
        }
    }
}

/// `CI=true` or `CI=1` means a non-interactive run.
pub fn is_ci(value: Option<&str>) -> bool {
    matches!(value, Some("true") | Some("1"))
}
