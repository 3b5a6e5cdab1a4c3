use crate::report::model::RunReport;
use crate::scenario::model::ScenarioStatus;

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

/// Format a run report for terminal output.
///
/// ```text
/// === Test Suite: storefront ===
///
/// ✓ PASS  should display a product title (2 steps)
/// ✗ FAIL  Complete E2E workflow ... (6 steps, 3 attempts)
///     [SynchronizationTimeout] Timed out after 15000 ms waiting for ...
///     screenshot: artifacts/screenshots/FAILED-Complete-E2E-... .png
/// - SKIP  Validate SKU, price, ... (0 steps)
///     credentials not set
///
/// === Results: 1 passed, 1 failed, 1 skipped (3 total) in 42.0s ===
/// ```
pub fn format_console_report(report: &RunReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Test Suite: {} ===\n\n", report.suite_name));

    for result in &report.results {
        let marker = match result.status {
            ScenarioStatus::Passed => "\u{2713} PASS",
            ScenarioStatus::Failed => "\u{2717} FAIL",
            ScenarioStatus::Skipped => "- SKIP",
        };

        out.push_str(&format!("{}  {} ({} steps", marker, result.name, result.steps_run));
        if result.attempts > 1 {
            out.push_str(&format!(", {} attempts", result.attempts));
        }
        out.push_str(")\n");

        if let Some(ref error) = result.error {
            let category = result.error_category.as_deref().unwrap_or("Error");
            out.push_str(&format!("    [{}] {}\n", category, error));
        }
        if let Some(ref reason) = result.skip_reason {
            out.push_str(&format!("    {}\n", reason));
        }
        if let Some(ref screenshot) = result.screenshot {
            out.push_str(&format!("    screenshot: {}\n", screenshot));
        }
    }

    out.push_str(&format!(
        "\n=== Results: {} passed, {} failed, {} skipped ({} total)",
        report.passed, report.failed, report.skipped, report.total
    ));

    if let Some(ms) = report.duration_ms {
        out.push_str(&format!(" in {:.1}s", ms as f64 / 1000.0));
    }

    out.push_str(" ===\n");

    out
}
