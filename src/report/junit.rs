use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};

use crate::error::E2eResult;
use crate::report::model::RunReport;
use crate::scenario::model::ScenarioStatus;

// ============================================================================
// JUnit XML reporter for CI
// ============================================================================

/// Generate a JUnit XML report for CI systems.
///
/// ```xml
/// <?xml version="1.0" encoding="UTF-8"?>
/// <testsuite name="storefront" tests="3" failures="1" skipped="1" time="12.345">
///   <testcase name="should display a product title" classname="Packaging Product Page" time="1.200" />
///   <testcase name="..." classname="..." time="9.000">
///     <failure message="..." type="AssertionMismatch">...</failure>
///   </testcase>
///   <testcase name="..." classname="..." time="0.000">
///     <skipped message="..." />
///   </testcase>
/// </testsuite>
/// ```
pub fn generate_junit_xml(report: &RunReport) -> String {
    let time_attr = report
        .duration_ms
        .map(|ms| format!(" time=\"{:.3}\"", ms as f64 / 1000.0))
        .unwrap_or_default();

    let mut cases = String::new();
    for result in &report.results {
        let open = format!(
            "  <testcase name=\"{}\" classname=\"{}\" time=\"{:.3}\"",
            escape_xml(&result.name),
            escape_xml(&result.group),
            result.duration_ms as f64 / 1000.0
        );
        match result.status {
            ScenarioStatus::Passed => {
                cases.push_str(&format!("{} />\n", open));
            }
            ScenarioStatus::Skipped => {
                let reason = result.skip_reason.as_deref().unwrap_or("skipped");
                cases.push_str(&format!(
                    "{}>\n    <skipped message=\"{}\" />\n  </testcase>\n",
                    open,
                    escape_xml(reason)
                ));
            }
            ScenarioStatus::Failed => {
                let category = result.error_category.as_deref().unwrap_or("Error");
                let error = result.error.as_deref().unwrap_or("scenario failed");
                let mut body = error.to_string();
                if let Some(ref screenshot) = result.screenshot {
                    body.push_str(&format!("\nScreenshot: {}", screenshot));
                }
                if result.attempts > 1 {
                    body.push_str(&format!("\nAttempts: {}", result.attempts));
                }
                cases.push_str(&format!(
                    "{open}>\n    <failure message=\"{message}\" type=\"{kind}\">{body}</failure>\n  </testcase>\n",
                    open = open,
                    message = escape_xml(error),
                    kind = escape_xml(category),
                    body = escape_xml(&body),
                ));
            }
        }
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<testsuite name=\"{name}\" tests=\"{tests}\" failures=\"{failures}\" skipped=\"{skipped}\"{time}>\n{cases}</testsuite>\n",
        name = escape_xml(&report.suite_name),
        tests = report.total,
        failures = report.failed,
        skipped = report.skipped,
        time = time_attr,
        cases = cases,
    )
}

/// `results-<hash>.xml`, the hash being the first 12 hex digits of the
/// SHA-1 of the document.
pub fn junit_file_name(xml: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(xml.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("results-{}.xml", &digest[..12])
}

/// Write the JUnit document into `dir` and return its path.
pub fn write_junit(report: &RunReport, dir: &Path) -> E2eResult<PathBuf> {
    let xml = generate_junit_xml(report);
    std::fs::create_dir_all(dir)?;
    let path = dir.join(junit_file_name(&xml));
    std::fs::write(&path, &xml)?;
    Ok(path)
}

/// Escape XML special characters.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
