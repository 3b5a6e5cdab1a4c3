use crate::error::E2eResult;
use crate::report::model::RunReport;

/// Pretty-printed JSON of the whole report.
pub fn generate_json_report(report: &RunReport) -> E2eResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
