use std::path::Path;

use tracing::info;

use crate::error::TrendScoutError;
use crate::types::TopicReport;

/// Write the run's report as pretty JSON, replacing any previous file.
pub async fn write_report(path: &Path, reports: &[TopicReport]) -> Result<(), TrendScoutError> {
    let json = serde_json::to_string_pretty(reports)?;
    tokio::fs::write(path, json).await?;
    info!(path = %path.display(), topics = reports.len(), "Report written");
    Ok(())
}

/// Read a report previously written by [`write_report`].
pub async fn load_report(path: &Path) -> Result<Vec<TopicReport>, TrendScoutError> {
    let json = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&json)?)
}
