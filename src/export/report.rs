use tracing::info;

use crate::models::Result;
use crate::stats::RunReport;

/// Writes the JSON run report next to the CSV files and returns its path.
pub async fn write_run_report(
    output_dir: &str,
    report: &RunReport,
    pretty: bool,
) -> Result<String> {
    let output_dir = output_dir.trim_end_matches('/');
    let filename = format!(
        "{}/report_{}_{}.json",
        output_dir,
        report.sector.trim().to_lowercase().replace([' ', '/'], "_"),
        report.started_at.format("%Y%m%d_%H%M%S")
    );

    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };

    tokio::fs::create_dir_all(output_dir).await?;
    tokio::fs::write(&filename, json).await?;

    info!("📝 Run report written to {}", filename);
    Ok(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serializes_with_stats() {
        let mut report = RunReport::new("wine");
        report.stats.companies_seen = 12;
        report.stats.business_emails = 4;

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"sector\":\"wine\""));
        assert!(json.contains("\"companies_seen\":12"));
        assert!(json.contains("\"business_emails\":4"));
    }
}
