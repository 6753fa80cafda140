use chrono::Utc;
use tracing::info;

use crate::models::{CompanyRecord, Result};

/// Writes the two CSV outputs of a run: one row per company (links file)
/// and one row per attributed email (emails file).
pub struct CsvExporter {
    output_dir: String,
}

impl CsvExporter {
    pub fn new(output_dir: &str) -> Self {
        Self {
            output_dir: output_dir.trim_end_matches('/').to_string(),
        }
    }

    pub async fn export_links(&self, sector: &str, records: &[CompanyRecord]) -> Result<String> {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let filename = format!(
            "{}/links_{}_found_{}_{}.csv",
            self.output_dir,
            filename_part(sector),
            records.len(),
            timestamp
        );

        tokio::fs::create_dir_all(&self.output_dir).await?;
        tokio::fs::write(&filename, links_csv(records)).await?;

        info!("✅ Exported {} companies to {}", records.len(), filename);
        Ok(filename)
    }

    pub async fn export_emails(&self, sector: &str, records: &[CompanyRecord]) -> Result<String> {
        let email_count: usize = records.iter().map(|r| r.emails.len()).sum();
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let filename = format!(
            "{}/emails_{}_found_{}_{}.csv",
            self.output_dir,
            filename_part(sector),
            email_count,
            timestamp
        );

        tokio::fs::create_dir_all(&self.output_dir).await?;
        tokio::fs::write(&filename, emails_csv(records)).await?;

        info!("✅ Exported {} emails to {}", email_count, filename);
        Ok(filename)
    }
}

fn links_csv(records: &[CompanyRecord]) -> String {
    let mut csv_content =
        String::from("Company Name,Country,Directory URL,Company Website URL\n");

    for record in records {
        csv_content.push_str(&format!(
            "\"{}\",\"{}\",\"{}\",\"{}\"\n",
            record.name.replace("\"", "\"\""),
            record.country.replace("\"", "\"\""),
            record.profile_url.replace("\"", "\"\""),
            record
                .website_url
                .as_deref()
                .unwrap_or("")
                .replace("\"", "\"\""),
        ));
    }

    csv_content
}

fn emails_csv(records: &[CompanyRecord]) -> String {
    let mut csv_content = String::from("Company Name,Country,Company Website URL,Email\n");

    for record in records {
        for email in &record.emails {
            csv_content.push_str(&format!(
                "\"{}\",\"{}\",\"{}\",\"{}\"\n",
                record.name.replace("\"", "\"\""),
                record.country.replace("\"", "\"\""),
                record
                    .website_url
                    .as_deref()
                    .unwrap_or("")
                    .replace("\"", "\"\""),
                email.replace("\"", "\"\""),
            ));
        }
    }

    csv_content
}

fn filename_part(sector: &str) -> String {
    sector
        .trim()
        .to_lowercase()
        .replace([' ', '/'], "_")
}
