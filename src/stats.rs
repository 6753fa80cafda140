use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pipeline::country::ResolutionLevel;

/// Counters accumulated over one scraping run. Rejections and misses are
/// ordinary data here, not errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub companies_seen: usize,
    pub companies_processed: usize,
    pub companies_with_emails: usize,
    pub duplicate_companies_removed: usize,
    pub duplicate_emails_removed: usize,

    pub pages_fetched: usize,
    pub fetch_failures: usize,

    pub emails_extracted: usize,
    pub business_emails: usize,
    pub personal_emails: usize,
    pub spam_emails: usize,
    pub invalid_emails: usize,
    pub sector_relevant_emails: usize,

    pub countries_from_hints: usize,
    pub countries_from_native_spelling: usize,
    pub countries_from_url_locale: usize,
    pub countries_from_context: usize,
    pub countries_unknown: usize,

    pub elapsed_seconds: f64,
}

impl RunStats {
    pub fn record_resolution(&mut self, level: Option<ResolutionLevel>) {
        match level {
            Some(ResolutionLevel::StructuredHints) => self.countries_from_hints += 1,
            Some(ResolutionLevel::NativeSpelling) => self.countries_from_native_spelling += 1,
            Some(ResolutionLevel::UrlLocale) => self.countries_from_url_locale += 1,
            Some(ResolutionLevel::ContextualMention) => self.countries_from_context += 1,
            None => self.countries_unknown += 1,
        }
    }

    pub fn resolved_countries(&self) -> usize {
        self.countries_from_hints
            + self.countries_from_native_spelling
            + self.countries_from_url_locale
            + self.countries_from_context
    }

    /// Share of companies that ended up with at least one business email.
    pub fn email_hit_rate(&self) -> f64 {
        if self.companies_processed == 0 {
            return 0.0;
        }
        self.companies_with_emails as f64 / self.companies_processed as f64 * 100.0
    }

    pub fn fetch_success_rate(&self) -> f64 {
        let attempts = self.pages_fetched + self.fetch_failures;
        if attempts == 0 {
            return 0.0;
        }
        self.pages_fetched as f64 / attempts as f64 * 100.0
    }

    pub fn print_summary(&self) {
        println!("\n📊 Run Summary");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("🏢 Companies seen: {}", self.companies_seen);
        println!("✅ Companies processed: {}", self.companies_processed);
        println!(
            "📧 Companies with emails: {} ({:.1}%)",
            self.companies_with_emails,
            self.email_hit_rate()
        );
        println!(
            "🔁 Duplicates removed: {} companies, {} emails",
            self.duplicate_companies_removed, self.duplicate_emails_removed
        );
        println!(
            "🌐 Pages fetched: {} ({} failures, {:.1}% success)",
            self.pages_fetched,
            self.fetch_failures,
            self.fetch_success_rate()
        );
        println!(
            "✉️  Emails: {} extracted → {} business, {} personal, {} spam, {} invalid",
            self.emails_extracted,
            self.business_emails,
            self.personal_emails,
            self.spam_emails,
            self.invalid_emails
        );
        if self.sector_relevant_emails > 0 {
            println!(
                "🎯 Sector-relevant emails: {}",
                self.sector_relevant_emails
            );
        }
        println!(
            "🗺️  Countries: {} hints, {} native spelling, {} URL locale, {} context, {} unknown",
            self.countries_from_hints,
            self.countries_from_native_spelling,
            self.countries_from_url_locale,
            self.countries_from_context,
            self.countries_unknown
        );
        println!("⏱️  Elapsed: {:.1}s", self.elapsed_seconds);
    }
}

/// One run's identity and outcome, written alongside the CSV exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub sector: String,
    pub started_at: DateTime<Utc>,
    pub stats: RunStats,
}

impl RunReport {
    pub fn new(sector: &str) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            sector: sector.to_string(),
            started_at: Utc::now(),
            stats: RunStats::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_levels_map_to_their_counters() {
        let mut stats = RunStats::default();
        stats.record_resolution(Some(ResolutionLevel::StructuredHints));
        stats.record_resolution(Some(ResolutionLevel::UrlLocale));
        stats.record_resolution(None);

        assert_eq!(stats.countries_from_hints, 1);
        assert_eq!(stats.countries_from_url_locale, 1);
        assert_eq!(stats.countries_unknown, 1);
        assert_eq!(stats.resolved_countries(), 2);
    }

    #[test]
    fn rates_survive_empty_runs() {
        let stats = RunStats::default();
        assert_eq!(stats.email_hit_rate(), 0.0);
        assert_eq!(stats.fetch_success_rate(), 0.0);
    }

    #[test]
    fn rates_are_percentages() {
        let stats = RunStats {
            companies_processed: 4,
            companies_with_emails: 1,
            pages_fetched: 3,
            fetch_failures: 1,
            ..RunStats::default()
        };
        assert_eq!(stats.email_hit_rate(), 25.0);
        assert_eq!(stats.fetch_success_rate(), 75.0);
    }
}
