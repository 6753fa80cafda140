use crate::models::CompanyRecord;
use crate::pipeline::country::ResolutionLevel;
use crate::pipeline::dedup::{AttributionPolicy, DeduplicationKeySpace, Deduplicator};
use crate::stats::RunStats;

/// Everything one company worker hands back: the record itself plus the
/// counter deltas observed while producing it.
#[derive(Debug)]
pub struct CompanyOutcome {
    pub record: CompanyRecord,
    pub resolution_level: Option<ResolutionLevel>,
    pub pages_fetched: usize,
    pub fetch_failures: usize,
    pub emails_extracted: usize,
    pub business_emails: usize,
    pub personal_emails: usize,
    pub spam_emails: usize,
    pub invalid_emails: usize,
    pub sector_relevant_emails: usize,
}

impl CompanyOutcome {
    pub fn new(record: CompanyRecord) -> Self {
        Self {
            record,
            resolution_level: None,
            pages_fetched: 0,
            fetch_failures: 0,
            emails_extracted: 0,
            business_emails: 0,
            personal_emails: 0,
            spam_emails: 0,
            invalid_emails: 0,
            sector_relevant_emails: 0,
        }
    }
}

/// Collects worker outcomes, then runs the deduplication pass over the
/// whole batch. Owns the run's key space, so cross-run state cannot leak.
pub struct RecordAggregator {
    records: Vec<CompanyRecord>,
    stats: RunStats,
    dedup: Deduplicator,
    max_emails_per_company: usize,
}

impl RecordAggregator {
    pub fn new(policy: AttributionPolicy, max_emails_per_company: usize) -> Self {
        Self {
            records: Vec::new(),
            stats: RunStats::default(),
            dedup: Deduplicator::new(policy),
            max_emails_per_company,
        }
    }

    pub fn note_seeds(&mut self, count: usize) {
        self.stats.companies_seen = count;
    }

    pub fn absorb(&mut self, outcome: CompanyOutcome) {
        self.stats.companies_processed += 1;
        self.stats.pages_fetched += outcome.pages_fetched;
        self.stats.fetch_failures += outcome.fetch_failures;
        self.stats.emails_extracted += outcome.emails_extracted;
        self.stats.business_emails += outcome.business_emails;
        self.stats.personal_emails += outcome.personal_emails;
        self.stats.spam_emails += outcome.spam_emails;
        self.stats.invalid_emails += outcome.invalid_emails;
        self.stats.sector_relevant_emails += outcome.sector_relevant_emails;
        self.stats.record_resolution(outcome.resolution_level);
        self.records.push(outcome.record);
    }

    /// Deduplicates companies, then emails, then enforces the per-company
    /// email cap. Returns the final records in seed order.
    pub fn finish(mut self) -> (Vec<CompanyRecord>, RunStats) {
        let mut keyspace = DeduplicationKeySpace::new();

        let (mut records, removed_companies) =
            self.dedup.dedupe_companies(self.records, &mut keyspace);
        self.stats.duplicate_companies_removed = removed_companies;

        self.stats.duplicate_emails_removed =
            self.dedup.dedupe_emails(&mut records, &mut keyspace);

        for record in &mut records {
            record.emails.truncate(self.max_emails_per_company);
        }

        self.stats.companies_with_emails =
            records.iter().filter(|r| !r.emails.is_empty()).count();

        (records, self.stats)
    }
}
