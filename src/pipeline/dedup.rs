use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::models::CompanyRecord;

/// What happens when the same email shows up under several companies.
/// Single attribution is the default; the alternative keeps the email
/// on every company that produced it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttributionPolicy {
    #[default]
    FirstCompany,
    EveryCompany,
}

/// Working state of one deduplication pass: every profile URL and every
/// normalized email seen so far. Created fresh per run, owned by the
/// final aggregation stage, and discarded with it. Nothing survives
/// between runs.
#[derive(Debug, Default)]
pub struct DeduplicationKeySpace {
    seen_profiles: HashSet<String>,
    seen_emails: HashSet<String>,
}

impl DeduplicationKeySpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when this profile URL was not seen before.
    pub fn note_profile(&mut self, profile_url: &str) -> bool {
        self.seen_profiles.insert(profile_url.to_string())
    }

    /// True when this email was not seen before.
    pub fn note_email(&mut self, email: &str) -> bool {
        self.seen_emails.insert(email.to_string())
    }

    pub fn profiles_seen(&self) -> usize {
        self.seen_profiles.len()
    }

    pub fn emails_seen(&self) -> usize {
        self.seen_emails.len()
    }
}

pub struct Deduplicator {
    policy: AttributionPolicy,
}

impl Deduplicator {
    pub fn new(policy: AttributionPolicy) -> Self {
        Self { policy }
    }

    /// One record per profile URL. The more complete record survives;
    /// on a tie the record seen first (lowest ordinal) does. Returns the
    /// surviving records in processing order plus the removal count.
    pub fn dedupe_companies(
        &self,
        mut records: Vec<CompanyRecord>,
        keyspace: &mut DeduplicationKeySpace,
    ) -> (Vec<CompanyRecord>, usize) {
        records.sort_by_key(|r| r.ordinal);

        let mut kept: Vec<CompanyRecord> = Vec::with_capacity(records.len());
        let mut index_of: HashMap<String, usize> = HashMap::new();
        let mut removed = 0;

        for record in records {
            if keyspace.note_profile(&record.profile_url) {
                index_of.insert(record.profile_url.clone(), kept.len());
                kept.push(record);
            } else {
                removed += 1;
                let idx = index_of[&record.profile_url];
                if record.completeness() > kept[idx].completeness() {
                    debug!(
                        "Replacing duplicate of {} with a more complete record",
                        record.profile_url
                    );
                    kept[idx] = record;
                }
            }
        }

        (kept, removed)
    }

    /// Enforces global email uniqueness across records according to the
    /// attribution policy. Returns how many attributions were dropped.
    pub fn dedupe_emails(
        &self,
        records: &mut [CompanyRecord],
        keyspace: &mut DeduplicationKeySpace,
    ) -> usize {
        if self.policy == AttributionPolicy::EveryCompany {
            // Per-company uniqueness is already guaranteed upstream.
            return 0;
        }

        let mut removed = 0;
        for record in records.iter_mut() {
            let before = record.emails.len();
            record.emails.retain(|email| keyspace.note_email(email));
            removed += before - record.emails.len();
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ordinal: usize, profile_url: &str, emails: &[&str]) -> CompanyRecord {
        CompanyRecord {
            ordinal,
            name: format!("Company {}", ordinal),
            country: "France".to_string(),
            profile_url: profile_url.to_string(),
            website_url: Some(format!("https://company{}.example", ordinal)),
            emails: emails.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[test]
    fn more_complete_duplicate_survives() {
        let dedup = Deduplicator::new(AttributionPolicy::FirstCompany);
        let mut keyspace = DeduplicationKeySpace::new();

        let mut sparse = record(0, "https://dir.example/p/1", &[]);
        sparse.website_url = None;
        let full = record(1, "https://dir.example/p/1", &["info@a.com"]);

        let (kept, removed) = dedup.dedupe_companies(vec![sparse, full], &mut keyspace);
        assert_eq!(kept.len(), 1);
        assert_eq!(removed, 1);
        assert_eq!(kept[0].emails, vec!["info@a.com"]);
    }

    #[test]
    fn tie_keeps_the_first_seen_record() {
        let dedup = Deduplicator::new(AttributionPolicy::FirstCompany);
        let mut keyspace = DeduplicationKeySpace::new();

        let first = record(0, "https://dir.example/p/1", &["first@a.com"]);
        let second = record(1, "https://dir.example/p/1", &["second@a.com"]);

        let (kept, _) = dedup.dedupe_companies(vec![first, second], &mut keyspace);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].emails, vec!["first@a.com"]);
    }

    #[test]
    fn processing_order_is_ordinal_order_not_input_order() {
        let dedup = Deduplicator::new(AttributionPolicy::FirstCompany);
        let mut keyspace = DeduplicationKeySpace::new();

        // Input arrives out of order, as concurrent workers finish.
        let late = record(3, "https://dir.example/p/1", &["late@a.com"]);
        let early = record(0, "https://dir.example/p/1", &["early@a.com"]);

        let (kept, _) = dedup.dedupe_companies(vec![late, early], &mut keyspace);
        assert_eq!(kept[0].emails, vec!["early@a.com"]);
    }

    #[test]
    fn distinct_profiles_are_untouched() {
        let dedup = Deduplicator::new(AttributionPolicy::FirstCompany);
        let mut keyspace = DeduplicationKeySpace::new();

        let a = record(0, "https://dir.example/p/1", &[]);
        let b = record(1, "https://dir.example/p/2", &[]);

        let (kept, removed) = dedup.dedupe_companies(vec![a, b], &mut keyspace);
        assert_eq!(kept.len(), 2);
        assert_eq!(removed, 0);
        assert_eq!(keyspace.profiles_seen(), 2);
    }

    #[test]
    fn shared_email_stays_with_the_first_company() {
        let dedup = Deduplicator::new(AttributionPolicy::FirstCompany);
        let mut keyspace = DeduplicationKeySpace::new();

        let mut records = vec![
            record(0, "https://dir.example/p/1", &["shared@a.com"]),
            record(1, "https://dir.example/p/2", &["shared@a.com", "own@b.com"]),
        ];

        let removed = dedup.dedupe_emails(&mut records, &mut keyspace);
        assert_eq!(removed, 1);
        assert_eq!(records[0].emails, vec!["shared@a.com"]);
        assert_eq!(records[1].emails, vec!["own@b.com"]);
    }

    #[test]
    fn every_company_policy_keeps_shared_attributions() {
        let dedup = Deduplicator::new(AttributionPolicy::EveryCompany);
        let mut keyspace = DeduplicationKeySpace::new();

        let mut records = vec![
            record(0, "https://dir.example/p/1", &["shared@a.com"]),
            record(1, "https://dir.example/p/2", &["shared@a.com"]),
        ];

        let removed = dedup.dedupe_emails(&mut records, &mut keyspace);
        assert_eq!(removed, 0);
        assert_eq!(records[0].emails, vec!["shared@a.com"]);
        assert_eq!(records[1].emails, vec!["shared@a.com"]);
    }

    #[test]
    fn keyspace_starts_empty_each_run() {
        let keyspace = DeduplicationKeySpace::new();
        assert_eq!(keyspace.profiles_seen(), 0);
        assert_eq!(keyspace.emails_seen(), 0);
    }
}
