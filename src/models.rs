use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::{config::Config, fetch::FetchEngine};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Country value used when no resolution strategy produced a confident answer.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// One company as discovered on a directory listing page.
///
/// The ordinal is the position in submission order; it defines "first seen"
/// for deduplication regardless of which worker finishes first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanySeed {
    pub ordinal: usize,
    pub name: String,
    pub profile_url: String,
    pub website_url: Option<String>,
}

/// Fully assembled company record, ready for export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub ordinal: usize,
    pub name: String,
    pub country: String,
    pub profile_url: String,
    pub website_url: Option<String>,
    pub emails: Vec<String>,
}

impl CompanyRecord {
    /// Minimal record for a company whose pages could not be processed.
    pub fn minimal(seed: &CompanySeed) -> Self {
        Self {
            ordinal: seed.ordinal,
            name: seed.name.clone(),
            country: UNKNOWN_COUNTRY.to_string(),
            profile_url: seed.profile_url.clone(),
            website_url: seed.website_url.clone(),
            emails: Vec::new(),
        }
    }

    /// Number of populated fields, used to pick the survivor among duplicates.
    pub fn completeness(&self) -> usize {
        let mut score = 0;
        if !self.name.trim().is_empty() {
            score += 1;
        }
        if self.country != UNKNOWN_COUNTRY {
            score += 1;
        }
        if self.website_url.as_deref().is_some_and(|w| !w.is_empty()) {
            score += 1;
        }
        if !self.emails.is_empty() {
            score += 1;
        }
        score
    }
}

/// Country/region/locality values harvested from structured page data
/// (JSON-LD postal addresses, geo meta tags). Highest-trust country signal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructuredHints {
    pub country: Option<String>,
    pub region: Option<String>,
    pub locality: Option<String>,
}

impl StructuredHints {
    pub fn is_empty(&self) -> bool {
        self.country.is_none() && self.region.is_none() && self.locality.is_none()
    }
}

/// Classification buckets for extracted email addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailCategory {
    Business,
    Personal,
    Spam,
    Invalid,
}

impl std::fmt::Display for EmailCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmailCategory::Business => write!(f, "business"),
            EmailCategory::Personal => write!(f, "personal"),
            EmailCategory::Spam => write!(f, "spam"),
            EmailCategory::Invalid => write!(f, "invalid"),
        }
    }
}

/// Sector keyword list, lowercased and deduplicated at construction.
/// Used only as a relevance signal in reporting, never for filtering.
#[derive(Debug, Clone)]
pub struct SectorVocabulary {
    sector: String,
    keywords: HashSet<String>,
}

impl SectorVocabulary {
    pub fn new(sector: &str, keywords: &[String]) -> Self {
        let keywords = keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        Self {
            sector: sector.to_string(),
            keywords,
        }
    }

    pub fn empty(sector: &str) -> Self {
        Self {
            sector: sector.to_string(),
            keywords: HashSet::new(),
        }
    }

    pub fn sector(&self) -> &str {
        &self.sector
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// True when any keyword appears in the text (case-insensitive).
    pub fn matches(&self, text: &str) -> bool {
        if self.keywords.is_empty() {
            return false;
        }
        let lower = text.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }
}

pub struct CliApp {
    pub config: Config,
    pub engine: Arc<FetchEngine>,
}
