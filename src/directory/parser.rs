use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::SectorConfig;
use crate::error::ScrapeError;
use crate::fetch::PageFetcher;
use crate::models::CompanySeed;

/// One company link as it appears on a listing page.
#[derive(Debug, Clone)]
pub struct ListingEntry {
    pub name: String,
    pub profile_url: String,
}

/// Walks a sector's directory listing pages and turns company links into
/// seeds. The profile-link selector comes from configuration; pagination
/// uses the configured selector with common fallbacks.
pub struct DirectoryTraverser {
    sector: SectorConfig,
    link_selector: Selector,
    pagination_selector: Option<Selector>,
    slug_trailer: Regex,
}

impl DirectoryTraverser {
    pub fn new(sector: SectorConfig) -> Result<Self, ScrapeError> {
        let link_selector =
            Selector::parse(&sector.link_selector).map_err(|_| ScrapeError::Selector {
                selector: sector.link_selector.clone(),
            })?;

        let pagination_selector = if sector.pagination_selector.trim().is_empty() {
            None
        } else {
            let parsed = Selector::parse(&sector.pagination_selector).ok();
            if parsed.is_none() {
                warn!(
                    "Ignoring unparseable pagination selector for sector '{}': {}",
                    sector.name, sector.pagination_selector
                );
            }
            parsed
        };

        Ok(Self {
            sector,
            link_selector,
            pagination_selector,
            slug_trailer: Regex::new(r"-\d+$").unwrap(),
        })
    }

    pub fn sector(&self) -> &SectorConfig {
        &self.sector
    }

    /// Fetches up to `max_pages` listing pages and returns the seeds in
    /// discovery order. A failure on the first page is fatal; a failure
    /// on a later page keeps what was collected so far.
    pub async fn collect_seeds(
        &self,
        fetcher: &dyn PageFetcher,
    ) -> Result<Vec<CompanySeed>, ScrapeError> {
        let mut seeds: Vec<CompanySeed> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut page_url = self.sector.url.clone();
        let mut pages_visited = 0;

        for page_index in 1..=self.sector.max_pages {
            let html = match fetcher.fetch_page(&page_url).await {
                Ok(html) => html,
                Err(e) if page_index == 1 => return Err(e),
                Err(e) => {
                    warn!(
                        "Listing page {} of sector '{}' failed, keeping {} seeds: {}",
                        page_index,
                        self.sector.name,
                        seeds.len(),
                        e
                    );
                    break;
                }
            };
            pages_visited += 1;

            let entries = self.parse_listing(&html, &page_url);
            debug!(
                "Listing page {}/{}: {} company links",
                page_index,
                self.sector.max_pages,
                entries.len()
            );

            for entry in entries {
                let key = entry.profile_url.trim_end_matches('/').to_string();
                if seen.insert(key) {
                    seeds.push(CompanySeed {
                        ordinal: seeds.len(),
                        name: entry.name,
                        profile_url: entry.profile_url,
                        website_url: None,
                    });
                }
            }

            match self.next_page_url(&html, &page_url) {
                Some(next) if page_index < self.sector.max_pages => page_url = next,
                _ => break,
            }
        }

        info!(
            "📇 Sector '{}': {} companies from {} listing pages",
            self.sector.name,
            seeds.len(),
            pages_visited
        );
        Ok(seeds)
    }

    /// Extracts company links from one listing page. Relative hrefs are
    /// resolved against the page URL; non-HTTP links are dropped.
    pub fn parse_listing(&self, html: &str, base_url: &str) -> Vec<ListingEntry> {
        let document = Html::parse_document(html);
        let mut entries = Vec::new();

        for element in document.select(&self.link_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Some(profile_url) = absolute_http(href, base_url) else {
                continue;
            };
            let name = self.recover_name(&element, &profile_url);
            entries.push(ListingEntry { name, profile_url });
        }

        entries
    }

    /// URL of the next listing page, if any. The configured selector is
    /// tried first, then common pagination markup. A link pointing back
    /// at the current page is treated as no next page.
    pub fn next_page_url(&self, html: &str, current_url: &str) -> Option<String> {
        let document = Html::parse_document(html);

        let fallbacks = [
            Selector::parse(r#"a[aria-label="Next page"]"#).unwrap(),
            Selector::parse(r#"a[rel="next"]"#).unwrap(),
            Selector::parse(".pagination a.next").unwrap(),
        ];
        let candidates = self.pagination_selector.iter().chain(fallbacks.iter());

        for selector in candidates {
            let Some(element) = document.select(selector).next() else {
                continue;
            };
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Some(next) = absolute_http(href, current_url) else {
                continue;
            };
            if next.trim_end_matches('/') != current_url.trim_end_matches('/') {
                return Some(next);
            }
        }

        None
    }

    /// Company name for a listing link, trying progressively weaker
    /// sources: visible text, title attribute, aria-label, finally the
    /// URL slug title-cased.
    fn recover_name(&self, element: &ElementRef, profile_url: &str) -> String {
        let text = element
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if !text.is_empty() {
            return text;
        }

        for attr in ["title", "aria-label"] {
            if let Some(value) = element.value().attr(attr) {
                let value = value.trim();
                if !value.is_empty() {
                    return value.to_string();
                }
            }
        }

        self.name_from_slug(profile_url)
    }

    /// Name from the URL slug. Directories put the slug either last
    /// (`/c/acme-wines-1.html`) or first with a numeric ID as the final
    /// segment (`/ACME-WINES-SL/00000001234-567.html`), so the scan runs
    /// back to front and skips segments with no letters left.
    fn name_from_slug(&self, profile_url: &str) -> String {
        let Ok(url) = Url::parse(profile_url) else {
            return String::new();
        };
        let Some(segments) = url.path_segments() else {
            return String::new();
        };

        for segment in segments.rev().filter(|s| !s.is_empty()) {
            let stem = segment
                .trim_end_matches(".html")
                .trim_end_matches(".htm");
            let stem = self.slug_trailer.replace(stem, "");
            if !stem.chars().any(|c| c.is_ascii_alphabetic()) {
                continue;
            }
            return stem
                .split('-')
                .filter(|word| !word.is_empty())
                .map(title_case)
                .collect::<Vec<_>>()
                .join(" ");
        }

        String::new()
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

fn absolute_http(href: &str, base_url: &str) -> Option<String> {
    let base = Url::parse(base_url).ok()?;
    let resolved = base.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}
