use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::ScrapingConfig;
use crate::directory::profile;
use crate::error::ScrapeError;
use crate::fetch::PageFetcher;
use crate::models::{CompanyRecord, CompanySeed, EmailCategory, SectorVocabulary};
use crate::pipeline::aggregator::{CompanyOutcome, RecordAggregator};
use crate::pipeline::contact_pages::ContactPageDiscoverer;
use crate::pipeline::country::CountryResolver;
use crate::pipeline::email_patterns::EmailPatternMatcher;
use crate::pipeline::validator::ContactValidator;
use crate::stats::RunStats;

/// The per-run pipeline: takes company seeds, drives fetching and the
/// extraction stages concurrently, funnels every worker's outcome through
/// one aggregation point, and deduplicates after all workers finished.
///
/// Page failures never cross the company boundary. A company whose pages
/// all fail still produces a minimal record.
pub struct PipelineOrchestrator {
    stages: Arc<Stages>,
}

struct Stages {
    fetcher: Arc<dyn PageFetcher>,
    matcher: EmailPatternMatcher,
    discoverer: ContactPageDiscoverer,
    resolver: CountryResolver,
    validator: ContactValidator,
    scraping: ScrapingConfig,
}

impl PipelineOrchestrator {
    pub fn new(fetcher: Arc<dyn PageFetcher>, scraping: ScrapingConfig) -> Self {
        Self {
            stages: Arc::new(Stages {
                fetcher,
                matcher: EmailPatternMatcher::new(),
                discoverer: ContactPageDiscoverer::new(scraping.max_contact_pages),
                resolver: CountryResolver::new(),
                validator: ContactValidator::new(),
                scraping,
            }),
        }
    }

    pub async fn run(
        &self,
        seeds: Vec<CompanySeed>,
        vocabulary: &SectorVocabulary,
    ) -> (Vec<CompanyRecord>, RunStats) {
        let started = Instant::now();
        let scraping = &self.stages.scraping;

        info!(
            "🚀 Processing {} companies ({} company workers, {} page slots)",
            seeds.len(),
            scraping.company_concurrency,
            scraping.page_concurrency
        );

        let mut aggregator = RecordAggregator::new(
            scraping.email_attribution,
            scraping.max_emails_per_company,
        );
        aggregator.note_seeds(seeds.len());

        let company_limit = Arc::new(Semaphore::new(scraping.company_concurrency));
        let page_limit = Arc::new(Semaphore::new(scraping.page_concurrency));
        let stagger = Duration::from_millis(scraping.delay_between_companies_ms);

        let total = seeds.len();
        let mut workers = JoinSet::new();
        for (i, seed) in seeds.into_iter().enumerate() {
            let stages = self.stages.clone();
            let vocabulary = vocabulary.clone();
            let company_limit = company_limit.clone();
            let page_limit = page_limit.clone();

            workers.spawn(async move {
                let _permit = company_limit.acquire_owned().await;
                Self::process_company(stages, seed, vocabulary, page_limit).await
            });

            if i + 1 < total && !stagger.is_zero() {
                sleep(stagger).await;
            }
        }

        // Single consumer: worker outcomes are absorbed serially here.
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(outcome) => aggregator.absorb(outcome),
                Err(e) => warn!("Company worker failed: {}", e),
            }
        }

        let (records, mut stats) = aggregator.finish();
        stats.elapsed_seconds = started.elapsed().as_secs_f64();

        info!(
            "🏁 Run complete: {} records, {} emails attributed in {:.1}s",
            records.len(),
            records.iter().map(|r| r.emails.len()).sum::<usize>(),
            stats.elapsed_seconds
        );

        (records, stats)
    }

    async fn process_company(
        stages: Arc<Stages>,
        seed: CompanySeed,
        vocabulary: SectorVocabulary,
        page_limit: Arc<Semaphore>,
    ) -> CompanyOutcome {
        let cap = stages.scraping.max_emails_per_company;
        let mut outcome = CompanyOutcome::new(CompanyRecord::minimal(&seed));
        let mut seen_emails: HashSet<String> = HashSet::new();

        debug!("Processing company #{}: {}", seed.ordinal, seed.profile_url);

        // Directory profile page: identity, website link, structured hints.
        let mut hints = None;
        let mut profile_text = String::new();
        match Self::fetch_guarded(&stages, &page_limit, &seed.profile_url).await {
            Ok(html) => {
                outcome.pages_fetched += 1;

                if outcome.record.name.trim().is_empty() {
                    if let Some(name) = profile::extract_company_name(&html) {
                        outcome.record.name = name;
                    }
                }
                if outcome.record.website_url.is_none() {
                    outcome.record.website_url =
                        profile::extract_website_url(&html, &seed.profile_url);
                }

                let harvested = profile::extract_structured_hints(&html);
                if !harvested.is_empty() {
                    hints = Some(harvested);
                }
                profile_text = profile::page_text(&html);

                Self::harvest_page(
                    &stages,
                    &vocabulary,
                    &mut outcome,
                    &mut seen_emails,
                    &html,
                    &seed.profile_url,
                    cap,
                );
            }
            Err(e) => {
                outcome.fetch_failures += 1;
                warn!("Profile page failed for {}: {}", seed.profile_url, e);
            }
        }

        let resolution =
            stages
                .resolver
                .resolve(&profile_text, &seed.profile_url, hints.as_ref());
        outcome.record.country = resolution.country;
        outcome.resolution_level = resolution.level;

        // Company website: homepage, then proposed secondary pages. Path
        // guesses do not need the homepage HTML; only link candidates do.
        if let Some(website) = outcome.record.website_url.clone() {
            let proposals = match Self::fetch_guarded(&stages, &page_limit, &website).await {
                Ok(html) => {
                    outcome.pages_fetched += 1;
                    Self::harvest_page(
                        &stages,
                        &vocabulary,
                        &mut outcome,
                        &mut seen_emails,
                        &html,
                        &website,
                        cap,
                    );

                    let links = stages.discoverer.collect_links(&html, &website);
                    stages.discoverer.propose(&website, &links)
                }
                Err(e) => {
                    outcome.fetch_failures += 1;
                    warn!(
                        "Homepage failed for {}, trying common contact paths: {}",
                        website, e
                    );
                    stages.discoverer.propose(&website, &[])
                }
            };
            debug!("{} secondary pages proposed for {}", proposals.len(), website);

            let mut pages = JoinSet::new();
            for url in proposals {
                let fetcher = stages.fetcher.clone();
                let limit = page_limit.clone();
                pages.spawn(async move {
                    let _permit = limit.acquire_owned().await;
                    let fetched = fetcher.fetch_page(&url).await;
                    (url, fetched)
                });
            }
            while let Some(joined) = pages.join_next().await {
                match joined {
                    Ok((url, Ok(html))) => {
                        outcome.pages_fetched += 1;
                        Self::harvest_page(
                            &stages,
                            &vocabulary,
                            &mut outcome,
                            &mut seen_emails,
                            &html,
                            &url,
                            cap,
                        );
                    }
                    Ok((url, Err(e))) => {
                        outcome.fetch_failures += 1;
                        debug!("Secondary page failed for {}: {}", url, e);
                    }
                    Err(e) => warn!("Page task failed: {}", e),
                }
            }
        }

        outcome
    }

    async fn fetch_guarded(
        stages: &Stages,
        page_limit: &Semaphore,
        url: &str,
    ) -> Result<String, ScrapeError> {
        let _permit = page_limit.acquire().await;
        stages.fetcher.fetch_page(url).await
    }

    /// Runs extraction and classification over one page, counting every
    /// candidate and attributing business emails up to the cap.
    fn harvest_page(
        stages: &Stages,
        vocabulary: &SectorVocabulary,
        outcome: &mut CompanyOutcome,
        seen: &mut HashSet<String>,
        html: &str,
        page_url: &str,
        cap: usize,
    ) {
        for candidate in stages.matcher.extract(html, page_url) {
            outcome.emails_extracted += 1;
            let verdict = stages.validator.classify(&candidate, vocabulary);
            if verdict.sector_relevant {
                outcome.sector_relevant_emails += 1;
            }
            match verdict.category {
                EmailCategory::Business => {
                    outcome.business_emails += 1;
                    if seen.insert(candidate.normalized.clone())
                        && outcome.record.emails.len() < cap
                    {
                        outcome.record.emails.push(candidate.normalized);
                    }
                }
                EmailCategory::Personal => outcome.personal_emails += 1,
                EmailCategory::Spam => outcome.spam_emails += 1,
                EmailCategory::Invalid => outcome.invalid_emails += 1,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::dedup::AttributionPolicy;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FakeSite {
        pages: HashMap<String, String>,
        fail: HashSet<String>,
    }

    impl FakeSite {
        fn new() -> Self {
            Self {
                pages: HashMap::new(),
                fail: HashSet::new(),
            }
        }

        fn page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }

        fn failing(mut self, url: &str) -> Self {
            self.fail.insert(url.to_string());
            self
        }
    }

    #[async_trait]
    impl PageFetcher for FakeSite {
        async fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
            if self.fail.contains(url) {
                return Err(ScrapeError::Fetch {
                    url: url.to_string(),
                    reason: "injected failure".to_string(),
                });
            }
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| ScrapeError::Fetch {
                    url: url.to_string(),
                    reason: "no such page".to_string(),
                })
        }
    }

    fn scraping_config() -> ScrapingConfig {
        ScrapingConfig {
            max_contact_pages: 5,
            max_emails_per_company: 5,
            company_concurrency: 2,
            page_concurrency: 4,
            delay_between_companies_ms: 0,
            email_attribution: AttributionPolicy::FirstCompany,
        }
    }

    fn seed(ordinal: usize, name: &str, profile_url: &str) -> CompanySeed {
        CompanySeed {
            ordinal,
            name: name.to_string(),
            profile_url: profile_url.to_string(),
            website_url: None,
        }
    }

    fn profile_html(website: &str, country: &str) -> String {
        format!(
            r#"<html><head><script type="application/ld+json">
            {{"@type": "Organization", "address": {{"addressCountry": "{}"}}}}
            </script></head><body><h1>Profile</h1>
            <a class="website-button" href="{}">Website</a></body></html>"#,
            country, website
        )
    }

    fn orchestrator(site: FakeSite, config: ScrapingConfig) -> PipelineOrchestrator {
        PipelineOrchestrator::new(Arc::new(site), config)
    }

    #[tokio::test]
    async fn company_flows_from_profile_to_contact_page() {
        let site = FakeSite::new()
            .page(
                "https://dir.test/c/acme-1.html",
                &profile_html("https://acme.test/", "France"),
            )
            .page(
                "https://acme.test/",
                r#"<html><body><a href="/contact">Contact us</a></body></html>"#,
            )
            .page(
                "https://acme.test/contact",
                "<html><body><p>Reach us at info&#64;acme.test</p></body></html>",
            );

        let orchestrator = orchestrator(site, scraping_config());
        let seeds = vec![seed(0, "Acme Wines", "https://dir.test/c/acme-1.html")];
        let vocabulary = SectorVocabulary::new("wine", &["wine".to_string()]);

        let (records, stats) = orchestrator.run(seeds, &vocabulary).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Acme Wines");
        assert_eq!(records[0].country, "France");
        assert_eq!(records[0].website_url.as_deref(), Some("https://acme.test/"));
        assert_eq!(records[0].emails, vec!["info@acme.test"]);
        assert_eq!(stats.companies_processed, 1);
        assert_eq!(stats.companies_with_emails, 1);
        assert_eq!(stats.countries_from_hints, 1);
        assert!(stats.pages_fetched >= 3);
    }

    #[tokio::test]
    async fn total_fetch_failure_degrades_to_minimal_record() {
        let site = FakeSite::new().failing("https://dir.test/c/ghost-9.html");

        let orchestrator = orchestrator(site, scraping_config());
        let seeds = vec![seed(0, "Ghost Winery", "https://dir.test/c/ghost-9.html")];
        let vocabulary = SectorVocabulary::empty("wine");

        let (records, stats) = orchestrator.run(seeds, &vocabulary).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Ghost Winery");
        assert_eq!(records[0].country, "Unknown");
        assert!(records[0].emails.is_empty());
        assert_eq!(stats.fetch_failures, 1);
        assert_eq!(stats.companies_with_emails, 0);
        assert_eq!(stats.countries_unknown, 1);
    }

    #[tokio::test]
    async fn contact_paths_are_still_tried_when_the_homepage_is_down() {
        let mut config = scraping_config();
        config.max_contact_pages = 1;

        let site = FakeSite::new()
            .page(
                "https://dir.test/c/acme-1.html",
                &profile_html("https://acme.test/", "France"),
            )
            .failing("https://acme.test/")
            .page(
                "https://acme.test/contact",
                r#"<html><body><a href="mailto:info@acme.test">Write us</a></body></html>"#,
            );

        let orchestrator = orchestrator(site, config);
        let seeds = vec![seed(0, "Acme Wines", "https://dir.test/c/acme-1.html")];
        let vocabulary = SectorVocabulary::empty("wine");

        let (records, stats) = orchestrator.run(seeds, &vocabulary).await;

        assert_eq!(records[0].emails, vec!["info@acme.test"]);
        assert_eq!(records[0].country, "France");
        assert_eq!(stats.pages_fetched, 2);
        assert_eq!(stats.fetch_failures, 1);
    }

    #[tokio::test]
    async fn attribution_stops_at_the_email_cap() {
        let mut config = scraping_config();
        config.max_emails_per_company = 2;

        let site = FakeSite::new()
            .page(
                "https://dir.test/c/acme-1.html",
                &profile_html("https://acme.test/", "France"),
            )
            .page(
                "https://acme.test/",
                "<html><body>sales@acme.test export@acme.test office@acme.test</body></html>",
            );

        let orchestrator = orchestrator(site, config);
        let seeds = vec![seed(0, "Acme Wines", "https://dir.test/c/acme-1.html")];
        let vocabulary = SectorVocabulary::empty("wine");

        let (records, stats) = orchestrator.run(seeds, &vocabulary).await;

        assert_eq!(records[0].emails, vec!["sales@acme.test", "export@acme.test"]);
        assert_eq!(stats.business_emails, 3);
    }

    #[tokio::test]
    async fn shared_email_is_attributed_to_the_first_company_only() {
        let site = FakeSite::new()
            .page(
                "https://dir.test/c/acme-1.html",
                &profile_html("https://acme.test/", "France"),
            )
            .page(
                "https://acme.test/",
                "<html><body>shared@group.test</body></html>",
            )
            .page(
                "https://dir.test/c/bravo-2.html",
                &profile_html("https://bravo.test/", "Italy"),
            )
            .page(
                "https://bravo.test/",
                "<html><body>shared@group.test own@bravo.test</body></html>",
            );

        let orchestrator = orchestrator(site, scraping_config());
        let seeds = vec![
            seed(0, "Acme", "https://dir.test/c/acme-1.html"),
            seed(1, "Bravo", "https://dir.test/c/bravo-2.html"),
        ];
        let vocabulary = SectorVocabulary::empty("wine");

        let (records, stats) = orchestrator.run(seeds, &vocabulary).await;

        assert_eq!(records[0].emails, vec!["shared@group.test"]);
        assert_eq!(records[1].emails, vec!["own@bravo.test"]);
        assert_eq!(stats.duplicate_emails_removed, 1);
    }

    #[tokio::test]
    async fn spam_is_counted_but_never_attributed() {
        let site = FakeSite::new()
            .page(
                "https://dir.test/c/acme-1.html",
                &profile_html("https://acme.test/", "France"),
            )
            .page(
                "https://acme.test/",
                "<html><body>noreply@acme.test info@acme.test</body></html>",
            );

        let orchestrator = orchestrator(site, scraping_config());
        let seeds = vec![seed(0, "Acme", "https://dir.test/c/acme-1.html")];
        let vocabulary = SectorVocabulary::empty("wine");

        let (records, stats) = orchestrator.run(seeds, &vocabulary).await;

        assert_eq!(records[0].emails, vec!["info@acme.test"]);
        assert_eq!(stats.spam_emails, 1);
        assert_eq!(stats.business_emails, 1);
    }

    #[tokio::test]
    async fn url_locale_resolves_when_the_profile_page_is_gone() {
        let site = FakeSite::new().failing("https://dir.test/fr/c/ghost-9.html");

        let orchestrator = orchestrator(site, scraping_config());
        let seeds = vec![seed(0, "Ghost", "https://dir.test/fr/c/ghost-9.html")];
        let vocabulary = SectorVocabulary::empty("wine");

        let (records, stats) = orchestrator.run(seeds, &vocabulary).await;

        assert_eq!(records[0].country, "France");
        assert_eq!(stats.countries_from_url_locale, 1);
    }

    #[tokio::test]
    async fn structured_hint_codes_are_canonicalized() {
        let site = FakeSite::new()
            .page(
                "https://dir.test/c/acme-1.html",
                &profile_html("https://acme.test/", "ES"),
            )
            .page("https://acme.test/", "<html><body></body></html>");

        let orchestrator = orchestrator(site, scraping_config());
        let seeds = vec![seed(0, "Acme", "https://dir.test/c/acme-1.html")];
        let vocabulary = SectorVocabulary::empty("wine");

        let (records, stats) = orchestrator.run(seeds, &vocabulary).await;

        assert_eq!(records[0].country, "Spain");
        assert_eq!(stats.countries_from_hints, 1);
    }
}
