use dialoguer::{theme::ColorfulTheme, Input};
use scraper::{Html, Selector};

use crate::fetch::FetchEngine;
use crate::models::{CliApp, Result};

/// Candidate listing-page selectors, most specific first. Probing tries
/// each one and reports match counts so a new directory can be wired
/// into the config without guessing.
const LINK_CANDIDATES: &[&str] = &[
    r#"a[data-test="company-name"]"#,
    ".company-name a, a.company-name",
    ".listing-title a, a.listing-title",
    r#".card a[href*="/companies/"]"#,
    r#"h2 a[href*="/companies/"], h3 a[href*="/companies/"]"#,
    r#"a[href*="/companies/"][href$=".html"]"#,
    r#"a[href*="/company/"]"#,
    r#"a[href*="/supplier/"]"#,
];

const PAGINATION_CANDIDATES: &[&str] = &[
    r#"a[aria-label="Next page"]"#,
    r#"a[rel="next"]"#,
    ".pagination a.next",
    ".pager a.next",
];

impl CliApp {
    pub async fn run_probe_selectors(&self) -> Result<()> {
        let suggested = self
            .config
            .sectors
            .first()
            .map(|sector| sector.url.clone())
            .unwrap_or_default();

        let url: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Listing page URL to probe")
            .default(suggested)
            .interact_text()?;

        println!("\n🔬 Probing selectors on {}", url);
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        let engine = FetchEngine::one_shot(&self.config.fetch)?;
        let html = engine.fetch(&url).await?;
        println!("📄 Fetched {} bytes\n", html.len());

        // Html is parsed after the last await so the future stays Send.
        let document = Html::parse_document(&html);

        println!("Company links:");
        let best = probe_group(&document, LINK_CANDIDATES);

        println!("\nPagination:");
        probe_group(&document, PAGINATION_CANDIDATES);

        match best {
            Some((selector, count)) => {
                println!("\n🏆 Best link selector ({} matches):", count);
                println!("   {}", selector);
            }
            None => {
                println!("\n❌ No candidate matched. Inspect the page markup manually.");
            }
        }

        Ok(())
    }
}

/// Runs every candidate against the document, printing counts and up to
/// three sample matches each. Returns the candidate with the most hits.
fn probe_group<'a>(document: &Html, candidates: &[&'a str]) -> Option<(&'a str, usize)> {
    let mut best: Option<(&str, usize)> = None;

    for &candidate in candidates {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        let matches: Vec<_> = document.select(&selector).collect();

        if matches.is_empty() {
            println!("   {} → 0 matches", candidate);
            continue;
        }
        println!("✅ {} → {} matches", candidate, matches.len());

        for element in matches.iter().take(3) {
            let text = element.text().collect::<Vec<_>>().join(" ");
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            let href = element.value().attr("href").unwrap_or("");
            println!("      '{}' {}", snippet(&text, 40), href);
        }

        if matches.len() > best.map_or(0, |(_, count)| count) {
            best = Some((candidate, matches.len()));
        }
    }

    best
}

fn snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut)
}
