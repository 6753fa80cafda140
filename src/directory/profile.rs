use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

use crate::models::StructuredHints;

/// Hosts that show up behind "website" buttons but are file shares or ad
/// infrastructure, never a company homepage.
const UNWANTED_WEBSITE_HOSTS: &[&str] = &[
    "hubspotusercontent",
    "dropbox.com",
    "drive.google.com",
    "onedrive.live.com",
    "wetransfer.com",
    "we.tl",
    "s3.amazonaws.com",
    "box.com",
    "sharepoint.com",
    "adform",
];

/// Words that mark an outbound link as the company's own site.
const WEBSITE_LINK_WORDS: &[&str] = &["website", "visit", "homepage", "site web", "web site"];

/// Visible text of the page with whitespace collapsed to single spaces.
pub fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let body_selector = Selector::parse("body").unwrap();

    document
        .select(&body_selector)
        .next()
        .map(|body| {
            body.text()
                .collect::<Vec<_>>()
                .join(" ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

/// Company name from the profile page: the first h1, else the title with
/// trailing "| Directory" style suffixes cut off.
pub fn extract_company_name(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let h1_selector = Selector::parse("h1").unwrap();
    if let Some(h1) = document.select(&h1_selector).next() {
        let name = clean_text(&h1.text().collect::<Vec<_>>().join(" "));
        if !name.is_empty() {
            return Some(name);
        }
    }

    let title_selector = Selector::parse("title").unwrap();
    let title = document
        .select(&title_selector)
        .next()
        .map(|t| t.text().collect::<String>())?;

    let head = title
        .split(" | ")
        .next()
        .and_then(|t| t.split(" - ").next())
        .unwrap_or(&title);
    let name = clean_text(head);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// The company's own website URL, if the profile links to one.
///
/// The dedicated website button is tried first; failing that, any
/// external link whose label names the company site. File-share and ad
/// hosts are rejected in both paths.
pub fn extract_website_url(html: &str, profile_url: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let button_selector = Selector::parse(
        "a.website-button, a[class*=\"website-button\"], a[data-test=\"company-website\"]",
    )
    .unwrap();
    for element in document.select(&button_selector) {
        if let Some(href) = element.value().attr("href") {
            if let Some(candidate) = absolute_http(href, profile_url) {
                if !is_unwanted_host(&candidate) {
                    return Some(candidate);
                }
            }
        }
    }

    let profile_host = host_of(profile_url);
    let anchor_selector = Selector::parse("a[href]").unwrap();
    for element in document.select(&anchor_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(candidate) = absolute_http(href, profile_url) else {
            continue;
        };
        if is_unwanted_host(&candidate) {
            continue;
        }
        if host_of(&candidate) == profile_host {
            continue;
        }

        let mut label = element.text().collect::<Vec<_>>().join(" ").to_lowercase();
        for attr in ["title", "aria-label"] {
            if let Some(value) = element.value().attr(attr) {
                label.push(' ');
                label.push_str(&value.to_lowercase());
            }
        }
        if WEBSITE_LINK_WORDS.iter().any(|w| label.contains(w)) {
            return Some(candidate);
        }
    }

    None
}

/// Country/region/locality signals from embedded structured data:
/// JSON-LD postal addresses first, geo meta tags filling whatever the
/// JSON-LD left open.
pub fn extract_structured_hints(html: &str) -> StructuredHints {
    let document = Html::parse_document(html);
    let mut hints = StructuredHints::default();

    let jsonld_selector = Selector::parse("script[type=\"application/ld+json\"]").unwrap();
    for script in document.select(&jsonld_selector) {
        let raw = script.text().collect::<String>();
        if let Ok(value) = serde_json::from_str::<Value>(&raw) {
            collect_jsonld(&value, &mut hints);
        }
    }

    if hints.country.is_none() {
        hints.country = meta_content(&document, "geo.country");
    }
    if hints.region.is_none() {
        hints.region = meta_content(&document, "geo.region");
    }
    if hints.locality.is_none() {
        hints.locality = meta_content(&document, "geo.placename");
    }

    hints
}

fn collect_jsonld(value: &Value, hints: &mut StructuredHints) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_jsonld(item, hints);
            }
        }
        Value::Object(map) => {
            if let Some(address) = map.get("address") {
                collect_address(address, hints);
            }
            if let Some(graph) = map.get("@graph") {
                collect_jsonld(graph, hints);
            }
        }
        _ => {}
    }
}

fn collect_address(value: &Value, hints: &mut StructuredHints) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_address(item, hints);
            }
        }
        Value::Object(map) => {
            if hints.country.is_none() {
                hints.country = string_or_name(map.get("addressCountry"));
            }
            if hints.region.is_none() {
                hints.region = string_or_name(map.get("addressRegion"));
            }
            if hints.locality.is_none() {
                hints.locality = string_or_name(map.get("addressLocality"));
            }
        }
        _ => {}
    }
}

// JSON-LD allows both "FR" and {"@type": "Country", "name": "France"}.
fn string_or_name(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Object(map) => match map.get("name") {
            Some(Value::String(s)) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            _ => None,
        },
        _ => None,
    }
}

fn meta_content(document: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse(&format!("meta[name=\"{}\"]", name)).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn absolute_http(href: &str, base_url: &str) -> Option<String> {
    let base = Url::parse(base_url).ok()?;
    let resolved = base.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        .unwrap_or_default()
}

fn is_unwanted_host(url: &str) -> bool {
    let host = host_of(url);
    UNWANTED_WEBSITE_HOSTS.iter().any(|bad| host.contains(bad))
}
