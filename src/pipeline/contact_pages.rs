use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

/// Path segments tried against a site's origin, most promising first.
const CONTACT_PATHS: &[&str] = &[
    "/contact",
    "/contact-us",
    "/about",
    "/about-us",
    "/contacts",
    "/contacto",
    "/contatti",
    "/kontakt",
    "/nous-contacter",
    "/chi-siamo",
    "/quienes-somos",
    "/impressum",
    "/mentions-legales",
    "/company",
    "/team",
];

/// How many path guesses outrank link-derived candidates. The rest of
/// CONTACT_PATHS only backfills slots the links leave unused.
const PATH_PRIORITY: usize = 3;

/// Link-text keywords marking likely contact pages, across the languages
/// the directories cover.
const CONTACT_KEYWORDS: &[&str] = &[
    "contact",
    "kontakt",
    "contacto",
    "contatti",
    "contattaci",
    "get in touch",
    "reach us",
    "about us",
    "about",
    "über uns",
    "impressum",
    "chi siamo",
    "quiénes somos",
    "quienes somos",
    "à propos",
    "qui sommes-nous",
    "nous contacter",
    "contactez",
    "mentions légales",
    "sobre nosotros",
    "acerca de",
    "informazioni",
];

/// A link lifted from a fetched page: absolute href plus visible text.
#[derive(Debug, Clone)]
pub struct PageLink {
    pub href: String,
    pub text: String,
}

/// Proposes a bounded, ordered set of secondary URLs worth fetching for
/// contact data. Never fetches anything itself.
pub struct ContactPageDiscoverer {
    cap: usize,
}

impl ContactPageDiscoverer {
    pub fn new(cap: usize) -> Self {
        Self { cap }
    }

    /// Candidate URLs for `root_url`, at most `cap`, root excluded,
    /// no duplicates. `homepage_links` is the link list of the already
    /// fetched homepage; pass an empty slice when it failed to load.
    pub fn propose(&self, root_url: &str, homepage_links: &[PageLink]) -> Vec<String> {
        let root = match Url::parse(root_url) {
            Ok(u) => u,
            Err(_) => {
                debug!("Cannot propose contact pages for unparseable root {}", root_url);
                return Vec::new();
            }
        };

        let origin = root.origin().ascii_serialization();
        let root_key = normalize_key(root_url);

        let path_guesses: Vec<String> = CONTACT_PATHS
            .iter()
            .map(|p| format!("{}{}", origin, p))
            .collect();

        let link_candidates = homepage_links
            .iter()
            .filter(|l| is_contact_link(l, &root))
            .map(|l| l.href.clone());

        let mut proposals = Vec::with_capacity(self.cap);
        let mut seen = vec![root_key];

        let ordered = path_guesses
            .iter()
            .take(PATH_PRIORITY)
            .cloned()
            .chain(link_candidates)
            .chain(path_guesses.iter().skip(PATH_PRIORITY).cloned());

        for candidate in ordered {
            if proposals.len() >= self.cap {
                break;
            }
            let key = normalize_key(&candidate);
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            proposals.push(candidate);
        }

        proposals
    }

    /// Pulls `a[href]` links out of a page, resolved against `base_url`.
    /// The fixed selector cannot fail to parse.
    pub fn collect_links(&self, html: &str, base_url: &str) -> Vec<PageLink> {
        let base = match Url::parse(base_url) {
            Ok(u) => u,
            Err(_) => return Vec::new(),
        };

        let document = Html::parse_document(html);
        let selector = Selector::parse("a[href]").unwrap();

        let mut links = Vec::new();
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if href.starts_with('#') || href.starts_with("javascript:") {
                    continue;
                }
                if let Ok(resolved) = base.join(href) {
                    if resolved.scheme() == "http" || resolved.scheme() == "https" {
                        links.push(PageLink {
                            href: resolved.to_string(),
                            text: element.text().collect::<String>().trim().to_string(),
                        });
                    }
                }
            }
        }
        links
    }
}

impl Default for ContactPageDiscoverer {
    fn default() -> Self {
        Self::new(5)
    }
}

fn is_contact_link(link: &PageLink, root: &Url) -> bool {
    let href = match Url::parse(&link.href) {
        Ok(u) => u,
        Err(_) => return false,
    };

    // Off-site links are never contact pages of this company.
    if !same_host(&href, root) {
        return false;
    }

    let text = link.text.to_lowercase();
    if CONTACT_KEYWORDS.iter().any(|k| text.contains(k)) {
        return true;
    }

    let path = href.path().to_lowercase();
    CONTACT_PATHS.iter().any(|p| path.contains(p))
}

fn same_host(a: &Url, b: &Url) -> bool {
    let strip = |u: &Url| {
        u.host_str()
            .map(|h| h.trim_start_matches("www.").to_lowercase())
            .unwrap_or_default()
    };
    strip(a) == strip(b)
}

/// Key for dedup: scheme/host casing and trailing slash do not make two
/// URLs different pages.
fn normalize_key(url: &str) -> String {
    match Url::parse(url) {
        Ok(u) => {
            let mut s = u.to_string();
            while s.ends_with('/') {
                s.pop();
            }
            s.to_lowercase()
        }
        Err(_) => url.trim_end_matches('/').to_lowercase(),
    }
}
