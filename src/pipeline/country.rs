use std::collections::HashMap;
use tracing::debug;
use url::Url;

use crate::models::{StructuredHints, UNKNOWN_COUNTRY};

/// ISO 3166 alpha-2 codes for the countries the directories cover. Also
/// doubles as the URL locale-segment table (`/de/` means Germany).
const ALPHA2: &[(&str, &str)] = &[
    ("at", "Austria"),
    ("be", "Belgium"),
    ("bg", "Bulgaria"),
    ("ch", "Switzerland"),
    ("cz", "Czech Republic"),
    ("de", "Germany"),
    ("dk", "Denmark"),
    ("ee", "Estonia"),
    ("es", "Spain"),
    ("fi", "Finland"),
    ("fr", "France"),
    ("gb", "United Kingdom"),
    ("gr", "Greece"),
    ("hr", "Croatia"),
    ("hu", "Hungary"),
    ("ie", "Ireland"),
    ("it", "Italy"),
    ("lt", "Lithuania"),
    ("lu", "Luxembourg"),
    ("lv", "Latvia"),
    ("mt", "Malta"),
    ("nl", "Netherlands"),
    ("no", "Norway"),
    ("pl", "Poland"),
    ("pt", "Portugal"),
    ("ro", "Romania"),
    ("se", "Sweden"),
    ("si", "Slovenia"),
    ("sk", "Slovakia"),
    ("tr", "Turkey"),
    ("uk", "United Kingdom"),
];

/// Native and localized country spellings as they appear in address
/// blocks, mapped to the canonical English name.
const NATIVE_SPELLINGS: &[(&str, &str)] = &[
    ("deutschland", "Germany"),
    ("österreich", "Austria"),
    ("osterreich", "Austria"),
    ("españa", "Spain"),
    ("espana", "Spain"),
    ("italia", "Italy"),
    ("nederland", "Netherlands"),
    ("belgië", "Belgium"),
    ("belgie", "Belgium"),
    ("belgique", "Belgium"),
    ("schweiz", "Switzerland"),
    ("suisse", "Switzerland"),
    ("svizzera", "Switzerland"),
    ("polska", "Poland"),
    ("česká republika", "Czech Republic"),
    ("ceska republika", "Czech Republic"),
    ("česko", "Czech Republic"),
    ("türkiye", "Turkey"),
    ("turkiye", "Turkey"),
    ("sverige", "Sweden"),
    ("norge", "Norway"),
    ("danmark", "Denmark"),
    ("suomi", "Finland"),
    ("magyarország", "Hungary"),
    ("magyarorszag", "Hungary"),
    ("hrvatska", "Croatia"),
    ("éire", "Ireland"),
    ("eire", "Ireland"),
    ("românia", "Romania"),
    ("ελλάδα", "Greece"),
];

/// Canonical names plus common English variants, multi-word entries
/// first so "Northern Ireland" is never read as "Ireland".
const ENGLISH_TOKENS: &[(&str, &str)] = &[
    ("united kingdom", "United Kingdom"),
    ("great britain", "United Kingdom"),
    ("northern ireland", "United Kingdom"),
    ("czech republic", "Czech Republic"),
    ("austria", "Austria"),
    ("belgium", "Belgium"),
    ("bulgaria", "Bulgaria"),
    ("croatia", "Croatia"),
    ("denmark", "Denmark"),
    ("england", "United Kingdom"),
    ("estonia", "Estonia"),
    ("finland", "Finland"),
    ("france", "France"),
    ("germany", "Germany"),
    ("greece", "Greece"),
    ("hungary", "Hungary"),
    ("ireland", "Ireland"),
    ("italy", "Italy"),
    ("latvia", "Latvia"),
    ("lithuania", "Lithuania"),
    ("luxembourg", "Luxembourg"),
    ("malta", "Malta"),
    ("netherlands", "Netherlands"),
    ("norway", "Norway"),
    ("poland", "Poland"),
    ("portugal", "Portugal"),
    ("romania", "Romania"),
    ("scotland", "United Kingdom"),
    ("slovakia", "Slovakia"),
    ("slovenia", "Slovenia"),
    ("spain", "Spain"),
    ("sweden", "Sweden"),
    ("switzerland", "Switzerland"),
    ("turkey", "Turkey"),
    ("wales", "United Kingdom"),
];

/// Words signalling that surrounding text is a registered location.
const POSITIVE_INDICATORS: &[&str] = &[
    "address",
    "adresse",
    "anschrift",
    "dirección",
    "direccion",
    "indirizzo",
    "located in",
    "based in",
    "location",
    "headquarters",
    "head office",
    "registered office",
    "sede",
    "siège",
    "siege",
    "ubicado",
    "situé",
    "situe",
];

/// Words signalling a service area rather than a registered location.
const NEGATIVE_INDICATORS: &[&str] = &[
    "ships to",
    "shipping to",
    "ship to",
    "delivery to",
    "deliver to",
    "delivers to",
    "available in",
    "markets in",
    "operates in",
    "sells to",
    "exports to",
    "export to",
    "distribution in",
];

/// Characters of context inspected on each side of a country mention.
const CONTEXT_WINDOW: usize = 120;

/// Which precedence level produced a resolution. Reported per company so
/// the run statistics can show the hit rate of each strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionLevel {
    StructuredHints,
    NativeSpelling,
    UrlLocale,
    ContextualMention,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub country: String,
    pub level: Option<ResolutionLevel>,
}

impl Resolution {
    fn unknown() -> Self {
        Self {
            country: UNKNOWN_COUNTRY.to_string(),
            level: None,
        }
    }
}

type Strategy = fn(&CountryResolver, &str, &str, Option<&StructuredHints>) -> Option<String>;

/// Resolves a company's country from weak page signals.
///
/// Strategies run in a fixed precedence order and the first confident
/// answer wins outright; there is no voting across levels. A level is
/// confident only when it finds exactly one distinct country, so an
/// ambiguous level falls through instead of guessing.
pub struct CountryResolver {
    aliases: HashMap<String, &'static str>,
    strategies: [(ResolutionLevel, Strategy); 4],
}

impl CountryResolver {
    pub fn new() -> Self {
        let mut aliases: HashMap<String, &'static str> = HashMap::new();
        for (code, country) in ALPHA2 {
            aliases.insert((*code).to_string(), country);
        }
        for (spelling, country) in NATIVE_SPELLINGS {
            aliases.insert((*spelling).to_string(), country);
        }
        for (token, country) in ENGLISH_TOKENS {
            aliases.insert((*token).to_string(), country);
        }

        Self {
            aliases,
            strategies: [
                (ResolutionLevel::StructuredHints, Self::from_structured_hints),
                (ResolutionLevel::NativeSpelling, Self::from_native_spelling),
                (ResolutionLevel::UrlLocale, Self::from_url_locale),
                (ResolutionLevel::ContextualMention, Self::from_contextual_mention),
            ],
        }
    }

    /// Never fails: falls back to "Unknown" when every strategy abstains.
    pub fn resolve(
        &self,
        page_text: &str,
        page_url: &str,
        hints: Option<&StructuredHints>,
    ) -> Resolution {
        for (level, strategy) in &self.strategies {
            if let Some(country) = strategy(self, page_text, page_url, hints) {
                debug!("Resolved country {:?} at {:?} for {}", country, level, page_url);
                return Resolution {
                    country,
                    level: Some(*level),
                };
            }
        }
        Resolution::unknown()
    }

    /// Level 1: explicit country in structured page data. Trusted as-is;
    /// known codes and spellings are canonicalized, anything else passes
    /// through untouched.
    fn from_structured_hints(
        &self,
        _text: &str,
        _url: &str,
        hints: Option<&StructuredHints>,
    ) -> Option<String> {
        let hints = hints?;

        if let Some(country) = hints.country.as_deref() {
            let trimmed = country.trim();
            if !trimmed.is_empty() {
                return Some(self.canonicalize(trimmed));
            }
        }

        // Region codes like "FR-75" still name the country.
        if let Some(region) = hints.region.as_deref() {
            let prefix = region.split(['-', ' ']).next().unwrap_or("").to_lowercase();
            if let Some(country) = self.aliases.get(&prefix) {
                if prefix.len() == 2 {
                    return Some((*country).to_string());
                }
            }
        }

        None
    }

    /// Level 2: native spelling in text, near an address indicator.
    fn from_native_spelling(
        &self,
        text: &str,
        _url: &str,
        _hints: Option<&StructuredHints>,
    ) -> Option<String> {
        if text.is_empty() {
            return None;
        }
        let lower = text.to_lowercase();

        let mut found: Vec<&'static str> = Vec::new();
        for (spelling, country) in NATIVE_SPELLINGS {
            for (start, end) in whole_word_positions(&lower, spelling) {
                if window_contains_any(&lower, start, end, POSITIVE_INDICATORS) {
                    if !found.contains(country) {
                        found.push(country);
                    }
                    break;
                }
            }
        }

        confident(found)
    }

    /// Level 3: locale segment in the source URL path.
    fn from_url_locale(
        &self,
        _text: &str,
        url: &str,
        _hints: Option<&StructuredHints>,
    ) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        let segments = parsed.path_segments()?;

        let mut found: Vec<&'static str> = Vec::new();
        for segment in segments {
            let lower = segment.to_lowercase();
            if let Some((_, country)) = ALPHA2.iter().find(|(code, _)| *code == lower) {
                if !found.contains(country) {
                    found.push(country);
                }
            }
        }

        confident(found)
    }

    /// Level 4: English country mention, accepted only with an address
    /// indicator in the surrounding window and no service-area wording.
    fn from_contextual_mention(
        &self,
        text: &str,
        _url: &str,
        _hints: Option<&StructuredHints>,
    ) -> Option<String> {
        if text.is_empty() {
            return None;
        }
        let lower = text.to_lowercase();

        let mut claimed: Vec<(usize, usize)> = Vec::new();
        let mut found: Vec<&'static str> = Vec::new();

        for (token, country) in ENGLISH_TOKENS {
            for (start, end) in whole_word_positions(&lower, token) {
                if claimed.iter().any(|(s, e)| start < *e && *s < end) {
                    continue;
                }
                claimed.push((start, end));

                if window_contains_any(&lower, start, end, NEGATIVE_INDICATORS) {
                    continue;
                }
                if window_contains_any(&lower, start, end, POSITIVE_INDICATORS)
                    && !found.contains(country)
                {
                    found.push(country);
                }
            }
        }

        confident(found)
    }

    fn canonicalize(&self, raw: &str) -> String {
        let key = raw.trim().to_lowercase();
        match self.aliases.get(&key) {
            Some(country) => (*country).to_string(),
            None => raw.trim().to_string(),
        }
    }
}

impl Default for CountryResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Exactly one distinct country means a confident answer; zero or
/// several means the level abstains.
fn confident(found: Vec<&'static str>) -> Option<String> {
    if found.len() == 1 {
        Some(found[0].to_string())
    } else {
        None
    }
}

/// Byte positions of `needle` in `haystack` where neither neighbor is
/// alphanumeric. Indices come from `match_indices`, so they always sit
/// on character boundaries.
fn whole_word_positions(haystack: &str, needle: &str) -> Vec<(usize, usize)> {
    let mut positions = Vec::new();
    for (start, matched) in haystack.match_indices(needle) {
        let end = start + matched.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if before_ok && after_ok {
            positions.push((start, end));
        }
    }
    positions
}

/// True when any indicator appears within CONTEXT_WINDOW characters of
/// the span. Window edges are clamped to character boundaries.
fn window_contains_any(text: &str, start: usize, end: usize, indicators: &[&str]) -> bool {
    let mut lo = start.saturating_sub(CONTEXT_WINDOW);
    while !text.is_char_boundary(lo) {
        lo -= 1;
    }
    let mut hi = (end + CONTEXT_WINDOW).min(text.len());
    while !text.is_char_boundary(hi) {
        hi += 1;
    }

    let window = &text[lo..hi];
    indicators.iter().any(|i| window.contains(i))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints_with_country(country: &str) -> StructuredHints {
        StructuredHints {
            country: Some(country.to_string()),
            region: None,
            locality: None,
        }
    }

    #[test]
    fn structured_hints_beat_free_text_service_areas() {
        let resolver = CountryResolver::new();
        let resolution = resolver.resolve(
            "We ship to Germany and deliver to Italy within two days.",
            "https://example.com/company",
            Some(&hints_with_country("France")),
        );
        assert_eq!(resolution.country, "France");
        assert_eq!(resolution.level, Some(ResolutionLevel::StructuredHints));
    }

    #[test]
    fn hint_codes_and_native_spellings_are_canonicalized() {
        let resolver = CountryResolver::new();
        assert_eq!(
            resolver.resolve("", "", Some(&hints_with_country("FR"))).country,
            "France"
        );
        assert_eq!(
            resolver
                .resolve("", "", Some(&hints_with_country("Deutschland")))
                .country,
            "Germany"
        );
    }

    #[test]
    fn unrecognized_hint_passes_through_verbatim() {
        let resolver = CountryResolver::new();
        let resolution = resolver.resolve("", "", Some(&hints_with_country("Atlantis")));
        assert_eq!(resolution.country, "Atlantis");
        assert_eq!(resolution.level, Some(ResolutionLevel::StructuredHints));
    }

    #[test]
    fn region_code_hint_names_the_country() {
        let resolver = CountryResolver::new();
        let hints = StructuredHints {
            country: None,
            region: Some("FR-75".to_string()),
            locality: None,
        };
        let resolution = resolver.resolve("", "", Some(&hints));
        assert_eq!(resolution.country, "France");
        assert_eq!(resolution.level, Some(ResolutionLevel::StructuredHints));
    }

    #[test]
    fn native_spelling_near_address_context() {
        let resolver = CountryResolver::new();
        let text = "Anschrift: Hauptstraße 5, 80331 München, Deutschland. Tel: 089 1234";
        let resolution = resolver.resolve(text, "https://example.com", None);
        assert_eq!(resolution.country, "Germany");
        assert_eq!(resolution.level, Some(ResolutionLevel::NativeSpelling));
    }

    #[test]
    fn native_spelling_without_address_context_falls_through() {
        let resolver = CountryResolver::new();
        let resolution = resolver.resolve(
            "Wir lieben Deutschland und seine Weine.",
            "https://example.com",
            None,
        );
        assert_eq!(resolution.country, UNKNOWN_COUNTRY);
        assert_eq!(resolution.level, None);
    }

    #[test]
    fn url_locale_segment_resolves() {
        let resolver = CountryResolver::new();
        let resolution = resolver.resolve("", "https://example.com/de/firma", None);
        assert_eq!(resolution.country, "Germany");
        assert_eq!(resolution.level, Some(ResolutionLevel::UrlLocale));
    }

    #[test]
    fn native_spelling_outranks_url_locale() {
        let resolver = CountryResolver::new();
        let text = "Adresse: Calle Mayor 1, 28001 Madrid, España";
        let resolution = resolver.resolve(text, "https://example.com/fr/empresa", None);
        assert_eq!(resolution.country, "Spain");
        assert_eq!(resolution.level, Some(ResolutionLevel::NativeSpelling));
    }

    #[test]
    fn contextual_mention_with_address_indicator() {
        let resolver = CountryResolver::new();
        let text = "Registered office address: 10 Queen Street, London, United Kingdom.";
        let resolution = resolver.resolve(text, "https://example.com", None);
        assert_eq!(resolution.country, "United Kingdom");
        assert_eq!(resolution.level, Some(ResolutionLevel::ContextualMention));
    }

    #[test]
    fn service_area_wording_rejects_the_mention() {
        let resolver = CountryResolver::new();
        let text = "Our address: we arrange delivery to France for all orders.";
        let resolution = resolver.resolve(text, "https://example.com", None);
        assert_eq!(resolution.country, UNKNOWN_COUNTRY);
    }

    #[test]
    fn two_qualified_countries_are_ambiguous() {
        let resolver = CountryResolver::new();
        let text = "Main address: Paris, France. Second address: Berlin, Germany.";
        let resolution = resolver.resolve(text, "https://example.com", None);
        assert_eq!(resolution.country, UNKNOWN_COUNTRY);
    }

    #[test]
    fn northern_ireland_is_not_ireland() {
        let resolver = CountryResolver::new();
        let text = "Our registered office address: Belfast, Northern Ireland.";
        let resolution = resolver.resolve(text, "https://example.com", None);
        assert_eq!(resolution.country, "United Kingdom");
    }

    #[test]
    fn empty_input_defaults_to_unknown() {
        let resolver = CountryResolver::new();
        let resolution = resolver.resolve("", "", None);
        assert_eq!(resolution.country, UNKNOWN_COUNTRY);
        assert_eq!(resolution.level, None);
    }

    #[test]
    fn country_word_inside_another_word_is_ignored() {
        let resolver = CountryResolver::new();
        // "polandia.com" must not read as Poland even near an address.
        let text = "Contact address: info server at polandia.com office";
        let resolution = resolver.resolve(text, "https://example.com", None);
        assert_eq!(resolution.country, UNKNOWN_COUNTRY);
    }
}
