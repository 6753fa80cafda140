use regex::Regex;
use tracing::debug;

/// An unvalidated extraction result. Produced here, consumed immediately
/// by the validator, never persisted.
#[derive(Debug, Clone)]
pub struct EmailCandidate {
    pub raw: String,
    pub source_page: String,
    pub normalized: String,
}

/// Extracts candidate email addresses from raw markup, including the
/// obfuscated forms publishers use against naive scrapers.
///
/// Patterns are applied in a fixed precedence order. When two patterns
/// match overlapping spans of text, the higher-precedence pattern keeps
/// the span and the other is skipped, so each address is extracted once.
pub struct EmailPatternMatcher {
    strict: Regex,
    flexible: Regex,
    entity_obfuscated: Regex,
    spaced_obfuscated: Regex,
    mailto: Regex,
}

/// Finite iterator over extracted candidates, in document order.
/// Consumed once; not restartable.
pub struct Extraction {
    inner: std::vec::IntoIter<EmailCandidate>,
}

impl Iterator for Extraction {
    type Item = EmailCandidate;

    fn next(&mut self) -> Option<EmailCandidate> {
        self.inner.next()
    }
}

impl ExactSizeIterator for Extraction {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl EmailPatternMatcher {
    pub fn new() -> Self {
        Self {
            // Anchored shape every candidate must satisfy after normalization.
            strict: Regex::new(
                r"^[a-z0-9]([a-z0-9._-]*[a-z0-9])?@[a-z0-9]([a-z0-9.-]*[a-z0-9])?\.[a-z]{2,6}(\.[a-z]{2,3})?$",
            )
            .unwrap(),
            flexible: Regex::new(
                r"\b[A-Za-z0-9]([A-Za-z0-9._-]*[A-Za-z0-9])?@[A-Za-z0-9]([A-Za-z0-9.-]*[A-Za-z0-9])?\.[A-Za-z]{2,6}\b",
            )
            .unwrap(),
            entity_obfuscated: Regex::new(
                r"\b[A-Za-z0-9._-]+&#64;[A-Za-z0-9.-]+\.[A-Za-z]{2,6}\b",
            )
            .unwrap(),
            spaced_obfuscated: Regex::new(
                r"\b[A-Za-z0-9._-]+\s*@\s*[A-Za-z0-9.-]+\.[A-Za-z]{2,6}\b",
            )
            .unwrap(),
            mailto: Regex::new(r#"["']mailto:[^"']*["']"#).unwrap(),
        }
    }

    /// Scans `text` with every pattern and returns the surviving
    /// candidates as a finite iterator in document order.
    pub fn extract(&self, text: &str, source_page: &str) -> Extraction {
        // (span start, span end, raw span, addresses pulled from the span)
        let mut claimed: Vec<(usize, usize, String, Vec<String>)> = Vec::new();

        // Precedence 1: the whole input is exactly one address.
        if self.strict.is_match(text) {
            claimed.push((0, text.len(), text.to_string(), vec![text.to_string()]));
        }

        // Precedence 2: plain addresses embedded in prose or markup.
        for m in self.flexible.find_iter(text) {
            Self::claim(&mut claimed, m.start(), m.end(), m.as_str(), vec![
                m.as_str().to_string(),
            ]);
        }

        // Precedence 3: HTML-entity-encoded @ sign.
        for m in self.entity_obfuscated.find_iter(text) {
            let decoded = m.as_str().replace("&#64;", "@");
            Self::claim(&mut claimed, m.start(), m.end(), m.as_str(), vec![decoded]);
        }

        // Precedence 4: whitespace wedged around the @ sign.
        for m in self.spaced_obfuscated.find_iter(text) {
            let collapsed: String = m.as_str().chars().filter(|c| !c.is_whitespace()).collect();
            Self::claim(&mut claimed, m.start(), m.end(), m.as_str(), vec![collapsed]);
        }

        // Precedence 5: quoted mailto targets assembled by scripts.
        for m in self.mailto.find_iter(text) {
            let addresses = Self::split_mailto(m.as_str());
            if !addresses.is_empty() {
                Self::claim(&mut claimed, m.start(), m.end(), m.as_str(), addresses);
            }
        }

        claimed.sort_by_key(|(start, _, _, _)| *start);

        let mut candidates = Vec::new();
        for (_, _, raw, addresses) in claimed {
            for address in addresses {
                let normalized = self.normalize(&address);
                // Anything that does not look like an address once decoded
                // is dropped here and never reaches the validator.
                if self.strict.is_match(&normalized) {
                    candidates.push(EmailCandidate {
                        raw: raw.clone(),
                        source_page: source_page.to_string(),
                        normalized,
                    });
                }
            }
        }

        debug!(
            "Extracted {} email candidates from {}",
            candidates.len(),
            source_page
        );

        Extraction {
            inner: candidates.into_iter(),
        }
    }

    /// Entity decoding, lowercasing and edge trimming. Idempotent.
    pub fn normalize(&self, raw: &str) -> String {
        let decoded = raw
            .replace("&#64;", "@")
            .replace("&amp;", "&")
            .replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'");

        decoded
            .to_lowercase()
            .trim_matches(|c: char| {
                c.is_whitespace() || "<>()[]{}\",;:!?'".contains(c)
            })
            .to_string()
    }

    /// True when the string already has the exact final address shape.
    pub fn is_strict_match(&self, candidate: &str) -> bool {
        self.strict.is_match(candidate)
    }

    fn claim(
        claimed: &mut Vec<(usize, usize, String, Vec<String>)>,
        start: usize,
        end: usize,
        raw: &str,
        addresses: Vec<String>,
    ) {
        let overlaps = claimed
            .iter()
            .any(|(s, e, _, _)| start < *e && *s < end);
        if !overlaps {
            claimed.push((start, end, raw.to_string(), addresses));
        }
    }

    /// `"mailto:a@x.com,b@y.com?subject=Hi"` carries two addresses and a
    /// query tail that is not part of either.
    fn split_mailto(span: &str) -> Vec<String> {
        let inner = span.trim_matches(|c| c == '"' || c == '\'');
        let target = match inner.strip_prefix("mailto:") {
            Some(t) => t,
            None => return Vec::new(),
        };
        let without_query = target
            .split('?')
            .next()
            .unwrap_or("")
            .split('&')
            .next()
            .unwrap_or("");

        without_query
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Default for EmailPatternMatcher {
    fn default() -> Self {
        Self::new()
    }
}
