use regex::Regex;
use std::collections::HashSet;

use crate::models::{EmailCategory, SectorVocabulary};
use crate::pipeline::email_patterns::EmailCandidate;

/// Tokens marking non-actionable placeholder addresses. Tokens with an
/// `@` match anywhere in the address; plain tokens match inside the
/// local part or as a whole domain label, so "example.com" is spam
/// while "winery-example.com" is a real business domain.
const SPAM_TOKENS: &[&str] = &[
    "noreply",
    "no-reply",
    "donotreply",
    "example",
    "test@",
    "admin@localhost",
    "webmaster@",
];

/// Consumer webmail domains. Exact domain matches only.
const PERSONAL_DOMAINS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "aol.com",
    "icloud.com",
    "mail.com",
    "protonmail.com",
];

#[derive(Debug, Clone)]
pub struct ValidationVerdict {
    pub is_format_valid: bool,
    pub category: EmailCategory,
    /// The sector vocabulary matched somewhere in the address. Reporting
    /// signal only; it never changes the category.
    pub sector_relevant: bool,
}

/// Classifies normalized email candidates. Checks short-circuit in a
/// fixed order: format, spam tokens, personal providers, business.
pub struct ContactValidator {
    strict: Regex,
    personal_domains: HashSet<&'static str>,
}

impl ContactValidator {
    pub fn new() -> Self {
        Self {
            strict: Regex::new(
                r"^[a-z0-9]([a-z0-9._-]*[a-z0-9])?@[a-z0-9]([a-z0-9.-]*[a-z0-9])?\.[a-z]{2,6}(\.[a-z]{2,3})?$",
            )
            .unwrap(),
            personal_domains: PERSONAL_DOMAINS.iter().copied().collect(),
        }
    }

    pub fn classify(
        &self,
        candidate: &EmailCandidate,
        vocabulary: &SectorVocabulary,
    ) -> ValidationVerdict {
        let email = candidate.normalized.as_str();

        if !self.strict.is_match(email) {
            return ValidationVerdict {
                is_format_valid: false,
                category: EmailCategory::Invalid,
                sector_relevant: false,
            };
        }

        let sector_relevant = vocabulary.matches(email);
        let (local, domain) = email.split_once('@').unwrap_or((email, ""));

        if is_spam(email, local, domain) {
            return ValidationVerdict {
                is_format_valid: true,
                category: EmailCategory::Spam,
                sector_relevant,
            };
        }

        if self.personal_domains.contains(domain) {
            return ValidationVerdict {
                is_format_valid: true,
                category: EmailCategory::Personal,
                sector_relevant,
            };
        }

        ValidationVerdict {
            is_format_valid: true,
            category: EmailCategory::Business,
            sector_relevant,
        }
    }
}

impl Default for ContactValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn is_spam(email: &str, local: &str, domain: &str) -> bool {
    SPAM_TOKENS.iter().any(|token| {
        if token.contains('@') {
            email.contains(token)
        } else {
            local.contains(token) || domain.split('.').any(|label| label == *token)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(email: &str) -> EmailCandidate {
        EmailCandidate {
            raw: email.to_string(),
            source_page: "https://example.com/contact".to_string(),
            normalized: email.to_string(),
        }
    }

    fn wine_vocab() -> SectorVocabulary {
        SectorVocabulary::new(
            "wine",
            &["winery".to_string(), "vineyard".to_string(), "vino".to_string()],
        )
    }

    #[test]
    fn noreply_address_is_spam() {
        let validator = ContactValidator::new();
        let verdict = validator.classify(&candidate("noreply@europages.com"), &wine_vocab());
        assert_eq!(verdict.category, EmailCategory::Spam);
        assert!(verdict.is_format_valid);
    }

    #[test]
    fn webmail_address_is_personal() {
        let validator = ContactValidator::new();
        let verdict = validator.classify(&candidate("j.doe@gmail.com"), &wine_vocab());
        assert_eq!(verdict.category, EmailCategory::Personal);
        assert!(verdict.is_format_valid);
    }

    #[test]
    fn company_address_with_industry_term_is_business_and_relevant() {
        let validator = ContactValidator::new();
        let verdict = validator.classify(&candidate("info@winery-example.com"), &wine_vocab());
        assert_eq!(verdict.category, EmailCategory::Business);
        assert!(verdict.sector_relevant);
    }

    #[test]
    fn placeholder_domain_is_spam() {
        let validator = ContactValidator::new();
        let verdict = validator.classify(&candidate("info@example.com"), &wine_vocab());
        assert_eq!(verdict.category, EmailCategory::Spam);
    }

    #[test]
    fn malformed_address_is_invalid() {
        let validator = ContactValidator::new();
        let verdict = validator.classify(&candidate("not-an-email"), &wine_vocab());
        assert_eq!(verdict.category, EmailCategory::Invalid);
        assert!(!verdict.is_format_valid);
        assert!(!verdict.sector_relevant);
    }

    #[test]
    fn vocabulary_never_overrides_personal_classification() {
        let validator = ContactValidator::new();
        let verdict = validator.classify(&candidate("vineyard.owner@gmail.com"), &wine_vocab());
        assert_eq!(verdict.category, EmailCategory::Personal);
        assert!(verdict.sector_relevant, "relevance is still reported");
    }

    #[test]
    fn vocabulary_never_overrides_spam_classification() {
        let validator = ContactValidator::new();
        let verdict = validator.classify(&candidate("noreply@vineyard.com"), &wine_vocab());
        assert_eq!(verdict.category, EmailCategory::Spam);
    }

    #[test]
    fn exact_domain_match_only_for_personal_providers() {
        let validator = ContactValidator::new();
        // A business running its own domain that merely contains a
        // provider name is not webmail.
        let verdict = validator.classify(&candidate("sales@gmail-consulting.de"), &wine_vocab());
        assert_eq!(verdict.category, EmailCategory::Business);
    }

    #[test]
    fn plain_business_address_without_vocabulary_hit() {
        let validator = ContactValidator::new();
        let verdict = validator.classify(&candidate("office@acme-tools.fr"), &wine_vocab());
        assert_eq!(verdict.category, EmailCategory::Business);
        assert!(!verdict.sector_relevant);
    }

    #[test]
    fn uppercase_input_fails_the_strict_format() {
        // The matcher lowercases before the validator ever sees a
        // candidate; raw uppercase reaching here is a format violation.
        let validator = ContactValidator::new();
        let verdict = validator.classify(&candidate("Sales@Example.com"), &wine_vocab());
        assert_eq!(verdict.category, EmailCategory::Invalid);
    }
}
