pub mod aggregator;
pub mod contact_pages;
pub mod country;
pub mod dedup;
pub mod email_patterns;
pub mod orchestrator;
pub mod validator;

pub use contact_pages::ContactPageDiscoverer;
pub use country::CountryResolver;
pub use dedup::{AttributionPolicy, DeduplicationKeySpace, Deduplicator};
pub use email_patterns::{EmailCandidate, EmailPatternMatcher};
pub use orchestrator::PipelineOrchestrator;
pub use validator::ContactValidator;
