pub mod parser;
pub mod profile;

pub use parser::{DirectoryTraverser, ListingEntry};
