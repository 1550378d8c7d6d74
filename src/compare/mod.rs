//! File comparison strategies: SHA-256 content hashing and size/mtime heuristics.

mod content_hasher;
mod metadata_comparator;
mod strategy;

pub use content_hasher::{ContentHasher, DEFAULT_CHUNK_SIZE, Digest};
pub use metadata_comparator::{DEFAULT_TOLERANCE_SECONDS, MetadataComparator, metadata_equivalent};
pub use strategy::{CompareStrategy, ComparisonOutcome, FileStamp, Side, StrategyError};
