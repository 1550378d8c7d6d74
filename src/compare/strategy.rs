use std::fmt;
use std::io;

use serde::Serialize;
use snafu::{ResultExt, Snafu};
use tracing::debug;

use crate::compare::{ContentHasher, Digest, MetadataComparator};
use crate::filesystem::{Entry, FileSystem, FileSystemTrait, FsError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileStamp {
    pub size: u64,
    pub modified_at: i64,
}

impl From<&Entry> for FileStamp {
    fn from(entry: &Entry) -> Self {
        Self {
            size: entry.size,
            modified_at: entry.modified_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonOutcome {
    Match,
    ContentDiffers {
        left_digest: Digest,
        right_digest: Digest,
    },
    SizeOrTimeDiffers {
        left: FileStamp,
        right: FileStamp,
    },
}

/// File comparison policy applied to every pair of files present on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareStrategy {
    Hash(ContentHasher),
    Metadata(MetadataComparator),
}

impl CompareStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            CompareStrategy::Hash(_) => "hash",
            CompareStrategy::Metadata(_) => "metadata",
        }
    }

    pub async fn compare(
        &self,
        left_fs: &FileSystem,
        right_fs: &FileSystem,
        path: &str,
        left: &Entry,
        right: &Entry,
    ) -> Result<ComparisonOutcome, StrategyError> {
        match self {
            CompareStrategy::Metadata(comparator) => Ok(comparator.compare(left, right)),
            CompareStrategy::Hash(hasher) => {
                let (left_digest, right_digest) = futures::join!(
                    Self::digest(hasher, left_fs, path, Side::Left),
                    Self::digest(hasher, right_fs, path, Side::Right)
                );
                let (left_digest, right_digest) = (left_digest?, right_digest?);
                debug!("Digests of '{}': {} / {}", path, left_digest, right_digest);

                if left_digest == right_digest {
                    Ok(ComparisonOutcome::Match)
                } else {
                    Ok(ComparisonOutcome::ContentDiffers {
                        left_digest,
                        right_digest,
                    })
                }
            }
        }
    }

    async fn digest(
        hasher: &ContentHasher,
        fs: &FileSystem,
        path: &str,
        side: Side,
    ) -> Result<Digest, StrategyError> {
        let mut stream = fs.open_read(path).await.context(OpenSnafu { side })?;
        hasher.hash(&mut stream).await.context(ReadSnafu { side })
    }
}

impl Default for CompareStrategy {
    fn default() -> Self {
        CompareStrategy::Hash(ContentHasher::default())
    }
}

#[derive(Debug, Snafu)]
pub enum StrategyError {
    #[snafu(display("Failed to open the {} file: {}", side, source))]
    OpenError { side: Side, source: FsError },
    #[snafu(display("Failed to read the {} file: {}", side, source))]
    ReadError { side: Side, source: io::Error },
}

impl StrategyError {
    pub fn side(&self) -> Side {
        match self {
            StrategyError::OpenError { side, .. } | StrategyError::ReadError { side, .. } => *side,
        }
    }
}
