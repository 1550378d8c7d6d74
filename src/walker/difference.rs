use serde::Serialize;

use crate::compare::{ComparisonOutcome, Digest, FileStamp, Side};
use crate::ext::components;
use crate::filesystem::EntryKind;

/// Why two files present on both sides were not considered equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum MismatchDetail {
    Digest { left: Digest, right: Digest },
    Metadata { left: FileStamp, right: FileStamp },
    LinkTarget { left: String, right: String },
    Unreadable { side: Side, message: String },
    /// The directory is one of its own ancestors on at least one side,
    /// reached through links. Each side holds the ancestor it leads back to.
    DirectoryCycle {
        left: Option<String>,
        right: Option<String>,
    },
}

impl MismatchDetail {
    /// The detail carried by a non-matching outcome, `None` for a match.
    pub fn from_outcome(outcome: ComparisonOutcome) -> Option<Self> {
        match outcome {
            ComparisonOutcome::Match => None,
            ComparisonOutcome::ContentDiffers {
                left_digest,
                right_digest,
            } => Some(MismatchDetail::Digest {
                left: left_digest,
                right: right_digest,
            }),
            ComparisonOutcome::SizeOrTimeDiffers { left, right } => {
                Some(MismatchDetail::Metadata { left, right })
            }
        }
    }
}

/// One classified discrepancy between the two trees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PathDifference {
    MissingOnRight {
        path: String,
        kind: EntryKind,
    },
    MissingOnLeft {
        path: String,
        kind: EntryKind,
    },
    TypeMismatch {
        path: String,
        left: EntryKind,
        right: EntryKind,
    },
    ContentMismatch {
        path: String,
        detail: MismatchDetail,
    },
}

impl PathDifference {
    pub fn path(&self) -> &str {
        match self {
            PathDifference::MissingOnRight { path, .. }
            | PathDifference::MissingOnLeft { path, .. }
            | PathDifference::TypeMismatch { path, .. }
            | PathDifference::ContentMismatch { path, .. } => path,
        }
    }
}

/// Differences and counters of one subtree, merged into its parent's.
#[derive(Debug, Default)]
pub struct PartialResult {
    differences: Vec<PathDifference>,
    files_compared: usize,
    directories_compared: usize,
}

impl PartialResult {
    pub fn directory() -> Self {
        Self {
            directories_compared: 1,
            ..Self::default()
        }
    }

    pub fn file() -> Self {
        Self {
            files_compared: 1,
            ..Self::default()
        }
    }

    pub fn push(&mut self, difference: PathDifference) {
        self.differences.push(difference);
    }

    pub fn merge(&mut self, child: PartialResult) {
        self.differences.extend(child.differences);
        self.files_compared += child.files_compared;
        self.directories_compared += child.directories_compared;
    }
}

/// Outcome of comparing two whole trees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraversalResult {
    pub identical: bool,
    /// Sorted by path components, parents before their children
    pub differences: Vec<PathDifference>,
    pub files_compared: usize,
    pub directories_compared: usize,
}

impl From<PartialResult> for TraversalResult {
    fn from(partial: PartialResult) -> Self {
        let mut differences = partial.differences;
        differences.sort_by(|a, b| components(a.path()).cmp(components(b.path())));

        Self {
            identical: differences.is_empty(),
            differences,
            files_compared: partial.files_compared,
            directories_compared: partial.directories_compared,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result_is_identical() {
        let result = TraversalResult::from(PartialResult::directory());
        assert!(result.identical);
        assert_eq!(result.directories_compared, 1);
    }

    #[test]
    fn merged_differences_are_sorted_by_path() {
        let mut root = PartialResult::directory();
        root.push(PathDifference::MissingOnLeft {
            path: "z.txt".to_string(),
            kind: EntryKind::File,
        });

        let mut child = PartialResult::directory();
        child.push(PathDifference::MissingOnRight {
            path: "a/b.txt".to_string(),
            kind: EntryKind::File,
        });
        child.merge(PartialResult::file());
        root.merge(child);
        root.push(PathDifference::TypeMismatch {
            path: "a".to_string(),
            left: EntryKind::File,
            right: EntryKind::Directory,
        });

        let result = TraversalResult::from(root);
        let paths: Vec<_> = result.differences.iter().map(PathDifference::path).collect();
        assert_eq!(paths, vec!["a", "a/b.txt", "z.txt"]);
        assert!(!result.identical);
        assert_eq!(result.files_compared, 1);
        assert_eq!(result.directories_compared, 2);
    }

    #[test]
    fn match_outcome_has_no_detail() {
        assert_eq!(MismatchDetail::from_outcome(ComparisonOutcome::Match), None);
    }

    #[test]
    fn differences_serialize_with_tags() {
        let difference = PathDifference::ContentMismatch {
            path: "a.txt".to_string(),
            detail: MismatchDetail::Unreadable {
                side: Side::Right,
                message: "denied".to_string(),
            },
        };

        let json = serde_json::to_value(&difference).expect("Failed to serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "type": "content_mismatch",
                "path": "a.txt",
                "detail": { "reason": "unreadable", "side": "right", "message": "denied" }
            })
        );
    }
}
