use crate::compare::{ComparisonOutcome, FileStamp};
use crate::filesystem::Entry;

/// Default tolerance window, covering coarse timestamp resolution and small
/// clock skew between hosts
pub const DEFAULT_TOLERANCE_SECONDS: u64 = 2;

/// Two files are equivalent when they have the same size and modification
/// times at most `tolerance_seconds` apart. Content is never read, so equal
/// metadata over different bytes is reported as a match.
pub fn metadata_equivalent(left: &Entry, right: &Entry, tolerance_seconds: u64) -> bool {
    left.size == right.size && left.modified_at.abs_diff(right.modified_at) <= tolerance_seconds
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataComparator {
    tolerance_seconds: u64,
}

impl Default for MetadataComparator {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE_SECONDS)
    }
}

impl MetadataComparator {
    pub fn new(tolerance_seconds: u64) -> Self {
        Self { tolerance_seconds }
    }

    pub fn tolerance_seconds(&self) -> u64 {
        self.tolerance_seconds
    }

    pub fn compare(&self, left: &Entry, right: &Entry) -> ComparisonOutcome {
        if metadata_equivalent(left, right, self.tolerance_seconds) {
            ComparisonOutcome::Match
        } else {
            ComparisonOutcome::SizeOrTimeDiffers {
                left: FileStamp::from(left),
                right: FileStamp::from(right),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(2)]
    #[case(59)]
    #[case(3600)]
    fn tolerance_is_monotonic(#[case] delta: i64) {
        let left = Entry::file("a.txt", 10, 1_700_000_000);
        let right = Entry::file("a.txt", 10, 1_700_000_000 + delta);
        let delta = delta as u64;

        for tolerance in delta..delta + 5 {
            assert!(metadata_equivalent(&left, &right, tolerance));
        }
        for tolerance in 0..delta {
            assert!(!metadata_equivalent(&left, &right, tolerance));
        }
    }

    #[test]
    fn time_difference_is_symmetric() {
        let early = Entry::file("a.txt", 10, 100);
        let late = Entry::file("a.txt", 10, 103);

        assert!(!metadata_equivalent(&early, &late, 2));
        assert!(!metadata_equivalent(&late, &early, 2));
        assert!(metadata_equivalent(&late, &early, 3));
    }

    #[test]
    fn size_difference_is_never_tolerated() {
        let left = Entry::file("a.txt", 10, 100);
        let right = Entry::file("a.txt", 11, 100);
        assert!(!metadata_equivalent(&left, &right, u64::MAX));
    }

    #[test]
    fn compare_reports_both_stamps() {
        let comparator = MetadataComparator::new(0);
        let left = Entry::file("a.txt", 10, 100);
        let right = Entry::file("a.txt", 10, 101);

        assert_eq!(
            comparator.compare(&left, &right),
            ComparisonOutcome::SizeOrTimeDiffers {
                left: FileStamp {
                    size: 10,
                    modified_at: 100
                },
                right: FileStamp {
                    size: 10,
                    modified_at: 101
                },
            }
        );
        assert_eq!(
            MetadataComparator::default().compare(&left, &right),
            ComparisonOutcome::Match
        );
    }
}
