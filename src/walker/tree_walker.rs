use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::{FutureExt, StreamExt, stream};
use snafu::{ResultExt, Snafu};
use tracing::{debug, info, warn};

use crate::compare::{CompareStrategy, Side};
use crate::ext::join_relative;
use crate::filesystem::{
    DirectoryId, DirectoryListing, Entry, EntryKind, FileSystem, FileSystemTrait, FsError,
};
use crate::walker::{MismatchDetail, PartialResult, PathDifference, TraversalResult};

/// Default number of sibling comparisons in flight at once
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Work found while classifying one directory, run once the whole listing
/// has been classified
enum ChildTask {
    Directory {
        path: String,
        ancestors: Rc<Vec<Visited>>,
    },
    Files { path: String, left: Entry, right: Entry },
    Links { path: String },
}

/// A directory on the path from the root to the one being compared
#[derive(Debug, Clone)]
struct Visited {
    path: String,
    left: Option<DirectoryId>,
    right: Option<DirectoryId>,
}

/// Walks two trees in lock-step and classifies every entry.
///
/// Both sides are treated the same, except that an entry only present on one
/// side is labeled with the side that lacks it. Siblings are visited in name
/// order and up to `concurrency` of them are compared at once, each returning
/// its own partial result that is merged into the parent's.
pub struct TreeWalker<'a> {
    left: &'a FileSystem,
    right: &'a FileSystem,
    strategy: &'a CompareStrategy,
    concurrency: NonZeroUsize,
}

impl<'a> TreeWalker<'a> {
    pub fn new(left: &'a FileSystem, right: &'a FileSystem, strategy: &'a CompareStrategy) -> Self {
        Self {
            left,
            right,
            strategy,
            concurrency: NonZeroUsize::new(DEFAULT_CONCURRENCY).unwrap_or(NonZeroUsize::MIN),
        }
    }

    pub fn with_concurrency(mut self, concurrency: NonZeroUsize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Compares the two trees from their roots.
    ///
    /// Fails only when one of the roots cannot be listed; every other problem
    /// is recorded as a difference and the walk carries on.
    pub async fn walk(&self) -> Result<TraversalResult, WalkError> {
        info!(
            "Comparing {} with {} using the {} strategy",
            self.left.describe(),
            self.right.describe(),
            self.strategy.name()
        );

        let (left, right) = futures::join!(self.left.list(""), self.right.list(""));
        let left = left.context(RootListingSnafu {
            side: Side::Left,
            root: self.left.describe(),
        })?;
        let right = right.context(RootListingSnafu {
            side: Side::Right,
            root: self.right.describe(),
        })?;

        let partial = self.compare_listings(String::new(), left, right, &[]).await;
        let result = TraversalResult::from(partial);
        info!(
            "Compared {} files in {} directories, found {} differences",
            result.files_compared,
            result.directories_compared,
            result.differences.len()
        );
        Ok(result)
    }

    fn walk_directory(
        &self,
        path: String,
        ancestors: Rc<Vec<Visited>>,
    ) -> LocalBoxFuture<'_, PartialResult> {
        async move {
            let (left, right) = futures::join!(self.left.list(&path), self.right.list(&path));
            match (left, right) {
                (Ok(left), Ok(right)) => {
                    let left_cycle = revisited(&ancestors, left.identity(), |v| &v.left);
                    let right_cycle = revisited(&ancestors, right.identity(), |v| &v.right);
                    if left_cycle.is_some() || right_cycle.is_some() {
                        warn!("Directory '{}' leads back to one of its ancestors", path);
                        let mut partial = PartialResult::default();
                        partial.push(PathDifference::ContentMismatch {
                            path,
                            detail: MismatchDetail::DirectoryCycle {
                                left: left_cycle,
                                right: right_cycle,
                            },
                        });
                        return partial;
                    }
                    self.compare_listings(path, left, right, &ancestors).await
                }
                (left, right) => {
                    // Nothing inside an unreadable directory is compared
                    let mut partial = PartialResult::default();
                    if let Err(e) = left {
                        warn!("Cannot list left directory '{}': {}", path, e);
                        partial.push(PathDifference::MissingOnLeft {
                            path: path.clone(),
                            kind: EntryKind::Directory,
                        });
                    }
                    if let Err(e) = right {
                        warn!("Cannot list right directory '{}': {}", path, e);
                        partial.push(PathDifference::MissingOnRight {
                            path: path.clone(),
                            kind: EntryKind::Directory,
                        });
                    }
                    partial
                }
            }
        }
        .boxed_local()
    }

    async fn compare_listings(
        &self,
        path: String,
        left: DirectoryListing,
        right: DirectoryListing,
        ancestors: &[Visited],
    ) -> PartialResult {
        debug!(
            "Comparing directory '{}': {} left entries, {} right entries",
            path,
            left.len(),
            right.len()
        );
        let mut partial = PartialResult::directory();
        let mut tasks = Vec::new();

        let mut chain = ancestors.to_vec();
        chain.push(Visited {
            path: path.clone(),
            left: left.identity().cloned(),
            right: right.identity().cloned(),
        });
        let chain = Rc::new(chain);

        let names: BTreeSet<&String> = left.names().chain(right.names()).collect();
        for name in names {
            let child = join_relative(&path, name);
            let (l, r) = (left.get(name), right.get(name));
            if is_unreadable(l) || is_unreadable(r) {
                // Nothing is known about the kind of an unreadable entry
                for (side, entry) in [(Side::Left, l), (Side::Right, r)] {
                    if let Some(entry) = entry.filter(|entry| entry.kind == EntryKind::Unreadable) {
                        warn!("Cannot read {} entry '{}'", side, child);
                        partial.push(PathDifference::ContentMismatch {
                            path: child.clone(),
                            detail: MismatchDetail::Unreadable {
                                side,
                                message: entry.error.clone().unwrap_or_default(),
                            },
                        });
                    }
                }
                continue;
            }

            match (l, r) {
                (Some(l), None) => partial.push(PathDifference::MissingOnRight {
                    path: child,
                    kind: l.kind,
                }),
                (None, Some(r)) => partial.push(PathDifference::MissingOnLeft {
                    path: child,
                    kind: r.kind,
                }),
                (Some(l), Some(r)) if l.kind != r.kind => {
                    partial.push(PathDifference::TypeMismatch {
                        path: child,
                        left: l.kind,
                        right: r.kind,
                    })
                }
                (Some(l), Some(r)) => match l.kind {
                    EntryKind::Directory => tasks.push(ChildTask::Directory {
                        path: child,
                        ancestors: chain.clone(),
                    }),
                    EntryKind::File => tasks.push(ChildTask::Files {
                        path: child,
                        left: l.clone(),
                        right: r.clone(),
                    }),
                    EntryKind::Symlink => tasks.push(ChildTask::Links { path: child }),
                    EntryKind::Other | EntryKind::Unreadable => {
                        debug!("Special file '{}' present on both sides, no content to compare", child)
                    }
                },
                (None, None) => {}
            }
        }

        let children: Vec<PartialResult> = stream::iter(tasks)
            .map(|task| self.run_task(task))
            .buffered(self.concurrency.get())
            .collect()
            .await;
        for child in children {
            partial.merge(child);
        }
        partial
    }

    fn run_task(&self, task: ChildTask) -> LocalBoxFuture<'_, PartialResult> {
        match task {
            ChildTask::Directory { path, ancestors } => self.walk_directory(path, ancestors),
            ChildTask::Files { path, left, right } => {
                self.compare_files(path, left, right).boxed_local()
            }
            ChildTask::Links { path } => self.compare_links(path).boxed_local(),
        }
    }

    async fn compare_files(&self, path: String, left: Entry, right: Entry) -> PartialResult {
        let mut partial = PartialResult::file();
        let outcome = self
            .strategy
            .compare(self.left, self.right, &path, &left, &right)
            .await;

        let detail = match outcome {
            Ok(outcome) => MismatchDetail::from_outcome(outcome),
            Err(e) => {
                warn!("Cannot compare '{}': {}", path, e);
                Some(MismatchDetail::Unreadable {
                    side: e.side(),
                    message: e.to_string(),
                })
            }
        };

        match detail {
            Some(detail) => partial.push(PathDifference::ContentMismatch { path, detail }),
            None => debug!("Match: {}", path),
        }
        partial
    }

    async fn compare_links(&self, path: String) -> PartialResult {
        let mut partial = PartialResult::file();
        let (left, right) =
            futures::join!(self.left.read_link(&path), self.right.read_link(&path));

        let detail = match (left, right) {
            (Ok(left), Ok(right)) if left == right => None,
            (Ok(left), Ok(right)) => Some(MismatchDetail::LinkTarget { left, right }),
            (Err(e), _) => Some(Self::unreadable(&path, Side::Left, e)),
            (_, Err(e)) => Some(Self::unreadable(&path, Side::Right, e)),
        };

        match detail {
            Some(detail) => partial.push(PathDifference::ContentMismatch { path, detail }),
            None => debug!("Match: {}", path),
        }
        partial
    }

    fn unreadable(path: &str, side: Side, error: FsError) -> MismatchDetail {
        warn!("Cannot read {} link '{}': {}", side, path, error);
        MismatchDetail::Unreadable {
            side,
            message: error.to_string(),
        }
    }
}

fn is_unreadable(entry: Option<&Entry>) -> bool {
    entry.is_some_and(|entry| entry.kind == EntryKind::Unreadable)
}

/// Path of the ancestor with the same identity as the directory just listed.
fn revisited(
    ancestors: &[Visited],
    identity: Option<&DirectoryId>,
    side: impl Fn(&Visited) -> &Option<DirectoryId>,
) -> Option<String> {
    let identity = identity?;
    ancestors
        .iter()
        .find(|visited| side(visited).as_ref() == Some(identity))
        .map(|visited| visited.path.clone())
}

#[derive(Debug, Snafu)]
pub enum WalkError {
    #[snafu(display("Failed to list the {} root {}", side, root))]
    RootListingError {
        side: Side,
        root: String,
        source: FsError,
    },
}
