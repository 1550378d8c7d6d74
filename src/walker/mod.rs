//! Lock-step traversal of two trees and the classified result it produces.

mod difference;
mod tree_walker;

pub use difference::{MismatchDetail, PartialResult, PathDifference, TraversalResult};
pub use tree_walker::{DEFAULT_CONCURRENCY, TreeWalker, WalkError};
