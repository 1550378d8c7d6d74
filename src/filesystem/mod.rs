//! Read-only filesystem adapters.
//!
//! Both the local tree and a remote tree reached through an open session are
//! exposed through [`FileSystemTrait`], and the [`FileSystem`] enum lets the
//! walker treat either side the same way.

mod adapter;
mod entry;
mod local;
#[cfg(test)]
pub(crate) mod memory;
mod remote;
mod stream;

pub use adapter::{FileSystem, FileSystemTrait, FsError};
pub use entry::{DirectoryId, DirectoryListing, Entry, EntryKind};
pub use local::LocalFileSystem;
pub use remote::{
    RemoteAttributes, RemoteDirEntry, RemoteFileSystem, RemoteHandle, RemoteReader, SftpSession,
    SharedSession,
};
pub use stream::ByteStream;
