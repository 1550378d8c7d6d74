use std::io;

use snafu::Snafu;

use crate::filesystem::{ByteStream, DirectoryListing, Entry, LocalFileSystem, RemoteFileSystem};

/// Read-only view over one side of a comparison.
///
/// Paths are relative to the backend's root and use `/` as separator, the
/// root itself being the empty string. Nothing is cached: every call asks
/// the backend again, so both sides reflect their state at comparison time.
pub trait FileSystemTrait {
    /// Lists the entries of the directory at `path`.
    async fn list(&self, path: &str) -> Result<DirectoryListing, FsError>;
    /// Reads the metadata of the entry at `path` without touching its content.
    async fn stat(&self, path: &str) -> Result<Entry, FsError>;
    /// Opens the file at `path` for sequential reading.
    async fn open_read(&self, path: &str) -> Result<ByteStream, FsError>;
    /// Returns the target of the symbolic link at `path`.
    async fn read_link(&self, path: &str) -> Result<String, FsError>;
    /// Short human readable name of the backend and its root, for logs.
    fn describe(&self) -> String;
}

#[derive(Debug)]
pub enum FileSystem {
    Local(LocalFileSystem),
    Remote(RemoteFileSystem),
}

impl FileSystemTrait for FileSystem {
    async fn list(&self, path: &str) -> Result<DirectoryListing, FsError> {
        match self {
            FileSystem::Local(fs) => fs.list(path).await,
            FileSystem::Remote(fs) => fs.list(path).await,
        }
    }

    async fn stat(&self, path: &str) -> Result<Entry, FsError> {
        match self {
            FileSystem::Local(fs) => fs.stat(path).await,
            FileSystem::Remote(fs) => fs.stat(path).await,
        }
    }

    async fn open_read(&self, path: &str) -> Result<ByteStream, FsError> {
        match self {
            FileSystem::Local(fs) => fs.open_read(path).await,
            FileSystem::Remote(fs) => fs.open_read(path).await,
        }
    }

    async fn read_link(&self, path: &str) -> Result<String, FsError> {
        match self {
            FileSystem::Local(fs) => fs.read_link(path).await,
            FileSystem::Remote(fs) => fs.read_link(path).await,
        }
    }

    fn describe(&self) -> String {
        match self {
            FileSystem::Local(fs) => fs.describe(),
            FileSystem::Remote(fs) => fs.describe(),
        }
    }
}

impl From<LocalFileSystem> for FileSystem {
    fn from(fs: LocalFileSystem) -> Self {
        FileSystem::Local(fs)
    }
}

impl From<RemoteFileSystem> for FileSystem {
    fn from(fs: RemoteFileSystem) -> Self {
        FileSystem::Remote(fs)
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FsError {
    #[snafu(display("'{}' does not exist", path))]
    NotFound { path: String },
    #[snafu(display("Permission denied for '{}'", path))]
    PermissionDenied { path: String },
    #[snafu(display("'{}' is not a directory", path))]
    NotADirectory { path: String },
    #[snafu(display("I/O error on '{}': {}", path, source))]
    IoError { path: String, source: io::Error },
    #[snafu(display("The remote session is no longer usable"))]
    SessionUnavailable,
}

impl FsError {
    /// Classifies a raw I/O error on `path` into the adapter's error kinds.
    pub fn from_io(path: impl Into<String>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => FsError::NotFound { path },
            io::ErrorKind::PermissionDenied => FsError::PermissionDenied { path },
            _ => FsError::IoError { path, source },
        }
    }
}
