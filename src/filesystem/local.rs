use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use compio::fs::File;
use tracing::{debug, warn};

use crate::ext::{SystemTimeExt, components};
use crate::filesystem::{
    ByteStream, DirectoryId, DirectoryListing, Entry, EntryKind, FileSystemTrait, FsError,
};

/// Directory tree on the host running the comparison.
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    root: PathBuf,
    follow_symlinks: bool,
}

impl LocalFileSystem {
    pub fn new(root: impl Into<PathBuf>, follow_symlinks: bool) -> Self {
        Self {
            root: root.into(),
            follow_symlinks,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        components(path).fold(self.root.clone(), |acc, component| acc.join(component))
    }

    fn error(path: &Path, source: io::Error) -> FsError {
        FsError::from_io(path.display().to_string(), source)
    }

    /// Metadata of `path`, resolving symlinks only when configured to.
    /// A dangling link is reported as the link itself.
    fn entry_metadata(&self, path: &Path) -> io::Result<Metadata> {
        if !self.follow_symlinks {
            return fs::symlink_metadata(path);
        }
        match fs::metadata(path) {
            Ok(metadata) => Ok(metadata),
            Err(e) if e.kind() == io::ErrorKind::NotFound => fs::symlink_metadata(path),
            Err(e) => Err(e),
        }
    }

    fn entry_from_metadata(path: &Path, name: String, metadata: &Metadata) -> Entry {
        let file_type = metadata.file_type();
        let kind = if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else if file_type.is_symlink() {
            EntryKind::Symlink
        } else {
            EntryKind::Other
        };

        Entry {
            name,
            kind,
            size: if kind == EntryKind::File { metadata.len() } else { 0 },
            modified_at: modified_seconds(path, metadata.modified()),
            error: None,
        }
    }
}

/// Modification time in whole seconds, the epoch when the platform cannot
/// provide one.
fn modified_seconds(path: &Path, modified: io::Result<SystemTime>) -> i64 {
    match modified {
        Ok(time) => time.unix_seconds(),
        Err(e) => {
            warn!(
                "Modification time of {} is unavailable, using 0: {}",
                path.display(),
                e
            );
            0
        }
    }
}

#[cfg(unix)]
fn directory_id(_dir: &Path, metadata: &Metadata) -> Option<DirectoryId> {
    use std::os::unix::fs::MetadataExt;
    Some(DirectoryId::Inode {
        dev: metadata.dev(),
        ino: metadata.ino(),
    })
}

#[cfg(not(unix))]
fn directory_id(dir: &Path, _metadata: &Metadata) -> Option<DirectoryId> {
    match fs::canonicalize(dir) {
        Ok(canonical) => Some(DirectoryId::Path(canonical.display().to_string())),
        Err(e) => {
            warn!("Failed to canonicalize {}: {}", dir.display(), e);
            None
        }
    }
}

impl FileSystemTrait for LocalFileSystem {
    async fn list(&self, path: &str) -> Result<DirectoryListing, FsError> {
        let dir = self.resolve(path);
        debug!("Listing local directory {}", dir.display());

        // The directory itself is always resolved, links to it were already
        // accepted as directories by the parent listing
        let metadata = fs::metadata(&dir).map_err(|e| Self::error(&dir, e))?;
        if !metadata.is_dir() {
            return Err(FsError::NotADirectory {
                path: dir.display().to_string(),
            });
        }

        let read_dir = fs::read_dir(&dir).map_err(|e| Self::error(&dir, e))?;
        let mut listing = DirectoryListing::new().with_identity(directory_id(&dir, &metadata));
        for dir_entry in read_dir {
            // A broken directory stream leaves no name to report, so the
            // whole listing fails
            let dir_entry = dir_entry.map_err(|e| Self::error(&dir, e))?;

            let name = match dir_entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    warn!("Entry {:?} in {} is not valid UTF-8", raw, dir.display());
                    raw.to_string_lossy().into_owned()
                }
            };

            let entry_path = dir_entry.path();
            match self.entry_metadata(&entry_path) {
                Ok(metadata) => {
                    listing.insert(Self::entry_from_metadata(&entry_path, name, &metadata))
                }
                Err(e) => {
                    warn!("Failed to read metadata of {}: {}", entry_path.display(), e);
                    listing.insert(Entry::unreadable(name, e.to_string()));
                }
            }
        }

        Ok(listing)
    }

    async fn stat(&self, path: &str) -> Result<Entry, FsError> {
        let full_path = self.resolve(path);
        let metadata = self
            .entry_metadata(&full_path)
            .map_err(|e| Self::error(&full_path, e))?;
        let name = components(path).last().unwrap_or_default().to_string();
        Ok(Self::entry_from_metadata(&full_path, name, &metadata))
    }

    async fn open_read(&self, path: &str) -> Result<ByteStream, FsError> {
        let full_path = self.resolve(path);
        let file = File::open(&full_path)
            .await
            .map_err(|e| Self::error(&full_path, e))?;
        Ok(ByteStream::local(file))
    }

    async fn read_link(&self, path: &str) -> Result<String, FsError> {
        let full_path = self.resolve(path);
        let target = fs::read_link(&full_path).map_err(|e| Self::error(&full_path, e))?;
        Ok(target.to_string_lossy().into_owned())
    }

    fn describe(&self) -> String {
        format!("local:{}", self.root.display())
    }
}
