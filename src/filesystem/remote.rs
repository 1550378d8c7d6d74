//! Remote trees reached through an already-open SFTP-style session.
//!
//! The session is owned by whoever authenticated it. This module only borrows
//! it through [`SharedSession`] and never opens or tears it down. Remote
//! session protocols are generally not reentrant, so every call goes through
//! the session mutex, including reads of open file handles.

use std::fmt;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::ext::components;
use crate::filesystem::{
    ByteStream, DirectoryId, DirectoryListing, Entry, EntryKind, FileSystemTrait, FsError,
};

const S_IFMT: u32 = 0o170000;
const S_IFDIR: u32 = 0o040000;
const S_IFREG: u32 = 0o100000;
const S_IFLNK: u32 = 0o120000;

/// File attributes as transferred by the session, with POSIX mode bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteAttributes {
    pub permissions: u32,
    pub size: u64,
    /// Modification time in whole seconds since the Unix epoch
    pub mtime: i64,
}

impl RemoteAttributes {
    pub fn kind(&self) -> EntryKind {
        match self.permissions & S_IFMT {
            S_IFDIR => EntryKind::Directory,
            S_IFREG => EntryKind::File,
            S_IFLNK => EntryKind::Symlink,
            _ => EntryKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDirEntry {
    pub name: String,
    /// Attributes of the entry itself, links are not resolved
    pub attributes: RemoteAttributes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RemoteHandle(pub u64);

/// Operations the remote backend needs from an open file-transfer session.
pub trait SftpSession: Send {
    fn read_dir(&mut self, path: &str) -> io::Result<Vec<RemoteDirEntry>>;
    /// Attributes of `path`, following symbolic links.
    fn stat(&mut self, path: &str) -> io::Result<RemoteAttributes>;
    /// Attributes of `path` itself.
    fn lstat(&mut self, path: &str) -> io::Result<RemoteAttributes>;
    fn read_link(&mut self, path: &str) -> io::Result<String>;
    /// Canonical absolute form of `path` with every link resolved.
    fn real_path(&mut self, path: &str) -> io::Result<String>;
    fn open(&mut self, path: &str) -> io::Result<RemoteHandle>;
    /// Reads the next bytes of `handle` into `buf`, returning 0 at end of file.
    fn read(&mut self, handle: RemoteHandle, buf: &mut [u8]) -> io::Result<usize>;
    fn close(&mut self, handle: RemoteHandle) -> io::Result<()>;
}

pub type SharedSession = Arc<Mutex<dyn SftpSession>>;

pub struct RemoteFileSystem {
    session: SharedSession,
    root: String,
    follow_symlinks: bool,
}

impl RemoteFileSystem {
    pub fn new(session: SharedSession, root: impl Into<String>, follow_symlinks: bool) -> Self {
        Self {
            session,
            root: root.into(),
            follow_symlinks,
        }
    }

    fn resolve(&self, path: &str) -> String {
        components(path).fold(self.root.clone(), |mut acc, component| {
            if !acc.is_empty() && !acc.ends_with('/') {
                acc.push('/');
            }
            acc.push_str(component);
            acc
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, dyn SftpSession + 'static>, FsError> {
        self.session.lock().map_err(|_| FsError::SessionUnavailable)
    }

    fn attributes(
        &self,
        session: &mut dyn SftpSession,
        full_path: &str,
    ) -> io::Result<RemoteAttributes> {
        let attributes = session.lstat(full_path)?;
        if self.follow_symlinks && attributes.kind() == EntryKind::Symlink {
            // Dangling links stay links
            return Ok(session.stat(full_path).unwrap_or(attributes));
        }
        Ok(attributes)
    }

    fn entry(name: String, attributes: &RemoteAttributes) -> Entry {
        let kind = attributes.kind();
        Entry {
            name,
            kind,
            size: if kind == EntryKind::File { attributes.size } else { 0 },
            modified_at: attributes.mtime,
            error: None,
        }
    }
}

impl FileSystemTrait for RemoteFileSystem {
    async fn list(&self, path: &str) -> Result<DirectoryListing, FsError> {
        let dir = self.resolve(path);
        debug!("Listing remote directory {}", dir);
        let mut session = self.lock()?;

        let attributes = session
            .stat(&dir)
            .map_err(|e| FsError::from_io(dir.as_str(), e))?;
        if attributes.kind() != EntryKind::Directory {
            return Err(FsError::NotADirectory { path: dir });
        }

        let dir_entries = session
            .read_dir(&dir)
            .map_err(|e| FsError::from_io(dir.as_str(), e))?;

        let identity = match session.real_path(&dir) {
            Ok(real_path) => Some(DirectoryId::Path(real_path)),
            Err(e) => {
                warn!("Failed to resolve the real path of {}: {}", dir, e);
                None
            }
        };

        let mut listing = DirectoryListing::new().with_identity(identity);
        for dir_entry in dir_entries {
            if dir_entry.name == "." || dir_entry.name == ".." {
                continue;
            }

            let mut attributes = dir_entry.attributes;
            if self.follow_symlinks && attributes.kind() == EntryKind::Symlink {
                let child = format!("{}/{}", dir.trim_end_matches('/'), dir_entry.name);
                match session.stat(&child) {
                    Ok(resolved) => attributes = resolved,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        debug!("Remote link {} is dangling", child)
                    }
                    Err(e) => {
                        warn!("Failed to resolve remote link {}: {}", child, e);
                        listing.insert(Entry::unreadable(dir_entry.name, e.to_string()));
                        continue;
                    }
                }
            }
            listing.insert(Self::entry(dir_entry.name, &attributes));
        }

        Ok(listing)
    }

    async fn stat(&self, path: &str) -> Result<Entry, FsError> {
        let full_path = self.resolve(path);
        let mut session = self.lock()?;
        let attributes = self
            .attributes(&mut *session, &full_path)
            .map_err(|e| FsError::from_io(full_path.as_str(), e))?;
        let name = components(path).last().unwrap_or_default().to_string();
        Ok(Self::entry(name, &attributes))
    }

    async fn open_read(&self, path: &str) -> Result<ByteStream, FsError> {
        let full_path = self.resolve(path);
        let handle = self
            .lock()?
            .open(&full_path)
            .map_err(|e| FsError::from_io(full_path.as_str(), e))?;
        Ok(ByteStream::Remote(RemoteReader {
            session: self.session.clone(),
            handle,
            path: full_path,
        }))
    }

    async fn read_link(&self, path: &str) -> Result<String, FsError> {
        let full_path = self.resolve(path);
        self.lock()?
            .read_link(&full_path)
            .map_err(|e| FsError::from_io(full_path.as_str(), e))
    }

    fn describe(&self) -> String {
        format!("remote:{}", self.root)
    }
}

impl fmt::Debug for RemoteFileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteFileSystem")
            .field("root", &self.root)
            .field("follow_symlinks", &self.follow_symlinks)
            .finish_non_exhaustive()
    }
}

/// An open remote file. The handle is closed when the reader is dropped.
pub struct RemoteReader {
    session: SharedSession,
    handle: RemoteHandle,
    path: String,
}

impl RemoteReader {
    pub(crate) fn read_chunk(&mut self, buf: &mut Vec<u8>, chunk_size: usize) -> io::Result<usize> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| io::Error::other("remote session mutex poisoned"))?;
        buf.resize(chunk_size, 0);
        let read = session.read(self.handle, buf.as_mut_slice())?;
        buf.truncate(read);
        Ok(read)
    }
}

impl Drop for RemoteReader {
    fn drop(&mut self) {
        match self.session.lock() {
            Ok(mut session) => {
                if let Err(e) = session.close(self.handle) {
                    debug!("Failed to close remote file {}: {}", self.path, e);
                }
            }
            Err(_) => debug!("Remote session poisoned, leaking handle of {}", self.path),
        }
    }
}

impl fmt::Debug for RemoteReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteReader")
            .field("handle", &self.handle)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
