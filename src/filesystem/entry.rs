use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    /// Sockets, fifos, device nodes and anything else without comparable content
    Other,
    /// Listed by its directory, but its metadata could not be read
    Unreadable,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
            EntryKind::Symlink => "symlink",
            EntryKind::Other => "special file",
            EntryKind::Unreadable => "unreadable entry",
        };
        f.write_str(name)
    }
}

/// One node of a directory listing, read fresh from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
    /// Zero for anything that is not a regular file
    pub size: u64,
    /// Whole seconds since the Unix epoch
    pub modified_at: i64,
    /// Why the metadata could not be read, for [`EntryKind::Unreadable`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Entry {
    pub fn file(name: impl Into<String>, size: u64, modified_at: i64) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            size,
            modified_at,
            error: None,
        }
    }

    pub fn directory(name: impl Into<String>, modified_at: i64) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            size: 0,
            modified_at,
            error: None,
        }
    }

    pub fn unreadable(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Unreadable,
            size: 0,
            modified_at: 0,
            error: Some(error.into()),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Identity of a directory on its backend, stable however the directory was
/// reached. Two listings with the same identity are the same directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DirectoryId {
    /// Device and inode numbers
    Inode { dev: u64, ino: u64 },
    /// Canonical path with every link resolved
    Path(String),
}

/// Entries of a single directory on one side, keyed by name.
///
/// Iteration is lexicographic by name, which is the order reports are built in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    entries: BTreeMap<String, Entry>,
    identity: Option<DirectoryId>,
}

impl DirectoryListing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(mut self, identity: Option<DirectoryId>) -> Self {
        self.identity = identity;
        self
    }

    /// Identity of the listed directory, when the backend could determine it.
    pub fn identity(&self) -> Option<&DirectoryId> {
        self.identity.as_ref()
    }

    /// Inserts `entry`, replacing a previous entry with the same name.
    pub fn insert(&mut self, entry: Entry) {
        self.entries.insert(entry.name.clone(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Entry> for DirectoryListing {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        let mut listing = DirectoryListing::new();
        for entry in iter {
            listing.insert(entry);
        }
        listing
    }
}
