use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::io;

use crate::filesystem::{RemoteAttributes, RemoteDirEntry, RemoteHandle, SftpSession};

const MAX_LINK_HOPS: usize = 32;

fn split(path: &str) -> impl Iterator<Item = String> + '_ {
    path.split('/').filter(|c| !c.is_empty()).map(str::to_string)
}

fn join(components: &[String]) -> String {
    format!("/{}", components.join("/"))
}

#[derive(Debug, Clone)]
enum MemoryNode {
    Directory { mtime: i64 },
    File { data: Vec<u8>, mtime: i64 },
    Symlink { target: String },
}

/// In-memory stand-in for a remote session, keyed by absolute `/` paths.
#[derive(Debug, Clone)]
pub struct MemorySession {
    nodes: BTreeMap<String, MemoryNode>,
    denied: HashSet<String>,
    broken_reads: HashSet<String>,
    handles: HashMap<u64, (String, usize)>,
    next_handle: u64,
}

impl MemorySession {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), MemoryNode::Directory { mtime: 0 });
        Self {
            nodes,
            denied: HashSet::new(),
            broken_reads: HashSet::new(),
            handles: HashMap::new(),
            next_handle: 1,
        }
    }

    pub fn with_dir(mut self, path: &str, mtime: i64) -> Self {
        self.ensure_parents(path);
        self.nodes.insert(path.to_string(), MemoryNode::Directory { mtime });
        self
    }

    pub fn with_file(mut self, path: &str, data: &[u8], mtime: i64) -> Self {
        self.ensure_parents(path);
        self.nodes.insert(
            path.to_string(),
            MemoryNode::File {
                data: data.to_vec(),
                mtime,
            },
        );
        self
    }

    pub fn with_symlink(mut self, path: &str, target: &str) -> Self {
        self.ensure_parents(path);
        self.nodes.insert(
            path.to_string(),
            MemoryNode::Symlink {
                target: target.to_string(),
            },
        );
        self
    }

    /// Removes `path` and everything below it.
    pub fn without(mut self, path: &str) -> Self {
        let prefix = format!("{path}/");
        self.nodes
            .retain(|key, _| key != path && !key.starts_with(&prefix));
        self
    }

    /// Makes every operation on `path` fail with `PermissionDenied`.
    pub fn deny(mut self, path: &str) -> Self {
        self.denied.insert(path.to_string());
        self
    }

    /// Makes reads of the file at `path` fail mid-stream.
    pub fn break_reads(mut self, path: &str) -> Self {
        self.broken_reads.insert(path.to_string());
        self
    }

    pub fn open_handles(&self) -> usize {
        self.handles.len()
    }

    fn ensure_parents(&mut self, path: &str) {
        let mut current = String::new();
        let components: Vec<_> = path.split('/').filter(|c| !c.is_empty()).collect();
        for component in components.iter().take(components.len().saturating_sub(1)) {
            current.push('/');
            current.push_str(component);
            self.nodes
                .entry(current.clone())
                .or_insert(MemoryNode::Directory { mtime: 0 });
        }
    }

    fn check_access(&self, path: &str) -> io::Result<()> {
        if self.denied.contains(path) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, path.to_string()));
        }
        Ok(())
    }

    fn node(&self, path: &str) -> io::Result<&MemoryNode> {
        self.check_access(path)?;
        self.nodes
            .get(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }

    /// Absolute form of `path` with `.`, `..` and every link resolved,
    /// including a link in last position.
    fn canonical(&self, path: &str) -> io::Result<String> {
        let mut resolved: Vec<String> = Vec::new();
        let mut pending: VecDeque<String> = split(path).collect();
        let mut hops = 0;

        while let Some(component) = pending.pop_front() {
            match component.as_str() {
                "." => continue,
                ".." => {
                    resolved.pop();
                    continue;
                }
                _ => resolved.push(component),
            }

            let current = join(&resolved);
            if let MemoryNode::Symlink { target } = self.node(&current)? {
                hops += 1;
                if hops > MAX_LINK_HOPS {
                    return Err(io::Error::other(format!(
                        "too many levels of symbolic links resolving {path}"
                    )));
                }
                resolved.pop();
                if target.starts_with('/') {
                    resolved.clear();
                }
                for component in split(target).collect::<Vec<_>>().into_iter().rev() {
                    pending.push_front(component);
                }
            }
        }

        let canonical = join(&resolved);
        self.node(&canonical)?;
        Ok(canonical)
    }

    /// `path` with its parent resolved and its last component untouched.
    fn canonical_parent(&self, path: &str) -> io::Result<String> {
        match path.trim_end_matches('/').rsplit_once('/') {
            Some((parent, name)) if !name.is_empty() => {
                let parent = self.canonical(if parent.is_empty() { "/" } else { parent })?;
                Ok(format!("{}/{}", parent.trim_end_matches('/'), name))
            }
            _ => Ok("/".to_string()),
        }
    }

    fn attributes_of(node: &MemoryNode) -> RemoteAttributes {
        match node {
            MemoryNode::Directory { mtime } => RemoteAttributes {
                permissions: 0o040755,
                size: 0,
                mtime: *mtime,
            },
            MemoryNode::File { data, mtime } => RemoteAttributes {
                permissions: 0o100644,
                size: data.len() as u64,
                mtime: *mtime,
            },
            MemoryNode::Symlink { target } => RemoteAttributes {
                permissions: 0o120777,
                size: target.len() as u64,
                mtime: 0,
            },
        }
    }
}

impl SftpSession for MemorySession {
    fn read_dir(&mut self, path: &str) -> io::Result<Vec<RemoteDirEntry>> {
        let path = self.canonical(path)?;
        match self.node(&path)? {
            MemoryNode::Directory { .. } => {}
            _ => return Err(io::Error::other(format!("{path} is not a directory"))),
        }
        let prefix = if path.ends_with('/') {
            path.clone()
        } else {
            format!("{path}/")
        };
        Ok(self
            .nodes
            .iter()
            .filter_map(|(key, node)| {
                let name = key.strip_prefix(&prefix)?;
                if name.is_empty() || name.contains('/') {
                    return None;
                }
                Some(RemoteDirEntry {
                    name: name.to_string(),
                    attributes: Self::attributes_of(node),
                })
            })
            .collect())
    }

    fn stat(&mut self, path: &str) -> io::Result<RemoteAttributes> {
        let path = self.canonical(path)?;
        self.node(&path).map(Self::attributes_of)
    }

    fn lstat(&mut self, path: &str) -> io::Result<RemoteAttributes> {
        let path = self.canonical_parent(path)?;
        self.node(&path).map(Self::attributes_of)
    }

    fn read_link(&mut self, path: &str) -> io::Result<String> {
        let path = self.canonical_parent(path)?;
        match self.node(&path)? {
            MemoryNode::Symlink { target } => Ok(target.clone()),
            _ => Err(io::Error::new(io::ErrorKind::InvalidInput, "not a link")),
        }
    }

    fn real_path(&mut self, path: &str) -> io::Result<String> {
        self.canonical(path)
    }

    fn open(&mut self, path: &str) -> io::Result<RemoteHandle> {
        let path = self.canonical(path)?;
        match self.node(&path)? {
            MemoryNode::File { .. } => {}
            _ => return Err(io::Error::other(format!("{path} is not a file"))),
        }
        let handle = self.next_handle;
        self.next_handle += 1;
        self.handles.insert(handle, (path, 0));
        Ok(RemoteHandle(handle))
    }

    fn read(&mut self, handle: RemoteHandle, buf: &mut [u8]) -> io::Result<usize> {
        let (path, position) = self
            .handles
            .get_mut(&handle.0)
            .ok_or_else(|| io::Error::other("invalid handle"))?;
        if self.broken_reads.contains(path.as_str()) {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            ));
        }
        let data = match self.nodes.get(path.as_str()) {
            Some(MemoryNode::File { data, .. }) => data,
            _ => return Err(io::Error::new(io::ErrorKind::NotFound, path.clone())),
        };
        let remaining = &data[(*position).min(data.len())..];
        let read = remaining.len().min(buf.len());
        buf[..read].copy_from_slice(&remaining[..read]);
        *position += read;
        Ok(read)
    }

    fn close(&mut self, handle: RemoteHandle) -> io::Result<()> {
        self.handles
            .remove(&handle.0)
            .map(|_| ())
            .ok_or_else(|| io::Error::other("invalid handle"))
    }
}
