use std::fmt;
use std::io;
use std::num::NonZeroUsize;

use serde::Serialize;
use sha2::{Digest as _, Sha256};

use crate::filesystem::ByteStream;

/// Default size of a single read while hashing
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// SHA-256 fingerprint of a file's content, as lowercase hexadecimal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    /// Wraps an already computed hexadecimal digest.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Digest(hex.into().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentHasher {
    chunk_size: NonZeroUsize,
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self {
            chunk_size: NonZeroUsize::new(DEFAULT_CHUNK_SIZE).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl ContentHasher {
    pub fn new(chunk_size: NonZeroUsize) -> Self {
        Self { chunk_size }
    }

    pub fn chunk_size(&self) -> NonZeroUsize {
        self.chunk_size
    }

    /// Hashes `stream` until exhaustion, one chunk at a time.
    ///
    /// Only the read buffer is held in memory, never the whole file. A read
    /// failure is returned as is, without retrying.
    pub async fn hash(&self, stream: &mut ByteStream) -> io::Result<Digest> {
        let chunk_size = self.chunk_size.get();
        let mut hasher = Sha256::new();
        let mut buf = Vec::with_capacity(chunk_size);

        loop {
            let read = stream.read_chunk(&mut buf, chunk_size).await?;
            if read == 0 {
                break;
            }
            hasher.update(&buf[..read]);
        }

        Ok(Digest(format!("{:x}", hasher.finalize())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::memory::MemorySession;
    use crate::filesystem::{FileSystemTrait, LocalFileSystem, RemoteFileSystem};
    use rstest::rstest;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    const HELLO_WORLD_SHA256: &str =
        "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";
    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    fn hasher(chunk_size: usize) -> ContentHasher {
        ContentHasher::new(NonZeroUsize::new(chunk_size).expect("chunk size must be non-zero"))
    }

    async fn hash_local(content: &[u8], chunk_size: usize) -> Digest {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        std::fs::write(temp_dir.path().join("file"), content).expect("Failed to write file");
        let fs = LocalFileSystem::new(temp_dir.path(), false);
        let mut stream = fs.open_read("file").await.expect("Failed to open file");
        hasher(chunk_size)
            .hash(&mut stream)
            .await
            .expect("Failed to hash file")
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(4096)]
    #[case(DEFAULT_CHUNK_SIZE)]
    #[compio::test]
    async fn known_digest_regardless_of_chunk_size(#[case] chunk_size: usize) {
        let digest = hash_local(b"hello world", chunk_size).await;
        assert_eq!(digest.as_str(), HELLO_WORLD_SHA256);
    }

    #[compio::test]
    async fn empty_file_has_the_empty_digest() {
        assert_eq!(hash_local(b"", 16).await.as_str(), EMPTY_SHA256);
    }

    #[compio::test]
    async fn content_larger_than_many_chunks_hashes_consistently() {
        let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let small = hash_local(&content, 1000).await;
        let large = hash_local(&content, DEFAULT_CHUNK_SIZE).await;
        assert_eq!(small, large);
    }

    #[compio::test]
    async fn different_content_different_digest() {
        assert_ne!(hash_local(b"aaa", 8).await, hash_local(b"aab", 8).await);
    }

    #[compio::test]
    async fn remote_and_local_streams_agree() {
        let session = MemorySession::new().with_file("/data/file", b"hello world", 0);
        let fs = RemoteFileSystem::new(Arc::new(Mutex::new(session)), "/data", false);
        let mut stream = fs.open_read("file").await.expect("Failed to open file");

        let digest = hasher(5).hash(&mut stream).await.expect("Failed to hash");
        assert_eq!(digest, hash_local(b"hello world", 7).await);
    }

    #[compio::test]
    async fn read_failure_is_returned() {
        let session = MemorySession::new()
            .with_file("/data/file", b"hello world", 0)
            .break_reads("/data/file");
        let fs = RemoteFileSystem::new(Arc::new(Mutex::new(session)), "/data", false);
        let mut stream = fs.open_read("file").await.expect("Failed to open file");

        let result = ContentHasher::default().hash(&mut stream).await;
        assert_eq!(
            result.map_err(|e| e.kind()),
            Err(io::ErrorKind::ConnectionReset)
        );
    }
}
