use std::io::{self, Cursor};

use compio::BufResult;
use compio::fs::File;
use compio::io::AsyncRead;

use crate::filesystem::RemoteReader;

/// Sequential read access to the content of one file.
pub enum ByteStream {
    Local(Cursor<File>),
    Remote(RemoteReader),
}

impl ByteStream {
    pub fn local(file: File) -> Self {
        ByteStream::Local(Cursor::new(file))
    }

    /// Replaces the content of `buf` with the next chunk of at most roughly
    /// `chunk_size` bytes and returns its length. Zero means end of stream.
    pub async fn read_chunk(&mut self, buf: &mut Vec<u8>, chunk_size: usize) -> io::Result<usize> {
        match self {
            ByteStream::Local(cursor) => {
                let mut owned = std::mem::take(buf);
                owned.clear();
                owned.reserve(chunk_size);
                let BufResult(result, owned) = cursor.read(owned).await;
                *buf = owned;
                result
            }
            ByteStream::Remote(reader) => reader.read_chunk(buf, chunk_size),
        }
    }
}

impl std::fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ByteStream::Local(cursor) => write!(f, "ByteStream::Local(position={})", cursor.position()),
            ByteStream::Remote(reader) => write!(f, "ByteStream::Remote({:?})", reader),
        }
    }
}
