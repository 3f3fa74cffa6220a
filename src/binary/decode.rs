use std::io::Read;

use anyhow::Context as _;

pub trait Decode<S>: Sized {
    /// Returns `Ok(None)` when the input ended before the first byte of the value.
    fn decode(bytes: &mut ByteReader<S>) -> anyhow::Result<Option<Self>>;
}

pub trait DecodeTag: Sized {
    fn decode_tag(byte: u8) -> Option<Self>;
}

/// An ordered source of byte chunks. `Ok(None)` signals the end of input.
pub trait ChunkSource {
    fn next_chunk(&mut self) -> std::io::Result<Option<Vec<u8>>>;
}

pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

pub struct ReadSource<R> {
    reader: R,
    chunk_size: usize,
}

impl<R: Read> ReadSource<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size: chunk_size.max(1),
        }
    }
}

impl<R: Read> ChunkSource for ReadSource<R> {
    fn next_chunk(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        let mut chunk = vec![0; self.chunk_size];
        loop {
            match self.reader.read(&mut chunk) {
                Ok(0) => return Ok(None),
                Ok(len) => {
                    chunk.truncate(len);
                    return Ok(Some(chunk));
                }
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }
}

pub struct IterSource<I>(I);

impl<I: Iterator<Item = Vec<u8>>> ChunkSource for IterSource<I> {
    fn next_chunk(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        Ok(self.0.next())
    }
}

pub struct ByteReader<S> {
    source: S,
    chunk: Vec<u8>,
    position: usize,
    offset: u64,
    finished: bool,
}

impl<R: Read> From<R> for ByteReader<ReadSource<R>> {
    fn from(value: R) -> Self {
        Self::new(ReadSource::new(value, DEFAULT_CHUNK_SIZE))
    }
}

impl<T: AsRef<[u8]>> From<T> for ByteReader<ReadSource<std::io::Cursor<T>>> {
    fn from(value: T) -> Self {
        std::io::Cursor::new(value).into()
    }
}

impl<I: Iterator<Item = Vec<u8>>> ByteReader<IterSource<I>> {
    pub fn from_chunks<C>(chunks: C) -> Self
    where
        C: IntoIterator<IntoIter = I>,
    {
        Self::new(IterSource(chunks.into_iter()))
    }
}

impl<S: ChunkSource> ByteReader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            chunk: Vec::new(),
            position: 0,
            offset: 0,
            finished: false,
        }
    }

    /// Makes sure the current chunk has unread bytes, pulling from the source as needed.
    fn fill(&mut self) -> anyhow::Result<bool> {
        while self.position >= self.chunk.len() {
            if self.finished {
                return Ok(false);
            }
            let offset = self.offset;
            let next = self
                .source
                .next_chunk()
                .with_context(|| format!("failed to read input at byte offset 0x{offset:0>8X}"))?;
            match next {
                Some(chunk) => {
                    self.chunk = chunk;
                    self.position = 0;
                }
                None => {
                    self.chunk.clear();
                    self.position = 0;
                    self.finished = true;
                }
            }
        }
        Ok(true)
    }

    pub fn next(&mut self) -> anyhow::Result<Option<u8>> {
        if !self.fill()? {
            return Ok(None);
        }
        let byte = self.chunk[self.position];
        self.position += 1;
        self.offset += 1;
        Ok(Some(byte))
    }

    /// Reads up to `len` bytes. Fewer are returned only when the input is exhausted.
    pub fn take(&mut self, len: usize) -> anyhow::Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(len.min(DEFAULT_CHUNK_SIZE));
        while bytes.len() < len && self.fill()? {
            let available = &self.chunk[self.position..];
            let count = available.len().min(len - bytes.len());
            bytes.extend_from_slice(&available[..count]);
            self.position += count;
            self.offset += count as u64;
        }
        Ok(bytes)
    }

    pub fn bytes_read(&self) -> u64 {
        self.offset
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn decode<D: Decode<S>>(&mut self) -> anyhow::Result<Option<D>> {
        let start_offset = self.offset;
        D::decode(self).with_context(|| {
            format!(
                "failed to decode `{}` at byte offset 0x{:0>8X}",
                std::any::type_name::<D>(),
                start_offset,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSource {
        chunks: Vec<Vec<u8>>,
    }

    impl ChunkSource for FailingSource {
        fn next_chunk(&mut self) -> std::io::Result<Option<Vec<u8>>> {
            if self.chunks.is_empty() {
                return Err(std::io::Error::other("device unplugged"));
            }
            Ok(Some(self.chunks.remove(0)))
        }
    }

    #[test]
    fn reads_across_chunk_boundaries() -> anyhow::Result<()> {
        let mut bytes = ByteReader::from_chunks(vec![vec![1], vec![], vec![2, 3], vec![4, 5, 6]]);
        assert_eq!(Some(1), bytes.next()?);
        assert_eq!(vec![2, 3, 4, 5], bytes.take(4)?);
        assert_eq!(5, bytes.bytes_read());
        assert!(!bytes.is_finished());
        assert_eq!(vec![6], bytes.take(10)?);
        assert!(bytes.is_finished());
        assert_eq!(None, bytes.next()?);
        assert!(bytes.take(3)?.is_empty());
        assert_eq!(6, bytes.bytes_read());
        Ok(())
    }

    #[test]
    fn drained_reader_counts_every_byte() -> anyhow::Result<()> {
        let input = (0..=255u8).cycle().take(1000).collect::<Vec<_>>();
        let mut bytes = ByteReader::new(ReadSource::new(&input[..], 7));
        let mut count = 0;
        while bytes.next()?.is_some() {
            count += 1;
        }
        assert_eq!(1000, count);
        assert!(bytes.is_finished());
        assert_eq!(1000, bytes.bytes_read());
        Ok(())
    }

    #[test]
    fn source_failure_is_an_error() {
        let mut bytes = ByteReader::new(FailingSource {
            chunks: vec![vec![0x80]],
        });
        let err = bytes.decode::<u32>().unwrap_err();
        assert!(format!("{err:#}").contains("device unplugged"));
    }
}
