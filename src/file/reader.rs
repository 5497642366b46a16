//! Forward cursor over a seekable byte source.
//!
//! The DBI orchestrator alternates between decoding fixed-size structures and skipping whole
//! sub-streams by byte count. [`crate::file::reader::StreamReader`] wraps any `Read + Seek` source
//! positioned at the start of the DBI stream and provides exactly those two operations, with one
//! rule: a fixed-size read or a skip that cannot be fully satisfied is a
//! [`crate::Error::TruncatedStream`], never a silently shortened result.
//!
//! The only tolerant operation is [`crate::file::reader::StreamReader::read_until`], which the
//! file-info region uses to pull in "whatever is left" of its name blob.
//!
//! All offsets reported by the reader (and therefore in errors) are relative to the position the
//! source had when the reader was created.

use std::io::{Read, Seek, SeekFrom};

use crate::{
    file::io::{read_le, read_le_at, PdbIO},
    Error::FileError,
    Result,
};

/// A forward-only, bounds-aware reader over a seekable byte source.
///
/// The total length of the source is determined once on construction, so skips can be validated
/// before they happen (seeking past the end of a `std::io` source succeeds silently otherwise).
///
/// # Examples
///
/// ```rust
/// use dbiscope::file::reader::StreamReader;
/// use std::io::Cursor;
///
/// let mut reader = StreamReader::new(Cursor::new(vec![0x01, 0x00, 0xAA, 0xBB, 0xFF, 0xFF]))?;
/// assert_eq!(reader.read_le::<u16>("count")?, 1);
/// reader.skip(2, "padding")?;
/// assert_eq!(reader.read_le::<i16>("stream")?, -1);
/// assert!(reader.skip(1, "past the end").is_err());
/// # Ok::<(), dbiscope::Error>(())
/// ```
pub struct StreamReader<R> {
    /// Underlying byte source
    inner: R,
    /// Absolute position of the first byte of the stream within `inner`
    base: u64,
    /// Current position, relative to `base`
    position: u64,
    /// Total number of bytes available from `base` onwards
    len: u64,
}

impl<R: Read + Seek> StreamReader<R> {
    /// Create a reader over `inner`, starting at its current position.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the source cannot report or restore its position.
    pub fn new(mut inner: R) -> Result<Self> {
        let base = inner.stream_position()?;
        let end = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(base))?;

        Ok(StreamReader {
            inner,
            base,
            position: 0,
            len: end.saturating_sub(base),
        })
    }

    /// Current position, relative to the start of the stream.
    #[must_use]
    pub fn pos(&self) -> u64 {
        self.position
    }

    /// Total length of the stream.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` if the stream holds no bytes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of bytes left between the cursor and the end of the stream.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.position)
    }

    /// Consume the reader, returning the underlying source.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn ensure(&self, what: &'static str, needed: u64) -> Result<()> {
        let available = self.remaining();
        if needed > available {
            return Err(truncated_error!(what, self.position, needed, available));
        }
        Ok(())
    }

    fn fill(&mut self, what: &'static str, buf: &mut [u8]) -> Result<()> {
        self.ensure(what, buf.len() as u64)?;

        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.position += buf.len() as u64;
                Ok(())
            }
            Err(error) if error.kind() == std::io::ErrorKind::UnexpectedEof => {
                let available = self.remaining();
                Err(truncated_error!(
                    what,
                    self.position,
                    buf.len() as u64,
                    available
                ))
            }
            Err(error) => Err(FileError(error)),
        }
    }

    /// Read a little-endian value of type `T`.
    ///
    /// # Arguments
    /// * `what` - Name of the structure being read, reported on failure
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedStream`] if the stream ends before `T` is complete.
    pub fn read_le<T: PdbIO>(&mut self, what: &'static str) -> Result<T> {
        let mut buf = [0_u8; 8];
        let size = std::mem::size_of::<T>();
        self.fill(what, &mut buf[..size])?;
        read_le::<T>(&buf[..size])
    }

    /// Read a fixed-size byte array.
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedStream`] if fewer than `N` bytes remain.
    pub fn read_array<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N]> {
        let mut buf = [0_u8; N];
        self.fill(what, &mut buf)?;
        Ok(buf)
    }

    /// Read exactly `len` bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedStream`] if fewer than `len` bytes remain. Nothing is
    /// allocated for a length the stream cannot satisfy.
    pub fn read_bytes(&mut self, len: u64, what: &'static str) -> Result<Vec<u8>> {
        self.ensure(what, len)?;

        let size = usize::try_from(len)
            .map_err(|_| truncated_error!(what, self.position, len, self.remaining()))?;
        let mut buf = vec![0_u8; size];
        self.fill(what, &mut buf)?;
        Ok(buf)
    }

    /// Read `count` consecutive little-endian values of type `T`.
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedStream`] if the array does not fit in the remaining bytes.
    pub fn read_array_le<T: PdbIO>(&mut self, count: usize, what: &'static str) -> Result<Vec<T>> {
        let needed = (count as u64).saturating_mul(std::mem::size_of::<T>() as u64);
        let data = self.read_bytes(needed, what)?;

        let mut offset = 0_usize;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(read_le_at::<T>(&data, &mut offset)?);
        }
        Ok(values)
    }

    /// Advance the cursor by `len` bytes without decoding them.
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedStream`] if the skipped region extends past the end of the
    /// stream. The cursor does not move in that case.
    pub fn skip(&mut self, len: u64, what: &'static str) -> Result<()> {
        self.ensure(what, len)?;
        if len == 0 {
            return Ok(());
        }

        let target = self.position + len;
        self.inner.seek(SeekFrom::Start(self.base + target))?;
        self.position = target;
        Ok(())
    }

    /// Read every byte from the cursor up to the absolute stream offset `end`.
    ///
    /// This is the tolerant counterpart of [`StreamReader::read_bytes`]: if `end` lies behind the
    /// cursor, nothing is read and the cursor stays put; if it lies past the end of the stream,
    /// the remaining bytes are returned.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the underlying source fails.
    pub fn read_until(&mut self, end: u64) -> Result<Vec<u8>> {
        let wanted = end.saturating_sub(self.position).min(self.remaining());
        if wanted == 0 {
            return Ok(Vec::new());
        }

        self.read_bytes(wanted, "trailing region")
    }
}
