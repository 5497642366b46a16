//! Cursor-based parser over an in-memory byte slice.
//!
//! This module provides the [`crate::file::parser::Parser`] type, which walks a bounded window of
//! bytes that has already been pulled out of the DBI stream. The module-record scanner runs a
//! `Parser` over exactly `module_size` bytes, so nothing it does can read past that region.
//!
//! # Key Components
//!
//! ## Navigation Methods
//! - [`crate::file::parser::Parser::seek`] - Move to a specific position
//! - [`crate::file::parser::Parser::advance_by`] - Move forward by a number of bytes
//! - [`crate::file::parser::Parser::align`] - Align to a byte boundary, clamped to the window
//! - [`crate::file::parser::Parser::transactional`] - Roll back the cursor if a closure fails
//!
//! ## Data Access Methods
//! - [`crate::file::parser::Parser::read_le`] - Read little-endian primitives
//! - [`crate::file::parser::Parser::read_cstring`] - Read a null-terminated name
//!
//! # Usage Examples
//!
//! ```rust
//! use dbiscope::Parser;
//! use std::num::NonZeroUsize;
//!
//! let data = [0x01, 0x02, b'a', b'.', b'c', 0x00, 0xAA, 0xAA];
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.read_le::<u16>()?, 0x0201);
//! assert_eq!(parser.read_cstring()?, "a.c");
//! parser.align(NonZeroUsize::new(4).unwrap());
//! assert_eq!(parser.pos(), 8);
//! # Ok::<(), dbiscope::Error>(())
//! ```

use std::num::NonZeroUsize;

use crate::{
    file::io::{read_le_at, PdbIO},
    Error::OutOfBounds,
    Result,
};

/// A bounds-checked cursor over a byte slice.
///
/// The parser keeps a position into the borrowed data and refuses any operation that would move
/// past the end. Unlike [`crate::file::reader::StreamReader`], it never touches the underlying
/// byte source; it is used for regions whose size is already known and fully buffered.
///
/// # Examples
///
/// ```rust
/// use dbiscope::Parser;
///
/// let data = [0xFF, 0xFF, 0x4C, 0x01];
/// let mut parser = Parser::new(&data);
///
/// let stream = parser.read_le::<i16>()?;
/// let machine = parser.read_le::<u16>()?;
/// assert_eq!((stream, machine), (-1, 0x014C));
/// assert!(!parser.has_more_data());
/// # Ok::<(), dbiscope::Error>(())
/// ```
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`crate::file::parser::Parser`] from a byte slice.
    ///
    /// # Arguments
    /// * `data` - The byte slice to read from
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move the current position to the specified index.
    ///
    /// Seeking to exactly the end of the data is allowed and leaves nothing to read.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if position is beyond the data length.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(OutOfBounds);
        }

        self.position = pos;
        Ok(())
    }

    /// Move the position forward by the specified number of bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing by step would exceed the data length.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        match self.position.checked_add(step) {
            Some(end) if end <= self.data.len() => {
                self.position = end;
                Ok(())
            }
            _ => Err(OutOfBounds),
        }
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Get access to the underlying data buffer.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the number of bytes remaining from the current position.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Ensures that at least `needed` bytes are available from the current position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `needed` bytes remain.
    pub fn ensure_remaining(&self, needed: usize) -> Result<()> {
        if self.remaining() < needed {
            return Err(OutOfBounds);
        }
        Ok(())
    }

    /// Execute a closure transactionally, rolling back on failure.
    ///
    /// The parser position is saved before `f` runs; if `f` returns `Err` the position is
    /// restored, so a record that fails to decode half-way leaves the cursor at its start.
    ///
    /// # Errors
    /// Returns any error produced by the closure `f`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dbiscope::Parser;
    ///
    /// let mut parser = Parser::new(&[0x01]);
    /// let result: Result<u32, _> = parser.transactional(|p| p.read_le());
    /// assert!(result.is_err());
    /// assert_eq!(parser.pos(), 0);
    /// ```
    pub fn transactional<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let saved_position = self.position;
        let result = f(self);
        if result.is_err() {
            self.position = saved_position;
        }
        result
    }

    /// Align the position to a specific boundary.
    ///
    /// Padding bytes are skipped without being inspected. If the window ends before the next
    /// boundary, the position is clamped to the end of the data instead of failing; DBI module
    /// records are allowed to omit the padding after the final entry.
    ///
    /// Returns the number of padding bytes that were skipped.
    pub fn align(&mut self, alignment: NonZeroUsize) -> usize {
        let alignment = alignment.get();
        let padding = (alignment - (self.position % alignment)) % alignment;
        let target = self.position.saturating_add(padding).min(self.data.len());
        let skipped = target - self.position;
        self.position = target;
        skipped
    }

    /// Read a type `T` from the current position in little-endian format and advance the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length.
    pub fn read_le<T: PdbIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Read `len` raw bytes and advance the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `len` bytes remain.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure_remaining(len)?;

        let bytes = &self.data[self.position..self.position + len];
        self.position += len;
        Ok(bytes)
    }

    /// Read a null-terminated string and advance the position past the terminator.
    ///
    /// Invalid UTF-8 sequences are replaced with `U+FFFD`; module and object names written by
    /// older toolchains are frequently in the local ANSI code page.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if no terminator is found before the end of the
    /// data. The position is left unchanged in that case.
    pub fn read_cstring(&mut self) -> Result<String> {
        let rest = &self.data[self.position.min(self.data.len())..];
        let Some(length) = rest.iter().position(|&byte| byte == 0) else {
            return Err(OutOfBounds);
        };

        let name = String::from_utf8_lossy(&rest[..length]).into_owned();
        self.position += length + 1;
        Ok(name)
    }
}
