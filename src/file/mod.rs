//! Byte sources and low-level decoding primitives.
//!
//! Everything the DBI decoder reads comes through this module. It provides the primitive
//! little-endian codec, two cursors (one over buffered slices, one over seekable sources), and
//! a small loader abstraction for obtaining the raw stream bytes from disk or memory.
//!
//! # Key Components
//!
//! ## Core Types
//! - [`crate::file::File`] - Owned raw DBI stream bytes, loaded from disk or memory
//! - [`crate::file::Backend`] - Trait for different data sources (disk files, memory buffers)
//!
//! ## Parsing Infrastructure
//! - [`crate::file::io`] - Little-endian primitive codec
//! - [`crate::file::parser::Parser`] - Cursor over an in-memory window
//! - [`crate::file::reader::StreamReader`] - Forward cursor over a `Read + Seek` source
//!
//! ## Backend Implementations
//! - `Physical` - Memory-mapped file backend for disk access
//! - `Memory` - In-memory buffer backend
//!
//! Locating the DBI stream inside a PDB container (the MSF page directory) is not handled
//! here; the loader expects the already-extracted stream bytes.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dbiscope::{File, DbiStream};
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("dbi_stream.bin"))?;
//! println!("Loaded {} bytes", file.len());
//!
//! let dbi = DbiStream::parse(file.data())?;
//! println!("{} modules", dbi.modules().len());
//! # Ok::<(), dbiscope::Error>(())
//! ```

pub mod io;
pub mod parser;
pub mod reader;

mod memory;
mod physical;

use std::path::Path;

use crate::{
    Error::{Empty, OutOfBounds},
    Result,
};
use memory::Memory;
use physical::Physical;

/// Backend for file data.
///
/// Provides read-only access to the raw bytes of a DBI stream regardless of whether they live
/// in a memory-mapped file or an owned buffer. All implementations must be thread-safe.
pub trait Backend: Send + Sync {
    /// Returns a slice of the data at the given offset and length.
    ///
    /// # Arguments
    ///
    /// * `offset` - The starting offset within the data.
    /// * `len` - The length of the slice in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested range is out of bounds.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize;
}

/// Raw bytes of a DBI stream, loaded from disk or memory.
///
/// # Examples
///
/// ```rust
/// use dbiscope::File;
///
/// let file = File::from_mem(vec![0xFF, 0xFF, 0xFF, 0xFF])?;
/// assert_eq!(file.len(), 4);
/// assert_eq!(file.data_slice(0, 2)?, &[0xFF, 0xFF]);
/// # Ok::<(), dbiscope::Error>(())
/// ```
pub struct File {
    /// The underlying data source (memory or file).
    data: Box<dyn Backend>,
}

impl File {
    /// Loads a DBI stream from a file on disk, using memory-mapped I/O.
    ///
    /// # Arguments
    ///
    /// * `file` - Path to the file holding the raw DBI stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or mapped, or if it is empty.
    pub fn from_file(file: &Path) -> Result<File> {
        let input = Physical::new(file)?;

        Self::load(input)
    }

    /// Loads a DBI stream from a memory buffer.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Empty`] if the buffer is empty.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        let input = Memory::from(data);

        Self::load(input)
    }

    /// Internal loader for any backend.
    fn load<T: Backend + 'static>(data: T) -> Result<File> {
        if data.len() == 0 {
            return Err(Empty);
        }

        Ok(File {
            data: Box::new(data),
        })
    }

    /// Returns the total size of the loaded data in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the loaded data has a length of zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.len() == 0
    }

    /// Returns the complete data buffer.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    /// Returns a bounds-checked slice of the data.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if the range is out of bounds.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        match self.data.data_slice(offset, len) {
            Ok(slice) => Ok(slice),
            Err(_) => Err(OutOfBounds),
        }
    }
}
