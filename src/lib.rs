// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # dbiscope
//!
//! [![Crates.io](https://img.shields.io/crates/v/dbiscope.svg)](https://crates.io/crates/dbiscope)
//! [![Documentation](https://docs.rs/dbiscope/badge.svg)](https://docs.rs/dbiscope)
//! [![License](https://img.shields.io/badge/license-Apache--2.0-blue.svg)](https://github.com/BinFlip/dbiscope/blob/main/LICENSE-APACHE)
//!
//! A fast, defensive decoder for the Debug Info ("DBI") stream of Microsoft PDB files.
//! Built in pure Rust, `dbiscope` turns the raw bytes of a DBI stream into its header, the list
//! of modules that were linked into the image, the source files each module was built from,
//! and the stream numbers of the optional debug streams.
//!
//! ## Features
//!
//! - **📦 Any byte source** - Decode from a slice, any `Read + Seek` source, or a memory-mapped file
//! - **🛡️ Defensive decoding** - Every fixed read is bounds-checked; malformed name tables are tolerated
//! - **🔍 Full module records** - Section contribution, stream numbers, sizes, module and object names
//! - **📊 Diagnostics** - Anomalies are collected and forwarded to `tracing` instead of failing the parse
//!
//! Locating the DBI stream inside the PDB container is left to the caller: `dbiscope` expects the
//! raw bytes of stream 3, as extracted by any MSF reader.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dbiscope::prelude::*;
//!
//! let dbi = DbiStream::from_file("dbi_stream.bin".as_ref())?;
//! println!("{} modules, {} distinct files", dbi.modules().len(), dbi.unique_files().len());
//! # Ok::<(), dbiscope::Error>(())
//! ```
//!
//! ### Decoding From Memory
//!
//! ```rust,no_run
//! use dbiscope::DbiStream;
//!
//! let data: Vec<u8> = std::fs::read("dbi_stream.bin")?;
//! let dbi = DbiStream::parse(&data)?;
//!
//! for (index, module) in dbi.modules().iter().enumerate() {
//!     println!("{}", module.module_name);
//!     for file in dbi.module_files(index).unwrap_or_default() {
//!         println!("    {}", file);
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ### Diagnostics And Options
//!
//! ```rust,no_run
//! use dbiscope::dbi::{DbiStream, Diagnostics, ParseOptions};
//! use std::{fs::File, io::BufReader, sync::Arc};
//!
//! let diagnostics = Arc::new(Diagnostics::new());
//! let source = BufReader::new(File::open("dbi_stream.bin")?);
//!
//! let dbi = DbiStream::parse_with(source, ParseOptions::lenient(), Arc::clone(&diagnostics))?;
//! if diagnostics.has_warnings() {
//!     eprintln!("{}", diagnostics.summary());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`prelude`] - Convenient re-exports of commonly used types
//! - [`dbi`] - The DBI stream structures and the decoding pipeline
//! - [`file`] - Byte sources, the little-endian codec and the cursors the decoder reads through
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Error Handling
//!
//! Decoding is all-or-nothing. A stream either decodes completely or fails with an error naming
//! the structure that could not be read:
//!
//! ```rust,no_run
//! use dbiscope::{DbiStream, Error};
//!
//! match DbiStream::from_file(std::path::Path::new("dbi_stream.bin")) {
//!     Ok(dbi) => println!("{} modules", dbi.modules().len()),
//!     Err(Error::MalformedHeader { .. }) => println!("Not a DBI stream"),
//!     Err(Error::TruncatedStream { what, .. }) => println!("Stream ends inside the {}", what),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Development and Testing
//!
//! ```bash
//! cargo test
//! cargo bench
//!
//! # Run fuzzer
//! cargo +nightly fuzz run dbistream --release
//! ```

#[macro_use]
pub(crate) mod error;

/// Byte sources, the little-endian codec, and the cursors used for decoding.
///
/// # Examples
///
/// ```rust
/// use dbiscope::Parser;
///
/// let mut parser = Parser::new(b"a.obj\0");
/// assert_eq!(parser.read_cstring()?, "a.obj");
/// # Ok::<(), dbiscope::Error>(())
/// ```
pub mod file;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust,no_run
/// use dbiscope::prelude::*;
///
/// let dbi = DbiStream::from_file("dbi_stream.bin".as_ref())?;
/// let amd64 = dbi.header().machine == Machine::Amd64;
/// # Ok::<(), dbiscope::Error>(())
/// ```
pub mod prelude;

/// The DBI stream: header, module records, file info, and the optional debug header.
///
/// # Key Types
///
/// - [`dbi::DbiStream`] - The decoded stream and the entry points that produce it
/// - [`dbi::StreamHeader`] - The 64-byte stream header
/// - [`dbi::ModuleRecord`] - One linked module
/// - [`dbi::FileInfo`] / [`dbi::ModuleFiles`] - Source files per module
/// - [`dbi::DebugSubstreamIndex`] - Stream numbers of the optional debug streams
/// - [`dbi::Diagnostics`] / [`dbi::ParseOptions`] - Anomaly reporting and configuration
pub mod dbi;

/// `dbiscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `dbiscope` Error type
///
/// Every fallible operation of the crate returns this type; decoding failures name the
/// structure that could not be read.
pub use error::Error;

/// Main entry point for decoding DBI streams.
///
/// # Example
///
/// ```rust,no_run
/// use dbiscope::DbiStream;
/// let dbi = DbiStream::from_file(std::path::Path::new("dbi_stream.bin"))?;
/// println!("Found {} modules", dbi.modules().len());
/// # Ok::<(), dbiscope::Error>(())
/// ```
pub use dbi::DbiStream;

/// Provides access to low-level file and memory parsing utilities.
///
/// The [`Parser`] type is used for decoding bounded in-memory regions, and [`File`] for loading
/// raw stream bytes from disk or memory.
pub use file::{parser::Parser, File};

/// Decode a DBI stream held in memory.
///
/// Shorthand for [`DbiStream::parse`].
///
/// # Errors
/// Returns [`Error::MalformedHeader`] or [`Error::TruncatedStream`].
pub fn parse(data: &[u8]) -> Result<DbiStream> {
    DbiStream::parse(data)
}

/// Decode a DBI stream from a seekable source positioned at the start of the stream.
///
/// Shorthand for [`DbiStream::parse_stream`].
///
/// # Errors
/// Returns [`Error::MalformedHeader`], [`Error::TruncatedStream`], or [`Error::FileError`].
pub fn parse_stream<R: std::io::Read + std::io::Seek>(source: R) -> Result<DbiStream> {
    DbiStream::parse_stream(source)
}

/// Decode a raw DBI stream stored in a file.
///
/// Shorthand for [`DbiStream::from_file`].
///
/// # Errors
/// Returns [`Error::FileError`] or [`Error::Empty`] if the file cannot be loaded, otherwise the
/// same errors as [`parse`].
pub fn parse_file(path: impl AsRef<std::path::Path>) -> Result<DbiStream> {
    DbiStream::from_file(path.as_ref())
}
