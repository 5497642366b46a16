use thiserror::Error;

/// Builds an [`Error::TruncatedStream`] for a fixed-size read that came up short.
///
/// ```rust, ignore
/// return Err(truncated_error!("DBI header", offset, 64, remaining));
/// ```
macro_rules! truncated_error {
    ($what:expr, $offset:expr, $needed:expr, $available:expr) => {
        crate::Error::TruncatedStream {
            what: $what,
            offset: $offset,
            needed: $needed,
            available: $available,
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Decoding a DBI stream is all-or-nothing: any of the variants below aborts the parse and no
/// partial [`crate::DbiStream`] is produced. Anomalies inside the file-info name tables are
/// deliberately *not* represented here; they are absorbed by the resolver and reported through
/// [`crate::dbi::Diagnostics`] instead.
///
/// # Error Categories
///
/// ## Stream Decoding Errors
/// - [`Error::MalformedHeader`] - The `0xFFFFFFFF` sentinel at the start of the stream is missing
/// - [`Error::TruncatedStream`] - A fixed-size structure or skipped region extends past the end
/// - [`Error::OutOfBounds`] - A bounds-checked read on an in-memory slice failed
///
/// ## I/O and Input Errors
/// - [`Error::Empty`] - Empty input provided to the file loader
/// - [`Error::FileError`] - Filesystem or byte source I/O errors
/// - [`Error::Error`] - Miscellaneous failures, such as memory mapping
///
/// # Examples
///
/// ```rust
/// use dbiscope::{DbiStream, Error};
///
/// match DbiStream::parse(&[0x00, 0x01, 0x02, 0x03]) {
///     Ok(dbi) => println!("{} modules", dbi.modules().len()),
///     Err(Error::MalformedHeader { signature }) => {
///         eprintln!("Not a DBI stream, signature {:02x?}", signature);
///     }
///     Err(Error::TruncatedStream { what, offset, .. }) => {
///         eprintln!("Stream ended while reading {} at 0x{:x}", what, offset);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The stream does not start with the `FF FF FF FF` sentinel.
    ///
    /// Older, pre-VC 4.1 DBI headers lack this sentinel and are not supported. Only the first
    /// four bytes of the stream are consumed before this error is raised.
    #[error("Malformed DBI header - invalid signature {signature:02x?}")]
    MalformedHeader {
        /// The four bytes found where the sentinel was expected
        signature: [u8; 4],
    },

    /// A fixed-size read could not obtain the required number of bytes.
    ///
    /// Raised for the stream header, the module-record region, the file-info index arrays,
    /// every skipped sub-stream, and the trailing debug sub-stream index table.
    ///
    /// # Fields
    ///
    /// * `what` - The structure or region that was being read
    /// * `offset` - Offset relative to the start of the DBI stream where the read began
    /// * `needed` - Number of bytes the read required
    /// * `available` - Number of bytes that were actually left in the source
    #[error("Truncated stream - {what} at 0x{offset:x} needs {needed} bytes, {available} available")]
    TruncatedStream {
        /// The structure or region that was being read
        what: &'static str,
        /// Offset of the read, relative to the start of the DBI stream
        offset: u64,
        /// Bytes required
        needed: u64,
        /// Bytes left in the source
        available: u64,
    },

    /// An out of bound access was attempted on an in-memory buffer.
    ///
    /// Produced by the low-level slice helpers in [`crate::file::io`] and [`crate::Parser`].
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors raised by the byte source, other than running out of data.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}
