//! The optional debug header at the end of the DBI stream.
//!
//! It is a table of eleven 16-bit stream numbers, one per kind of debug data the linker may
//! have copied out of the image. A value of `-1` means the stream is absent. Only the stream
//! numbers are decoded here; the streams themselves are left to the caller.

use std::io::{Read, Seek};

use strum::{EnumCount, EnumIter, IntoEnumIterator};

use crate::{file::reader::StreamReader, Result};

/// The kinds of optional debug stream, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, EnumCount)]
pub enum DebugStream {
    /// Frame pointer omission records
    Fpo,
    /// Exception handler data
    Exception,
    /// Fixup records
    Fixup,
    /// Address map from the image to the original source layout
    OmapToSource,
    /// Address map from the original source layout to the image
    OmapFromSource,
    /// Section headers of the image
    SectionHeader,
    /// Token to RID map
    TokenRidMap,
    /// Copy of the `.xdata` section
    Xdata,
    /// Copy of the `.pdata` section
    Pdata,
    /// Frame data records
    NewFpo,
    /// Section headers before any post-link rewriting
    SectionHeaderOriginal,
}

/// Stream numbers of the optional debug streams.
///
/// # Examples
///
/// ```rust
/// use dbiscope::dbi::{DebugStream, DebugSubstreamIndex};
///
/// let mut index = DebugSubstreamIndex::default();
/// index.streams[DebugStream::SectionHeader as usize] = 12;
///
/// assert_eq!(index.get(DebugStream::SectionHeader), Some(12));
/// assert_eq!(index.get(DebugStream::Fpo), None);
/// assert_eq!(index.iter().count(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugSubstreamIndex {
    /// Raw stream numbers, indexed by [`DebugStream`]; `-1` if absent
    pub streams: [i16; DebugStream::COUNT],
}

impl Default for DebugSubstreamIndex {
    fn default() -> Self {
        DebugSubstreamIndex {
            streams: [-1; DebugStream::COUNT],
        }
    }
}

impl DebugSubstreamIndex {
    /// Encoded size in bytes.
    pub const SIZE: usize = DebugStream::COUNT * 2;

    /// Decode the table at the reader's position.
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedStream`] if fewer than 22 bytes remain.
    pub fn read_from<R: Read + Seek>(reader: &mut StreamReader<R>) -> Result<DebugSubstreamIndex> {
        let values = reader.read_array_le::<i16>(DebugStream::COUNT, "debug header")?;

        let mut streams = [-1; DebugStream::COUNT];
        streams.copy_from_slice(&values);
        Ok(DebugSubstreamIndex { streams })
    }

    /// Raw stream number of `kind`, `-1` if absent
    #[must_use]
    pub fn raw(&self, kind: DebugStream) -> i16 {
        self.streams[kind as usize]
    }

    /// Stream number of `kind`, if present
    #[must_use]
    pub fn get(&self, kind: DebugStream) -> Option<u16> {
        u16::try_from(self.raw(kind)).ok()
    }

    /// Iterate over the streams that are present, in table order.
    pub fn iter(&self) -> impl Iterator<Item = (DebugStream, u16)> + '_ {
        DebugStream::iter().filter_map(|kind| Some((kind, self.get(kind)?)))
    }
}
