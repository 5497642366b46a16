//! Module records ("exinfo") of the DBI stream.
//!
//! The module-record region holds one variable-length record per object file or import library
//! that contributed to the image. Each record is a 64-byte fixed prefix followed by two
//! null-terminated names, padded to the next 4-byte boundary:
//!
//! | Offset | Size | Field                                                 |
//! |--------|------|-------------------------------------------------------|
//! | 0      | 4    | Opened (unused on disk)                               |
//! | 4      | 28   | First section contribution ([`SymbolRange`])          |
//! | 32     | 2    | Flags ([`ModuleFlags`])                               |
//! | 34     | 2    | Module symbol stream, `-1` if absent                  |
//! | 36     | 4    | Symbol byte size                                      |
//! | 40     | 4    | C11 line info byte size                               |
//! | 44     | 4    | C13 line info byte size                               |
//! | 48     | 2    | Number of contributing source files                   |
//! | 50     | 2    | Padding                                               |
//! | 52     | 4    | Offset of the module's entries in the file-name table |
//! | 56     | 4    | Name index of the source file                         |
//! | 60     | 4    | Name index of the compiler PDB                        |
//! | 64     | *    | Module name, null-terminated                          |
//! | *      | *    | Object name, null-terminated                          |

use std::num::NonZeroUsize;

use bitflags::bitflags;

use crate::{file::parser::Parser, Result};

/// A contiguous range of a section, as recorded for a module's first contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SymbolRange {
    /// One-based section index
    pub section: i16,
    /// Offset within the section
    pub offset: i32,
    /// Byte size of the range
    pub size: i32,
    /// Section characteristics (`IMAGE_SCN_*`)
    pub characteristics: u32,
    /// Index of the module this range belongs to
    pub module: i16,
    /// CRC of the contributed data; not verified
    pub data_crc: u32,
    /// CRC of the relocations; not verified
    pub reloc_crc: u32,
}

impl SymbolRange {
    /// Encoded size in bytes, including two 2-byte padding fields.
    pub const SIZE: usize = 28;

    /// Decode a range at the parser's position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than 28 bytes remain.
    pub fn read(parser: &mut Parser) -> Result<SymbolRange> {
        parser.ensure_remaining(Self::SIZE)?;

        let section = parser.read_le::<i16>()?;
        parser.advance_by(2)?;
        let offset = parser.read_le::<i32>()?;
        let size = parser.read_le::<i32>()?;
        let characteristics = parser.read_le::<u32>()?;
        let module = parser.read_le::<i16>()?;
        parser.advance_by(2)?;

        Ok(SymbolRange {
            section,
            offset,
            size,
            characteristics,
            module,
            data_crc: parser.read_le::<u32>()?,
            reloc_crc: parser.read_le::<u32>()?,
        })
    }
}

bitflags! {
    /// Flags of a module record.
    ///
    /// Bits 8 to 15 hold the type server index, see [`ModuleRecord::type_server_index`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModuleFlags: u16 {
        /// The module has been written since the PDB was opened
        const WRITTEN = 0x0001;
        /// The module was compiled with edit-and-continue support
        const EC_ENABLED = 0x0002;
    }
}

/// One module record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRecord {
    /// Byte offset of this record within the module-record region
    pub offset: usize,
    /// Opened flag, meaningful only in memory
    pub opened: u32,
    /// First section contribution of the module
    pub section: SymbolRange,
    /// Module flags
    pub flags: ModuleFlags,
    /// Stream holding the module's private symbols, `-1` if absent
    pub stream: i16,
    /// Byte size of the symbol data in the module stream
    pub symbols_size: u32,
    /// Byte size of the C11-style line info in the module stream
    pub c11_lines_size: u32,
    /// Byte size of the C13-style line info in the module stream
    pub c13_lines_size: u32,
    /// Number of source files contributing to the module
    pub source_file_count: u16,
    /// Offset of this module's entries in the file-name table
    pub file_names_offset: u32,
    /// Name index of the primary source file
    pub source_name_index: u32,
    /// Name index of the compiler PDB
    pub pdb_name_index: u32,
    /// Module name, usually the object file path
    pub module_name: String,
    /// Object name, usually the library the object came from
    pub object_name: String,
}

impl ModuleRecord {
    /// Size of the fixed prefix preceding the two names.
    pub const FIXED_SIZE: usize = 64;

    /// Decode one record at the parser's position, without trailing padding.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the prefix or either name does not fit in the
    /// remaining data. The parser position is unspecified afterwards; use
    /// [`Parser::transactional`] to restore it.
    pub fn read(parser: &mut Parser) -> Result<ModuleRecord> {
        let offset = parser.pos();
        parser.ensure_remaining(Self::FIXED_SIZE)?;

        let opened = parser.read_le::<u32>()?;
        let section = SymbolRange::read(parser)?;
        let flags = ModuleFlags::from_bits_retain(parser.read_le::<u16>()?);
        let stream = parser.read_le::<i16>()?;
        let symbols_size = parser.read_le::<u32>()?;
        let c11_lines_size = parser.read_le::<u32>()?;
        let c13_lines_size = parser.read_le::<u32>()?;
        let source_file_count = parser.read_le::<u16>()?;
        parser.advance_by(2)?;
        let file_names_offset = parser.read_le::<u32>()?;
        let source_name_index = parser.read_le::<u32>()?;
        let pdb_name_index = parser.read_le::<u32>()?;

        Ok(ModuleRecord {
            offset,
            opened,
            section,
            flags,
            stream,
            symbols_size,
            c11_lines_size,
            c13_lines_size,
            source_file_count,
            file_names_offset,
            source_name_index,
            pdb_name_index,
            module_name: parser.read_cstring()?,
            object_name: parser.read_cstring()?,
        })
    }

    /// Stream holding the module's private symbols and line info, if present
    #[must_use]
    pub fn symbols_stream(&self) -> Option<u16> {
        u16::try_from(self.stream).ok()
    }

    /// Index of the type server the module's types live in
    #[must_use]
    pub fn type_server_index(&self) -> u8 {
        (self.flags.bits() >> 8) as u8
    }
}

/// Scanner over the module-record region.
///
/// Yields records until the region is exhausted. A record whose prefix or names do not fit in
/// what is left ends the scan; no partial record is produced and the leftover byte count is
/// available from [`ModuleIter::trailing_bytes`].
///
/// # Examples
///
/// ```rust
/// use dbiscope::dbi::ModuleIter;
///
/// let mut iter = ModuleIter::new(&[0u8; 10], 4)?;
/// assert!(iter.next().is_none());
/// assert_eq!(iter.trailing_bytes(), 10);
/// # Ok::<(), dbiscope::Error>(())
/// ```
pub struct ModuleIter<'a> {
    parser: Parser<'a>,
    alignment: NonZeroUsize,
    done: bool,
}

impl<'a> ModuleIter<'a> {
    /// Create a scanner over exactly the bytes of the module-record region.
    ///
    /// # Errors
    /// Returns [`crate::Error::Error`] if `alignment` is zero.
    pub fn new(data: &'a [u8], alignment: usize) -> Result<Self> {
        let Some(alignment) = NonZeroUsize::new(alignment) else {
            return Err(crate::Error::Error(
                "Module record alignment must be non-zero".to_string(),
            ));
        };

        Ok(ModuleIter {
            parser: Parser::new(data),
            alignment,
            done: false,
        })
    }

    /// Bytes of the region consumed so far, including padding.
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.parser.pos()
    }

    /// Bytes left at the end of the region that did not form a complete record.
    #[must_use]
    pub fn trailing_bytes(&self) -> usize {
        self.parser.remaining()
    }
}

impl Iterator for ModuleIter<'_> {
    type Item = ModuleRecord;

    fn next(&mut self) -> Option<ModuleRecord> {
        if self.done || !self.parser.has_more_data() {
            return None;
        }

        match self.parser.transactional(ModuleRecord::read) {
            Ok(record) => {
                self.parser.align(self.alignment);
                Some(record)
            }
            Err(_) => {
                self.done = true;
                None
            }
        }
    }
}
