//! The fixed 64-byte DBI stream header.
//!
//! The header is the only part of the stream that describes the rest: it carries the byte sizes
//! of every variable-length region that follows, plus the stream numbers of the global symbol,
//! public symbol and symbol-record streams.
//!
//! # Layout
//!
//! | Offset | Size | Field                                           |
//! |--------|------|-------------------------------------------------|
//! | 0      | 4    | Signature, always `FF FF FF FF`                 |
//! | 4      | 4    | Version                                         |
//! | 8      | 4    | Age                                             |
//! | 12     | 2    | Global symbols stream                           |
//! | 14     | 2    | Build number                                    |
//! | 16     | 2    | Public symbols stream                           |
//! | 18     | 2    | PDB DLL version                                 |
//! | 20     | 2    | Symbol records stream                           |
//! | 22     | 2    | PDB DLL rebuild                                 |
//! | 24     | 4    | Module-record region size                       |
//! | 28     | 4    | Section contribution size                       |
//! | 32     | 4    | Section map size                                |
//! | 36     | 4    | File info size                                  |
//! | 40     | 4    | Type server map size                            |
//! | 44     | 4    | MFC type server index                           |
//! | 48     | 4    | Optional debug header size                      |
//! | 52     | 4    | Edit-and-continue info size                     |
//! | 56     | 2    | Flags                                           |
//! | 58     | 2    | Machine                                         |
//! | 60     | 4    | Reserved                                        |

use std::{
    fmt,
    io::{Cursor, Read, Seek},
};

use bitflags::bitflags;

use crate::{
    file::{io::write_le_at, parser::Parser, reader::StreamReader},
    Error::MalformedHeader,
    Result,
};

/// The four bytes every supported DBI stream starts with.
pub const DBI_SIGNATURE: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];

/// Known DBI header format versions.
///
/// Values not listed here are preserved in [`HeaderVersion::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderVersion {
    /// VC 4.1
    V41,
    /// VC 5.0
    V50,
    /// VC 6.0
    V60,
    /// VC 7.0 and every later toolset observed in practice
    V70,
    /// VC 11.0
    V110,
    /// Any other value
    Other(u32),
}

impl From<u32> for HeaderVersion {
    fn from(value: u32) -> Self {
        match value {
            930_803 => HeaderVersion::V41,
            19_960_307 => HeaderVersion::V50,
            19_970_606 => HeaderVersion::V60,
            19_990_903 => HeaderVersion::V70,
            20_091_201 => HeaderVersion::V110,
            other => HeaderVersion::Other(other),
        }
    }
}

impl From<HeaderVersion> for u32 {
    fn from(value: HeaderVersion) -> Self {
        match value {
            HeaderVersion::V41 => 930_803,
            HeaderVersion::V50 => 19_960_307,
            HeaderVersion::V60 => 19_970_606,
            HeaderVersion::V70 => 19_990_903,
            HeaderVersion::V110 => 20_091_201,
            HeaderVersion::Other(other) => other,
        }
    }
}

/// Target architecture of the linked image.
///
/// The four values the linker is known to write get their own variant; anything else is kept as
/// [`Machine::Other`] so that re-encoding the header reproduces the original bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Machine {
    /// `IMAGE_FILE_MACHINE_UNKNOWN`
    Unknown,
    /// Intel 386 and compatible
    I386,
    /// Intel Itanium
    Ia64,
    /// x64
    Amd64,
    /// Any other machine value
    Other(u16),
}

impl From<u16> for Machine {
    fn from(value: u16) -> Self {
        match value {
            0x0000 => Machine::Unknown,
            0x014C => Machine::I386,
            0x0200 => Machine::Ia64,
            0x8664 => Machine::Amd64,
            other => Machine::Other(other),
        }
    }
}

impl From<Machine> for u16 {
    fn from(value: Machine) -> Self {
        match value {
            Machine::Unknown => 0x0000,
            Machine::I386 => 0x014C,
            Machine::Ia64 => 0x0200,
            Machine::Amd64 => 0x8664,
            Machine::Other(other) => other,
        }
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Machine::Unknown => write!(f, "Unknown"),
            Machine::I386 => write!(f, "I386"),
            Machine::Ia64 => write!(f, "IA64"),
            Machine::Amd64 => write!(f, "AMD64"),
            Machine::Other(value) => write!(f, "0x{value:04x}"),
        }
    }
}

bitflags! {
    /// Flags in the DBI header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HeaderFlags: u16 {
        /// The image was incrementally linked
        const INCREMENTALLY_LINKED = 0x0001;
        /// Private symbols were stripped from this PDB
        const PRIVATE_SYMBOLS_STRIPPED = 0x0002;
        /// The image was linked with `/DEBUG:CTYPES` and has conflicting types
        const CONFLICTING_TYPES = 0x0004;
    }
}

/// Toolchain build number packed into the `vers` header field.
///
/// The new format sets bit 15 and stores the major version in bits 8 to 14 and the minor
/// version in bits 0 to 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuildNumber(u16);

impl BuildNumber {
    /// Raw 16-bit value as stored in the header
    #[must_use]
    pub fn raw(self) -> u16 {
        self.0
    }

    /// Returns `true` if the value uses the new build-number format
    #[must_use]
    pub fn is_new_format(self) -> bool {
        self.0 & 0x8000 != 0
    }

    /// Major toolchain version
    #[must_use]
    pub fn major(self) -> u8 {
        ((self.0 >> 8) & 0x7F) as u8
    }

    /// Minor toolchain version
    #[must_use]
    pub fn minor(self) -> u8 {
        (self.0 & 0xFF) as u8
    }
}

impl From<u16> for BuildNumber {
    fn from(value: u16) -> Self {
        BuildNumber(value)
    }
}

impl fmt::Display for BuildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major(), self.minor())
    }
}

/// The decoded DBI stream header.
///
/// All fields are kept in their on-disk form so that [`StreamHeader::to_bytes`] reproduces the
/// 64 header bytes exactly. The signature is not stored: a decoded header always had a valid one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
    /// Raw format version, see [`StreamHeader::header_version`]
    pub version: u32,
    /// Number of times the PDB has been written
    pub age: u32,
    /// Stream number of the global symbol hash, `-1` if absent
    pub gs_symbols_stream: i16,
    /// Packed toolchain build number
    pub build_number: BuildNumber,
    /// Stream number of the public symbol hash, `-1` if absent
    pub ps_symbols_stream: i16,
    /// Version of the mspdb DLL that wrote the PDB
    pub pdb_dll_version: u16,
    /// Stream number of the symbol records, `-1` if absent
    pub symbol_records_stream: i16,
    /// Rebuild number of the mspdb DLL that wrote the PDB
    pub pdb_dll_rbld: u16,
    /// Byte size of the module-record region
    pub module_list_size: u32,
    /// Byte size of the section contribution region
    pub section_contribution_size: u32,
    /// Byte size of the section map region
    pub section_map_size: u32,
    /// Byte size of the file-info region
    pub file_info_size: u32,
    /// Byte size of the type server map region
    pub type_server_map_size: u32,
    /// Index of the MFC type server
    pub mfc_type_server_index: u32,
    /// Byte size of the optional debug header at the end of the stream
    pub debug_header_size: u32,
    /// Byte size of the edit-and-continue info region
    pub ec_substream_size: u32,
    /// Header flags; unknown bits are retained
    pub flags: HeaderFlags,
    /// Target machine of the image
    pub machine: Machine,
    /// Reserved, expected to be zero
    pub reserved: u32,
}

impl StreamHeader {
    /// Encoded size of the header in bytes.
    pub const SIZE: usize = 64;

    /// Decode a header from the start of `data`.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedHeader`] if the signature is wrong, or
    /// [`crate::Error::TruncatedStream`] if `data` is shorter than 64 bytes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dbiscope::dbi::{Machine, StreamHeader};
    ///
    /// let mut data = [0u8; 64];
    /// data[..4].copy_from_slice(&[0xFF; 4]);
    /// data[58..60].copy_from_slice(&0x8664_u16.to_le_bytes());
    ///
    /// let header = StreamHeader::read(&data)?;
    /// assert_eq!(header.machine, Machine::Amd64);
    /// assert_eq!(header.to_bytes()?, data);
    /// # Ok::<(), dbiscope::Error>(())
    /// ```
    pub fn read(data: &[u8]) -> Result<StreamHeader> {
        let mut reader = StreamReader::new(Cursor::new(data))?;
        Self::read_from(&mut reader)
    }

    /// Decode a header at the reader's current position, advancing it by 64 bytes.
    ///
    /// The signature is read and checked before anything else, so a mismatch consumes exactly
    /// four bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedHeader`] or [`crate::Error::TruncatedStream`].
    pub fn read_from<R: Read + Seek>(reader: &mut StreamReader<R>) -> Result<StreamHeader> {
        let signature = reader.read_array::<4>("DBI header signature")?;
        if signature != DBI_SIGNATURE {
            return Err(MalformedHeader { signature });
        }

        let body = reader.read_array::<{ StreamHeader::SIZE - 4 }>("DBI header")?;
        let mut parser = Parser::new(&body);

        Ok(StreamHeader {
            version: parser.read_le::<u32>()?,
            age: parser.read_le::<u32>()?,
            gs_symbols_stream: parser.read_le::<i16>()?,
            build_number: BuildNumber(parser.read_le::<u16>()?),
            ps_symbols_stream: parser.read_le::<i16>()?,
            pdb_dll_version: parser.read_le::<u16>()?,
            symbol_records_stream: parser.read_le::<i16>()?,
            pdb_dll_rbld: parser.read_le::<u16>()?,
            module_list_size: parser.read_le::<u32>()?,
            section_contribution_size: parser.read_le::<u32>()?,
            section_map_size: parser.read_le::<u32>()?,
            file_info_size: parser.read_le::<u32>()?,
            type_server_map_size: parser.read_le::<u32>()?,
            mfc_type_server_index: parser.read_le::<u32>()?,
            debug_header_size: parser.read_le::<u32>()?,
            ec_substream_size: parser.read_le::<u32>()?,
            flags: HeaderFlags::from_bits_retain(parser.read_le::<u16>()?),
            machine: Machine::from(parser.read_le::<u16>()?),
            reserved: parser.read_le::<u32>()?,
        })
    }

    /// Re-encode the header into its 64-byte on-disk form.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] only if the fields do not fit, which cannot happen
    /// for a well-formed `StreamHeader`.
    pub fn to_bytes(&self) -> Result<[u8; StreamHeader::SIZE]> {
        let mut data = [0u8; StreamHeader::SIZE];
        data[..4].copy_from_slice(&DBI_SIGNATURE);

        let mut offset = 4;
        write_le_at(&mut data, &mut offset, self.version)?;
        write_le_at(&mut data, &mut offset, self.age)?;
        write_le_at(&mut data, &mut offset, self.gs_symbols_stream)?;
        write_le_at(&mut data, &mut offset, self.build_number.raw())?;
        write_le_at(&mut data, &mut offset, self.ps_symbols_stream)?;
        write_le_at(&mut data, &mut offset, self.pdb_dll_version)?;
        write_le_at(&mut data, &mut offset, self.symbol_records_stream)?;
        write_le_at(&mut data, &mut offset, self.pdb_dll_rbld)?;
        write_le_at(&mut data, &mut offset, self.module_list_size)?;
        write_le_at(&mut data, &mut offset, self.section_contribution_size)?;
        write_le_at(&mut data, &mut offset, self.section_map_size)?;
        write_le_at(&mut data, &mut offset, self.file_info_size)?;
        write_le_at(&mut data, &mut offset, self.type_server_map_size)?;
        write_le_at(&mut data, &mut offset, self.mfc_type_server_index)?;
        write_le_at(&mut data, &mut offset, self.debug_header_size)?;
        write_le_at(&mut data, &mut offset, self.ec_substream_size)?;
        write_le_at(&mut data, &mut offset, self.flags.bits())?;
        write_le_at(&mut data, &mut offset, u16::from(self.machine))?;
        write_le_at(&mut data, &mut offset, self.reserved)?;

        Ok(data)
    }

    /// Interpreted format version
    #[must_use]
    pub fn header_version(&self) -> HeaderVersion {
        HeaderVersion::from(self.version)
    }

    /// Stream holding the global symbol hash, if present
    #[must_use]
    pub fn global_symbols_stream(&self) -> Option<u16> {
        u16::try_from(self.gs_symbols_stream).ok()
    }

    /// Stream holding the public symbol hash, if present
    #[must_use]
    pub fn public_symbols_stream(&self) -> Option<u16> {
        u16::try_from(self.ps_symbols_stream).ok()
    }

    /// Stream holding the symbol records, if present
    #[must_use]
    pub fn symbol_records_stream(&self) -> Option<u16> {
        u16::try_from(self.symbol_records_stream).ok()
    }
}
