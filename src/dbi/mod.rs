//! Decoding of the DBI stream.
//!
//! The DBI ("debug info") stream of a PDB describes the modules that were linked into the image
//! and the source files each of them was compiled from. Its layout is only partially
//! self-describing: the header carries the byte size of every region that follows, and the
//! regions are laid out back to back:
//!
//! 1. the 64-byte [`StreamHeader`]
//! 2. the module records ([`ModuleRecord`], decoded by [`ModuleIter`])
//! 3. section contributions (skipped)
//! 4. section map (skipped)
//! 5. file info ([`FileInfo`], resolved into [`ModuleFiles`])
//! 6. type server map (skipped)
//! 7. edit-and-continue info (skipped)
//! 8. the optional debug header ([`DebugSubstreamIndex`])
//!
//! [`DbiStream`] drives this sequence in a single forward pass over any `Read + Seek` source.
//!
//! # Failure Model
//!
//! A wrong signature fails with [`crate::Error::MalformedHeader`]; any fixed-size read or skip
//! the source cannot satisfy fails with [`crate::Error::TruncatedStream`]. Nothing else fails:
//! problems inside the file-info tables are absorbed and reported to [`Diagnostics`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use dbiscope::dbi::{DebugStream, DbiStream};
//! use std::path::Path;
//!
//! let dbi = DbiStream::from_file(Path::new("dbi_stream.bin"))?;
//!
//! println!("machine: {}", dbi.header().machine);
//! for (index, module) in dbi.modules().iter().enumerate() {
//!     println!("{} ({} files)", module.module_name, dbi.module_files(index).map_or(0, |f| f.len()));
//! }
//!
//! if let Some(stream) = dbi.debug_streams().get(DebugStream::SectionHeader) {
//!     println!("section headers in stream {}", stream);
//! }
//! # Ok::<(), dbiscope::Error>(())
//! ```

mod debug;
mod diagnostics;
mod files;
mod header;
mod module;
mod options;

pub use debug::{DebugStream, DebugSubstreamIndex};
pub use diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics};
pub use files::{FileIndexSummary, FileInfo, ModuleFiles};
pub use header::{BuildNumber, HeaderFlags, HeaderVersion, Machine, StreamHeader, DBI_SIGNATURE};
pub use module::{ModuleFlags, ModuleIter, ModuleRecord, SymbolRange};
pub use options::{
    ParseOptions, DEFAULT_MAX_SKIPPED_NAMES, MAX_REPORTED_NAME_ANOMALIES, MODULE_RECORD_ALIGNMENT,
};

use std::{
    collections::HashSet,
    io::{Cursor, Read, Seek},
    path::Path,
    sync::Arc,
};

use crate::{
    file::{reader::StreamReader, File},
    Result,
};

/// A fully decoded DBI stream.
///
/// Produced by one of the parse entry points; immutable afterwards.
pub struct DbiStream {
    header: StreamHeader,
    modules: Vec<ModuleRecord>,
    file_info: FileInfo,
    files: ModuleFiles,
    debug_streams: DebugSubstreamIndex,
    diagnostics: Arc<Diagnostics>,
}

impl DbiStream {
    /// Decode a DBI stream held in memory.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedHeader`] or [`crate::Error::TruncatedStream`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dbiscope::{DbiStream, Error};
    ///
    /// let result = DbiStream::parse(&[0xFF, 0xFF, 0xFF, 0xFF, 0x00]);
    /// assert!(matches!(result, Err(Error::TruncatedStream { what: "DBI header", .. })));
    /// ```
    pub fn parse(data: &[u8]) -> Result<DbiStream> {
        Self::parse_stream(Cursor::new(data))
    }

    /// Decode a DBI stream from a seekable source positioned at the start of the stream.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedHeader`], [`crate::Error::TruncatedStream`], or
    /// [`crate::Error::FileError`] if the source itself fails.
    pub fn parse_stream<R: Read + Seek>(source: R) -> Result<DbiStream> {
        Self::parse_with(
            source,
            ParseOptions::default(),
            Arc::new(Diagnostics::new()),
        )
    }

    /// Decode a DBI stream with explicit options, reporting anomalies to `diagnostics`.
    ///
    /// The same `diagnostics` container is kept by the returned stream. Entries reported before
    /// a failed parse remain in the container.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedHeader`], [`crate::Error::TruncatedStream`],
    /// [`crate::Error::FileError`], or [`crate::Error::Error`] for a zero alignment.
    #[tracing::instrument(level = "trace", name = "DbiStream::parse", skip_all)]
    pub fn parse_with<R: Read + Seek>(
        source: R,
        options: ParseOptions,
        diagnostics: Arc<Diagnostics>,
    ) -> Result<DbiStream> {
        let mut reader = StreamReader::new(source)?;

        let header = StreamHeader::read_from(&mut reader)?;
        tracing::debug!(
            version = header.version,
            machine = %header.machine,
            module_list_size = header.module_list_size,
            file_info_size = header.file_info_size,
            "read DBI header"
        );

        if let HeaderVersion::Other(version) = header.header_version() {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticSeverity::Info,
                    DiagnosticCategory::Header,
                    format!("Unknown DBI header version {}", version),
                )
                .with_offset(4),
            );
        }
        if header.reserved != 0 {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticSeverity::Info,
                    DiagnosticCategory::Header,
                    format!("Reserved header field is 0x{:08x}", header.reserved),
                )
                .with_offset(60),
            );
        }

        let module_start = reader.pos();
        let module_data = reader.read_bytes(header.module_list_size.into(), "module records")?;
        let mut iter = ModuleIter::new(&module_data, options.alignment)?;
        let modules: Vec<ModuleRecord> = iter.by_ref().collect();
        if iter.trailing_bytes() > 0 {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticSeverity::Warning,
                    DiagnosticCategory::Modules,
                    format!(
                        "{} trailing bytes in the module records do not form a complete record",
                        iter.trailing_bytes()
                    ),
                )
                .with_offset(module_start + iter.consumed() as u64),
            );
        }
        tracing::trace!(count = modules.len(), "read module records");

        reader.skip(header.section_contribution_size.into(), "section contributions")?;
        reader.skip(header.section_map_size.into(), "section map")?;

        let file_info = FileInfo::read_from(&mut reader, header.file_info_size, &diagnostics)?;
        let files = file_info.resolve(&options, &diagnostics);

        reader.skip(header.type_server_map_size.into(), "type server map")?;
        reader.skip(header.ec_substream_size.into(), "edit and continue info")?;

        if header.debug_header_size as usize != DebugSubstreamIndex::SIZE {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticSeverity::Info,
                    DiagnosticCategory::DebugHeader,
                    format!(
                        "Debug header declared as {} bytes, decoding the {} byte table",
                        header.debug_header_size,
                        DebugSubstreamIndex::SIZE
                    ),
                )
                .with_offset(reader.pos()),
            );
        }
        let debug_streams = DebugSubstreamIndex::read_from(&mut reader)?;

        tracing::debug!(
            modules = modules.len(),
            files = files.files.len(),
            skipped_names = files.skipped_names,
            "decoded DBI stream"
        );

        Ok(DbiStream {
            header,
            modules,
            file_info,
            files,
            debug_streams,
            diagnostics,
        })
    }

    /// Decode a raw DBI stream stored in a file, using memory-mapped I/O.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] or [`crate::Error::Empty`] if the file cannot be
    /// loaded, otherwise the same errors as [`DbiStream::parse`].
    pub fn from_file(file: &Path) -> Result<DbiStream> {
        let input = File::from_file(file)?;
        Self::parse(input.data())
    }

    /// Decode a raw DBI stream from an owned buffer.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] for an empty buffer, otherwise the same errors as
    /// [`DbiStream::parse`].
    pub fn from_mem(data: Vec<u8>) -> Result<DbiStream> {
        let input = File::from_mem(data)?;
        Self::parse(input.data())
    }

    /// Returns the stream header.
    #[must_use]
    pub fn header(&self) -> &StreamHeader {
        &self.header
    }

    /// Returns the module records, in stream order.
    #[must_use]
    pub fn modules(&self) -> &[ModuleRecord] {
        &self.modules
    }

    /// Returns the first module whose name equals `name`, together with its index.
    #[must_use]
    pub fn module_by_name(&self, name: &str) -> Option<(usize, &ModuleRecord)> {
        self.modules
            .iter()
            .enumerate()
            .find(|(_, module)| module.module_name == name)
    }

    /// Returns the raw file-info tables.
    #[must_use]
    pub fn file_info(&self) -> &FileInfo {
        &self.file_info
    }

    /// Returns the resolved file names of every module described by the file-info region.
    ///
    /// Indexed by the module's position in the file-info tables, which matches
    /// [`DbiStream::modules`] in a well-formed stream.
    #[must_use]
    pub fn all_module_files(&self) -> &[Vec<String>] {
        &self.files.modules
    }

    /// Returns the resolved file names of module `index`.
    #[must_use]
    pub fn module_files(&self, index: usize) -> Option<&[String]> {
        self.files.modules.get(index).map(Vec::as_slice)
    }

    /// Returns every resolved file name, module by module; duplicates are preserved.
    #[must_use]
    pub fn files(&self) -> &[String] {
        &self.files.files
    }

    /// Returns every distinct file name, in order of first appearance.
    #[must_use]
    pub fn unique_files(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.files
            .files
            .iter()
            .map(String::as_str)
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Returns the number of out-of-bounds name indices met during resolution.
    #[must_use]
    pub fn skipped_names(&self) -> usize {
        self.files.skipped_names
    }

    /// Returns the number of entries of module `index` that did not resolve to a name.
    #[must_use]
    pub fn skipped_for_module(&self, index: usize) -> Option<usize> {
        self.files.skipped_per_module.get(index).copied()
    }

    /// Returns the stream numbers of the optional debug streams.
    #[must_use]
    pub fn debug_streams(&self) -> &DebugSubstreamIndex {
        &self.debug_streams
    }

    /// Returns the diagnostics collected while decoding.
    #[must_use]
    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test::DbiStreamBuilder, Error};

    #[test]
    fn single_file_stream() {
        let data = DbiStreamBuilder::new()
            .file_info(&[0], &[1], &[0], b"a.c\0")
            .build();

        let dbi = DbiStream::parse(&data).unwrap();

        assert!(dbi.modules().is_empty());
        assert_eq!(dbi.all_module_files(), &[vec!["a.c".to_string()]]);
        assert_eq!(dbi.files(), &["a.c".to_string()]);
        assert_eq!(dbi.debug_streams().streams, [-1; 11]);
        assert!(!dbi.diagnostics().has_any());
    }

    #[test]
    fn modules_and_files() {
        let data = DbiStreamBuilder::new()
            .module("a.obj", "")
            .module("b.obj", "lib.lib")
            .section_contributions(16)
            .section_map(8)
            .file_info(&[0, 2], &[2, 2], &[0, 4, 0, 8], b"a.c\0a.h\0b.c\0")
            .type_server_map(4)
            .ec_info(12)
            .debug_stream(DebugStream::SectionHeader, 9)
            .machine(Machine::I386)
            .build();

        let dbi = DbiStream::parse(&data).unwrap();

        assert_eq!(dbi.header().machine, Machine::I386);
        assert_eq!(dbi.modules()[0].symbols_stream(), Some(10));
        assert_eq!(dbi.modules()[1].section.offset, 0x1000);

        assert_eq!(dbi.modules().len(), 2);
        assert_eq!(dbi.modules()[1].object_name, "lib.lib");
        assert_eq!(dbi.module_files(0).unwrap(), ["a.c", "a.h"]);
        assert_eq!(dbi.module_files(1).unwrap(), ["a.c", "b.c"]);
        assert!(dbi.module_files(2).is_none());
        assert_eq!(dbi.files(), ["a.c", "a.h", "a.c", "b.c"]);
        assert_eq!(dbi.unique_files(), vec!["a.c", "a.h", "b.c"]);
        assert_eq!(dbi.debug_streams().get(DebugStream::SectionHeader), Some(9));
        assert_eq!(dbi.module_by_name("b.obj").map(|(i, _)| i), Some(1));
        assert!(dbi.module_by_name("c.obj").is_none());
        assert_eq!(dbi.skipped_names(), 0);
    }

    #[test]
    fn module_region_consumed_exactly() {
        let data = DbiStreamBuilder::new()
            .module("abc.obj", "x")
            .module("d.obj", "")
            .build();

        let header = StreamHeader::read(&data).unwrap();
        let region =
            &data[StreamHeader::SIZE..StreamHeader::SIZE + header.module_list_size as usize];

        let mut iter = ModuleIter::new(region, MODULE_RECORD_ALIGNMENT).unwrap();
        assert_eq!(iter.by_ref().count(), 2);
        assert_eq!(iter.consumed(), header.module_list_size as usize);
    }

    #[test]
    fn bad_signature() {
        let mut data = DbiStreamBuilder::new().build();
        data[3] = 0x00;

        assert!(matches!(
            DbiStream::parse(&data),
            Err(Error::MalformedHeader {
                signature: [0xFF, 0xFF, 0xFF, 0x00]
            })
        ));
    }

    #[test]
    fn truncation_in_each_region() {
        let builder = DbiStreamBuilder::new()
            .module("a.obj", "")
            .section_contributions(8)
            .section_map(8)
            .file_info(&[0], &[1], &[0], b"a.c\0")
            .type_server_map(8)
            .ec_info(8);
        let data = builder.build();
        let offsets = builder.region_offsets();
        assert_eq!(data.len(), offsets.end);
        assert!(DbiStream::parse(&data).is_ok());

        let cases = [
            (offsets.modules + 1, "module records"),
            (offsets.section_contributions + 1, "section contributions"),
            (offsets.section_map + 1, "section map"),
            (offsets.file_info + 1, "file info module count"),
            (offsets.type_server_map + 1, "type server map"),
            (offsets.ec_info + 1, "edit and continue info"),
            (offsets.debug_header + 1, "debug header"),
        ];

        for (length, expected) in cases {
            match DbiStream::parse(&data[..length]) {
                Err(Error::TruncatedStream { what, .. }) => assert_eq!(what, expected),
                Err(other) => panic!("Unexpected error at {length} - {other}"),
                Ok(_) => panic!("Parse of {length} bytes should fail"),
            }
        }
    }

    #[test]
    fn malformed_name_table_is_tolerated() {
        let data = DbiStreamBuilder::new()
            .file_info(&[0, 3], &[3, 1], &[0, 4], b"a.c\0b.c\0")
            .build();

        let diagnostics = Arc::new(Diagnostics::new());
        let dbi = DbiStream::parse_with(
            Cursor::new(&data),
            ParseOptions::default(),
            Arc::clone(&diagnostics),
        )
        .unwrap();

        assert_eq!(dbi.module_files(0).unwrap(), ["a.c", "b.c"]);
        assert!(dbi.module_files(1).unwrap().is_empty());
        assert_eq!(dbi.skipped_names(), 2);
        assert_eq!(dbi.skipped_for_module(0), Some(1));
        assert_eq!(dbi.skipped_for_module(1), Some(1));
        assert!(Arc::ptr_eq(dbi.diagnostics(), &diagnostics));
        assert_eq!(diagnostics.by_category(DiagnosticCategory::FileInfo).len(), 3);
    }

    #[test]
    fn trailing_module_bytes_reported() {
        let data = DbiStreamBuilder::new()
            .module("a.obj", "")
            .module_padding(12)
            .build();

        let dbi = DbiStream::parse(&data).unwrap();

        assert_eq!(dbi.modules().len(), 1);
        assert_eq!(
            dbi.diagnostics()
                .by_category(DiagnosticCategory::Modules)
                .len(),
            1
        );
    }

    #[test]
    fn unusual_debug_header_size() {
        let data = DbiStreamBuilder::new().debug_header_size(0).build();

        let dbi = DbiStream::parse(&data).unwrap();

        assert_eq!(dbi.header().debug_header_size, 0);
        assert_eq!(
            dbi.diagnostics()
                .by_category(DiagnosticCategory::DebugHeader)
                .len(),
            1
        );
    }

    #[test]
    fn unusual_header_fields_reported() {
        let mut data = DbiStreamBuilder::new().build();
        assert!(!DbiStream::parse(&data).unwrap().diagnostics().has_any());

        data[4..8].copy_from_slice(&20_240_101_u32.to_le_bytes());
        data[60..64].copy_from_slice(&7_u32.to_le_bytes());

        let dbi = DbiStream::parse(&data).unwrap();
        let header = dbi.diagnostics().by_category(DiagnosticCategory::Header);

        assert_eq!(dbi.header().header_version(), HeaderVersion::Other(20_240_101));
        assert_eq!(header.len(), 2);
        assert_eq!(header[0].offset, Some(4));
        assert_eq!(header[1].offset, Some(60));
        assert!(!dbi.diagnostics().has_warnings());
    }

    #[test]
    fn zero_alignment_rejected() {
        let data = DbiStreamBuilder::new().build();
        let options = ParseOptions {
            alignment: 0,
            ..ParseOptions::default()
        };

        assert!(matches!(
            DbiStream::parse_with(
                Cursor::new(&data),
                options,
                Arc::new(Diagnostics::new())
            ),
            Err(Error::Error(_))
        ));
    }

    #[test]
    fn from_mem() {
        let data = DbiStreamBuilder::new().module("m.obj", "").build();
        let dbi = DbiStream::from_mem(data).unwrap();
        assert_eq!(dbi.modules()[0].module_name, "m.obj");

        assert!(matches!(DbiStream::from_mem(Vec::new()), Err(Error::Empty)));
    }
}
