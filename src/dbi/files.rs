//! The file-info region and the name-table resolver.
//!
//! The file-info region maps every module to the source files that contributed to it. It is
//! stored as four flat tables followed by a blob of null-terminated names:
//!
//! | Field           | Type            | Count             |
//! |-----------------|-----------------|-------------------|
//! | module count    | `u16`           | 1                 |
//! | reference count | `u16`           | 1                 |
//! | module starts   | `u16`           | module count      |
//! | reference counts| `u16`           | module count      |
//! | name offsets    | `u32`           | reference count   |
//! | names           | bytes           | rest of region    |
//!
//! Module `i` owns the name offsets `starts[i] .. starts[i] + counts[i]`; each offset points
//! into the name blob. Linkers writing more than 65535 references overflow the 16-bit counts,
//! so indices past the end of the offset table are expected on large programs. Those entries
//! are skipped and reported, never treated as fatal.

use std::io::{Read, Seek};

use crate::{
    dbi::{
        Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics, ParseOptions,
        MAX_REPORTED_NAME_ANOMALIES,
    },
    file::reader::StreamReader,
    Result,
};

/// The two counts at the start of the file-info region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileIndexSummary {
    /// Number of modules described by the region
    pub module_count: u16,
    /// Number of entries in the name offset table
    pub reference_count: u16,
}

impl FileIndexSummary {
    /// Encoded size in bytes.
    pub const SIZE: usize = 4;
}

/// The raw tables of the file-info region.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileInfo {
    /// Module and reference counts
    pub summary: FileIndexSummary,
    /// First name offset index of each module
    pub module_starts: Vec<u16>,
    /// Number of name offsets owned by each module
    pub reference_counts: Vec<u16>,
    /// Offsets of the file names within [`FileInfo::names`]
    pub name_offsets: Vec<u32>,
    /// Null-terminated file names
    pub names: Vec<u8>,
}

impl FileInfo {
    /// Decode the file-info region starting at the reader's position.
    ///
    /// `size` is the region size declared in the stream header. The four tables are fixed reads
    /// and must be complete; the name blob is whatever lies between the end of the tables and
    /// the declared end of the region. When the two disagree the declared size wins, the blob is
    /// shortened or empty, and a diagnostic is reported. The reader never moves backwards.
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedStream`] if the stream ends inside the tables.
    pub fn read_from<R: Read + Seek>(
        reader: &mut StreamReader<R>,
        size: u32,
        diagnostics: &Diagnostics,
    ) -> Result<FileInfo> {
        let start = reader.pos();
        let end = start + u64::from(size);

        if end > reader.len() {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticSeverity::Warning,
                    DiagnosticCategory::FileInfo,
                    format!(
                        "File info region of {} bytes extends {} bytes past the end of the stream",
                        size,
                        end - reader.len()
                    ),
                )
                .with_offset(start),
            );
        }

        let summary = FileIndexSummary {
            module_count: reader.read_le::<u16>("file info module count")?,
            reference_count: reader.read_le::<u16>("file info reference count")?,
        };

        let module_starts =
            reader.read_array_le::<u16>(summary.module_count.into(), "file info module starts")?;
        let reference_counts = reader
            .read_array_le::<u16>(summary.module_count.into(), "file info reference counts")?;
        let name_offsets =
            reader.read_array_le::<u32>(summary.reference_count.into(), "file info name offsets")?;

        if reader.pos() > end {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticSeverity::Warning,
                    DiagnosticCategory::FileInfo,
                    format!(
                        "File info tables overrun the declared region of {} bytes by {} bytes",
                        size,
                        reader.pos() - end
                    ),
                )
                .with_offset(start),
            );
        }

        let names = reader.read_until(end)?;

        tracing::trace!(
            modules = summary.module_count,
            references = summary.reference_count,
            names = names.len(),
            "read file info"
        );

        Ok(FileInfo {
            summary,
            module_starts,
            reference_counts,
            name_offsets,
            names,
        })
    }

    /// Decode the file name at `offset` within the name blob.
    ///
    /// A name running to the end of the blob without a terminator is returned as-is. Returns
    /// `None` if `offset` lies outside the blob.
    #[must_use]
    pub fn name_at(&self, offset: u32) -> Option<String> {
        let rest = self.names.get(usize::try_from(offset).ok()?..)?;
        if rest.is_empty() {
            return None;
        }

        let length = rest.iter().position(|&byte| byte == 0).unwrap_or(rest.len());
        Some(String::from_utf8_lossy(&rest[..length]).into_owned())
    }

    /// Resolve every module's file names.
    ///
    /// Never fails. Entries whose index lies past the end of the offset table are skipped and
    /// counted across the whole pass; once that count exceeds
    /// [`ParseOptions::max_skipped_names`], the rest of the current module's entries are
    /// dropped and resolution moves on to the next module. Entries whose offset lies outside
    /// the name blob are skipped for their module but do not count toward that limit.
    ///
    /// The first [`MAX_REPORTED_NAME_ANOMALIES`] anomalies are reported individually. A single
    /// summary entry at the end of the pass carries the totals, including the anomalies that
    /// were not reported on their own.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dbiscope::dbi::{Diagnostics, FileIndexSummary, FileInfo, ParseOptions};
    ///
    /// let info = FileInfo {
    ///     summary: FileIndexSummary { module_count: 2, reference_count: 2 },
    ///     module_starts: vec![0, 1],
    ///     reference_counts: vec![1, 2],
    ///     name_offsets: vec![0, 4],
    ///     names: b"a.c\0b.h\0".to_vec(),
    /// };
    ///
    /// let files = info.resolve(&ParseOptions::default(), &Diagnostics::new());
    /// assert_eq!(files.modules, vec![vec!["a.c"], vec!["b.h"]]);
    /// assert_eq!(files.skipped_per_module, vec![0, 1]);
    /// assert_eq!(files.skipped_names, 1);
    /// ```
    pub fn resolve(&self, options: &ParseOptions, diagnostics: &Diagnostics) -> ModuleFiles {
        let mut resolved = ModuleFiles::default();
        let mut reports = AnomalyReports::default();
        let mut outside_blob = 0_usize;

        for (module, (&start, &count)) in self
            .module_starts
            .iter()
            .zip(self.reference_counts.iter())
            .enumerate()
        {
            let count = usize::from(count);
            let mut names = Vec::with_capacity(count);
            let mut skipped = 0_usize;

            for (position, index) in (usize::from(start)..usize::from(start) + count).enumerate()
            {
                let Some(&offset) = self.name_offsets.get(index) else {
                    resolved.skipped_names += 1;
                    skipped += 1;
                    reports.push(diagnostics, || {
                        Diagnostic::new(
                            DiagnosticSeverity::Warning,
                            DiagnosticCategory::FileInfo,
                            format!(
                                "Name index {} out of bounds for a table of {} entries",
                                index,
                                self.name_offsets.len()
                            ),
                        )
                        .with_module(module)
                    });

                    if resolved.skipped_names > options.max_skipped_names {
                        let abandoned = count - position - 1;
                        skipped += abandoned;
                        reports.push(diagnostics, || {
                            Diagnostic::new(
                                DiagnosticSeverity::Warning,
                                DiagnosticCategory::FileInfo,
                                format!(
                                    "More than {} name indices skipped, abandoning {} remaining entries",
                                    options.max_skipped_names, abandoned
                                ),
                            )
                            .with_module(module)
                        });
                        break;
                    }
                    continue;
                };

                match self.name_at(offset) {
                    Some(name) => {
                        resolved.files.push(name.clone());
                        names.push(name);
                    }
                    None => {
                        skipped += 1;
                        outside_blob += 1;
                        reports.push(diagnostics, || {
                            Diagnostic::new(
                                DiagnosticSeverity::Warning,
                                DiagnosticCategory::FileInfo,
                                format!(
                                    "Name offset 0x{:x} outside the {} byte name blob",
                                    offset,
                                    self.names.len()
                                ),
                            )
                            .with_module(module)
                        });
                    }
                }
            }

            resolved.modules.push(names);
            resolved.skipped_per_module.push(skipped);
        }

        if resolved.skipped_names > 0 || outside_blob > 0 {
            diagnostics.info(
                DiagnosticCategory::FileInfo,
                format!(
                    "{} out of bounds name indices and {} name offsets outside the blob skipped, {} anomalies not reported individually",
                    resolved.skipped_names, outside_blob, reports.suppressed
                ),
            );
        }

        resolved
    }
}

/// Caps the anomalies a single resolution pass reports individually.
#[derive(Default)]
struct AnomalyReports {
    reported: usize,
    suppressed: usize,
}

impl AnomalyReports {
    /// Push the diagnostic built by `build`, or only count it once the cap is reached.
    fn push(&mut self, diagnostics: &Diagnostics, build: impl FnOnce() -> Diagnostic) {
        if self.reported < MAX_REPORTED_NAME_ANOMALIES {
            diagnostics.push(build());
            self.reported += 1;
        } else {
            self.suppressed += 1;
        }
    }
}

/// Resolved file names of every module.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleFiles {
    /// File names of each module, in reference order; duplicates are preserved
    pub modules: Vec<Vec<String>>,
    /// Every resolved name, module-major then reference order
    pub files: Vec<String>,
    /// Number of entries of each module that did not resolve to a name
    pub skipped_per_module: Vec<usize>,
    /// Number of out-of-bounds name indices met across all modules
    pub skipped_names: usize,
}
