//! Diagnostics collection for DBI stream decoding.
//!
//! Decoding a DBI stream is all-or-nothing for structural failures, but the file-info region is
//! deliberately tolerant: name indices that point outside their table, names that point outside
//! the blob, and size disagreements between the header and the data are absorbed and decoding
//! continues. This module provides the sink those anomalies are reported to.
//!
//! Every entry pushed into a [`Diagnostics`] container is also emitted as a `tracing` event at
//! the matching level, so an application that installs a subscriber sees anomalies without
//! having to inspect the container.
//!
//! # Key Components
//!
//! - [`Diagnostics`] - Thread-safe container for diagnostic entries
//! - [`Diagnostic`] - Individual diagnostic entry with severity and context
//! - [`DiagnosticSeverity`] - Severity level (Info, Warning)
//! - [`DiagnosticCategory`] - Region of the stream the diagnostic refers to
//!
//! # Usage Examples
//!
//! ```rust
//! use dbiscope::dbi::{DiagnosticCategory, Diagnostics, ParseOptions};
//! use dbiscope::DbiStream;
//! use std::io::Cursor;
//! use std::sync::Arc;
//!
//! let diagnostics = Arc::new(Diagnostics::new());
//! diagnostics.info(DiagnosticCategory::General, "decoding dbi stream of foo.pdb");
//!
//! let result = DbiStream::parse_with(
//!     Cursor::new(vec![0xFF; 4]),
//!     ParseOptions::default(),
//!     Arc::clone(&diagnostics),
//! );
//! assert!(result.is_err());
//!
//! for entry in diagnostics.iter() {
//!     println!("{entry}");
//! }
//! ```
//!
//! # Thread Safety
//!
//! The container uses `boxcar::Vec` internally, which provides lock-free concurrent append
//! operations. A single `Arc<Diagnostics>` may be shared by several parses running on different
//! threads.

use std::fmt::{self, Write};

/// Severity level of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticSeverity {
    /// Informational message, not indicating a problem.
    ///
    /// Used for unusual but valid constructs, such as an optional debug header of unexpected size.
    Info,

    /// Part of the stream could not be used as declared.
    ///
    /// The result is still produced, but some file names may be missing.
    Warning,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Info => write!(f, "INFO"),
            DiagnosticSeverity::Warning => write!(f, "WARN"),
        }
    }
}

/// Region of the DBI stream a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    /// The fixed 64-byte stream header.
    ///
    /// Examples: an unknown format version, a non-zero reserved field.
    Header,

    /// The module-record region.
    ///
    /// Examples: trailing bytes that do not form a complete record.
    Modules,

    /// The file-info region and its name tables.
    ///
    /// Examples: out-of-bounds name indices, name offsets outside the blob, size mismatches.
    FileInfo,

    /// The optional debug header at the end of the stream.
    DebugHeader,

    /// Anything not tied to a specific region.
    General,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Header => write!(f, "Header"),
            DiagnosticCategory::Modules => write!(f, "Modules"),
            DiagnosticCategory::FileInfo => write!(f, "FileInfo"),
            DiagnosticCategory::DebugHeader => write!(f, "DebugHeader"),
            DiagnosticCategory::General => write!(f, "General"),
        }
    }
}

/// A single diagnostic entry with context information.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level of this diagnostic.
    pub severity: DiagnosticSeverity,

    /// Region of the stream this diagnostic refers to.
    pub category: DiagnosticCategory,

    /// Human-readable description of the issue.
    pub message: String,

    /// Optional offset, relative to the start of the DBI stream.
    pub offset: Option<u64>,

    /// Optional index of the module the issue belongs to.
    pub module: Option<usize>,
}

impl Diagnostic {
    /// Creates a new diagnostic entry.
    ///
    /// # Arguments
    ///
    /// * `severity` - Severity level of the diagnostic
    /// * `category` - Stream region the diagnostic refers to
    /// * `message` - Human-readable description
    pub fn new(
        severity: DiagnosticSeverity,
        category: DiagnosticCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            offset: None,
            module: None,
        }
    }

    /// Adds stream offset information to the diagnostic.
    #[must_use]
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Adds the index of the affected module.
    #[must_use]
    pub fn with_module(mut self, module: usize) -> Self {
        self.module = Some(module);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)?;

        if let Some(offset) = self.offset {
            write!(f, " (offset: 0x{:08x})", offset)?;
        }

        if let Some(module) = self.module {
            write!(f, " (module: {})", module)?;
        }

        Ok(())
    }
}

/// Thread-safe container for collecting diagnostic entries.
///
/// # Example
///
/// ```rust
/// use dbiscope::dbi::{DiagnosticCategory, Diagnostics};
///
/// let diagnostics = Diagnostics::new();
/// diagnostics.warning(DiagnosticCategory::FileInfo, "name index 7 out of bounds");
///
/// assert!(diagnostics.has_warnings());
/// assert_eq!(diagnostics.by_category(DiagnosticCategory::FileInfo).len(), 1);
/// ```
#[derive(Debug)]
pub struct Diagnostics {
    entries: boxcar::Vec<Diagnostic>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    /// Creates a new empty diagnostics container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: boxcar::Vec::new(),
        }
    }

    /// Adds an informational diagnostic.
    pub fn info(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(DiagnosticSeverity::Info, category, message));
    }

    /// Adds a warning diagnostic.
    pub fn warning(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(
            DiagnosticSeverity::Warning,
            category,
            message,
        ));
    }

    /// Adds a diagnostic entry directly and forwards it to `tracing`.
    ///
    /// Use this for diagnostics that carry an offset or module index.
    pub fn push(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            DiagnosticSeverity::Info => tracing::info!(
                category = %diagnostic.category,
                offset = diagnostic.offset,
                module = diagnostic.module,
                "{}",
                diagnostic.message
            ),
            DiagnosticSeverity::Warning => tracing::warn!(
                category = %diagnostic.category,
                offset = diagnostic.offset,
                module = diagnostic.module,
                "{}",
                diagnostic.message
            ),
        }

        self.entries.push(diagnostic);
    }

    /// Returns true if any diagnostics have been collected.
    pub fn has_any(&self) -> bool {
        self.entries.count() > 0
    }

    /// Returns true if any warning-level diagnostics have been collected.
    pub fn has_warnings(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, d)| d.severity == DiagnosticSeverity::Warning)
    }

    /// Returns the total number of diagnostics.
    pub fn count(&self) -> usize {
        self.entries.count()
    }

    /// Returns the number of diagnostics with the given severity.
    pub fn count_of(&self, severity: DiagnosticSeverity) -> usize {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == severity)
            .count()
    }

    /// Returns an iterator over all diagnostics, in the order they were reported.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().map(|(_, d)| d)
    }

    /// Returns all warnings as a vector.
    pub fn warnings(&self) -> Vec<&Diagnostic> {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == DiagnosticSeverity::Warning)
            .map(|(_, d)| d)
            .collect()
    }

    /// Returns diagnostics filtered by category.
    pub fn by_category(&self, category: DiagnosticCategory) -> Vec<&Diagnostic> {
        self.entries
            .iter()
            .filter(|(_, d)| d.category == category)
            .map(|(_, d)| d)
            .collect()
    }

    /// Returns diagnostics reported against a specific module.
    pub fn by_module(&self, module: usize) -> Vec<&Diagnostic> {
        self.entries
            .iter()
            .filter(|(_, d)| d.module == Some(module))
            .map(|(_, d)| d)
            .collect()
    }

    /// Formats a summary of all diagnostics for display.
    pub fn summary(&self) -> String {
        let mut output = String::new();

        let warning_count = self.count_of(DiagnosticSeverity::Warning);
        let info_count = self.count_of(DiagnosticSeverity::Info);

        let _ = writeln!(
            output,
            "Diagnostics: {} warning(s), {} info(s)",
            warning_count, info_count
        );

        if warning_count > 0 {
            let _ = writeln!(output, "\n{}:", DiagnosticSeverity::Warning);
            for diag in self.warnings() {
                let _ = writeln!(output, "  {diag}");
            }
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}
