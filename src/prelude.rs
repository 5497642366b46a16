//! # dbiscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types from the dbiscope
//! library. Import this module to get quick access to everything needed for decoding a DBI
//! stream and inspecting the result.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dbiscope operations
pub use crate::Error;

/// The result type used throughout dbiscope
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Decoded DBI stream and its parse entry points
pub use crate::DbiStream;

/// Decoding configuration and anomaly reporting
pub use crate::dbi::{
    Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics, ParseOptions,
};

/// Low-level file parsing utilities
pub use crate::{File, Parser};

// ================================================================================================
// Stream Structures
// ================================================================================================

/// The stream header and its interpreted fields
pub use crate::dbi::{BuildNumber, HeaderFlags, HeaderVersion, Machine, StreamHeader};

/// Module records
pub use crate::dbi::{ModuleFlags, ModuleRecord, SymbolRange};

/// File info tables and resolved file names
pub use crate::dbi::{FileIndexSummary, FileInfo, ModuleFiles};

/// Optional debug stream numbers
pub use crate::dbi::{DebugStream, DebugSubstreamIndex};
