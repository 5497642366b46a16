//! Configuration for DBI stream decoding
//!
//! The decoder has two knobs: the soft limit on out-of-bounds name indices before the resolver
//! gives up on a module's remaining entries, and the alignment applied between module records.

/// Number of out-of-bounds name indices tolerated before the resolver abandons the remaining
/// entries of the module it is working on.
pub const DEFAULT_MAX_SKIPPED_NAMES: usize = 10;

/// Alignment, in bytes, of consecutive records in the module-record region.
pub const MODULE_RECORD_ALIGNMENT: usize = 4;

/// Number of name-table anomalies reported individually per resolution pass.
///
/// Anomalies past this limit are only counted, in the summary entry the resolver adds at the
/// end of the pass.
pub const MAX_REPORTED_NAME_ANOMALIES: usize = 10;

/// Configuration for decoding a DBI stream.
///
/// # Examples
///
/// ```rust
/// use dbiscope::dbi::ParseOptions;
///
/// let options = ParseOptions {
///     max_skipped_names: 100,
///     ..ParseOptions::default()
/// };
/// assert_eq!(options.alignment, 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Circuit-breaker threshold for the name-table resolver (default: 10)
    ///
    /// The count of skipped indices is global across the whole resolution pass. Once it exceeds
    /// this value, the rest of the current module's entries are dropped; the next module is
    /// still attempted.
    pub max_skipped_names: usize,

    /// Alignment of module records within the module-record region (default: 4)
    ///
    /// Must be non-zero.
    pub alignment: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_skipped_names: DEFAULT_MAX_SKIPPED_NAMES,
            alignment: MODULE_RECORD_ALIGNMENT,
        }
    }
}

impl ParseOptions {
    /// Options under which the circuit-breaker never trips
    ///
    /// Every in-range entry of every module is resolved, however many out-of-range ones are seen.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            max_skipped_names: usize::MAX,
            ..Self::default()
        }
    }

    /// Options under which the first out-of-range entry abandons the rest of its module
    #[must_use]
    pub fn strict() -> Self {
        Self {
            max_skipped_names: 0,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert_eq!(options.max_skipped_names, 10);
        assert_eq!(options.alignment, 4);
    }

    #[test]
    fn test_presets() {
        assert_eq!(ParseOptions::lenient().max_skipped_names, usize::MAX);
        assert_eq!(ParseOptions::strict().max_skipped_names, 0);
        assert_eq!(ParseOptions::strict().alignment, MODULE_RECORD_ALIGNMENT);
    }
}
