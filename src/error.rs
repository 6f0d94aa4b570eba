//! Error types and exit-code mapping for pyrepr.
//!
//! Module-level failures abort the whole run with a single diagnostic and a
//! non-zero exit code. Per-class conditions (no constructor, ineligible
//! constructor) are not errors; the driver skips those classes locally.
//!
//! ## Exit Code Mapping
//!
//! - `2`: invalid arguments (reserved for the CLI shell)
//! - `3`: resolution errors (module not found, failed to load)
//! - `4`: apply errors (failed to persist the rewrite)
//! - `5`: the module is not syntactically usable
//! - `1`: no representation could be generated

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for the generation pipeline.
///
/// Each variant carries enough context to produce one user-facing
/// diagnostic line. Callers match exhaustively; none of these escape as
/// panics.
#[derive(Debug, Error)]
pub enum ReprError {
    /// The module path does not resolve to a loadable file.
    #[error("error: file '{path}' not found")]
    ModuleNotFound { path: PathBuf },

    /// The file exists but could not be read as UTF-8 text.
    #[error("error: could not load '{path}': {source}")]
    ModuleLoadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The module text is not structurally valid Python.
    #[error("error: could not parse '{path}' (line {line}): {message}")]
    ModuleSyntaxInvalid {
        path: PathBuf,
        line: u32,
        message: String,
    },

    /// Every class was skipped; zero representation methods were produced.
    #[error("error: no __repr__ could be generated for '{path}'")]
    NoRepresentations { path: PathBuf },

    /// Apply mode could not persist the rewritten module.
    #[error("error: could not write '{path}': {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReprError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ReprError::ModuleNotFound { .. } => 3,
            ReprError::ModuleLoadFailure { .. } => 3,
            ReprError::ModuleSyntaxInvalid { .. } => 5,
            ReprError::NoRepresentations { .. } => 1,
            ReprError::WriteFailure { .. } => 4,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
