//! Error taxonomy for the overlay engine.
//!
//! Decoding problems (`Format`, `Truncated`) and a missing raster disable the
//! overlay and let the host generate an unmodified world. `IncompatibleWorld`
//! is the one fatal case: callers must stop the process instead of continuing.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, registering or driving the overlay.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// Bad magic, wrong header size, invalid dimensions or layer mismatch.
    #[error("invalid raster format: {0}")]
    Format(String),

    /// The file ended before a declared field could be read.
    #[error("raster truncated while reading {field}")]
    Truncated { field: String },

    /// No raster file could be found in any search location.
    #[error("raster not found (searched {searched:?})")]
    MissingResource { searched: Vec<PathBuf> },

    /// An existing world lacks the compatibility flag required to overlay it.
    #[error("world was not created for this overlay (missing save flag '{flag}')")]
    IncompatibleWorld { flag: String },

    /// A prerequisite for pipeline registration is absent.
    #[error("pipeline registration aborted: {0}")]
    Registration(String),

    /// The caller of an operator command lacks the required privilege.
    #[error("permission denied: '{command}' requires the '{privilege}' privilege")]
    PermissionDenied { command: String, privilege: String },

    /// The host failed to materialize a requested area.
    #[error("host generation failed: {0}")]
    Host(String),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OverlayError {
    /// Whether this error forbids continuing at all.
    ///
    /// Only a world that was never created for the overlay is fatal: writing
    /// into it would silently corrupt terrain that already exists on disk.
    pub fn is_fatal(&self) -> bool {
        matches!(self, OverlayError::IncompatibleWorld { .. })
    }

    pub(crate) fn truncated(field: impl Into<String>) -> Self {
        OverlayError::Truncated { field: field.into() }
    }
}

pub type Result<T> = std::result::Result<T, OverlayError>;
