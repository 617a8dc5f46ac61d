// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pecha.

use thiserror::Error;

/// Top-level error type for all Pecha operations.
#[derive(Debug, Error)]
pub enum PechaError {
    // -- Resource errors --
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("text content not found for {0}")]
    TextNotFound(String),

    #[error("malformed property {predicate} on {resource}: {detail}")]
    MalformedProperty {
        resource: String,
        predicate: String,
        detail: String,
    },

    #[error("unsupported resource {id}: {reason}")]
    UnsupportedResource { id: String, reason: String },

    // -- Pagination errors --
    #[error("malformed page table for {etext}: {detail}")]
    MalformedPageTable { etext: String, detail: String },

    #[error("inconsistent page table: {0}")]
    InconsistentPageTable(String),

    // -- Output errors --
    #[error("document converter unavailable: {0}")]
    ConverterUnavailable(String),

    #[error("document conversion failed: {0}")]
    Conversion(String),

    #[error("cover generation failed: {0}")]
    CoverError(String),

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PechaError {
    /// Whether the unit that raised this error can still produce a
    /// structurally valid document.
    ///
    /// Recoverable conditions degrade the output (a skipped part, an
    /// unpaginated volume, a missing EPUB) but never abort the unit.
    /// Everything else aborts only the unit being processed, never the batch.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::MalformedProperty { .. }
            | Self::MalformedPageTable { .. }
            | Self::InconsistentPageTable(_)
            | Self::ConverterUnavailable(_)
            | Self::Conversion(_)
            | Self::CoverError(_) => true,

            Self::ResourceNotFound(_)
            | Self::TextNotFound(_)
            | Self::UnsupportedResource { .. }
            | Self::Config(_)
            | Self::Io(_)
            | Self::Serialization(_) => false,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PechaError>;
