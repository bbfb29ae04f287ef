//! Error handling for the dispatch pipeline
//!
//! This module defines the stage taxonomy, the typed error enum and a
//! Result alias used throughout the crate. Fatal errors are converted to
//! per-stage error blocks at the dispatcher boundary and never propagate
//! to the dispatch caller.

use thiserror::Error;

/// Pipeline stage names, used to tag error blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Argument validation and filter compilation.
    Parsing,
    /// Data collection from the data source.
    Collection,
    /// Subtree transformation.
    Transformation,
    /// Empty-leaf removal and level collapse.
    Pruning,
    /// Level reordering and group-level computation.
    Grouping,
    /// Renderer fan-out.
    Rendering,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Parsing => write!(f, "parsing"),
            Stage::Collection => write!(f, "collection"),
            Stage::Transformation => write!(f, "transformation"),
            Stage::Pruning => write!(f, "pruning"),
            Stage::Grouping => write!(f, "grouping"),
            Stage::Rendering => write!(f, "rendering"),
        }
    }
}

/// Main error type for pipeline operations
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Malformed configuration: bad filter syntax, slice filter without a
    /// slice dimension.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The source exposed no tracks, or filtering removed all of them.
    #[error("No tracks found from source '{name}'{detail}")]
    NoTracks { name: String, detail: String },

    /// The render stage produced zero result blocks.
    #[error("Renderer '{0}' returned no output")]
    NoData(String),

    /// A data-source call failed during collection.
    #[error("Source '{source}' failed for path '{path}': {cause}")]
    Source {
        source: String,
        path: String,
        #[source]
        cause: anyhow::Error,
    },

    /// A transformer failed, or the tree is shallower than its declared levels.
    #[error("Transformer '{name}' failed: {message}")]
    Transform { name: String, message: String },

    /// A whole-tree render call failed (per-path failures are non-fatal).
    #[error("Renderer '{name}' failed for path '{path}': {cause}")]
    Render {
        name: String,
        path: String,
        #[source]
        cause: anyhow::Error,
    },
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, DispatchError>;

impl DispatchError {
    /// Full diagnostic text for an error block: the display chain of this
    /// error and every underlying cause.
    pub fn diagnostic(&self) -> String {
        let mut out = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            out.push_str("\n  caused by: ");
            out.push_str(&err.to_string());
            cause = err.source();
        }
        out
    }
}
