//! Data source capability contract.
//!
//! A data source supplies raw leaf payloads per path. It declares its
//! dimensionality up front instead of being probed for alternately-named
//! attributes at runtime: either it is a plain zero-argument computation,
//! or it exposes one or more ordered dimensions (conventionally an outer
//! "tracks" dimension and an optional "slices" dimension). The declaration
//! is resolved exactly once per dispatch invocation.

use serde_json::Value;

/// Declared dimensionality of a data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dimensions {
    /// A plain callable: a single collect call with the empty path.
    Zero,
    /// Ordered per-dimension label sequences, outer-to-inner.
    Declared(Vec<Vec<String>>),
}

impl Dimensions {
    /// Convenience constructor for a tracks-only source.
    pub fn tracks<S: Into<String>>(tracks: Vec<S>) -> Self {
        Dimensions::Declared(vec![tracks.into_iter().map(Into::into).collect()])
    }

    /// Number of declared dimensions.
    pub fn len(&self) -> usize {
        match self {
            Dimensions::Zero => 0,
            Dimensions::Declared(dims) => dims.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// External collaborator supplying raw leaf payloads per path.
pub trait DataSource {
    /// Name used for logging and cache scoping.
    fn name(&self) -> &str;

    /// Dimensionality declaration, resolved once per dispatch.
    fn dimensions(&self) -> Dimensions;

    /// Payload for one path, with the labels passed outer-to-inner and the
    /// source-specific option bag forwarded verbatim. `Ok(None)` is the
    /// "no data" sentinel: the path is skipped, not stored.
    fn collect(&self, path: &[String], options: Option<&Value>) -> anyhow::Result<Option<Value>>;

    /// Whether results may be kept in a persistent store across dispatch
    /// invocations.
    fn cacheable(&self) -> bool {
        false
    }
}
