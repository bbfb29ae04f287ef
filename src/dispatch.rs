//! Dispatch orchestration.
//!
//! The dispatcher owns one data source, one renderer and zero or more
//! transformers, and runs the pipeline strictly in order: parse arguments →
//! collect → transform → prune → group → render. Each stage's failure is
//! converted into a single error block tagged with the stage name, so a
//! dispatch call never fails from its caller's point of view.

use crate::cache::{CachePolicy, CacheStore, MemoryStore};
use crate::collect::Collector;
use crate::error::{DispatchError, Result, Stage};
use crate::filter::IncludeFilter;
use crate::group::{group, GroupBy};
use crate::prune::prune;
use crate::render::{error_result, render_tree, Renderer, ResultBlocks};
use crate::source::{DataSource, Dimensions};
use crate::transform::{apply_transformers, Transformer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Configuration surface for one dispatch invocation. All fields are
/// optional with the defaults noted on each.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchOptions {
    /// Grouping mode, default `slice`.
    pub groupby: GroupBy,
    /// Cache bypass flag, default off.
    pub nocache: bool,
    /// Include filter for the outer dimension: exact labels or `r(regex)`
    /// entries.
    pub tracks: Option<Vec<String>>,
    /// Include filter for the second dimension, same syntax.
    pub slices: Option<Vec<String>>,
    /// Column selection applied to object payloads.
    pub columns: Option<Vec<String>>,
    /// Opaque source-specific option bag, forwarded verbatim.
    pub options: Option<Value>,
}

impl DispatchOptions {
    /// Build options from string-keyed directive arguments. List values are
    /// comma-separated; `nocache` is a bare flag; unknown keys are ignored.
    pub fn from_args<'a, I>(args: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut opts = Self::default();
        for (key, value) in args {
            match key {
                "groupby" => opts.groupby = GroupBy::parse(value.trim()),
                "nocache" => opts.nocache = true,
                "tracks" => opts.tracks = Some(split_list(value)),
                "slices" => opts.slices = Some(split_list(value)),
                "columns" => opts.columns = Some(split_list(value)),
                "options" => opts.options = Some(Value::String(value.to_string())),
                other => {
                    tracing::debug!(key = other, "ignoring unknown dispatch option");
                }
            }
        }
        opts
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim().to_string())
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Options after the parsing stage: filters compiled, cache policy fixed.
struct ParsedOptions {
    groupby: GroupBy,
    policy: CachePolicy,
    track_filter: Option<IncludeFilter>,
    slice_filter: Option<IncludeFilter>,
}

/// Orchestrator owning the pipeline collaborators.
pub struct Dispatcher {
    source: Box<dyn DataSource>,
    renderer: Box<dyn Renderer>,
    transformers: Vec<Box<dyn Transformer>>,
    store: Box<dyn CacheStore>,
}

impl Dispatcher {
    /// New dispatcher with an ephemeral in-memory cache.
    pub fn new(source: Box<dyn DataSource>, renderer: Box<dyn Renderer>) -> Self {
        tracing::debug!(
            source = source.name(),
            renderer = renderer.name(),
            "starting dispatcher"
        );
        Self {
            source,
            renderer,
            transformers: Vec::new(),
            store: Box::new(MemoryStore::new()),
        }
    }

    /// Attach a persistent cache store, scoped per data source by the
    /// hosting application. Honored only when the source declares itself
    /// cacheable; other sources keep the ephemeral store.
    pub fn with_store(mut self, store: Box<dyn CacheStore>) -> Self {
        if self.source.cacheable() {
            self.store = store;
        }
        self
    }

    /// Register a transformer. Transformers run in registration order.
    pub fn add_transformer(mut self, transformer: Box<dyn Transformer>) -> Self {
        self.transformers.push(transformer);
        self
    }

    /// Run the full pipeline. Never fails: a stage error comes back as a
    /// result collection containing a single error block tagged with the
    /// stage name.
    pub fn dispatch(&mut self, options: &DispatchOptions) -> ResultBlocks {
        match self.run(options) {
            Ok(results) => results,
            Err((stage, err)) => {
                tracing::warn!(stage = %stage, "{}", err.diagnostic());
                error_result(stage, &err)
            }
        }
    }

    fn run(
        &mut self,
        options: &DispatchOptions,
    ) -> std::result::Result<ResultBlocks, (Stage, DispatchError)> {
        // Dimensionality is resolved exactly once per invocation.
        let dimensions = self.source.dimensions();

        let parsed = self
            .parse(options, &dimensions)
            .map_err(|err| (Stage::Parsing, err))?;

        let mut collector = Collector::new(
            self.source.as_ref(),
            self.store.as_mut(),
            parsed.policy,
            options.options.as_ref(),
            options.columns.as_deref(),
        );
        let tree = collector
            .collect(
                &dimensions,
                parsed.track_filter.as_ref(),
                parsed.slice_filter.as_ref(),
            )
            .map_err(|err| (Stage::Collection, err))?;
        tracing::debug!(paths = ?tree.paths(), "after collection");

        let mut tree = apply_transformers(tree, &self.transformers)
            .map_err(|err| (Stage::Transformation, err))?;
        tracing::debug!(paths = ?tree.paths(), "after transformation");

        prune(&mut tree, self.renderer.nlevels());
        tracing::debug!(paths = ?tree.paths(), "after pruning");

        let group_level = group(&mut tree, parsed.groupby, self.renderer.nlevels());
        tracing::debug!(group_level, paths = ?tree.paths(), "after grouping");

        render_tree(&tree, self.renderer.as_ref(), group_level)
            .map_err(|err| (Stage::Rendering, err))
    }

    /// Parsing stage: compile filters and validate them against the
    /// source's declared dimensionality.
    fn parse(&self, options: &DispatchOptions, dimensions: &Dimensions) -> Result<ParsedOptions> {
        let track_filter = options
            .tracks
            .as_deref()
            .map(IncludeFilter::parse)
            .transpose()?;
        let slice_filter = options
            .slices
            .as_deref()
            .map(IncludeFilter::parse)
            .transpose()?;

        if slice_filter.is_some() && dimensions.len() < 2 {
            return Err(DispatchError::Config(format!(
                "slice filtering requested for source '{}' without slices",
                self.source.name()
            )));
        }

        Ok(ParsedOptions {
            groupby: options.groupby,
            policy: CachePolicy {
                bypass: options.nocache,
                has_options: options.options.is_some(),
            },
            track_filter,
            slice_filter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_args() {
        let opts = DispatchOptions::from_args([
            ("groupby", "track"),
            ("tracks", "t1, t3"),
            ("nocache", ""),
            ("unknown", "ignored"),
        ]);

        assert_eq!(opts.groupby, GroupBy::Track);
        assert!(opts.nocache);
        assert_eq!(
            opts.tracks,
            Some(vec!["t1".to_string(), "t3".to_string()])
        );
        assert!(opts.slices.is_none());
    }

    #[test]
    fn test_defaults() {
        let opts = DispatchOptions::default();
        assert_eq!(opts.groupby, GroupBy::Slice);
        assert!(!opts.nocache);
        assert!(opts.options.is_none());
    }

    #[test]
    fn test_options_deserialize_from_json() {
        let opts: DispatchOptions = serde_json::from_str(
            r#"{"groupby": "none", "tracks": ["t1"], "options": {"bins": 10}}"#,
        )
        .unwrap();

        assert_eq!(opts.groupby, GroupBy::None);
        assert_eq!(opts.tracks, Some(vec!["t1".to_string()]));
        assert_eq!(opts.options, Some(serde_json::json!({"bins": 10})));
    }
}
