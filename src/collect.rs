//! Cartesian-product data collection.
//!
//! The collector resolves a source's declared dimensionality, applies the
//! per-dimension include filters, computes the cartesian product of the
//! filtered label sequences (outer dimension varying slowest) and invokes
//! the source once per resulting path, storing payloads as tree leaves.
//! The cache layer sits between the collector and the source.

use crate::cache::{CachePolicy, CacheStore};
use crate::error::{DispatchError, Result};
use crate::filter::IncludeFilter;
use crate::source::{DataSource, Dimensions};
use crate::tree::{path_to_key, DataTree};
use itertools::Itertools;
use serde_json::Value;

/// One collection pass over a data source.
pub struct Collector<'a> {
    source: &'a dyn DataSource,
    store: &'a mut dyn CacheStore,
    policy: CachePolicy,
    options: Option<&'a Value>,
    columns: Option<&'a [String]>,
}

impl<'a> Collector<'a> {
    pub fn new(
        source: &'a dyn DataSource,
        store: &'a mut dyn CacheStore,
        policy: CachePolicy,
        options: Option<&'a Value>,
        columns: Option<&'a [String]>,
    ) -> Self {
        Self {
            source,
            store,
            policy,
            options,
            columns,
        }
    }

    /// Collect all data into a fresh tree.
    pub fn collect(
        &mut self,
        dimensions: &Dimensions,
        track_filter: Option<&IncludeFilter>,
        slice_filter: Option<&IncludeFilter>,
    ) -> Result<DataTree> {
        let dims = match dimensions {
            Dimensions::Zero => {
                let mut tree = DataTree::new();
                if let Some(payload) = self.fetch(&[])? {
                    tree.set_leaf(&["all"], payload);
                }
                tracing::debug!(
                    source = self.source.name(),
                    "collecting data finished for zero-dimension source"
                );
                return Ok(tree);
            }
            Dimensions::Declared(dims) => dims,
        };

        // Empty dimensions are dropped from the product.
        let mut dims: Vec<Vec<String>> = dims.iter().filter(|d| !d.is_empty()).cloned().collect();
        if dims.is_empty() {
            return Err(self.no_tracks(""));
        }

        if let Some(filter) = track_filter {
            dims[0] = filter.apply(&dims[0]);
        }
        if let Some(filter) = slice_filter {
            if dims.len() < 2 {
                return Err(DispatchError::Config(format!(
                    "slice filtering requested for source '{}' without slices",
                    self.source.name()
                )));
            }
            dims[1] = filter.apply(&dims[1]);
        }
        if dims[0].is_empty() {
            return Err(self.no_tracks(" after filtering"));
        }

        let paths: Vec<Vec<String>> = dims
            .iter()
            .map(|labels| labels.iter())
            .multi_cartesian_product()
            .map(|path| path.into_iter().cloned().collect())
            .collect();

        tracing::debug!(
            source = self.source.name(),
            npaths = paths.len(),
            "collecting data started"
        );

        let mut tree = DataTree::new();
        for path in &paths {
            // A "no data" payload is skipped, never inserted as an empty leaf.
            let Some(payload) = self.fetch(path)? else {
                continue;
            };
            tree.set_leaf(path, payload);
        }

        tracing::debug!(
            source = self.source.name(),
            npaths = paths.len(),
            "collecting data finished"
        );
        Ok(tree)
    }

    /// Payload for one path, going through the cache layer.
    fn fetch(&mut self, path: &[String]) -> Result<Option<Value>> {
        let key = path_to_key(path);

        if self.policy.reads() {
            if let Some(hit) = self.store.get(&key) {
                tracing::debug!(key = %key, "cache hit");
                return Ok(Some(self.select_columns(hit)));
            }
        }

        let payload = self
            .source
            .collect(path, self.options)
            .map_err(|cause| {
                let err = DispatchError::Source {
                    source: self.source.name().to_string(),
                    path: key.clone(),
                    cause,
                };
                tracing::warn!("{}", err.diagnostic());
                err
            })?;

        match payload {
            Some(payload) => {
                // Written through even under bypass; the store holds the
                // full payload, column selection applies on the way out.
                self.store.set(&key, payload.clone());
                Ok(Some(self.select_columns(payload)))
            }
            None => Ok(None),
        }
    }

    /// Restrict an object payload to the configured column list.
    fn select_columns(&self, payload: Value) -> Value {
        let Some(columns) = self.columns else {
            return payload;
        };
        match payload {
            Value::Object(map) => {
                let mut selected = serde_json::Map::new();
                for column in columns {
                    if let Some(value) = map.get(column) {
                        selected.insert(column.clone(), value.clone());
                    }
                }
                Value::Object(selected)
            }
            other => other,
        }
    }

    fn no_tracks(&self, detail: &str) -> DispatchError {
        tracing::warn!(
            source = self.source.name(),
            "no tracks found{} - no output",
            detail
        );
        DispatchError::NoTracks {
            name: self.source.name().to_string(),
            detail: detail.to_string(),
        }
    }
}
