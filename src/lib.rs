//! # datatree-rs: path-indexed data tree dispatch pipeline
//!
//! A small, general engine for gathering data points indexed by an arbitrary
//! number of orthogonal dimensions (e.g. "track", "slice"), assembling them
//! into a hierarchical tree keyed by ordered label sequences, then
//! progressively transforming, pruning and grouping that tree before handing
//! slices of it to a consuming renderer with a fixed depth contract.
//!
//! ## Architecture
//!
//! Data flows strictly top-down through the pipeline stages; there is no
//! feedback loop:
//!
//! ```text
//! [DataSource] ──► collect ──► transform ──► prune ──► group ──► render
//!       ▲              │                                            │
//!       └── [Cache] ───┘                              [Renderer] ◄──┘
//! ```
//!
//! - **Collect**: cartesian product of the source's declared dimensions,
//!   one cached source call per path, results stored as tree leaves.
//! - **Transform**: registered transformers rewrite subtrees in order.
//! - **Prune**: empty leaves and non-discriminating levels are removed.
//! - **Group**: the level ordering is adjusted and the fan-out depth fixed.
//! - **Render**: one renderer call per group path (or one call overall),
//!   producing opaque result blocks.
//!
//! Everything downstream of the tree engine (plotting, image files,
//! documentation-build integration) lives behind the [`DataSource`],
//! [`Transformer`] and [`Renderer`] contracts.
//!
//! ## Example
//!
//! ```ignore
//! use datatree_rs::{DispatchOptions, Dispatcher};
//!
//! let mut dispatcher = Dispatcher::new(Box::new(source), Box::new(renderer))
//!     .with_store(Box::new(store))
//!     .add_transformer(Box::new(transformer));
//!
//! // Never fails: stage errors come back as error blocks.
//! let results = dispatcher.dispatch(&DispatchOptions::default());
//! for block in results.iter() {
//!     println!("{}\n{}", block.title, block.text);
//! }
//! ```

pub mod cache;
pub mod collect;
pub mod dispatch;
pub mod error;
pub mod filter;
pub mod group;
pub mod prune;
pub mod render;
pub mod source;
pub mod transform;
pub mod tree;

// Re-export commonly used types
pub use cache::{CachePolicy, CacheStore, MemoryStore};
pub use collect::Collector;
pub use dispatch::{DispatchOptions, Dispatcher};
pub use error::{DispatchError, Result, Stage};
pub use filter::IncludeFilter;
pub use group::GroupBy;
pub use render::{Renderer, ResultBlock, ResultBlocks, TitleMode};
pub use source::{DataSource, Dimensions};
pub use transform::Transformer;
pub use tree::{path_to_key, DataTree};
