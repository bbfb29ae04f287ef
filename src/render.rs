//! Renderer contract, result blocks and the render fan-out.
//!
//! A renderer consumes a subtree of a declared required depth and produces
//! opaque result blocks. The render stage adapts the tree to the renderer's
//! contract: padding with singleton `"all"` levels when the tree is too
//! shallow, rendering once when grouping is off, or fanning out one call
//! per group path otherwise.

use crate::error::{DispatchError, Result, Stage};
use crate::tree::{path_to_key, DataTree};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// How [`ResultBlock::update_title`] combines titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleMode {
    Prefix,
    Suffix,
    Replace,
}

/// One opaque output block produced by a renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultBlock {
    pub title: String,
    pub text: String,
}

impl ResultBlock {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
        }
    }

    /// Placeholder block for empty results.
    pub fn empty(title: impl Into<String>) -> Self {
        Self::new(title, "no data")
    }

    /// Combine `title` with the current title, joining segments with `/`
    /// and collapsing consecutive duplicate segments.
    pub fn update_title(&mut self, title: &str, mode: TitleMode) {
        if self.title.is_empty() {
            self.title = title.to_string();
            return;
        }
        self.title = match mode {
            TitleMode::Prefix => format!("{}/{}", title, self.title),
            TitleMode::Suffix => format!("{}/{}", self.title, title),
            TitleMode::Replace => title.to_string(),
        };
        let mut parts: Vec<&str> = Vec::new();
        for part in self.title.split('/') {
            if parts.last() != Some(&part) {
                parts.push(part);
            }
        }
        self.title = parts.join("/");
    }
}

/// An ordered collection of result blocks with an optional title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultBlocks {
    pub title: Option<String>,
    blocks: Vec<ResultBlock>,
}

impl ResultBlocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            blocks: Vec::new(),
        }
    }

    pub fn from_block(block: ResultBlock) -> Self {
        Self {
            title: None,
            blocks: vec![block],
        }
    }

    pub fn push(&mut self, block: ResultBlock) {
        self.blocks.push(block);
    }

    pub fn extend(&mut self, other: ResultBlocks) {
        self.blocks.extend(other.blocks);
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultBlock> {
        self.blocks.iter()
    }
}

impl IntoIterator for ResultBlocks {
    type Item = ResultBlock;
    type IntoIter = std::vec::IntoIter<ResultBlock>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.into_iter()
    }
}

/// Single error block for a failed stage, tagged with the stage name.
pub fn error_result(stage: Stage, error: &DispatchError) -> ResultBlocks {
    ResultBlocks::from_block(ResultBlock::new(stage.to_string(), error.diagnostic()))
}

/// External collaborator converting a subtree into result blocks.
pub trait Renderer {
    /// Name used for logging.
    fn name(&self) -> &str;

    /// Required input depth. Non-positive means no requirement; a negative
    /// value additionally disables pruning and grouping ("wants everything").
    fn nlevels(&self) -> i32;

    fn render(&self, subtree: &DataTree, path: &[String]) -> anyhow::Result<ResultBlocks>;
}

/// Hand slices of the tree to the renderer per the group level.
pub fn render_tree(
    tree: &DataTree,
    renderer: &dyn Renderer,
    group_level: i32,
) -> Result<ResultBlocks> {
    let levels = tree.paths();
    let nlevels = levels.len() as i32;
    let required = renderer.nlevels();
    let mut results = ResultBlocks::with_title("main");

    tracing::debug!(
        renderer = renderer.name(),
        nlevels,
        required,
        group_level,
        "rendering started"
    );

    if nlevels < required {
        // Pad with singleton wrapper levels to satisfy the contract.
        let mut padded = tree.clone();
        for _ in 0..(required - nlevels) {
            padded = DataTree::Branch(vec![("all".to_string(), padded)]);
        }
        let path = vec!["all".to_string()];
        let blocks = renderer.render(&padded, &path).map_err(|cause| {
            DispatchError::Render {
                name: renderer.name().to_string(),
                path: path_to_key(&path),
                cause,
            }
        })?;
        results.extend(blocks);
    } else if group_level < 0 || required <= 0 {
        let blocks = renderer
            .render(tree, &[])
            .map_err(|cause| DispatchError::Render {
                name: renderer.name().to_string(),
                path: path_to_key::<String>(&[]),
                cause,
            })?;
        results.extend(blocks);
    } else {
        let take = ((group_level + 1) as usize).min(levels.len());
        let group_paths = levels[..take]
            .iter()
            .map(|labels| labels.iter())
            .multi_cartesian_product();
        for path in group_paths {
            let path: Vec<String> = path.into_iter().cloned().collect();
            let Some(work) = tree.get(&path) else {
                continue;
            };
            if work.is_empty() {
                continue;
            }
            match renderer.render(work, &path) {
                Ok(blocks) => results.extend(blocks),
                // Per-path failures become inline error blocks; siblings
                // still render.
                Err(cause) => {
                    let err = DispatchError::Render {
                        name: renderer.name().to_string(),
                        path: path_to_key(&path),
                        cause,
                    };
                    tracing::warn!("{}", err.diagnostic());
                    results.extend(error_result(Stage::Rendering, &err));
                }
            }
        }
    }

    if results.is_empty() {
        tracing::warn!(renderer = renderer.name(), "renderer returned no data");
        return Err(DispatchError::NoData(renderer.name().to_string()));
    }

    tracing::debug!(blocks = results.len(), "rendering finished");
    Ok(results)
}
