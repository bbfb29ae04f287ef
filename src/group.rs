//! Grouping modes and group-level computation.
//!
//! Grouping reinterprets the tree's level ordering and decides the depth at
//! which the render stage fans out: a non-negative group level *g* means
//! one renderer call per distinct path over depths `0..=g`; -1 means one
//! call on the whole tree.

use crate::tree::DataTree;
use serde::{Deserialize, Serialize};

/// Grouping mode for the render fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    /// Group at exactly the renderer's required depth.
    None,
    /// Group by the first, outermost dimension.
    Track,
    /// Bring the second dimension to the front and group by it.
    #[default]
    Slice,
    /// Render the whole tree in one call.
    All,
}

impl GroupBy {
    /// Parse a mode string. Unrecognized modes degrade to grouping
    /// everything together.
    pub fn parse(value: &str) -> Self {
        match value {
            "none" => GroupBy::None,
            "track" => GroupBy::Track,
            "slice" => GroupBy::Slice,
            "all" => GroupBy::All,
            other => {
                tracing::debug!(mode = other, "unrecognized groupby mode - grouping everything");
                GroupBy::All
            }
        }
    }
}

impl std::fmt::Display for GroupBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupBy::None => write!(f, "none"),
            GroupBy::Track => write!(f, "track"),
            GroupBy::Slice => write!(f, "slice"),
            GroupBy::All => write!(f, "all"),
        }
    }
}

/// Rearrange the tree for grouping and return the group level.
pub fn group(tree: &mut DataTree, groupby: GroupBy, renderer_nlevels: i32) -> i32 {
    let nlevels = tree.depth();

    match groupby {
        GroupBy::None => renderer_nlevels,

        GroupBy::Track => {
            // No spare outer level to group by: duplicate the top level so
            // grouping by track keeps all data.
            if nlevels as i32 == renderer_nlevels {
                duplicate_outer_level(tree);
            }
            0
        }

        GroupBy::Slice => {
            if nlevels <= 2 {
                tracing::warn!(
                    nlevels,
                    "grouping by slice with too few levels in data tree - all are grouped"
                );
                -1
            } else {
                tree.swop(0, 1);
                0
            }
        }

        GroupBy::All => -1,
    }
}

/// Wrap every top-level entry in a singleton branch carrying its own label,
/// so each top label appears as both the new outer and inner label.
fn duplicate_outer_level(tree: &mut DataTree) {
    let taken = std::mem::take(tree);
    let DataTree::Branch(entries) = taken else {
        *tree = taken;
        return;
    };
    let mut wrapped = DataTree::new();
    for (label, child) in entries {
        wrapped.insert(&[label.as_str(), label.as_str()], child);
    }
    *tree = wrapped;
}
