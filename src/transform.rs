//! Transform stage.
//!
//! Transformers rewrite subtrees. Each one declares how many trailing
//! nesting levels it operates on (`nlevels`) and is visited with every path
//! formed from the levels above those: the subtree rooted at the path is
//! handed in, and the returned subtree replaces it. A transformer whose
//! declared levels cover the whole tree replaces the root outright.

use crate::error::{DispatchError, Result};
use crate::tree::{path_to_key, DataTree};
use itertools::Itertools;

/// External collaborator rewriting a subtree.
pub trait Transformer {
    /// Name used for logging.
    fn name(&self) -> &str;

    /// Number of trailing nesting levels this transformer consumes. The
    /// transformer must not assume any particular depth beyond these.
    fn nlevels(&self) -> usize;

    /// New subtree for the work rooted at `path`. `Ok(None)` drops the
    /// branch; this is non-fatal and logged as a warning.
    fn transform(&self, subtree: DataTree, path: &[String]) -> anyhow::Result<Option<DataTree>>;
}

/// Apply every registered transformer, in order, to the whole tree.
pub fn apply_transformers(
    mut tree: DataTree,
    transformers: &[Box<dyn Transformer>],
) -> Result<DataTree> {
    for transformer in transformers {
        tree = apply_one(tree, transformer.as_ref())?;
    }
    Ok(tree)
}

fn apply_one(mut tree: DataTree, transformer: &dyn Transformer) -> Result<DataTree> {
    let levels = tree.paths();
    tracing::debug!(
        transformer = transformer.name(),
        nlevels = levels.len(),
        "transform started"
    );

    if levels.len() < transformer.nlevels() {
        return Err(DispatchError::Transform {
            name: transformer.name().to_string(),
            message: format!(
                "expected at least {} levels - got {}",
                transformer.nlevels(),
                levels.len()
            ),
        });
    }

    let upper = levels.len() - transformer.nlevels();
    let visit: Vec<Vec<String>> = if upper == 0 {
        vec![Vec::new()]
    } else {
        levels[..upper]
            .iter()
            .map(|labels| labels.iter())
            .multi_cartesian_product()
            .map(|path| path.into_iter().cloned().collect())
            .collect()
    };

    for path in visit {
        let Some(work) = tree.get(&path) else {
            continue;
        };
        if work.is_empty() {
            continue;
        }
        let work = work.clone();
        let new_data = transformer.transform(work, &path).map_err(|err| {
            DispatchError::Transform {
                name: transformer.name().to_string(),
                message: format!("{err:#}"),
            }
        })?;
        match new_data {
            // An empty path replaces the tree root.
            Some(subtree) => tree.insert(&path, subtree),
            None => {
                tracing::warn!(
                    transformer = transformer.name(),
                    path = %path_to_key(&path),
                    "no data - removing branch"
                );
                tree.remove_leaf(&path);
            }
        }
    }

    tracing::debug!(
        transformer = transformer.name(),
        nlevels = tree.paths().len(),
        "transform finished"
    );
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // Leaf transformer: zero trailing levels, visited once per leaf path.
    struct Doubler;

    impl Transformer for Doubler {
        fn name(&self) -> &str {
            "doubler"
        }
        fn nlevels(&self) -> usize {
            0
        }
        fn transform(
            &self,
            subtree: DataTree,
            _path: &[String],
        ) -> anyhow::Result<Option<DataTree>> {
            let DataTree::Leaf(value) = subtree else {
                anyhow::bail!("expected a leaf");
            };
            let doubled = value.as_i64().map(|v| v * 2).unwrap_or(0);
            Ok(Some(DataTree::leaf(json!(doubled))))
        }
    }

    // One trailing level: receives the branch holding the leaves and
    // aggregates over its entries.
    struct SliceSum;

    impl Transformer for SliceSum {
        fn name(&self) -> &str {
            "slice-sum"
        }
        fn nlevels(&self) -> usize {
            1
        }
        fn transform(
            &self,
            subtree: DataTree,
            _path: &[String],
        ) -> anyhow::Result<Option<DataTree>> {
            let DataTree::Branch(entries) = subtree else {
                anyhow::bail!("expected a branch");
            };
            let mut total = 0;
            for (_, child) in &entries {
                let DataTree::Leaf(value) = child else {
                    anyhow::bail!("expected a leaf entry");
                };
                total += value.as_i64().unwrap_or(0);
            }
            Ok(Some(DataTree::leaf(json!(total))))
        }
    }

    struct AlwaysFails;

    impl Transformer for AlwaysFails {
        fn name(&self) -> &str {
            "always-fails"
        }
        fn nlevels(&self) -> usize {
            1
        }
        fn transform(
            &self,
            _subtree: DataTree,
            _path: &[String],
        ) -> anyhow::Result<Option<DataTree>> {
            anyhow::bail!("cannot transform")
        }
    }

    struct DropTrack(String);

    impl Transformer for DropTrack {
        fn name(&self) -> &str {
            "drop-track"
        }
        fn nlevels(&self) -> usize {
            1
        }
        fn transform(
            &self,
            subtree: DataTree,
            path: &[String],
        ) -> anyhow::Result<Option<DataTree>> {
            if path.first() == Some(&self.0) {
                Ok(None)
            } else {
                Ok(Some(subtree))
            }
        }
    }

    struct Collapse;

    impl Transformer for Collapse {
        fn name(&self) -> &str {
            "collapse"
        }
        fn nlevels(&self) -> usize {
            2
        }
        fn transform(
            &self,
            _subtree: DataTree,
            _path: &[String],
        ) -> anyhow::Result<Option<DataTree>> {
            let mut replacement = DataTree::new();
            replacement.set_leaf(&["summary"], json!({"n": 4}));
            Ok(Some(replacement))
        }
    }

    fn sample_tree() -> DataTree {
        let mut tree = DataTree::new();
        tree.set_leaf(&["t1", "s1"], json!(1));
        tree.set_leaf(&["t1", "s2"], json!(2));
        tree.set_leaf(&["t2", "s1"], json!(3));
        tree.set_leaf(&["t2", "s2"], json!(4));
        tree
    }

    #[test]
    fn test_leaf_transformer_rewrites_every_leaf() {
        let tree = apply_transformers(sample_tree(), &[Box::new(Doubler)]).unwrap();

        assert_eq!(tree.get_leaf(&["t1", "s1"]), Some(&json!(2)));
        assert_eq!(tree.get_leaf(&["t2", "s2"]), Some(&json!(8)));
    }

    #[test]
    fn test_one_level_transformer_receives_branch() {
        // A transformer declaring one trailing level is visited per track
        // and handed the branch holding that track's slices.
        let tree = apply_transformers(sample_tree(), &[Box::new(SliceSum)]).unwrap();

        assert_eq!(tree.get_leaf(&["t1"]), Some(&json!(3)));
        assert_eq!(tree.get_leaf(&["t2"]), Some(&json!(7)));
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_transformer_drops_branch_on_none() {
        let tree =
            apply_transformers(sample_tree(), &[Box::new(DropTrack("t1".to_string()))]).unwrap();

        assert!(tree.get(&["t1", "s1"]).is_none());
        assert_eq!(tree.get_leaf(&["t2", "s1"]), Some(&json!(3)));
    }

    #[test]
    fn test_transformer_covering_whole_tree_replaces_root() {
        let tree = apply_transformers(sample_tree(), &[Box::new(Collapse)]).unwrap();

        assert_eq!(tree.get_leaf(&["summary"]), Some(&json!({"n": 4})));
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_tree_shallower_than_nlevels_is_error() {
        let mut tree = DataTree::new();
        tree.set_leaf(&["only"], json!(1));

        let err = apply_transformers(tree, &[Box::new(Collapse)]).unwrap_err();
        assert!(matches!(err, DispatchError::Transform { .. }));
    }

    #[test]
    fn test_transformer_error_aborts_stage() {
        let err = apply_transformers(sample_tree(), &[Box::new(AlwaysFails)]).unwrap_err();

        match err {
            DispatchError::Transform { name, message } => {
                assert_eq!(name, "always-fails");
                assert!(message.contains("cannot transform"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_transformers_apply_in_order() {
        let tree = apply_transformers(
            sample_tree(),
            &[Box::new(DropTrack("t2".to_string())), Box::new(Doubler)],
        )
        .unwrap();

        assert!(tree.get(&["t2"]).is_none());
        assert_eq!(tree.get_leaf(&["t1", "s1"]), Some(&json!(2)));
    }
}
