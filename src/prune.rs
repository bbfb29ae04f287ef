//! Structural simplification of the data tree.
//!
//! Pruning removes empty leaves, then collapses interior levels that exist
//! structurally but carry no discriminating information, so the tree's
//! effective depth matches what the renderer actually requires.

use crate::tree::DataTree;

/// Remove empty leaves and collapse non-discriminating interior levels.
///
/// Level collapse is skipped when the renderer wants all available depth
/// (negative required levels). The first and last level are never
/// candidates. A level with a single distinct label is collapsed only when
/// every prefix one level above shows exactly that one child key; if the
/// label coexists with siblings at any prefix, the level is discriminating
/// somewhere and is kept.
pub fn prune(tree: &mut DataTree, renderer_nlevels: i32) {
    tree.remove_empty_leaves();

    if renderer_nlevels < 0 {
        return;
    }

    let levels = tree.paths();
    let nlevels = levels.len();
    if nlevels < 3 {
        return;
    }

    let mut to_collapse = Vec::new();
    for level in 1..nlevels - 1 {
        if levels[level].len() != 1 {
            continue;
        }
        let label = &levels[level][0];
        let keep = tree.prefixes(level).iter().any(|prefix| {
            match tree.get(prefix) {
                Some(node) => {
                    let labels = node.labels();
                    labels.len() > 1 || labels.first().copied() != Some(label.as_str())
                }
                None => false,
            }
        });
        if !keep {
            to_collapse.push((level, label.clone()));
        }
    }

    // Deepest first, so level indices stay valid during removal.
    for (level, label) in to_collapse.into_iter().rev() {
        tracing::debug!(level, label = %label, "pruning level from data tree");
        tree.remove_level(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_redundant_middle_level_is_collapsed() {
        let mut tree = DataTree::new();
        tree.set_leaf(&["t1", "only", "x"], json!(1));
        tree.set_leaf(&["t2", "only", "y"], json!(2));

        prune(&mut tree, 1);

        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.get_leaf(&["t1", "x"]), Some(&json!(1)));
        assert_eq!(tree.get_leaf(&["t2", "y"]), Some(&json!(2)));
    }

    #[test]
    fn test_level_with_siblings_somewhere_is_kept() {
        // "only" is the single distinct label at depth 1, but at t2 it
        // coexists with a sibling, so the level is discriminating.
        let mut tree = DataTree::new();
        tree.set_leaf(&["t1", "only", "x"], json!(1));
        tree.set_leaf(&["t2", "only", "x"], json!(2));
        tree.set_leaf(&["t2", "other", "x"], json!(3));

        let before = tree.clone();
        prune(&mut tree, 1);
        assert_eq!(tree, before);
    }

    #[test]
    fn test_first_and_last_levels_are_never_collapsed() {
        let mut tree = DataTree::new();
        tree.set_leaf(&["single", "a", "x"], json!(1));
        tree.set_leaf(&["single", "b", "x"], json!(2));

        prune(&mut tree, 1);

        // Depth 0 has one label and depth 2 has one label; neither is
        // an interior level.
        assert_eq!(tree.depth(), 3);
    }

    #[test]
    fn test_negative_renderer_levels_skips_collapse_but_not_empty_leaves() {
        let mut tree = DataTree::new();
        tree.set_leaf(&["t1", "only", "x"], json!(1));
        tree.set_leaf(&["t2", "only", "y"], json!(2));
        tree.set_leaf(&["t3", "only", "z"], json!(null));

        prune(&mut tree, -1);

        assert_eq!(tree.depth(), 3);
        assert!(tree.get(&["t3"]).is_none());
    }

    #[test]
    fn test_multiple_redundant_levels_collapse_deepest_first() {
        let mut tree = DataTree::new();
        tree.set_leaf(&["t1", "mid", "inner", "x"], json!(1));
        tree.set_leaf(&["t2", "mid", "inner", "y"], json!(2));

        prune(&mut tree, 1);

        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.get_leaf(&["t1", "x"]), Some(&json!(1)));
        assert_eq!(tree.get_leaf(&["t2", "y"]), Some(&json!(2)));
    }

    #[test]
    fn test_empty_leaves_removed_before_level_analysis() {
        let mut tree = DataTree::new();
        tree.set_leaf(&["t1", "only", "x"], json!(1));
        tree.set_leaf(&["t2", "only", "y"], json!(2));
        // An empty leaf under a second depth-1 label; once removed, "only"
        // is the single label left and the level collapses.
        tree.set_leaf(&["t1", "ghost"], json!(null));

        prune(&mut tree, 1);

        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.get_leaf(&["t1", "x"]), Some(&json!(1)));
    }
}
