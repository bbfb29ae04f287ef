//! Path-indexed data tree.
//!
//! A `DataTree` is an ordered, nested mapping from string labels to either a
//! nested tree or a leaf payload. A path of length *k* reaches a value at
//! nesting depth *k*. Insertion order at every level is preserved because it
//! determines rendering order downstream.
//!
//! ```text
//! track1
//! +-- slice1 -> {mean: 1.0}
//! +-- slice2 -> {mean: 2.0}
//! track2
//! +-- slice1 -> {mean: 3.0}
//! ```
//!
//! Trees need not be balanced: different branches may expose different child
//! label sets. Level computation ([`DataTree::paths`]) walks the whole tree
//! and unions the labels seen at each depth in first-seen order.

use serde_json::Value;

/// Canonical string form of a path, used as a cache key.
///
/// The empty path (a zero-dimension source) maps to the sentinel `"all"`.
pub fn path_to_key<S: AsRef<str>>(path: &[S]) -> String {
    if path.is_empty() {
        "all".to_string()
    } else {
        path.iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// An ordered, nested label-keyed tree with opaque leaf payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum DataTree {
    /// Interior node: ordered label -> subtree entries.
    Branch(Vec<(String, DataTree)>),
    /// Terminal payload. Opaque to the tree engine.
    Leaf(Value),
}

impl Default for DataTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DataTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        DataTree::Branch(Vec::new())
    }

    /// Create a leaf node.
    pub fn leaf(value: Value) -> Self {
        DataTree::Leaf(value)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, DataTree::Leaf(_))
    }

    /// True for empty branches and for leaves with an empty payload
    /// (`null`, `{}` or `[]`).
    pub fn is_empty(&self) -> bool {
        match self {
            DataTree::Branch(entries) => entries.is_empty(),
            DataTree::Leaf(value) => match value {
                Value::Null => true,
                Value::Object(map) => map.is_empty(),
                Value::Array(items) => items.is_empty(),
                _ => false,
            },
        }
    }

    /// Number of entries at the top level.
    pub fn len(&self) -> usize {
        match self {
            DataTree::Branch(entries) => entries.len(),
            DataTree::Leaf(_) => 0,
        }
    }

    /// Immediate child by label. Leaves have no children.
    pub fn child(&self, label: &str) -> Option<&DataTree> {
        match self {
            DataTree::Branch(entries) => entries
                .iter()
                .find(|(key, _)| key.as_str() == label)
                .map(|(_, node)| node),
            DataTree::Leaf(_) => None,
        }
    }

    fn child_mut(&mut self, label: &str) -> Option<&mut DataTree> {
        match self {
            DataTree::Branch(entries) => entries
                .iter_mut()
                .find(|(key, _)| key.as_str() == label)
                .map(|(_, node)| node),
            DataTree::Leaf(_) => None,
        }
    }

    /// Ordered labels of the immediate children.
    pub fn labels(&self) -> Vec<&str> {
        match self {
            DataTree::Branch(entries) => entries.iter().map(|(key, _)| key.as_str()).collect(),
            DataTree::Leaf(_) => Vec::new(),
        }
    }

    fn entries_mut(&mut self) -> &mut Vec<(String, DataTree)> {
        // A leaf in an intermediate position is overwritten by a branch.
        if matches!(self, DataTree::Leaf(_)) {
            *self = DataTree::Branch(Vec::new());
        }
        match self {
            DataTree::Branch(entries) => entries,
            DataTree::Leaf(_) => unreachable!(),
        }
    }

    /// Child by label, created as an empty branch if missing.
    fn child_entry(&mut self, label: &str) -> &mut DataTree {
        let entries = self.entries_mut();
        let idx = match entries.iter().position(|(key, _)| key.as_str() == label) {
            Some(idx) => idx,
            None => {
                entries.push((label.to_string(), DataTree::Branch(Vec::new())));
                entries.len() - 1
            }
        };
        &mut entries[idx].1
    }

    /// Place `node` at `path`, creating intermediate branches as needed.
    /// New keys are appended, preserving insertion order. An empty path
    /// replaces the whole tree.
    pub fn insert<S: AsRef<str>>(&mut self, path: &[S], node: DataTree) {
        let Some((last, rest)) = path.split_last() else {
            *self = node;
            return;
        };
        let mut cursor = self;
        for label in rest {
            cursor = cursor.child_entry(label.as_ref());
        }
        let entries = cursor.entries_mut();
        match entries.iter_mut().find(|(key, _)| key.as_str() == last.as_ref()) {
            Some(slot) => slot.1 = node,
            None => entries.push((last.as_ref().to_string(), node)),
        }
    }

    /// Store a leaf payload at `path`.
    pub fn set_leaf<S: AsRef<str>>(&mut self, path: &[S], value: Value) {
        self.insert(path, DataTree::Leaf(value));
    }

    /// Subtree at `path`. Absence is a normal outcome, never an error.
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<&DataTree> {
        let mut cursor = self;
        for label in path {
            cursor = cursor.child(label.as_ref())?;
        }
        Some(cursor)
    }

    /// Leaf payload at `path`, if the path reaches a leaf.
    pub fn get_leaf<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        match self.get(path)? {
            DataTree::Leaf(value) => Some(value),
            DataTree::Branch(_) => None,
        }
    }

    /// Remove the entry at `path`. Missing paths are a no-op; the empty
    /// path clears the whole tree.
    pub fn remove_leaf<S: AsRef<str>>(&mut self, path: &[S]) {
        let Some((last, rest)) = path.split_last() else {
            *self = DataTree::new();
            return;
        };
        let mut cursor = self;
        for label in rest {
            match cursor.child_mut(label.as_ref()) {
                Some(child) => cursor = child,
                None => return,
            }
        }
        if let DataTree::Branch(entries) = cursor {
            entries.retain(|(key, _)| key.as_str() != last.as_ref());
        }
    }

    /// Distinct labels per nesting depth, outer-to-inner, in first-seen
    /// order. Ragged branches contribute a first-seen union per depth.
    pub fn paths(&self) -> Vec<Vec<String>> {
        let mut levels: Vec<Vec<String>> = Vec::new();
        self.collect_levels(0, &mut levels);
        levels
    }

    fn collect_levels(&self, depth: usize, levels: &mut Vec<Vec<String>>) {
        let DataTree::Branch(entries) = self else {
            return;
        };
        if entries.is_empty() {
            return;
        }
        if levels.len() <= depth {
            levels.push(Vec::new());
        }
        for (label, child) in entries {
            if !levels[depth].contains(label) {
                levels[depth].push(label.clone());
            }
            child.collect_levels(depth + 1, levels);
        }
    }

    /// Number of nesting depths.
    pub fn depth(&self) -> usize {
        self.paths().len()
    }

    /// All root paths of exactly `level` labels that reach a branch,
    /// in tree order. Used by the pruner to inspect the nodes one level
    /// above a candidate level.
    pub fn prefixes(&self, level: usize) -> Vec<Vec<String>> {
        let mut out = Vec::new();
        let mut current = Vec::new();
        self.collect_prefixes(level, &mut current, &mut out);
        out
    }

    fn collect_prefixes(
        &self,
        remaining: usize,
        current: &mut Vec<String>,
        out: &mut Vec<Vec<String>>,
    ) {
        if remaining == 0 {
            if matches!(self, DataTree::Branch(_)) {
                out.push(current.clone());
            }
            return;
        }
        let DataTree::Branch(entries) = self else {
            return;
        };
        for (label, child) in entries {
            current.push(label.clone());
            child.collect_prefixes(remaining - 1, current, out);
            current.pop();
        }
    }

    /// Ordered enumeration of all (path, payload) leaves.
    pub fn leaf_paths(&self) -> Vec<(Vec<String>, Value)> {
        let mut out = Vec::new();
        let mut current = Vec::new();
        self.collect_leaves(&mut current, &mut out);
        out
    }

    fn collect_leaves(&self, current: &mut Vec<String>, out: &mut Vec<(Vec<String>, Value)>) {
        match self {
            DataTree::Leaf(value) => out.push((current.clone(), value.clone())),
            DataTree::Branch(entries) => {
                for (label, child) in entries {
                    current.push(label.clone());
                    child.collect_leaves(current, out);
                    current.pop();
                }
            }
        }
    }

    /// Collapse nesting depth `level` tree-wide, re-parenting that depth's
    /// children directly under the level above. Paths too short to carry
    /// the level are kept unchanged.
    pub fn remove_level(&mut self, level: usize) {
        let mut rebuilt = DataTree::new();
        for (mut path, value) in self.leaf_paths() {
            if path.len() > level {
                path.remove(level);
            }
            rebuilt.set_leaf(&path, value);
        }
        *self = rebuilt;
    }

    /// Transpose nesting depths `i` and `j` tree-wide, preserving leaves.
    /// Paths too short to carry both depths are kept unchanged.
    pub fn swop(&mut self, i: usize, j: usize) {
        let deepest = i.max(j);
        let mut rebuilt = DataTree::new();
        for (mut path, value) in self.leaf_paths() {
            if path.len() > deepest {
                path.swap(i, j);
            }
            rebuilt.set_leaf(&path, value);
        }
        *self = rebuilt;
    }

    /// Strip leaves with an empty payload, removing now-empty parent
    /// branches transitively.
    pub fn remove_empty_leaves(&mut self) {
        if let DataTree::Branch(entries) = self {
            for (_, child) in entries.iter_mut() {
                child.remove_empty_leaves();
            }
            entries.retain(|(_, child)| !child.is_empty());
        }
    }
}
