//! Per-dimension include filters.
//!
//! A filter is a list of entries applied to one dimension's label sequence.
//! A plain entry selects a label by exact string match, in filter-argument
//! order. An entry of the form `r(<pattern>)` (the pattern optionally
//! wrapped in one layer of quotes) compiles to a regular expression and
//! selects every label it matches with search semantics, in original label
//! order.

use crate::error::{DispatchError, Result};
use regex::Regex;

#[derive(Debug, Clone)]
enum FilterEntry {
    Exact(String),
    Pattern(Regex),
}

/// Compiled inclusion filter for one dimension.
#[derive(Debug, Clone)]
pub struct IncludeFilter {
    entries: Vec<FilterEntry>,
}

impl IncludeFilter {
    /// Compile filter entries. A malformed pattern inside `r(...)` is a
    /// configuration error; an entry that merely looks regex-like without
    /// the `r(...)` wrapper stays an exact match.
    pub fn parse(entries: &[String]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry = entry.trim();
            match entry
                .strip_prefix("r(")
                .and_then(|rest| rest.strip_suffix(')'))
            {
                Some(inner) => {
                    let pattern = strip_quotes(inner);
                    let regex = Regex::new(pattern).map_err(|err| {
                        DispatchError::Config(format!("invalid filter pattern '{entry}': {err}"))
                    })?;
                    compiled.push(FilterEntry::Pattern(regex));
                }
                None => compiled.push(FilterEntry::Exact(entry.to_string())),
            }
        }
        Ok(Self { entries: compiled })
    }

    /// Select from `labels`: exact entries contribute their match in
    /// filter-argument order, pattern entries contribute all matches in
    /// original label order.
    pub fn apply(&self, labels: &[String]) -> Vec<String> {
        let mut selected = Vec::new();
        for entry in &self.entries {
            match entry {
                FilterEntry::Exact(wanted) => {
                    if let Some(found) = labels.iter().find(|label| *label == wanted) {
                        selected.push(found.clone());
                    }
                }
                FilterEntry::Pattern(regex) => {
                    selected.extend(
                        labels
                            .iter()
                            .filter(|label| regex.is_match(label))
                            .cloned(),
                    );
                }
            }
        }
        selected
    }
}

/// Remove one layer of flanking quotes, single or double.
fn strip_quotes(s: &str) -> &str {
    let bytes = s.as_bytes();
    if s.len() >= 2 {
        let (first, last) = (bytes[0], bytes[s.len() - 1]);
        if (first == b'"' || first == b'\'') && (last == b'"' || last == b'\'') {
            return &s[1..s.len() - 1];
        }
    }
    s
}
