//! Recursive unwrapping of `TABLE_`/`ROW_` wrapped vendor JSON.
//!
//! NX-OS encodes every table in its JSON output as
//!
//! ```text
//! {"TABLE_<name>": {"ROW_<name>": [ {row}, {row}, ... ]}}
//! ```
//!
//! where a row may itself hold further `TABLE_` keys, and a single-row table
//! collapses the sequence into a bare mapping. [`normalize`] removes both
//! wrapper levels, stores the rows under the logical name, and lifts nested
//! sub-tables up into their parent row. [`strip_tags`] only renames keys.
//!
//! Both functions rebuild a new tree from an immutable walk of the input.

use super::{ROW_TAG, TABLE_TAG};
use crate::tree::{Node, Tree};

/// Normalize one command's decoded JSON response.
///
/// Scalars, sequences and untagged keys pass through unchanged.
pub fn normalize(node: &Tree) -> Tree {
    match node {
        Tree::Object(map) => Tree::Object(normalize_node(map)),
        other => other.clone(),
    }
}

/// Remove wrapper prefixes from every key, keeping the structure as is.
pub fn strip_tags(node: &Tree) -> Tree {
    match node {
        Tree::Object(map) => Tree::Object(
            map.iter()
                .map(|(key, value)| (logical_name(key).to_string(), strip_tags(value)))
                .collect(),
        ),
        Tree::Array(items) => Tree::Array(items.iter().map(strip_tags).collect()),
        other => other.clone(),
    }
}

/// Key with one leading `TABLE_` or `ROW_` tag removed.
pub fn logical_name(key: &str) -> &str {
    key.strip_prefix(TABLE_TAG)
        .or_else(|| key.strip_prefix(ROW_TAG))
        .unwrap_or(key)
}

/// Check if `key` carries the nested-table tag.
pub fn is_table_key(key: &str) -> bool {
    key.starts_with(TABLE_TAG)
}

fn normalize_node(map: &Node) -> Node {
    let mut result = Node::new();
    for (key, value) in map {
        match key.strip_prefix(TABLE_TAG) {
            Some(name) => {
                result.insert(name.to_string(), unwrap_table(value));
            }
            None => {
                result.insert(key.clone(), value.clone());
            }
        }
    }
    result
}

/// Content of a `TABLE_` value with the `ROW_` level removed.
fn unwrap_table(value: &Tree) -> Tree {
    match value {
        Tree::Object(map) => unwrap_row_holder(map),
        Tree::Array(items) => Tree::Array(items.iter().flat_map(unwrap_row_entry).collect()),
        other => other.clone(),
    }
}

/// `{"ROW_x": rows}` becomes `rows`, each row flattened.
///
/// A holder with several keys keeps its shape with tags stripped.
fn unwrap_row_holder(map: &Node) -> Tree {
    let mut entries = map.iter();
    match (entries.next(), entries.next()) {
        (None, _) => Tree::Object(Node::new()),
        (Some((_, rows)), None) => flatten_rows(rows),
        _ => Tree::Object(
            map.iter()
                .map(|(key, rows)| (logical_name(key).to_string(), flatten_rows(rows)))
                .collect(),
        ),
    }
}

/// One element of a table given directly as a sequence.
///
/// `{"ROW_x": row}` elements contribute their row content; anything else is
/// already a row and is flattened in place.
fn unwrap_row_entry(entry: &Tree) -> Vec<Tree> {
    match entry {
        Tree::Object(map) if !map.is_empty() && map.keys().all(|k| k.starts_with(ROW_TAG)) => {
            map.values().map(flatten_rows).collect()
        }
        other => vec![flatten_rows(other)],
    }
}

fn flatten_rows(rows: &Tree) -> Tree {
    match rows {
        Tree::Object(row) => Tree::Object(flatten_row(row)),
        Tree::Array(items) => Tree::Array(items.iter().map(flatten_rows).collect()),
        other => other.clone(),
    }
}

/// Lift every nested table of `row` up to sibling level.
///
/// Plain fields keep their order; normalized sub-tables follow them.
fn flatten_row(row: &Node) -> Node {
    let mut result = Node::new();
    let mut nested = Vec::new();
    for (key, value) in row {
        if is_table_key(key) {
            nested.push((key, value));
        } else {
            result.insert(key.clone(), value.clone());
        }
    }
    for (key, value) in nested {
        let mut single = Node::new();
        single.insert(key.clone(), value.clone());
        result.extend(normalize_node(&single));
    }
    result
}
