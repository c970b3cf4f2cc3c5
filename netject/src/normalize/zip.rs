//! Positional join of sibling tables.
//!
//! Some NX-OS commands report one logical table as several parallel tables
//! (`show interface trunk` emits port details, allowed VLANs and STP
//! forwarding as separate tables). Row `i` of each table describes the same
//! port, but only by position: there is no join key, and none is checked.

use crate::error::ParseError;
use crate::tree::{Node, Tree};

/// Merge the top-level tables of `node` row by row.
///
/// Every field is renamed `<table>_<field>`. Shorter tables are padded with
/// empty rows, so the result has as many rows as the longest table. A table
/// holding a single mapping counts as one row.
pub fn zip_tables(node: &Node) -> Result<Vec<Tree>, ParseError> {
    let tables = node
        .iter()
        .map(|(key, value)| rows_of(key, value).map(|rows| (key.as_str(), rows)))
        .collect::<Result<Vec<_>, _>>()?;

    let height = tables.iter().map(|(_, rows)| rows.len()).max().unwrap_or(0);

    let zipped = (0..height)
        .map(|index| {
            let mut merged = Node::new();
            for (table, rows) in &tables {
                let Some(row) = rows.get(index) else {
                    continue;
                };
                for (field, value) in *row {
                    merged.insert(format!("{table}_{field}"), value.clone());
                }
            }
            Tree::Object(merged)
        })
        .collect();

    Ok(zipped)
}

fn rows_of<'a>(key: &str, value: &'a Tree) -> Result<Vec<&'a Node>, ParseError> {
    let not_a_table = || ParseError::NotATable {
        key: key.to_string(),
    };
    match value {
        Tree::Object(row) => Ok(vec![row]),
        Tree::Array(items) => items
            .iter()
            .map(|item| item.as_object().ok_or_else(not_a_table))
            .collect(),
        _ => Err(not_a_table()),
    }
}
