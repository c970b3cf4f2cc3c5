//! Normalization of vendor JSON responses.
//!
//! This module turns `TABLE_`/`ROW_` wrapped trees into plain nested
//! structures and joins parallel sibling tables by position.

mod table;
mod zip;

pub use table::{is_table_key, logical_name, normalize, strip_tags};
pub use zip::zip_tables;

/// Key prefix marking a nested table.
pub const TABLE_TAG: &str = "TABLE_";

/// Key prefix marking one row or a sequence of rows.
pub const ROW_TAG: &str = "ROW_";
