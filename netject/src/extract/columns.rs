//! Fixed-column table scanning.

use regex::Regex;

use super::fill_schema;
use crate::error::ParseError;
use crate::tree::{Node, Tree};

#[derive(Debug, Clone)]
struct Column {
    label: String,
    field: String,
}

/// Rules for fixed-width tables.
///
/// Column boundaries come from the character offsets of each label in the
/// detected header line: a column spans from its label to the next label,
/// the last one to the end of the line. Data lines are sliced at those
/// offsets and trimmed. Blank lines, separator lines and repeated headers
/// are skipped.
#[derive(Debug, Clone)]
pub struct ColumnRules {
    header: Regex,
    separator: Regex,
    columns: Vec<Column>,
    key: Option<usize>,
}

impl ColumnRules {
    /// Create rules locating the header line with `header`.
    pub fn new(header: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            header: Regex::new(header)?,
            separator: Regex::new(r"^\s*-{2,}")?,
            columns: Vec::new(),
            key: None,
        })
    }

    /// Add a column found at `label` in the header, stored as `field`.
    pub fn column(mut self, label: &str, field: &str) -> Self {
        self.columns.push(Column {
            label: label.to_string(),
            field: field.to_string(),
        });
        self
    }

    /// Add the column whose value keys each row.
    ///
    /// Keyed tables produce `key -> record`, rows with an empty key are
    /// dropped. Without a key column the output is a list of records.
    pub fn key_column(mut self, label: &str, field: &str) -> Self {
        self.key = Some(self.columns.len());
        self.column(label, field)
    }

    /// Scan `text` into rows.
    pub fn extract(&self, text: &str) -> Result<Tree, ParseError> {
        let mut lines = text.lines();
        let header = lines
            .by_ref()
            .find(|line| self.header.is_match(line))
            .ok_or_else(|| ParseError::HeaderNotFound {
                header: self.header.as_str().to_string(),
            })?;
        let starts = self.offsets(header)?;

        let mut keyed = Node::new();
        let mut rows = Vec::new();

        for line in lines {
            if line.trim().is_empty() || self.separator.is_match(line) || self.header.is_match(line) {
                continue;
            }

            let mut record = Node::new();
            let mut key = None;
            for (i, column) in self.columns.iter().enumerate() {
                let value = slice_chars(line, starts[i], starts.get(i + 1).copied()).trim();
                if self.key == Some(i) {
                    key = Some(value.to_string());
                } else {
                    record.insert(column.field.clone(), Tree::from(value));
                }
            }
            fill_schema(&mut record, self.value_fields());

            match key {
                Some(key) if key.is_empty() => {}
                Some(key) => {
                    keyed.insert(key, Tree::Object(record));
                }
                None => rows.push(Tree::Object(record)),
            }
        }

        Ok(match self.key {
            Some(_) => Tree::Object(keyed),
            None => Tree::Array(rows),
        })
    }

    fn value_fields(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(i, _)| self.key != Some(*i))
            .map(|(_, c)| c.field.as_str())
    }

    /// Character offset of each column label in `header`.
    fn offsets(&self, header: &str) -> Result<Vec<usize>, ParseError> {
        let mut starts: Vec<usize> = Vec::with_capacity(self.columns.len());
        let mut from = 0;
        for column in &self.columns {
            let byte = header[from..]
                .find(&column.label)
                .map(|pos| pos + from)
                .ok_or_else(|| {
                    if header.contains(&column.label) {
                        ParseError::UnorderedColumns {
                            label: column.label.clone(),
                        }
                    } else {
                        ParseError::MissingColumn {
                            label: column.label.clone(),
                        }
                    }
                })?;
            starts.push(header[..byte].chars().count());
            from = byte + column.label.len();
        }
        Ok(starts)
    }
}

/// Characters `start..end` of `line`, clamped to the line length.
fn slice_chars(line: &str, start: usize, end: Option<usize>) -> &str {
    let byte_at = |n: usize| line.char_indices().nth(n).map_or(line.len(), |(b, _)| b);
    let from = byte_at(start);
    let to = end.map_or(line.len(), byte_at);
    if from >= to { "" } else { &line[from..to] }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const STATUS: &str = "\
--------------------------------------------------------------------------------
Port          Name               Status    Vlan      Duplex  Speed   Type
--------------------------------------------------------------------------------
mgmt0         --                 connected routed    full    1000    --
Eth1/1        uplink-spine1      connected trunk     full    10G     10Gbase-SR
Eth1/2        --                 notconnec 1         auto    auto    10Gbase-SR
Eth1/3                           disabled  1         auto    auto
";

    fn status_rules() -> ColumnRules {
        ColumnRules::new(r"Port\s+Name\s+Status\s+Vlan\s+Duplex\s+Speed\s+Type")
            .unwrap()
            .key_column("Port", "port")
            .column("Name", "name")
            .column("Status", "status")
            .column("Vlan", "vlan")
            .column("Duplex", "duplex")
            .column("Speed", "speed")
            .column("Type", "type")
    }

    #[test]
    fn test_keyed_rows() {
        let tree = status_rules().extract(STATUS).unwrap();
        assert_eq!(tree.as_object().unwrap().len(), 4);
        assert_eq!(
            tree["Eth1/1"],
            json!({
                "name": "uplink-spine1",
                "status": "connected",
                "vlan": "trunk",
                "duplex": "full",
                "speed": "10G",
                "type": "10Gbase-SR",
            })
        );
        assert_eq!(tree["Eth1/3"]["name"], "");
        assert_eq!(tree["Eth1/3"]["type"], "");
    }

    #[test]
    fn test_list_rows_without_key() {
        let rules = ColumnRules::new(r"Port\s+Name")
            .unwrap()
            .column("Port", "port")
            .column("Name", "name");
        let tree = rules.extract("Port  Name\n----  ----\nE1    a\nE2\n").unwrap();
        assert_eq!(
            tree,
            json!([{"port": "E1", "name": "a"}, {"port": "E2", "name": ""}])
        );
    }

    #[test]
    fn test_header_not_found() {
        let err = status_rules().extract("% Invalid command").unwrap_err();
        assert!(matches!(err, ParseError::HeaderNotFound { .. }));
    }

    #[test]
    fn test_missing_column_label() {
        let rules = ColumnRules::new(r"Port\s+Name")
            .unwrap()
            .column("Port", "port")
            .column("Vlan", "vlan");
        let err = rules.extract("Port  Name\nE1 a\n").unwrap_err();
        assert!(matches!(err, ParseError::MissingColumn { label } if label == "Vlan"));
    }

    #[test]
    fn test_unordered_columns() {
        let rules = ColumnRules::new(r"Port\s+Name")
            .unwrap()
            .column("Name", "name")
            .column("Port", "port");
        let err = rules.extract("Port  Name\nE1 a\n").unwrap_err();
        assert!(matches!(err, ParseError::UnorderedColumns { label } if label == "Port"));
    }

    #[test]
    fn test_slice_chars() {
        assert_eq!(slice_chars("abcdef", 1, Some(3)), "bc");
        assert_eq!(slice_chars("abc", 1, None), "bc");
        assert_eq!(slice_chars("ab", 5, Some(8)), "");
        assert_eq!(slice_chars("héllo", 1, Some(3)), "él");
    }
}
