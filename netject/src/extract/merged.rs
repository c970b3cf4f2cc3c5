//! Multi-table outputs joined on a key column.

use indexmap::IndexMap;
use regex::Regex;

use super::{LineRules, Sections, TextParser};
use crate::error::ParseError;
use crate::tree::{Node, Tree};

#[derive(Debug, Clone)]
struct SectionRows {
    section: String,
    rules: LineRules,
    list: Option<String>,
}

/// Rules for outputs that print one entity across several tables.
///
/// `show interface trunk` prints ports once per table (native VLAN, allowed
/// VLANs, forwarding VLANs); the rows of every table are merged on their
/// key into one record per port. Row rules must be keyed.
///
/// A list field holds a comma-separated value that wraps onto indented
/// continuation lines, like the ports of `show vlan`.
#[derive(Debug, Clone)]
pub struct MergedSections {
    sections: Sections,
    rows: Vec<SectionRows>,
    continuation: Regex,
    first_defines_rows: bool,
}

impl MergedSections {
    pub fn new(sections: Sections) -> Result<Self, regex::Error> {
        Ok(Self {
            sections,
            rows: Vec::new(),
            continuation: Regex::new(r"^\s+[^\s-]")?,
            first_defines_rows: false,
        })
    }

    /// Rows of `section`.
    pub fn rows(mut self, section: &str, rules: LineRules) -> Self {
        self.rows.push(SectionRows {
            section: section.to_string(),
            rules,
            list: None,
        });
        self
    }

    /// Rows of `section` whose `field` is a wrapped comma-separated list.
    pub fn rows_with_list(mut self, section: &str, rules: LineRules, field: &str) -> Self {
        self.rows.push(SectionRows {
            section: section.to_string(),
            rules,
            list: Some(field.to_string()),
        });
        self
    }

    /// Ignore rows of later tables whose key the first table never printed.
    pub fn first_defines_rows(mut self) -> Self {
        self.first_defines_rows = true;
        self
    }

    fn schema(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flat_map(|r| r.rules.schema())
    }

    fn is_list(&self, field: &str) -> bool {
        self.rows.iter().any(|r| r.list.as_deref() == Some(field))
    }

    /// Give `row` every schema field it lacks: `[]` for lists, `""` otherwise.
    fn fill_row(&self, row: &mut Node) {
        for field in self.schema() {
            if !row.contains_key(field) {
                let empty = if self.is_list(field) {
                    Tree::Array(Vec::new())
                } else {
                    Tree::from("")
                };
                row.insert(field.to_string(), empty);
            }
        }
    }

    /// Scan `text` into `key -> merged record`.
    pub fn extract(&self, text: &str) -> Result<Tree, ParseError> {
        let bodies = self.sections.split(text)?;
        let mut merged: IndexMap<String, Node> = IndexMap::new();

        for (i, rows) in self.rows.iter().enumerate() {
            let Some(body) = bodies.get(&rows.section) else {
                continue;
            };
            let mut last: Option<String> = None;

            for line in body.lines() {
                if let Some((Some(key), record)) = rows.rules.record(line) {
                    if key.is_empty() || (i > 0 && self.first_defines_rows && !merged.contains_key(&key)) {
                        last = None;
                        continue;
                    }
                    let row = merged.entry(key.clone()).or_default();
                    for (name, value) in record {
                        let value = match (&rows.list, value) {
                            (Some(list), Tree::String(s)) if *list == name => split_list(&s),
                            (_, value) => value,
                        };
                        row.insert(name, value);
                    }
                    last = Some(key);
                    continue;
                }

                // Wrapped list values
                let (Some(list), Some(key)) = (&rows.list, &last) else {
                    continue;
                };
                if !self.continuation.is_match(line) {
                    continue;
                }
                if let Some(Tree::Array(items)) = merged.get_mut(key).and_then(|row| row.get_mut(list)) {
                    if let Tree::Array(more) = split_list(line) {
                        items.extend(more);
                    }
                }
            }
        }

        let mut out = Node::new();
        for (key, mut row) in merged {
            self.fill_row(&mut row);
            out.insert(key, Tree::Object(row));
        }
        Ok(Tree::Object(out))
    }
}

impl TextParser for MergedSections {
    fn parse(&self, text: &str) -> Result<Tree, ParseError> {
        self.extract(text)
    }
}

/// Comma-separated items, blanks dropped.
fn split_list(value: &str) -> Tree {
    Tree::Array(
        value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(Tree::from)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const VLAN: &str = "\
VLAN Name                             Status    Ports
---- -------------------------------- --------- -------------------------------
1    default                          active    Eth1/1, Eth1/2, Eth1/3
                                                Eth1/4
10   users                            active    Po1
20   voice                            suspend

VLAN Type         Vlan-mode
---- -----        ----------
1    enet         CE
10   enet         CE
30   enet         CE
";

    fn vlan_rules() -> MergedSections {
        let sections = Sections::new()
            .section("vlans", r"VLAN\s+Name\s+Status\s+Ports")
            .unwrap()
            .optional("types", r"VLAN\s+Type\s+Vlan-mode")
            .unwrap();
        let vlans = LineRules::new(r"^(?P<vlan_id>\d+)\s+(?P<name>\S+)\s+(?P<status>\S+)(?P<ports>.*)$")
            .unwrap()
            .keyed_by("vlan_id");
        let types = LineRules::new(r"^(?P<vlan_id>\d+)\s+(?P<type>\S+)\s+(?P<mode>\S+)")
            .unwrap()
            .keyed_by("vlan_id");
        MergedSections::new(sections)
            .unwrap()
            .rows_with_list("vlans", vlans, "ports")
            .rows("types", types)
    }

    #[test]
    fn test_continuation_lines_extend_list() {
        let tree = vlan_rules().extract(VLAN).unwrap();
        assert_eq!(tree["1"]["ports"], json!(["Eth1/1", "Eth1/2", "Eth1/3", "Eth1/4"]));
        assert_eq!(tree["10"]["ports"], json!(["Po1"]));
        assert_eq!(tree["20"]["ports"], json!([]));
    }

    #[test]
    fn test_rows_merged_by_key() {
        let tree = vlan_rules().extract(VLAN).unwrap();
        assert_eq!(
            tree["10"],
            json!({"name": "users", "status": "active", "ports": ["Po1"], "type": "enet", "mode": "CE"})
        );
        // VLAN 20 has no type row
        assert_eq!(tree["20"]["type"], "");
        // VLAN 30 only appears in the second table
        assert_eq!(tree["30"]["name"], "");
        assert_eq!(tree["30"]["ports"], json!([]));
    }

    #[test]
    fn test_first_defines_rows() {
        let tree = vlan_rules().first_defines_rows().extract(VLAN).unwrap();
        let keys: Vec<&String> = tree.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["1", "10", "20"]);
    }

    #[test]
    fn test_missing_required_section() {
        let err = vlan_rules().extract("VLAN Type Vlan-mode\n1 enet CE\n").unwrap_err();
        assert!(matches!(err, ParseError::SectionNotFound { .. }));
    }
}
