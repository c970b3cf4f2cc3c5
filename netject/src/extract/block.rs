//! Multi-field-per-line scanning.

use indexmap::IndexMap;
use regex::Regex;

use super::{Field, fill_schema, group_names};
use crate::tree::{Node, Tree};

/// Capture group of the boundary pattern that names a record.
const KEY_GROUP: &str = "key";

/// Rules for outputs made of records, each opened by a boundary line.
///
/// The boundary pattern must have a `key` named group; its other named
/// groups become fields of the record it opens. Every other line is tried
/// against every field pattern and sets that field on the current record.
/// Lines before the first boundary are ignored.
///
/// ```rust
/// use netject::extract::BlockRules;
///
/// let rules = BlockRules::new(r"^(?P<key>\S+) is (?P<status>up|down)")?
///     .field("mtu", r"MTU (\d+) bytes")?;
///
/// let tree = rules.extract("Vlan1 is up\n  MTU 1500 bytes\nVlan2 is down\n");
/// assert_eq!(tree["Vlan1"]["mtu"], "1500");
/// assert_eq!(tree["Vlan2"]["mtu"], "");
/// # Ok::<(), regex::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct BlockRules {
    boundary: Regex,
    fields: Vec<Field>,
}

impl BlockRules {
    /// Create rules with the record boundary pattern.
    pub fn new(boundary: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            boundary: Regex::new(boundary)?,
            fields: Vec::new(),
        })
    }

    /// Add a field whose last match wins.
    pub fn field(mut self, name: &str, pattern: &str) -> Result<Self, regex::Error> {
        self.fields.push(Field::new(name, pattern)?);
        Ok(self)
    }

    /// Add a field collecting every match.
    pub fn repeated(mut self, name: &str, pattern: &str) -> Result<Self, regex::Error> {
        self.fields.push(Field::repeated(name, pattern)?);
        Ok(self)
    }

    /// Names every record carries, in output order.
    pub fn schema(&self) -> impl Iterator<Item = &str> {
        group_names(&self.boundary)
            .filter(|name| *name != KEY_GROUP)
            .chain(self.fields.iter().map(|f| f.name.as_str()))
    }

    /// Scan `text` into `key -> record`.
    pub fn extract(&self, text: &str) -> Tree {
        let mut records: IndexMap<String, Node> = IndexMap::new();
        let mut current: Option<String> = None;

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(caps) = self.boundary.captures(line) {
                if let Some(key) = caps.name(KEY_GROUP) {
                    let mut record = Node::new();
                    for name in group_names(&self.boundary).filter(|n| *n != KEY_GROUP) {
                        let value = caps.name(name).map_or("", |m| m.as_str());
                        record.insert(name.to_string(), Tree::from(value));
                    }
                    let key = key.as_str().trim().to_string();
                    records.insert(key.clone(), record);
                    current = Some(key);
                    continue;
                }
            }

            let Some(record) = current.as_ref().and_then(|key| records.get_mut(key)) else {
                continue;
            };
            for field in &self.fields {
                if let Some(value) = field.capture(line) {
                    field.apply(record, value);
                }
            }
        }

        let mut out = Node::new();
        for (key, mut record) in records {
            fill_schema(&mut record, self.schema());
            out.insert(key, Tree::Object(record));
        }
        Tree::Object(out)
    }
}
