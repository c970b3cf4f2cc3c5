//! One record per matching line.

use regex::Regex;

use super::{fill_schema, group_names};
use crate::tree::{Node, Tree};

/// Rules for outputs where each data line is one record.
///
/// The pattern's named groups become the record's fields. Extra declared
/// fields that the pattern never captures are still present, as `""`.
#[derive(Debug, Clone)]
pub struct LineRules {
    pattern: Regex,
    key: Option<String>,
    fields: Vec<String>,
}

impl LineRules {
    /// Create rules from a pattern with named groups.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(pattern)?;
        let fields = group_names(&pattern).map(str::to_string).collect();
        Ok(Self {
            pattern,
            key: None,
            fields,
        })
    }

    /// Key records by the value of `group` instead of listing them.
    pub fn keyed_by(mut self, group: &str) -> Self {
        self.fields.retain(|f| f != group);
        self.key = Some(group.to_string());
        self
    }

    /// Declare a field the pattern may not capture.
    pub fn with_field(mut self, name: &str) -> Self {
        if !self.fields.iter().any(|f| f == name) {
            self.fields.push(name.to_string());
        }
        self
    }

    /// Names every record carries, key group excluded.
    pub fn schema(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    /// Record for one line, with its key when the rules are keyed.
    pub(crate) fn record(&self, line: &str) -> Option<(Option<String>, Node)> {
        let caps = self.pattern.captures(line)?;
        let mut record = Node::new();
        for name in &self.fields {
            if let Some(m) = caps.name(name) {
                record.insert(name.clone(), Tree::from(m.as_str().trim()));
            }
        }
        fill_schema(&mut record, self.schema());

        let key = self
            .key
            .as_ref()
            .map(|group| caps.name(group).map_or("", |m| m.as_str().trim()).to_string());
        Some((key, record))
    }

    /// Scan `text`, one record per matching line.
    pub fn extract(&self, text: &str) -> Tree {
        let mut keyed = Node::new();
        let mut rows = Vec::new();

        for (key, record) in text.lines().filter_map(|line| self.record(line)) {
            match key {
                Some(key) => {
                    keyed.insert(key, Tree::Object(record));
                }
                None => rows.push(Tree::Object(record)),
            }
        }

        match self.key {
            Some(_) => Tree::Object(keyed),
            None => Tree::Array(rows),
        }
    }
}
