//! Whole-text search for single-record outputs.

use regex::{Regex, RegexBuilder};

use super::Field;
use crate::tree::{Node, Tree};

/// Rules for outputs describing one entity, such as `show version`.
///
/// Each field is searched across the whole text in multi-line mode; the
/// first match wins.
#[derive(Debug, Clone, Default)]
pub struct SearchRules {
    fields: Vec<Field>,
}

impl SearchRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field; `^` and `$` match at line boundaries.
    pub fn field(mut self, name: &str, pattern: &str) -> Result<Self, regex::Error> {
        let pattern: Regex = RegexBuilder::new(pattern).multi_line(true).build()?;
        self.fields.push(Field {
            name: name.to_string(),
            pattern,
            repeat: false,
        });
        Ok(self)
    }

    pub fn extract(&self, text: &str) -> Tree {
        let mut record = Node::new();
        for field in &self.fields {
            let value = field.capture(text).unwrap_or("");
            record.insert(field.name.clone(), Tree::from(value.trim_end()));
        }
        Tree::Object(record)
    }
}
