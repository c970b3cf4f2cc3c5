//! Field extraction from free-text CLI output.
//!
//! A [`TextParser`] turns one command's screen output into a tree. The
//! declarative rule sets in this module cover the shapes found in show
//! command output:
//!
//! - [`BlockRules`] - records opened by a boundary line (`Eth1/1 is up`)
//!   followed by attribute lines, several fields per record.
//! - [`ColumnRules`] - fixed-width tables, column boundaries taken from the
//!   offsets of the labels in the header line.
//! - [`LineRules`] - one record per matching line.
//! - [`SearchRules`] - one flat record, each field searched in the whole text.
//!
//! [`Sections`] splits outputs made of several header-introduced tables;
//! [`MergedSections`] joins the rows of those tables on a key column.
//!
//! Every record produced by a rule set carries every declared field, set to
//! an empty string when nothing matched, so row-like outputs have a uniform
//! schema whatever optional attributes a device printed.

mod block;
mod columns;
mod lines;
mod merged;
mod search;
mod sections;

pub use block::BlockRules;
pub use columns::ColumnRules;
pub use lines::LineRules;
pub use merged::MergedSections;
pub use search::SearchRules;
pub use sections::Sections;

use regex::Regex;

use crate::error::ParseError;
use crate::tree::{Node, Tree};

/// Parser for one command's text output.
pub trait TextParser: Send + Sync {
    /// Extract structured data from `text`.
    fn parse(&self, text: &str) -> Result<Tree, ParseError>;
}

/// A named field with one capture group.
#[derive(Debug, Clone)]
pub struct Field {
    /// Output key.
    pub name: String,

    /// Pattern whose first capture group is the value.
    pub pattern: Regex,

    /// Collect every match into a list instead of keeping the last one.
    pub repeat: bool,
}

impl Field {
    /// Create a field whose last match wins.
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            pattern: Regex::new(pattern)?,
            repeat: false,
        })
    }

    /// Create a field that accumulates all matches.
    pub fn repeated(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            repeat: true,
            ..Self::new(name, pattern)?
        })
    }

    /// Value captured from `line`, if the pattern matches.
    pub fn capture<'t>(&self, line: &'t str) -> Option<&'t str> {
        let caps = self.pattern.captures(line)?;
        caps.get(1).or_else(|| caps.get(0)).map(|m| m.as_str())
    }

    /// Record the captured value on `record`.
    fn apply(&self, record: &mut Node, value: &str) {
        if !self.repeat {
            record.insert(self.name.clone(), Tree::from(value));
            return;
        }
        match record.get_mut(&self.name) {
            Some(Tree::Array(items)) => items.push(Tree::from(value)),
            _ => {
                record.insert(self.name.clone(), Tree::Array(vec![Tree::from(value)]));
            }
        }
    }
}

/// A declarative rule set.
#[derive(Debug, Clone)]
pub enum RuleSet {
    Block(BlockRules),
    Columns(ColumnRules),
    Lines(LineRules),
    Search(SearchRules),
}

impl RuleSet {
    /// Extract records from `text`.
    pub fn extract(&self, text: &str) -> Result<Tree, ParseError> {
        match self {
            RuleSet::Block(rules) => Ok(rules.extract(text)),
            RuleSet::Columns(rules) => rules.extract(text),
            RuleSet::Lines(rules) => Ok(rules.extract(text)),
            RuleSet::Search(rules) => Ok(rules.extract(text)),
        }
    }
}

impl TextParser for RuleSet {
    fn parse(&self, text: &str) -> Result<Tree, ParseError> {
        self.extract(text)
    }
}

impl From<BlockRules> for RuleSet {
    fn from(rules: BlockRules) -> Self {
        RuleSet::Block(rules)
    }
}

impl From<ColumnRules> for RuleSet {
    fn from(rules: ColumnRules) -> Self {
        RuleSet::Columns(rules)
    }
}

impl From<LineRules> for RuleSet {
    fn from(rules: LineRules) -> Self {
        RuleSet::Lines(rules)
    }
}

impl From<SearchRules> for RuleSet {
    fn from(rules: SearchRules) -> Self {
        RuleSet::Search(rules)
    }
}

/// Give `record` each of `fields` it lacks, set to `""`.
pub fn fill_schema<'a, I>(record: &mut Node, fields: I)
where
    I: IntoIterator<Item = &'a str>,
{
    for field in fields {
        if !record.contains_key(field) {
            record.insert(field.to_string(), Tree::from(""));
        }
    }
}

/// Named capture groups of `pattern`, in pattern order.
pub(crate) fn group_names(pattern: &Regex) -> impl Iterator<Item = &str> {
    pattern.capture_names().flatten()
}
