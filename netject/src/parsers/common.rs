//! Parsers shared by both Cisco OS families.

use indexmap::IndexMap;
use regex::Regex;

use crate::error::ParseError;
use crate::extract::{ColumnRules, RuleSet, TextParser};
use crate::tree::{Node, Tree};

/// `show interface status`: fixed-column table keyed by port.
pub fn interface_status() -> Result<ColumnRules, regex::Error> {
    Ok(
        ColumnRules::new(r"Port\s+Name\s+Status\s+Vlan\s+Duplex\s+Speed\s+Type")?
            .key_column("Port", "port")
            .column("Name", "name")
            .column("Status", "status")
            .column("Vlan", "vlan")
            .column("Duplex", "duplex")
            .column("Speed", "speed")
            .column("Type", "type"),
    )
}

/// Places a rule set's output under a single key.
pub struct Nested {
    key: &'static str,
    rules: RuleSet,
}

impl Nested {
    pub fn new(key: &'static str, rules: impl Into<RuleSet>) -> Self {
        Self {
            key,
            rules: rules.into(),
        }
    }
}

impl TextParser for Nested {
    fn parse(&self, text: &str) -> Result<Tree, ParseError> {
        let mut out = Node::new();
        out.insert(self.key.to_string(), self.rules.extract(text)?);
        Ok(Tree::Object(out))
    }
}

/// `show cdp neighbor`, keyed by device ID.
///
/// Long device IDs push the rest of the entry onto the next line; both the
/// one-line and two-line forms are recognized. Capability letters are
/// expanded with the legend printed above the table.
pub struct CdpNeighbors {
    legend: Regex,
    entry: Regex,
    device_only: Regex,
    detail: Regex,
}

const CDP_DETAIL: &str = r"(?P<local_interface>[/\w. ]+?)\s+(?P<holdtime>\d+)\s+(?P<capability>[A-Za-z](?: [A-Za-z])*)\s+(?P<platform>\S+)\s+(?P<port_id>\S.*?)\s*$";

impl CdpNeighbors {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            legend: Regex::new(r"([A-Za-z]) - ([ \w-]+)")?,
            entry: Regex::new(&format!(r"^(?P<device_id>\S+)\s+{CDP_DETAIL}"))?,
            device_only: Regex::new(r"^(?P<device_id>\S+)\s*$")?,
            detail: Regex::new(&format!(r"^\s+{CDP_DETAIL}"))?,
        })
    }

    fn capabilities(&self, text: &str) -> IndexMap<String, String> {
        self.legend
            .captures_iter(text)
            .map(|caps| (caps[1].to_string(), caps[2].trim().to_string()))
            .collect()
    }

    fn record(caps: &regex::Captures<'_>, legend: &IndexMap<String, String>) -> Node {
        let capability = caps["capability"]
            .split_whitespace()
            .filter_map(|code| legend.get(code).map(String::as_str))
            .collect::<Vec<_>>()
            .join(", ");

        let mut record = Node::new();
        record.insert("local_interface".into(), Tree::from(caps["local_interface"].trim()));
        record.insert("holdtime".into(), Tree::from(&caps["holdtime"]));
        record.insert("capability".into(), Tree::from(capability));
        record.insert("platform".into(), Tree::from(&caps["platform"]));
        record.insert("port_id".into(), Tree::from(&caps["port_id"]));
        record
    }
}

impl TextParser for CdpNeighbors {
    fn parse(&self, text: &str) -> Result<Tree, ParseError> {
        let legend = self.capabilities(text);
        let mut neighbors = Node::new();
        let mut pending: Option<&str> = None;

        for line in text.lines().map(str::trim_end) {
            if line.is_empty() {
                continue;
            }
            if let Some(device) = pending.take() {
                if let Some(caps) = self.detail.captures(line) {
                    neighbors.insert(device.to_string(), Tree::Object(Self::record(&caps, &legend)));
                    continue;
                }
            }
            if let Some(caps) = self.entry.captures(line) {
                neighbors.insert(
                    caps["device_id"].to_string(),
                    Tree::Object(Self::record(&caps, &legend)),
                );
            } else if let Some(caps) = self.device_only.captures(line) {
                pending = caps.name("device_id").map(|m| m.as_str());
            }
        }
        Ok(Tree::Object(neighbors))
    }
}
