//! Cisco IOS / IOS-XE text parsers.

use indexmap::IndexMap;
use regex::Regex;

use super::ParserRegistry;
use super::common::{CdpNeighbors, interface_status};
use crate::error::{ConfigError, ParseError};
use crate::extract::{BlockRules, LineRules, MergedSections, SearchRules, RuleSet, Sections, TextParser, fill_schema};
use crate::platform::OsFamily;
use crate::tree::{Node, Tree};

/// Register every IOS command.
pub fn register(registry: &mut ParserRegistry) -> Result<(), ConfigError> {
    let os = OsFamily::Ios;
    registry.register(os, "show version", RuleSet::from(show_version()?))?;
    registry.register(os, "show interface", Interfaces::new()?)?;
    registry.register(os, "show interface status", RuleSet::from(interface_status()?))?;
    registry.register(os, "show interface trunk", show_interface_trunk()?)?;
    registry.register(os, "show vlan", show_vlan()?)?;
    registry.register(os, "show run interface", RuleSet::from(show_run_interface()?))?;
    registry.register(os, "show cdp neighbor", CdpNeighbors::new()?)?;
    registry.register(os, "show ip arp", RuleSet::from(show_ip_arp()?))?;
    registry.register(os, "show mac address-table", RuleSet::from(show_mac_address_table()?))?;
    registry.register(os, "show ip route", Routes::new()?)?;
    Ok(())
}

fn show_version() -> Result<SearchRules, regex::Error> {
    SearchRules::new()
        .field("version", r"^Cisco IOS.*? Software.*?, Version ([^,\s]+)")?
        .field("software", r"^Cisco IOS Software,? (.+?), RELEASE SOFTWARE")?
        .field("rom", r"^ROM: (.+)$")?
        .field("hostname", r"^(\S+) uptime is")?
        .field("uptime", r"uptime is (.+)$")?
        .field("system_image_file", r#"System image file is "?([^"\r\n]+)"?"#)?
        .field("platform", r"^[Cc]isco (\S+) .*(?:processor|bytes of memory)")?
        .field("processor_board_id", r"Processor board ID (\S+)")
}

/// `show interface`, with each member of a port-channel pointing back at it.
///
/// Every interface gets a `port_channel` field naming the bundle whose
/// `Members in this channel` line lists it, or `""`. `members` is always a
/// list, empty outside port-channels.
struct Interfaces {
    rules: BlockRules,
}

impl Interfaces {
    fn new() -> Result<Self, regex::Error> {
        let rules = BlockRules::new(
            r"^(?P<key>\S+) is (?P<status>(?:administratively )?(?:up|down)), line protocol is (?P<protocol_status>\w+)(?: \((?P<physical_status>[^)]+)\))?",
        )?
        .field("hardware_address", r"address is ([0-9a-fA-F.]+) \(bia")?
        .field("internet_address", r"Internet address is (\S+)")?
        .field("description", r"Description: (.+)")?
        .field("mtu", r"MTU (\d+) bytes")?
        .field("encapsulation", r"Encapsulation ([^,]+),")?
        .field("duplex", r"(\w+-duplex)")?
        .field("speed", r", (\d+[GM]b/s)")?
        .field("media", r"media type is (.+)")?
        .field("members", r"Members in this channel: (.+)")?;
        Ok(Self { rules })
    }
}

impl TextParser for Interfaces {
    fn parse(&self, text: &str) -> Result<Tree, ParseError> {
        let Tree::Object(mut interfaces) = self.rules.extract(text) else {
            return Ok(Tree::Object(Node::new()));
        };

        let mut bundles: IndexMap<String, String> = IndexMap::new();
        for (name, record) in interfaces.iter_mut() {
            let Some(record) = record.as_object_mut() else {
                continue;
            };
            let members: Vec<String> = match record.get("members") {
                Some(Tree::String(members)) => members.split_whitespace().map(str::to_string).collect(),
                _ => Vec::new(),
            };
            for member in &members {
                bundles.insert(member.clone(), name.clone());
            }
            record.insert(
                "members".into(),
                Tree::Array(members.into_iter().map(Tree::from).collect()),
            );
        }

        for (name, record) in interfaces.iter_mut() {
            let bundle = bundles
                .iter()
                .find(|(member, _)| same_interface(member, name))
                .map_or("", |(_, bundle)| bundle.as_str());
            if let Some(record) = record.as_object_mut() {
                record.insert("port_channel".into(), Tree::from(bundle));
            }
        }
        Ok(Tree::Object(interfaces))
    }
}

/// Check if abbreviated `short` (`Gi1/0/1`) names interface `full`
/// (`GigabitEthernet1/0/1`).
fn same_interface(short: &str, full: &str) -> bool {
    let split = |name: &str| {
        let at = name.find(|c: char| c.is_ascii_digit()).unwrap_or(name.len());
        (name[..at].to_ascii_lowercase(), name[at..].to_string())
    };
    let (short_kind, short_id) = split(short);
    let (full_kind, full_id) = split(full);
    short_id == full_id && !short_kind.is_empty() && full_kind.starts_with(&short_kind)
}

fn show_interface_trunk() -> Result<MergedSections, regex::Error> {
    let sections = Sections::new()
        .section("ports", r"Port\s+Mode\s+Encapsulation\s+Status\s+Native vlan")?
        .section("allowed", r"Port\s+Vlans allowed on trunk")?
        .optional("active", r"Port\s+Vlans allowed and active in management domain")?
        .optional("forwarding", r"Port\s+Vlans in spanning tree forwarding state and not pruned")?;

    let ports = LineRules::new(
        r"^(?P<port>\S+)\s+(?P<mode>\S+)\s+(?P<encapsulation>\S+)\s+(?P<status>\S+)\s+(?P<native_vlan>\d+)",
    )?
    .keyed_by("port");
    let allowed = LineRules::new(r"^(?P<port>\S+)\s+(?P<vlans_allowed>[\d,\-]+|none)\s*$")?.keyed_by("port");
    let active = LineRules::new(r"^(?P<port>\S+)\s+(?P<vlans_allowed_mgmt>[\d,\-]+|none)\s*$")?.keyed_by("port");
    let forwarding =
        LineRules::new(r"^(?P<port>\S+)\s+(?P<vlans_stp_forwarding>[\d,\-]+|none)\s*$")?.keyed_by("port");

    Ok(MergedSections::new(sections)?
        .rows("ports", ports)
        .rows("allowed", allowed)
        .rows("active", active)
        .rows("forwarding", forwarding))
}

fn show_vlan() -> Result<MergedSections, regex::Error> {
    let sections = Sections::new()
        .section("vlans", r"VLAN\s+Name\s+Status\s+Ports")?
        .optional(
            "more",
            r"VLAN\s+Type\s+SAID\s+MTU\s+Parent\s+RingNo\s+BridgeNo\s+Stp\s+BrdgMode\s+Trans1\s+Trans2",
        )?;

    let vlans = LineRules::new(r"^(?P<vlan_id>\d+)\s+(?P<vlan_name>\S+)\s+(?P<status>\S+)(?P<ports>.*)$")?
        .keyed_by("vlan_id");
    let more = LineRules::new(
        r"^(?P<vlan_id>\d+)\s+(?P<type>\S+)\s+(?P<said>\d+)\s+(?P<mtu>\S+)\s+(?P<parent>\S+)\s+(?P<ringno>\S+)\s+(?P<bridgeno>\S+)\s+(?P<stp>\S+)\s+(?P<brdgmode>\S+)\s+(?P<trans1>\S+)\s+(?P<trans2>\S+)",
    )?
    .keyed_by("vlan_id");

    Ok(MergedSections::new(sections)?
        .rows_with_list("vlans", vlans, "ports")
        .rows("more", more))
}

fn show_run_interface() -> Result<BlockRules, regex::Error> {
    BlockRules::new(r"^interface (?P<key>\S+)")?
        .field("description", r"^\s+description (.+)")?
        .field("switchport_mode", r"^\s+switchport mode (\S+)")?
        .field("native_vlan", r"native vlan (\d+)")?
        .field("access_vlan", r"^\s+switchport access vlan (\d+)")?
        .field("ip_address", r"^ ip address (.+)")?
        .field("channel_group", r"^ channel-group (\d+) mode")?
        .field("channel_group_mode", r"^ channel-group \d+ mode (\S+)")
}

fn show_ip_arp() -> Result<LineRules, regex::Error> {
    LineRules::new(
        r"^(?P<protocol>\S+)\s+(?P<address>\d+\.\d+\.\d+\.\d+)\s+(?P<age>\S+)\s+(?P<hardware_address>\S+)\s+(?P<type>\S+)\s+(?P<interface>\S+)",
    )
}

fn show_mac_address_table() -> Result<LineRules, regex::Error> {
    Ok(LineRules::new(
        r"^\s*(?P<vlan>\d+|All)\s+(?P<mac>[0-9a-fA-F]{4}\.[0-9a-fA-F]{4}\.[0-9a-fA-F]{4})\s+(?P<type>\S+)\s+(?:(?P<learn>Yes|No)\s+(?P<age>\S+)\s+)?(?P<ports>\S.*?)\s*$",
    )?
    .keyed_by("mac"))
}

/// `show ip route`, keyed by prefix, with route codes spelled out.
struct Routes {
    legend: Regex,
    route: Regex,
}

impl Routes {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            legend: Regex::new(r"([\w*+%]+) - ([-\w ]+)")?,
            route: Regex::new(
                r"^(?P<codes>[A-Za-z*+%][\w*+% ]*?)\s+(?P<prefix>\d+\.\d+\.\d+\.\d+(?:/\d+)?)(?:\s+\[(?P<preference>\d+)/(?P<metric>\d+)\])?\s+(?:via (?P<next_hop>\d+\.\d+\.\d+\.\d+)|is (?P<connected>directly connected))(?:, (?:\S+, )?(?P<interface>[A-Za-z][^\s,]*))?",
            )?,
        })
    }
}

impl TextParser for Routes {
    fn parse(&self, text: &str) -> Result<Tree, ParseError> {
        let legend: IndexMap<&str, &str> = self
            .legend
            .captures_iter(text)
            .filter_map(|caps| Some((caps.get(1)?.as_str(), caps.get(2)?.as_str().trim())))
            .collect();
        let expand = |code: &str| Tree::from(legend.get(code).copied().unwrap_or(code));

        let mut routes = Node::new();
        for caps in text.lines().filter_map(|line| self.route.captures(line)) {
            let mut codes = Vec::new();
            for code in caps["codes"].split_whitespace() {
                if code.contains('*') {
                    codes.push(expand("*"));
                }
                let code = code.replace('*', "");
                if !code.is_empty() {
                    codes.push(expand(code.as_str()));
                }
            }

            let next_hop = caps
                .name("next_hop")
                .or_else(|| caps.name("connected"))
                .map_or("", |m| m.as_str());

            let mut record = Node::new();
            record.insert("codes".into(), Tree::Array(codes));
            for field in ["preference", "metric"] {
                let value = caps.name(field).map_or("", |m| m.as_str());
                record.insert(field.into(), Tree::from(value));
            }
            record.insert("next_hop".into(), Tree::from(next_hop));
            if let Some(interface) = caps.name("interface") {
                record.insert("interface".into(), Tree::from(interface.as_str()));
            }
            fill_schema(&mut record, ["interface"]);
            routes.insert(caps["prefix"].to_string(), Tree::Object(record));
        }
        Ok(Tree::Object(routes))
    }
}
