//! Cisco NX-OS text parsers.
//!
//! Commands registered as unsupported still accept `| json` output, which
//! the normalizer handles; only their screen text has no parser.

use regex::Regex;

use super::common::{CdpNeighbors, Nested, interface_status};
use super::ParserRegistry;
use crate::error::{ConfigError, ParseError};
use crate::extract::{BlockRules, LineRules, MergedSections, SearchRules, RuleSet, Sections, TextParser};
use crate::platform::OsFamily;
use crate::tree::{Node, Tree};

/// Commands collected from NX-OS devices with no text parser.
const JSON_ONLY: &[&str] = &[
    "show system resources",
    "show spanning-tree",
    "show vpc",
    "show vpc role",
    "show vpc consistency-parameters global",
    "show port-channel summary",
    "show forwarding adjacency",
    "show mac address-table",
    "show ip bgp summary",
    "show ip ospf neighbor",
    "show ip pim neighbor",
    "show hsrp",
    "show policy-map interface control-plane",
];

/// Register every NX-OS command.
pub fn register(registry: &mut ParserRegistry) -> Result<(), ConfigError> {
    let os = OsFamily::Nxos;
    registry.register(os, "show version", RuleSet::from(show_version()?))?;
    registry.register(os, "show interface", Nested::new("interfaces", show_interface()?))?;
    registry.register(os, "show interface status", RuleSet::from(interface_status()?))?;
    registry.register(os, "show interface trunk", show_interface_trunk()?)?;
    registry.register(os, "show vlan", show_vlan()?)?;
    registry.register(os, "show cdp neighbor", CdpNeighbors::new()?)?;
    registry.register(os, "show ip arp", RuleSet::from(show_ip_arp()?))?;
    registry.register(os, "show ip route vrf all", VrfRoutes::new()?)?;
    for command in JSON_ONLY {
        registry.register_unsupported(os, command)?;
    }
    Ok(())
}

fn show_version() -> Result<SearchRules, regex::Error> {
    SearchRules::new()
        .field("bios_version", r"BIOS:\s+version (.+)")?
        .field("loader_version", r"loader:\s+version (.+)")?
        .field("kickstart_version", r"kickstart:\s+version (.+)")?
        .field("system_version", r"(?:system|NXOS):\s+version (.+)")?
        .field("bios_compile_time", r"BIOS compile time:\s+(.+)")?
        .field("kickstart_image_file", r"kickstart image file is:\s+(.+)")?
        .field("kickstart_compile_time", r"kickstart compile time:\s+(.+)")?
        .field("system_image_file", r"(?:system|NXOS) image file is:\s+(.+)")?
        .field("system_compile_time", r"(?:system|NXOS) compile time:\s+(.+)")?
        .field("chassis", r"cisco (.+[Cc]hassis)")?
        .field("processor_info", r"^\s*(.+CPU.* with \d+ kB of memory\.)")?
        .field("processor_board_id", r"Processor Board ID (\S+)")?
        .field("device_name", r"Device name: (\S+)")?
        .field("bootflash", r"bootflash:\s+(\d+ kB)")?
        .field("kernel_uptime", r"Kernel uptime is (.+)")?
        .field("last_reset", r"Last reset at .+ after (.+)")?
        .field("last_reset_reason", r"Reason: (.+)")?
        .field("system_version_long", r"System version: (.+)")
}

fn show_interface() -> Result<BlockRules, regex::Error> {
    BlockRules::new(r"^(?P<key>\S+) is (?P<status>up|down)")?
        .field("eth_bundle", r"Belongs to (\S+)")?
        .field("hardware_address", r"address: ([0-9a-fA-F.]+) \(bia")?
        .field("description", r"Description: (.+)")?
        .field("mtu", r"MTU (\d+) bytes")?
        .field("bandwidth", r"BW (\d+) Kbit")?
        .field("delay", r"DLY (\d+) usec")?
        .field("reliability", r"reliability (\d+/\d+)")?
        .field("txload", r"txload (\d+/\d+)")?
        .field("rxload", r"rxload (\d+/\d+)")?
        .field("encapsulation", r"Encapsulation (\w+)")?
        .field("port_mode", r"Port mode is (\S+)")?
        .field("duplex", r"(\w+-duplex)")?
        .field("speed", r", (\d+ [GM]b/s)")?
        .field("medium", r"media type is (.+)")?
        .field("input_rate_30_sec", r"30 seconds input rate (\d+) bits")?
        .field("output_rate_30_sec", r"30 seconds output rate (\d+) bits")?
        .field("input_rate_5_min", r"^\s+input rate ([\d.]+ \w*bps)")?
        .field("output_rate_5_min", r"; output rate ([\d.]+ \w*bps)")?
        .field("input_packets", r"(\d+) input packets")?
        .field("output_packets", r"(\d+) output packets")
}

fn show_interface_trunk() -> Result<MergedSections, regex::Error> {
    let sections = Sections::new()
        .section("ports", r"Port\s+Native\s+Status\s+Port")?
        .section("allowed", r"Port\s+Vlans Allowed on Trunk")?
        .optional("err_disabled", r"Port\s+Vlans Err-disabled on Trunk")?
        .optional("stp", r"Port\s+STP Forwarding")?;

    let ports = LineRules::new(
        r"^(?P<port>\S+)\s+(?P<native_vlan>\d+)\s+(?P<status>\S+)\s+(?P<port_channel>\S+)",
    )?
    .keyed_by("port");
    let allowed = LineRules::new(r"^(?P<port>\S+)\s+(?P<vlans_allowed>[\d,\-]+|none)\s*$")?.keyed_by("port");
    let err_disabled =
        LineRules::new(r"^(?P<port>\S+)\s+(?P<vlans_err_disabled>[\d,\-]+|none)\s*$")?.keyed_by("port");
    let stp = LineRules::new(r"^(?P<port>\S+)\s+(?P<stp_forwarding>[\d,\-]+|none)\s*$")?.keyed_by("port");

    Ok(MergedSections::new(sections)?
        .rows("ports", ports)
        .rows("allowed", allowed)
        .rows("err_disabled", err_disabled)
        .rows("stp", stp)
        .first_defines_rows())
}

fn show_vlan() -> Result<MergedSections, regex::Error> {
    let sections = Sections::new()
        .section("vlans", r"VLAN\s+Name\s+Status\s+Ports")?
        .optional("types", r"VLAN\s+Type\s+Vlan-mode")?
        .optional("private", r"Primary\s+Secondary\s+Type\s+Ports")?;

    let vlans = LineRules::new(r"^(?P<vlan_id>\d+)\s+(?P<name>\S+)\s+(?P<status>\S+)(?P<ports>.*)$")?
        .keyed_by("vlan_id");
    let types = LineRules::new(r"^(?P<vlan_id>\d+)\s+(?P<type>\S+)\s+(?P<mode>\S+)")?.keyed_by("vlan_id");
    let private = LineRules::new(
        r"^(?P<vlan_id>\d+)\s+(?P<secondary>\d+)\s+(?P<pvlan_type>\S+)(?P<pvlan_ports>.*)$",
    )?
    .keyed_by("vlan_id");

    Ok(MergedSections::new(sections)?
        .rows_with_list("vlans", vlans, "ports")
        .rows("types", types)
        .rows_with_list("private", private, "pvlan_ports")
        .first_defines_rows())
}

fn show_ip_arp() -> Result<LineRules, regex::Error> {
    LineRules::new(
        r"^(?P<address>\d+\.\d+\.\d+\.\d+)\s+(?P<age>\S+)\s+(?P<mac_address>[0-9a-fA-F]{4}\.[0-9a-fA-F]{4}\.[0-9a-fA-F]{4}|INCOMPLETE)\s+(?P<interface>\S+)",
    )
}

/// `show ip route vrf all`: `vrf -> prefix -> route`.
///
/// Each route keeps its best path, the first `*via` line after the prefix.
struct VrfRoutes {
    vrf: Regex,
    prefix: Regex,
    via: Regex,
}

impl VrfRoutes {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            vrf: Regex::new(r#"^IP Route Table for VRF "([^"]*)""#)?,
            prefix: Regex::new(r"^(\S+/\d+), ubest/mbest: (\d+)/(\d+)(, attached)?")?,
            via: Regex::new(
                r"^\s+\*via ([^,\s]+),(?: ([^,\s\[]+),)? \[(\d+)/(\d+)\], ([^,\s]+), ([^,\s]+)",
            )?,
        })
    }
}

impl TextParser for VrfRoutes {
    fn parse(&self, text: &str) -> Result<Tree, ParseError> {
        let mut vrfs = Node::new();
        let mut vrf: Option<String> = None;
        let mut route: Option<(String, Node)> = None;

        let flush = |vrfs: &mut Node, vrf: &Option<String>, route: Option<(String, Node)>| {
            if let (Some(vrf), Some((prefix, record))) = (vrf, route) {
                if let Some(Tree::Object(routes)) = vrfs.get_mut(vrf) {
                    routes.insert(prefix, Tree::Object(record));
                }
            }
        };

        for line in text.lines() {
            if let Some(caps) = self.vrf.captures(line) {
                flush(&mut vrfs, &vrf, route.take());
                vrfs.insert(caps[1].to_string(), Tree::Object(Node::new()));
                vrf = Some(caps[1].to_string());
            } else if let Some(caps) = self.prefix.captures(line) {
                flush(&mut vrfs, &vrf, route.take());
                let mut record = Node::new();
                record.insert("ubest".into(), Tree::from(&caps[2]));
                record.insert("mbest".into(), Tree::from(&caps[3]));
                record.insert("attached".into(), Tree::Bool(caps.get(4).is_some()));
                route = Some((caps[1].to_string(), record));
            } else if let Some(caps) = self.via.captures(line) {
                let Some((_, record)) = route.as_mut() else {
                    continue;
                };
                if record.contains_key("next_hop") {
                    continue;
                }
                let interface = caps.get(2).map_or("", |m| m.as_str());
                record.insert("next_hop".into(), Tree::from(&caps[1]));
                record.insert("interface".into(), Tree::from(interface));
                record.insert("preference".into(), Tree::from(&caps[3]));
                record.insert("metric".into(), Tree::from(&caps[4]));
                record.insert("age".into(), Tree::from(&caps[5]));
                record.insert("route_type".into(), Tree::from(&caps[6]));
            }
        }
        flush(&mut vrfs, &vrf, route.take());

        for routes in vrfs.values_mut().filter_map(Tree::as_object_mut) {
            for record in routes.values_mut().filter_map(Tree::as_object_mut) {
                crate::extract::fill_schema(
                    record,
                    ["next_hop", "interface", "preference", "metric", "age", "route_type"],
                );
            }
        }
        Ok(Tree::Object(vrfs))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::tree::{ParsedResult, Payload};

    const VERSION: &str = "\
Cisco Nexus Operating System (NX-OS) Software
Software
  BIOS: version 07.69
  NXOS: version 9.3(8)
  BIOS compile time:  04/08/2021
  NXOS image file is: bootflash:///nxos.9.3.8.bin
  NXOS compile time:  8/31/2021 12:00:00 [08/31/2021 21:46:00]

Hardware
  cisco Nexus9000 C93180YC-EX chassis
  Intel(R) Xeon(R) CPU  @ 1.80GHz with 24632252 kB of memory.
  Processor Board ID FDO21120U8N

  Device name: leaf1
  bootflash: 53298520 kB
Kernel uptime is 41 day(s), 2 hour(s), 10 minute(s), 3 second(s)

Last reset at 145289 usecs after Mon Sep  6 10:12:01 2021
  Reason: Reset Requested by CLI command reload
";

    const INTERFACE: &str = "\
Ethernet1/1 is up
admin state is up, Dedicated Interface
  Belongs to Po1
  Hardware: 100/1000/10000/25000 Ethernet, address: 00fe.c8d1.2a08 (bia 00fe.c8d1.2a08)
  Description: server-01
  MTU 9216 bytes, BW 10000000 Kbit, DLY 10 usec
  reliability 255/255, txload 1/255, rxload 1/255
  Encapsulation ARPA, medium is broadcast
  Port mode is trunk
  full-duplex, 10 Gb/s, media type is 10G
  Load-Interval #1: 30 seconds
    30 seconds input rate 2488 bits/sec, 2 packets/sec
    30 seconds output rate 5096 bits/sec, 4 packets/sec
  Load-Interval #2: 5 minute (300 seconds)
    input rate 2.39 Kbps, 2 pps; output rate 4.88 Kbps, 4 pps
  RX
    1843913 unicast packets  2230 multicast packets  14 broadcast packets
    1846157 input packets  300451839 bytes
  TX
    3126545 output packets  498510293 bytes
mgmt0 is up
admin state is up,
  Hardware: GigabitEthernet, address: 00fe.c8d1.2a00 (bia 00fe.c8d1.2a00)
  MTU 1500 bytes, BW 1000000 Kbit, DLY 10 usec
";

    const TRUNK: &str = "\
--------------------------------------------------------------------------------
Port          Native  Status        Port
              Vlan                  Channel
--------------------------------------------------------------------------------
Eth1/49       1       trnk-bndl     Po1
Po1           1       trunking      --

--------------------------------------------------------------------------------
Port          Vlans Allowed on Trunk
--------------------------------------------------------------------------------
Eth1/49       1-4094
Po1           1,10,20

--------------------------------------------------------------------------------
Port          Vlans Err-disabled on Trunk
--------------------------------------------------------------------------------
Eth1/49       none
Po1           none

--------------------------------------------------------------------------------
Port          STP Forwarding
--------------------------------------------------------------------------------
Eth1/49       none
Po1           1,10,20
";

    const ROUTES: &str = r#"IP Route Table for VRF "default"
'*' denotes best ucast next-hop
'**' denotes best mcast next-hop

0.0.0.0/0, ubest/mbest: 1/0
    *via 10.0.0.1, Eth1/49, [110/41], 3d02h, ospf-1, type-2
10.1.1.0/24, ubest/mbest: 1/0, attached
    *via 10.1.1.1, Vlan10, [0/0], 1w2d, direct
10.9.0.0/16, ubest/mbest: 2/0
    *via 10.0.0.5, [20/0], 2d01h, bgp-65000, external, tag 65001
    *via 10.0.0.6, [20/0], 2d01h, bgp-65000, external, tag 65001

IP Route Table for VRF "management"
'*' denotes best ucast next-hop

0.0.0.0/0, ubest/mbest: 1/0
    *via 192.168.0.1, [1/0], 40w1d, static
"#;

    fn registry() -> ParserRegistry {
        ParserRegistry::builtin().unwrap()
    }

    fn parse(command: &str, text: &str) -> Tree {
        match registry()
            .dispatch(OsFamily::Nxos, command, Payload::Text(text.to_string()))
            .unwrap()
        {
            ParsedResult::Value(tree) => tree,
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_show_version() {
        let tree = parse("show version", VERSION);
        assert_eq!(tree["bios_version"], "07.69");
        assert_eq!(tree["system_version"], "9.3(8)");
        assert_eq!(tree["system_image_file"], "bootflash:///nxos.9.3.8.bin");
        assert_eq!(tree["chassis"], "Nexus9000 C93180YC-EX chassis");
        assert_eq!(tree["processor_board_id"], "FDO21120U8N");
        assert_eq!(tree["device_name"], "leaf1");
        assert_eq!(tree["bootflash"], "53298520 kB");
        assert_eq!(tree["last_reset_reason"], "Reset Requested by CLI command reload");
        assert_eq!(tree["kickstart_version"], "");
        assert_eq!(tree.as_object().unwrap().len(), 18);
    }

    #[test]
    fn test_show_interface() {
        let tree = parse("show interface", INTERFACE);
        let interfaces = tree["interfaces"].as_object().unwrap();
        assert_eq!(interfaces.len(), 2);

        let eth = &tree["interfaces"]["Ethernet1/1"];
        assert_eq!(eth["status"], "up");
        assert_eq!(eth["eth_bundle"], "Po1");
        assert_eq!(eth["hardware_address"], "00fe.c8d1.2a08");
        assert_eq!(eth["mtu"], "9216");
        assert_eq!(eth["rxload"], "1/255");
        assert_eq!(eth["encapsulation"], "ARPA");
        assert_eq!(eth["speed"], "10 Gb/s");
        assert_eq!(eth["input_rate_30_sec"], "2488");
        assert_eq!(eth["input_rate_5_min"], "2.39 Kbps");
        assert_eq!(eth["output_rate_5_min"], "4.88 Kbps");
        assert_eq!(eth["input_packets"], "1846157");

        let mgmt = &tree["interfaces"]["mgmt0"];
        assert_eq!(mgmt["mtu"], "1500");
        assert_eq!(mgmt["eth_bundle"], "");
        assert_eq!(
            mgmt.as_object().unwrap().len(),
            eth.as_object().unwrap().len()
        );
    }

    #[test]
    fn test_show_interface_trunk() {
        let tree = parse("show interface trunk", TRUNK);
        assert_eq!(
            tree["Eth1/49"],
            json!({
                "native_vlan": "1",
                "status": "trnk-bndl",
                "port_channel": "Po1",
                "vlans_allowed": "1-4094",
                "vlans_err_disabled": "none",
                "stp_forwarding": "none",
            })
        );
        assert_eq!(tree["Po1"]["stp_forwarding"], "1,10,20");
        assert_eq!(tree.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_show_vlan_missing_header() {
        let result = registry()
            .dispatch(OsFamily::Nxos, "show vlan", Payload::Text("garbage".into()))
            .unwrap();
        assert_eq!(
            result,
            ParsedResult::failed("show vlan", "Section 'vlans' not found")
        );
    }

    #[test]
    fn test_show_vlan_private_ports() {
        let text = "\
VLAN Name                             Status    Ports
---- -------------------------------- --------- -------------------------------
1    default                          active    Eth1/1
100  primary                          active    Eth1/5, Eth1/6
101  isolated                         active

VLAN Type         Vlan-mode
---- -----        ----------
1    enet         CE
100  enet         CE
101  enet         CE

Primary  Secondary  Type             Ports
-------  ---------  ---------------  -------------------------------------------
100      101        isolated         Eth1/5
";
        let tree = parse("show vlan", text);
        assert_eq!(tree["100"]["ports"], json!(["Eth1/5", "Eth1/6"]));
        assert_eq!(tree["100"]["secondary"], "101");
        assert_eq!(tree["100"]["pvlan_ports"], json!(["Eth1/5"]));

        // Lists stay lists when a VLAN has no entries
        assert_eq!(tree["101"]["ports"], json!([]));
        assert_eq!(tree["1"]["pvlan_ports"], json!([]));
        assert_eq!(tree["1"]["secondary"], "");
    }

    #[test]
    fn test_show_ip_arp() {
        let text = "\
Flags: * - Adjacencies learnt on non-active FHRP router

IP ARP Table for context default
Total number of entries: 2
Address         Age       MAC Address     Interface       Flags
10.1.1.20       00:12:41  0050.56a1.0014  Vlan10
10.1.1.30       00:00:05  INCOMPLETE      Vlan10
";
        let tree = parse("show ip arp", text);
        assert_eq!(
            tree,
            json!([
                {"address": "10.1.1.20", "age": "00:12:41", "mac_address": "0050.56a1.0014", "interface": "Vlan10"},
                {"address": "10.1.1.30", "age": "00:00:05", "mac_address": "INCOMPLETE", "interface": "Vlan10"},
            ])
        );
    }

    #[test]
    fn test_show_ip_route_vrf_all() {
        let tree = parse("show ip route vrf all", ROUTES);
        assert_eq!(
            tree["default"]["0.0.0.0/0"],
            json!({
                "ubest": "1",
                "mbest": "0",
                "attached": false,
                "next_hop": "10.0.0.1",
                "interface": "Eth1/49",
                "preference": "110",
                "metric": "41",
                "age": "3d02h",
                "route_type": "ospf-1",
            })
        );
        assert_eq!(tree["default"]["10.1.1.0/24"]["attached"], true);
        assert_eq!(tree["default"]["10.1.1.0/24"]["route_type"], "direct");

        // Best path only, no interface on recursive routes
        assert_eq!(tree["default"]["10.9.0.0/16"]["next_hop"], "10.0.0.5");
        assert_eq!(tree["default"]["10.9.0.0/16"]["interface"], "");

        assert_eq!(tree["management"]["0.0.0.0/0"]["next_hop"], "192.168.0.1");
        assert_eq!(tree["management"]["0.0.0.0/0"]["route_type"], "static");
    }

    #[test]
    fn test_json_only_commands() {
        let registry = registry();
        let result = registry
            .dispatch(OsFamily::Nxos, "show hsrp", Payload::Text("Vlan10 - Group 10".into()))
            .unwrap();
        assert_eq!(
            result,
            ParsedResult::Unsupported {
                command: "show hsrp".into()
            }
        );

        let decoded = Payload::Decoded(json!({"TABLE_grp_detail": {"ROW_grp_detail": {"sh_if_index": "Vlan10"}}}));
        let result = registry.dispatch(OsFamily::Nxos, "show hsrp", decoded).unwrap();
        assert_eq!(result, ParsedResult::Value(json!({"grp_detail": {"sh_if_index": "Vlan10"}})));
    }
}
