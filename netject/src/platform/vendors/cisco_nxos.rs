//! Cisco NX-OS platform definition.
//!
//! Sessions stay at the login privilege; NX-OS lands users with the
//! `network-operator` or `network-admin` role directly at a `#` prompt.
//!
//! # Prompt Examples
//!
//! ```text
//! leaf1#                     # exec
//! leaf1.lab.local#           # exec, domain in hostname
//! leaf1>                     # restricted exec
//! ```
//!
//! Show commands accept `| json`, so every registered command can be
//! requested as structured output. `show interface trunk` and `show vlan`
//! return several parallel tables that are zipped into one list of rows
//! after normalization.

use crate::platform::{OsFamily, PlatformDefinition};

/// Prompt pattern shared by exec and restricted exec.
const PROMPT: &str = r"(?mi)^[\w.\-@/:]{1,63}[>#]\s?$";

/// Create the Cisco NX-OS platform definition.
pub fn platform() -> Result<PlatformDefinition, regex::Error> {
    Ok(PlatformDefinition::new("cisco_nxos", OsFamily::Nxos, PROMPT)?
        .with_failure_pattern("% Invalid command")
        .with_failure_pattern("% Invalid input")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Ambiguous command")
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 511")
        .with_terminal_size(511, 24)
        .with_json_pipe("| json")
        .with_zipped_command("show interface trunk")
        .with_zipped_command("show vlan"))
}
