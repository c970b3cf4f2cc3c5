//! Cisco IOS / IOS-XE platform definition.
//!
//! # Prompt Examples
//!
//! ```text
//! access-sw1>                # user exec
//! access-sw1#                # privileged exec
//! ```
//!
//! IOS has no JSON pipe for show commands; devices of this family are
//! collected in text mode only.

use crate::platform::{OsFamily, PlatformDefinition};

const PROMPT: &str = r"(?mi)^[\w.\-@/:]{1,63}[>#]\s?$";

/// Create the Cisco IOS platform definition.
pub fn platform() -> Result<PlatformDefinition, regex::Error> {
    Ok(PlatformDefinition::new("cisco_iosxe", OsFamily::Ios, PROMPT)?
        .with_failure_pattern("% Invalid input")
        .with_failure_pattern("% Invalid command")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Ambiguous command")
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 511")
        .with_terminal_size(511, 24))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ios_platform() {
        let platform = platform().unwrap();
        assert_eq!(platform.name, "cisco_iosxe");
        assert_eq!(platform.os, OsFamily::Ios);
        assert!(!platform.supports_json());
        assert_eq!(platform.json_command("show version"), None);
        assert!(platform.zipped_commands.is_empty());
    }

    #[test]
    fn test_prompt_match() {
        let platform = platform().unwrap();
        assert!(platform.prompt_pattern.is_match(b"access-sw1>"));
        assert!(platform.prompt_pattern.is_match(b"access-sw1#"));
        assert!(!platform.prompt_pattern.is_match(b"access-sw1(config-if)#"));
    }

    #[test]
    fn test_failure_patterns() {
        let platform = platform().unwrap();
        assert_eq!(
            platform.detect_failure("% Invalid input detected at '^' marker."),
            Some("% Invalid input")
        );
        assert_eq!(platform.detect_failure("Vlan10 is up"), None);
    }
}
