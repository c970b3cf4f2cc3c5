//! Platform definitions for the supported switch operating systems.
//!
//! This module defines per-OS session behavior (prompt pattern, failure
//! strings, paging setup) and the JSON capabilities of each OS family.

mod definition;
pub mod vendors;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use definition::PlatformDefinition;

/// Operating system family of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    /// Cisco NX-OS (Nexus).
    #[default]
    Nxos,
    /// Cisco IOS / IOS-XE.
    Ios,
}

impl OsFamily {
    /// Lowercase configuration name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OsFamily::Nxos => "nxos",
            OsFamily::Ios => "ios",
        }
    }

    /// Built-in platform definition for this family.
    pub fn platform(&self) -> Result<PlatformDefinition, regex::Error> {
        match self {
            OsFamily::Nxos => vendors::cisco_nxos::platform(),
            OsFamily::Ios => vendors::cisco_ios::platform(),
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OsFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nxos" => Ok(OsFamily::Nxos),
            "ios" => Ok(OsFamily::Ios),
            other => Err(format!("unknown OS type '{other}' (expected nxos or ios)")),
        }
    }
}

/// Format in which command output is requested from a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Vendor JSON, normalized by the table normalizer.
    #[default]
    Json,
    /// Screen text, parsed by the registered field extractors.
    Text,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "text" => Ok(OutputFormat::Text),
            other => Err(format!("unknown output format '{other}' (expected json or text)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_family_parse() {
        assert_eq!("NXOS".parse::<OsFamily>().unwrap(), OsFamily::Nxos);
        assert_eq!("ios".parse::<OsFamily>().unwrap(), OsFamily::Ios);
        assert!("junos".parse::<OsFamily>().is_err());
        assert_eq!(OsFamily::Ios.to_string(), "ios");
    }

    #[test]
    fn test_output_format_serde() {
        let format: OutputFormat = serde_yaml::from_str("text").unwrap();
        assert_eq!(format, OutputFormat::Text);
        assert_eq!(OutputFormat::default(), OutputFormat::Json);
    }
}
