//! Device inventory loaded from `NetJect-config.yaml`.
//!
//! The inventory has global defaults at the top level and a `devices` list.
//! Each device either has an `address` (collected live over SSH) or a `file`
//! (a saved transcript parsed offline). Every setting is looked up on the
//! device first, then at the top level, then falls back to a built-in default.
//!
//! ```yaml
//! username: admin
//! password: secret
//! os_type: nxos
//! cli_output_format: json
//! output_path: ./out
//! devices:
//!   - address: 10.0.0.1
//!   - address: 10.0.0.2
//!     os_type: ios
//!     cli_output_format: text
//!   - file: captures/leaf3.txt
//!     commands: [show version, show vlan]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;
use crate::parsers::ParserRegistry;
use crate::platform::{OsFamily, OutputFormat};
use crate::segment::SegmentMode;
use crate::transport::HostKeyVerification;

/// Inventory file name looked up in a config directory.
pub const INVENTORY_FILE: &str = "NetJect-config.yaml";

/// Settings shared by the top level and each device entry.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    pub username: Option<String>,
    #[serde(default, deserialize_with = "secret")]
    pub password: Option<SecretString>,
    pub key_file: Option<PathBuf>,
    pub port: Option<u16>,
    pub os_type: Option<OsFamily>,
    pub cli_output_format: Option<OutputFormat>,
    pub output_path: Option<PathBuf>,
    pub commands: Option<Vec<String>>,
    pub segment_mode: Option<SegmentMode>,
    pub save_transcript: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub host_key_verification: Option<HostKeyVerification>,
}

fn secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

/// One `devices` entry as written in the file.
#[derive(Debug, Default, Deserialize)]
pub struct DeviceEntry {
    pub address: Option<String>,
    pub file: Option<PathBuf>,
    #[serde(flatten)]
    pub settings: Settings,
}

/// The raw inventory document.
#[derive(Debug, Default, Deserialize)]
pub struct Inventory {
    #[serde(flatten)]
    pub defaults: Settings,
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
}

/// Where a device's output comes from.
#[derive(Debug)]
pub enum Source {
    /// Live SSH session.
    Live(LiveTarget),
    /// Saved multi-command transcript.
    File(PathBuf),
}

/// Connection details of a live device.
#[derive(Debug)]
pub struct LiveTarget {
    pub address: String,
    pub port: u16,
    pub username: String,
    pub password: Option<SecretString>,
    pub key_file: Option<PathBuf>,
    pub timeout: Duration,
    pub host_key_verification: HostKeyVerification,
}

/// A device with every setting resolved.
#[derive(Debug)]
pub struct Device {
    pub source: Source,
    pub os: OsFamily,
    pub format: OutputFormat,
    pub output_path: PathBuf,
    pub commands: Vec<String>,
    pub segment_mode: SegmentMode,
    pub save_transcript: bool,
}

/// An inventory entry that failed validation.
///
/// It is reported like a failed device, so the rest of the batch still runs.
#[derive(Debug)]
pub struct InvalidDevice {
    /// Address, file path or `device #<n>` when the entry has neither.
    pub name: String,
    /// Where the failure report is written.
    pub output_path: PathBuf,
    pub error: ConfigError,
}

/// Outcome of resolving one inventory entry.
pub type Resolved = Result<Device, InvalidDevice>;

impl DeviceEntry {
    fn name(&self, index: usize) -> String {
        match (&self.address, &self.file) {
            (Some(address), _) => address.clone(),
            (None, Some(file)) => file.display().to_string(),
            (None, None) => format!("device #{}", index + 1),
        }
    }
}

impl Device {
    /// Address or transcript path, used in logs and failure reports.
    pub fn name(&self) -> String {
        match &self.source {
            Source::Live(target) => target.address.clone(),
            Source::File(path) => path.display().to_string(),
        }
    }
}

impl Inventory {
    /// Parse an inventory document.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        // An empty document is an inventory without devices
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load from a YAML file, or from `NetJect-config.yaml` inside a directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = if path.is_dir() {
            path.join(INVENTORY_FILE)
        } else {
            path.to_path_buf()
        };
        if !file.is_file() {
            return Err(ConfigError::InventoryNotFound(path.to_path_buf()));
        }

        debug!("Loading inventory from {}", file.display());
        let text = std::fs::read_to_string(&file).map_err(|source| ConfigError::Read {
            path: file.clone(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Inventory of live devices given by address and transcripts given by path.
    pub fn from_sources(addresses: Vec<String>, files: Vec<PathBuf>) -> Self {
        let devices = addresses
            .into_iter()
            .map(|address| DeviceEntry {
                address: Some(address),
                ..Default::default()
            })
            .chain(files.into_iter().map(|file| DeviceEntry {
                file: Some(file),
                ..Default::default()
            }))
            .collect();
        Self {
            defaults: Settings::default(),
            devices,
        }
    }

    /// Apply every device's defaults and validate each entry on its own.
    ///
    /// A device without commands gets every command registered for its OS
    /// family. An invalid entry comes back as [`InvalidDevice`] in its slot;
    /// only an inventory without devices fails as a whole.
    pub fn resolve(self, registry: &ParserRegistry) -> Result<Vec<Resolved>, ConfigError> {
        if self.devices.is_empty() {
            return Err(ConfigError::NoDevices);
        }

        let defaults = self.defaults;
        let resolved = self
            .devices
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                let name = entry.name(index);
                let output_path = output_path(&entry.settings, &defaults);
                resolve_device(index, entry, &defaults, registry).map_err(|error| {
                    warn!("Skipping {name}: {error}");
                    InvalidDevice {
                        name,
                        output_path,
                        error,
                    }
                })
            })
            .collect();
        Ok(resolved)
    }
}

fn resolve_device(
    index: usize,
    entry: DeviceEntry,
    defaults: &Settings,
    registry: &ParserRegistry,
) -> Result<Device, ConfigError> {
    let DeviceEntry {
        address,
        file,
        settings,
    } = entry;

    let os = settings.os_type.or(defaults.os_type).unwrap_or_default();
    let format = settings
        .cli_output_format
        .or(defaults.cli_output_format)
        .unwrap_or_default();
    if format == OutputFormat::Json && os == OsFamily::Ios {
        return Err(ConfigError::JsonUnsupported { os });
    }

    let source = match (address, file) {
        (Some(address), None) => Source::Live(live_target(address, settings.clone_connection(), defaults)?),
        (None, Some(file)) => Source::File(file),
        (None, None) => return Err(ConfigError::MissingSource { index }),
        (Some(_), Some(_)) => return Err(ConfigError::AmbiguousSource { index }),
    };

    let commands = settings
        .commands
        .clone()
        .or_else(|| defaults.commands.clone())
        .unwrap_or_else(|| registry.commands(os).map(str::to_string).collect());

    Ok(Device {
        source,
        os,
        format,
        output_path: output_path(&settings, defaults),
        commands,
        segment_mode: settings
            .segment_mode
            .or(defaults.segment_mode)
            .unwrap_or_default(),
        save_transcript: settings
            .save_transcript
            .or(defaults.save_transcript)
            .unwrap_or(true),
    })
}

fn output_path(own: &Settings, defaults: &Settings) -> PathBuf {
    own.output_path
        .clone()
        .or_else(|| defaults.output_path.clone())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Connection-only settings of an entry.
struct Connection {
    username: Option<String>,
    password: Option<SecretString>,
    key_file: Option<PathBuf>,
    port: Option<u16>,
    timeout_secs: Option<u64>,
    host_key_verification: Option<HostKeyVerification>,
}

impl Settings {
    fn clone_connection(&self) -> Connection {
        Connection {
            username: self.username.clone(),
            password: self.password.as_ref().map(copy_secret),
            key_file: self.key_file.clone(),
            port: self.port,
            timeout_secs: self.timeout_secs,
            host_key_verification: self.host_key_verification,
        }
    }
}

fn copy_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret())
}

fn live_target(address: String, own: Connection, defaults: &Settings) -> Result<LiveTarget, ConfigError> {
    let username = own
        .username
        .or_else(|| defaults.username.clone())
        .ok_or_else(|| ConfigError::MissingUsername {
            device: address.clone(),
        })?;
    let password = own
        .password
        .or_else(|| defaults.password.as_ref().map(copy_secret));
    let key_file = own.key_file.or_else(|| defaults.key_file.clone());
    if password.is_none() && key_file.is_none() {
        return Err(ConfigError::MissingCredentials { device: address });
    }

    Ok(LiveTarget {
        port: own.port.or(defaults.port).unwrap_or(22),
        username,
        password,
        key_file,
        timeout: Duration::from_secs(own.timeout_secs.or(defaults.timeout_secs).unwrap_or(30)),
        host_key_verification: own
            .host_key_verification
            .or(defaults.host_key_verification)
            .unwrap_or_default(),
        address,
    })
}
