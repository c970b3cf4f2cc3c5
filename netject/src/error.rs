//! Error types for netject.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::platform::OsFamily;

/// Main error type for netject operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Inventory and registry configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Failure while turning command output into a tree
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Output file errors
    #[error("Output error writing {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host is not present in known_hosts and verification is strict
    #[error("Host key for {host}:{port} is unknown")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Driver layer errors (command execution).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Driver not connected
    #[error("Driver not connected - call open() first")]
    NotConnected,

    /// Driver already connected
    #[error("Driver already connected")]
    AlreadyConnected,

    /// Device rejected a command the driver depends on
    #[error("Command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },

    /// Shell channel closed by the device
    #[error("Channel closed by the device")]
    ChannelClosed,

    /// Prompt was not seen before the deadline
    #[error("Prompt not found within {0:?}")]
    PromptTimeout(std::time::Duration),

    /// Invalid configuration in the driver builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Configuration errors, raised before any device I/O happens.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Command requested for an OS family that has no parser for it
    #[error("Command '{command}' is not supported in {os}")]
    UnsupportedCommand { command: String, os: OsFamily },

    /// JSON output requested from an OS family that cannot produce it
    #[error("{os} does not support JSON output format")]
    JsonUnsupported { os: OsFamily },

    /// Device entry has neither an address nor a file
    #[error("No 'address' or 'file' key is found in device entry #{index}")]
    MissingSource { index: usize },

    /// Device entry has both an address and a file
    #[error("Device entry #{index} has both 'address' and 'file'")]
    AmbiguousSource { index: usize },

    /// Live device without a username
    #[error("No 'username' key is found for device {device}")]
    MissingUsername { device: String },

    /// Live device without a password or key file
    #[error("No 'password' or 'key_file' is given for device {device}")]
    MissingCredentials { device: String },

    /// Inventory holds no devices
    #[error("No devices are provided")]
    NoDevices,

    /// Inventory file could not be located
    #[error("NetJect-config.yaml file is not found in {0}")]
    InventoryNotFound(PathBuf),

    /// Parser registered twice for the same command
    #[error("Parser for '{command}' is already registered in {os}")]
    AlreadyRegistered { command: String, os: OsFamily },

    /// Built-in rule set failed to compile
    #[error("Invalid rule pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// YAML syntax or schema error
    #[error("Invalid inventory: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O error while reading the inventory or a transcript
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors raised while extracting or normalizing a single command's output.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Fixed-column table header was not found
    #[error("Header line not found: {header}")]
    HeaderNotFound { header: String },

    /// A header-delimited section was not found
    #[error("Section '{section}' not found")]
    SectionNotFound { section: String },

    /// Column label missing from the detected header line
    #[error("Column '{label}' not found in header line")]
    MissingColumn { label: String },

    /// Column labels appear out of the declared order
    #[error("Column '{label}' appears before the preceding column")]
    UnorderedColumns { label: String },

    /// Zip input value is not a sequence of mappings
    #[error("Value of '{key}' is not a table")]
    NotATable { key: String },

    /// Parser panicked while scanning the payload
    #[error("Parser panicked: {0}")]
    Panicked(String),
}

/// Result type alias using netject's Error.
pub type Result<T> = std::result::Result<T, Error>;
