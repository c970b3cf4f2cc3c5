//! Registry of command parsers per OS family.
//!
//! The registry is an explicit value, built once at startup and shared by
//! reference with every device task:
//!
//! ```rust
//! use netject::parsers::ParserRegistry;
//! use netject::platform::OsFamily;
//! use netject::tree::{ParsedResult, Payload};
//!
//! let registry = ParserRegistry::builtin()?;
//! registry.validate(OsFamily::Nxos, ["show version", "show vlan"])?;
//!
//! let result = registry.dispatch(
//!     OsFamily::Nxos,
//!     "show version",
//!     Payload::Text("  NXOS: version 9.3(8)\n".into()),
//! )?;
//! assert!(matches!(result, ParsedResult::Value(_)));
//! # Ok::<(), netject::error::ConfigError>(())
//! ```

mod common;
pub mod ios;
pub mod nxos;

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;

use crate::error::ConfigError;
use crate::extract::TextParser;
use crate::normalize::normalize;
use crate::platform::OsFamily;
use crate::tree::{ParsedResult, Payload};

/// Parser registered for one command.
#[derive(Clone)]
pub enum CommandParser {
    /// Text output is extracted by this parser.
    Text(Arc<dyn TextParser>),
    /// The command is known but its text output has no parser yet.
    Unsupported,
}

impl std::fmt::Debug for CommandParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandParser::Text(_) => f.write_str("Text(..)"),
            CommandParser::Unsupported => f.write_str("Unsupported"),
        }
    }
}

/// Mapping from `(OS family, command)` to its parser.
#[derive(Debug, Clone, Default)]
pub struct ParserRegistry {
    parsers: HashMap<OsFamily, IndexMap<String, CommandParser>>,
}

impl ParserRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in NX-OS and IOS parser.
    pub fn builtin() -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        nxos::register(&mut registry)?;
        ios::register(&mut registry)?;
        Ok(registry)
    }

    /// Register a text parser for `command`.
    pub fn register(
        &mut self,
        os: OsFamily,
        command: &str,
        parser: impl TextParser + 'static,
    ) -> Result<(), ConfigError> {
        self.insert(os, command, CommandParser::Text(Arc::new(parser)))
    }

    /// Register `command` without a text parser.
    pub fn register_unsupported(&mut self, os: OsFamily, command: &str) -> Result<(), ConfigError> {
        self.insert(os, command, CommandParser::Unsupported)
    }

    fn insert(&mut self, os: OsFamily, command: &str, parser: CommandParser) -> Result<(), ConfigError> {
        let commands = self.parsers.entry(os).or_default();
        if commands.contains_key(command) {
            return Err(ConfigError::AlreadyRegistered {
                command: command.to_string(),
                os,
            });
        }
        commands.insert(command.to_string(), parser);
        Ok(())
    }

    /// Get the parser for a command.
    pub fn get(&self, os: OsFamily, command: &str) -> Option<&CommandParser> {
        self.parsers.get(&os)?.get(command)
    }

    /// Check if a command is registered.
    pub fn contains(&self, os: OsFamily, command: &str) -> bool {
        self.get(os, command).is_some()
    }

    /// Registered commands of `os`, in registration order.
    pub fn commands(&self, os: OsFamily) -> impl Iterator<Item = &str> {
        self.parsers
            .get(&os)
            .into_iter()
            .flat_map(|commands| commands.keys().map(String::as_str))
    }

    /// Check that every requested command is registered for `os`.
    ///
    /// Run before any device I/O; the first unknown command is reported.
    pub fn validate<I, S>(&self, os: OsFamily, commands: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for command in commands {
            let command = command.as_ref();
            if !self.contains(os, command) {
                return Err(ConfigError::UnsupportedCommand {
                    command: command.to_string(),
                    os,
                });
            }
        }
        Ok(())
    }

    /// Turn one command's payload into its result.
    ///
    /// Decoded JSON always goes through the table normalizer. Text goes to
    /// the registered parser; an extraction failure becomes a scoped
    /// [`ParsedResult::Failed`]. Only an unregistered command is an error.
    pub fn dispatch(
        &self,
        os: OsFamily,
        command: &str,
        payload: Payload,
    ) -> Result<ParsedResult, ConfigError> {
        let parser = self
            .get(os, command)
            .ok_or_else(|| ConfigError::UnsupportedCommand {
                command: command.to_string(),
                os,
            })?;

        let result = match (payload, parser) {
            (Payload::Decoded(tree), _) => ParsedResult::Value(normalize(&tree)),
            (Payload::Text(_), CommandParser::Unsupported) => ParsedResult::Unsupported {
                command: command.to_string(),
            },
            (Payload::Text(text), CommandParser::Text(parser)) => match parser.parse(&text) {
                Ok(tree) => ParsedResult::Value(tree),
                Err(e) => {
                    debug!("{os} '{command}' extraction failed: {e}");
                    ParsedResult::failed(command, e)
                }
            },
        };
        Ok(result)
    }
}
