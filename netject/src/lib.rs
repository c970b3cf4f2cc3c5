//! # NetJect
//!
//! Network JSON Object: poll Cisco NX-OS and IOS switches over SSH and turn
//! their `show` command output into plain JSON documents.
//!
//! ## Features
//!
//! - Async SSH sessions via russh, with prompt detection on a tail buffer
//! - Vendor JSON normalization (`TABLE_`/`ROW_` wrappers removed) and
//!   positional joins of parallel tables
//! - Regex and fixed-column extractors for screen text output
//! - Offline parsing of saved multi-command transcripts
//! - Concurrent device runs, one JSON document per device
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use netject::config::Inventory;
//! use netject::parsers::ParserRegistry;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netject::Error> {
//!     let registry = ParserRegistry::builtin()?;
//!     let devices = Inventory::load("NetJect-config.yaml".as_ref())?.resolve(&registry)?;
//!
//!     for report in netject::collect::run_batch(devices, Arc::new(registry)).await {
//!         println!("{}: {}", report.key, if report.is_success() { "ok" } else { "failed" });
//!     }
//!     Ok(())
//! }
//! ```

pub mod collect;
pub mod config;
pub mod driver;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod output;
pub mod parsers;
pub mod platform;
pub mod segment;
pub mod transport;
pub mod tree;

// Re-export main types for convenience
pub use collect::{DeviceReport, run_batch};
pub use driver::{Driver, DriverBuilder, GenericDriver, Response};
pub use error::Error;
pub use parsers::ParserRegistry;
pub use platform::{OsFamily, OutputFormat, PlatformDefinition};
pub use transport::{AuthMethod, SshConfig};
pub use tree::{ParsedResult, Payload, Tree};
