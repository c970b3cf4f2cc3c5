//! SSH transport layer wrapping russh.
//!
//! This module owns the connection to one device: handshake, host key
//! verification, authentication, and the interactive PTY shell channel
//! that commands are written to and prompts are read back from.

mod buffer;
pub mod config;
mod ssh;

pub use buffer::PatternBuffer;
pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use ssh::SshTransport;
