//! Command execution on a live device.
//!
//! A [`Driver`] owns one interactive session: it sends a command, waits for
//! the prompt and hands back a [`Response`] with the echo and prompt
//! stripped. Device collection only talks to this trait, so tests can swap
//! the SSH driver for a scripted one.

mod builder;
mod generic;
mod response;

pub use builder::DriverBuilder;
pub use generic::GenericDriver;
pub use response::Response;

use std::future::Future;

use crate::error::Result;

/// Trait for device drivers.
pub trait Driver: Send {
    /// Open the connection to the device.
    fn open(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Close the connection.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Send a command and wait for the prompt.
    fn send_command(&mut self, command: &str) -> impl Future<Output = Result<Response>> + Send;

    /// Send multiple commands sequentially.
    fn send_commands(
        &mut self,
        commands: &[&str],
    ) -> impl Future<Output = Result<Vec<Response>>> + Send {
        async move {
            let mut responses = Vec::with_capacity(commands.len());
            for cmd in commands {
                responses.push(self.send_command(cmd).await?);
            }
            Ok(responses)
        }
    }

    /// Check if the driver is connected.
    fn is_open(&self) -> bool;
}
