//! SSH driver for any platform definition.

use std::time::{Duration, Instant};

use log::{debug, warn};

use super::Driver;
use super::response::Response;
use crate::error::{DriverError, Result};
use crate::platform::PlatformDefinition;
use crate::transport::{SshConfig, SshTransport};

/// Driver running one interactive shell over [`SshTransport`].
///
/// On open it waits for the first prompt and sends the platform's on-open
/// commands (paging off, wide terminal). Each command is then sent on its
/// own and read until the prompt comes back.
pub struct GenericDriver {
    /// SSH configuration.
    ssh_config: SshConfig,

    /// Platform definition.
    platform: PlatformDefinition,

    /// SSH transport (None when disconnected).
    transport: Option<SshTransport>,

    /// Prompt timeout per command.
    timeout: Duration,
}

impl GenericDriver {
    /// Create a new driver; nothing is connected until [`Driver::open`].
    pub fn new(ssh_config: SshConfig, platform: PlatformDefinition) -> Self {
        let timeout = ssh_config.timeout;
        Self {
            ssh_config,
            platform,
            transport: None,
            timeout,
        }
    }

    /// Get a reference to the platform definition.
    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    /// Get the SSH configuration.
    pub fn ssh_config(&self) -> &SshConfig {
        &self.ssh_config
    }

    /// Set the prompt timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Read until the prompt and split off the prompt text.
    async fn read_until_prompt(&mut self) -> Result<(String, String)> {
        let transport = self.transport.as_mut().ok_or(DriverError::NotConnected)?;

        let data = transport
            .read_until_pattern(&self.platform.prompt_pattern, self.timeout)
            .await?;

        let output = String::from_utf8_lossy(&data).to_string();
        let prompt = self
            .platform
            .prompt_pattern
            .find_iter(&data)
            .last()
            .map(|m| String::from_utf8_lossy(m.as_bytes()).trim().to_string())
            .unwrap_or_default();

        Ok((output, prompt))
    }

    async fn execute_on_open_commands(&mut self) -> Result<()> {
        for cmd in self.platform.on_open_commands.clone() {
            let response = self.send_command(&cmd).await?;
            if let Some(failure) = response.failure_message {
                warn!("{}: '{}' rejected: {}", self.ssh_config.host, cmd, failure);
            }
        }
        Ok(())
    }
}

impl Driver for GenericDriver {
    async fn open(&mut self) -> Result<()> {
        if self.transport.is_some() {
            return Err(DriverError::AlreadyConnected.into());
        }

        let transport = SshTransport::connect(&self.ssh_config).await?;
        self.transport = Some(transport);

        let (_, prompt) = self.read_until_prompt().await?;
        debug!("{}: initial prompt {:?}", self.ssh_config.host, prompt);

        self.execute_on_open_commands().await
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(transport) = self.transport.take() {
            transport.close().await?;
        }
        Ok(())
    }

    async fn send_command(&mut self, command: &str) -> Result<Response> {
        let start = Instant::now();
        self.transport
            .as_mut()
            .ok_or(DriverError::NotConnected)?
            .send(command)
            .await?;

        let (raw_result, prompt) = self.read_until_prompt().await?;
        let elapsed = start.elapsed();
        debug!(
            "{}: '{}' returned {} bytes in {:?}",
            self.ssh_config.host,
            command,
            raw_result.len(),
            elapsed
        );

        let result = self.platform.normalize_output(&raw_result, command);
        let failure = self.platform.detect_failure(&result).map(str::to_string);

        let response = Response::new(command, result, raw_result, prompt, elapsed);
        Ok(match failure {
            Some(message) => response.with_failure(message),
            None => response,
        })
    }

    fn is_open(&self) -> bool {
        self.transport.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::platform::OsFamily;
    use crate::transport::AuthMethod;

    fn driver() -> GenericDriver {
        let config = SshConfig::new("192.0.2.10", "admin", AuthMethod::None);
        GenericDriver::new(config, OsFamily::Nxos.platform().unwrap())
    }

    #[tokio::test]
    async fn test_send_before_open() {
        let mut driver = driver();
        assert!(!driver.is_open());

        let err = driver.send_command("show version").await.unwrap_err();
        assert!(matches!(err, Error::Driver(DriverError::NotConnected)));
    }

    #[test]
    fn test_close_when_not_open() {
        let mut driver = driver();
        assert!(tokio_test::block_on(driver.close()).is_ok());
        assert!(!driver.is_open());
    }

    #[test]
    fn test_timeout_from_config() {
        let mut driver = driver();
        assert_eq!(driver.timeout, Duration::from_secs(30));
        driver.set_timeout(Duration::from_secs(5));
        assert_eq!(driver.timeout, Duration::from_secs(5));
        assert_eq!(driver.platform().name, "cisco_nxos");
    }
}
