use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};
use secrecy::SecretString;

use netject::config::Inventory;
use netject::error::ConfigError;
use netject::{OsFamily, OutputFormat, ParserRegistry};

#[derive(Parser)]
#[command(name = "netject")]
#[command(about = "NetJect - Network JSON Object")]
struct Args {
    /// Directory holding NetJect-config.yaml, or the inventory file itself
    /// (default: NetJect-config.yaml in the working directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Username for device login
    #[arg(long)]
    username: Option<String>,

    /// Password for device login
    #[arg(long)]
    password: Option<String>,

    /// OS type of the devices (nxos | ios)
    #[arg(long)]
    os_type: Option<OsFamily>,

    /// Command output format (json | text)
    #[arg(long)]
    cli_output_format: Option<OutputFormat>,

    /// Directory for the JSON documents and transcripts
    #[arg(long)]
    output_path: Option<PathBuf>,

    /// Commands to run on every device
    #[arg(long, num_args = 1..)]
    commands: Option<Vec<String>>,

    /// Device addresses to collect live
    #[arg(long, num_args = 1..)]
    addresses: Vec<String>,

    /// Transcript files to parse offline
    #[arg(long, num_args = 1..)]
    files: Vec<PathBuf>,
}

impl Args {
    fn inventory(&mut self) -> Result<Inventory, ConfigError> {
        let mut inventory = if let Some(path) = &self.config {
            Inventory::load(path)?
        } else if !self.addresses.is_empty() || !self.files.is_empty() {
            Inventory::from_sources(std::mem::take(&mut self.addresses), std::mem::take(&mut self.files))
        } else {
            Inventory::load(Path::new("."))?
        };

        // Command line settings win over the file's top level
        let defaults = &mut inventory.defaults;
        if let Some(username) = self.username.take() {
            defaults.username = Some(username);
        }
        if let Some(password) = self.password.take() {
            defaults.password = Some(SecretString::from(password));
        }
        if self.os_type.is_some() {
            defaults.os_type = self.os_type;
        }
        if self.cli_output_format.is_some() {
            defaults.cli_output_format = self.cli_output_format;
        }
        if let Some(path) = self.output_path.take() {
            defaults.output_path = Some(path);
        }
        if let Some(commands) = self.commands.take() {
            defaults.commands = Some(commands);
        }
        Ok(inventory)
    }
}

async fn run(mut args: Args) -> Result<bool, netject::Error> {
    let registry = ParserRegistry::builtin()?;
    let devices = args.inventory()?.resolve(&registry)?;
    info!("Processing {} device(s)", devices.len());

    let reports = netject::run_batch(devices, Arc::new(registry)).await;
    let failed = reports.iter().filter(|r| !r.is_success()).count();
    info!("{} succeeded, {} failed", reports.len() - failed, failed);
    Ok(failed == 0)
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e}");
            ExitCode::from(2)
        }
    }
}
