//! Device collection: requesting, parsing and reporting one device at a time.
//!
//! Commands are requested serially over the device's single session. Once
//! every payload is in hand, each one is parsed on its own blocking task, so
//! a slow or panicking parser only affects its own command. A device that
//! fails as a whole still produces a report, and a batch always returns one
//! report per device.

use std::path::Path;
use std::sync::Arc;

use futures_util::future::join_all;
use indexmap::IndexMap;
use log::{error, info, warn};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use crate::config::{Device, InvalidDevice, LiveTarget, Resolved, Source};
use crate::driver::{Driver, DriverBuilder, GenericDriver, Response};
use crate::error::{ConfigError, DriverError, Error, ParseError, Result};
use crate::normalize::zip_tables;
use crate::output;
use crate::parsers::ParserRegistry;
use crate::platform::{OsFamily, OutputFormat, PlatformDefinition};
use crate::segment::segment;
use crate::tree::{Node, ParsedResult, Payload, Tree};

/// Command used to name a live device.
pub const HOSTNAME_COMMAND: &str = "show hostname";

/// Outcome of one device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceReport {
    /// `<hostname>_<address>` for live devices, the file stem for
    /// transcripts, or the device name when the device failed.
    pub key: String,

    /// Per-command results in requested order, or the device failure.
    pub outcome: std::result::Result<IndexMap<String, ParsedResult>, String>,
}

impl DeviceReport {
    /// Report for a device that produced no usable data.
    pub fn failed(name: impl Into<String>, error: impl ToString) -> Self {
        Self {
            key: name.into(),
            outcome: Err(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// `{key: {command: result}}`, or `{key: {msg, error}}` on failure.
    pub fn to_tree(&self) -> Tree {
        let body = match &self.outcome {
            Ok(results) => {
                let mut node = Node::new();
                for (command, result) in results {
                    node.insert(command.clone(), result.clone().into_tree());
                }
                Tree::Object(node)
            }
            Err(error) => json!({
                "msg": format!("Failed to process device {}", self.key),
                "error": error,
            }),
        };
        let mut out = Node::new();
        out.insert(self.key.clone(), body);
        Tree::Object(out)
    }
}

/// Check a device's command list and format before any I/O.
pub fn validate(device: &Device, registry: &ParserRegistry) -> std::result::Result<(), ConfigError> {
    if device.format == OutputFormat::Json && device.os == OsFamily::Ios {
        return Err(ConfigError::JsonUnsupported { os: device.os });
    }
    registry.validate(device.os, &device.commands)
}

/// Parse every payload on its own blocking task.
///
/// Results come back in input order. A parser panic becomes a `Failed`
/// result for that command only.
pub async fn parse_payloads(
    registry: &Arc<ParserRegistry>,
    os: OsFamily,
    payloads: Vec<(String, Payload)>,
) -> Vec<(String, ParsedResult)> {
    let tasks = payloads.into_iter().map(|(command, payload)| {
        let registry = Arc::clone(registry);
        async move {
            info!("Parsing the output of {command}...");
            let cmd = command.clone();
            let joined = tokio::task::spawn_blocking(move || registry.dispatch(os, &cmd, payload)).await;
            let result = match joined {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => ParsedResult::failed(&command, e),
                Err(e) => ParsedResult::failed(&command, ParseError::Panicked(e.to_string())),
            };
            (command, result)
        }
    });
    join_all(tasks).await
}

/// Join the parallel tables of zipped commands, JSON results only.
fn zip_results(platform: &PlatformDefinition, format: OutputFormat, results: &mut IndexMap<String, ParsedResult>) {
    if format != OutputFormat::Json {
        return;
    }
    for (command, result) in results.iter_mut() {
        if !platform.is_zipped(command) {
            continue;
        }
        if let ParsedResult::Value(Tree::Object(node)) = result {
            *result = match zip_tables(node) {
                Ok(rows) => ParsedResult::Value(Tree::Array(rows)),
                Err(e) => ParsedResult::failed(command, e),
            };
        }
    }
}

/// Payload of one response, or the result it already settles to.
fn payload_of(command: &str, response: &Response, format: OutputFormat) -> std::result::Result<Payload, ParsedResult> {
    if let Some(failure) = &response.failure_message {
        return Err(ParsedResult::Failed {
            message: format!("Command {command} failed on the device"),
            error: failure.clone(),
        });
    }
    match format {
        OutputFormat::Text => Ok(Payload::Text(response.result.clone())),
        OutputFormat::Json => decode(command, &response.result),
    }
}

fn decode(command: &str, output: &str) -> std::result::Result<Payload, ParsedResult> {
    Payload::from_json(output).map_err(|e| {
        warn!("Command {command} CLI output is not in JSON format");
        ParsedResult::DecodeFailed {
            output: output.to_string(),
            error: format!("The CLI output is not in JSON format: {e}"),
        }
    })
}

/// Put parsed and early results back in requested order.
fn in_order(
    commands: &[String],
    mut settled: IndexMap<String, ParsedResult>,
    parsed: Vec<(String, ParsedResult)>,
) -> IndexMap<String, ParsedResult> {
    settled.extend(parsed);
    commands
        .iter()
        .filter_map(|command| settled.swap_remove(command).map(|result| (command.clone(), result)))
        .collect()
}

fn hostname_of(response: &Response) -> std::result::Result<String, DriverError> {
    let reported = response.result.lines().next().unwrap_or_default().trim();
    if response.is_success() && !reported.is_empty() {
        return Ok(reported.to_string());
    }
    // IOS has no `show hostname`; the prompt carries the name
    let prompt = response.prompt_hostname();
    if !prompt.is_empty() {
        return Ok(prompt.to_string());
    }
    Err(DriverError::CommandFailed {
        command: HOSTNAME_COMMAND.to_string(),
        message: response
            .failure_message
            .clone()
            .unwrap_or_else(|| "empty output".to_string()),
    })
}

/// Collect a live device through an already built driver.
///
/// The driver is opened here and always closed before returning.
pub async fn collect_live<D: Driver>(
    driver: &mut D,
    device: &Device,
    address: &str,
    platform: &PlatformDefinition,
    registry: &Arc<ParserRegistry>,
) -> Result<DeviceReport> {
    info!("Connecting to {address} and retrieving show commands output...");
    driver.open().await?;

    let report = run_live(driver, device, address, platform, registry).await;

    if let Err(e) = driver.close().await {
        warn!("{address}: close failed: {e}");
    }
    report
}

async fn run_live<D: Driver>(
    driver: &mut D,
    device: &Device,
    address: &str,
    platform: &PlatformDefinition,
    registry: &Arc<ParserRegistry>,
) -> Result<DeviceReport> {
    let response = driver.send_command(HOSTNAME_COMMAND).await?;
    let key = format!("{}_{address}", hostname_of(&response)?);

    let mut settled = IndexMap::new();
    let mut payloads = Vec::with_capacity(device.commands.len());
    let mut transcript = Vec::new();

    for command in &device.commands {
        let request = match device.format {
            OutputFormat::Text => command.clone(),
            OutputFormat::Json => platform
                .json_command(command)
                .ok_or(ConfigError::JsonUnsupported { os: device.os })?,
        };
        let response = driver.send_command(&request).await?;
        if device.format == OutputFormat::Text {
            transcript.push((command.clone(), response.result.clone()));
        }
        match payload_of(command, &response, device.format) {
            Ok(payload) => payloads.push((command.clone(), payload)),
            Err(result) => {
                settled.insert(command.clone(), result);
            }
        }
    }

    let parsed = parse_payloads(registry, device.os, payloads).await;
    let mut results = in_order(&device.commands, settled, parsed);
    zip_results(platform, device.format, &mut results);

    if device.save_transcript {
        if device.format == OutputFormat::Json {
            // Transcripts hold screen text
            let commands: Vec<&str> = device.commands.iter().map(String::as_str).collect();
            let responses = driver.send_commands(&commands).await?;
            transcript.extend(
                device
                    .commands
                    .iter()
                    .cloned()
                    .zip(responses.into_iter().map(|response| response.result)),
            );
        }
        match output::append_transcript(&device.output_path, &key, &transcript).await {
            Ok(path) => info!("Saved the CLI output of {key} to {}", path.display()),
            Err(e) => warn!("{key}: {e}"),
        }
    }

    info!("Finish parsing {key}...");
    Ok(DeviceReport {
        key,
        outcome: Ok(results),
    })
}

/// Collect a device from a saved transcript.
///
/// The transcript is split on every command registered for the OS family;
/// requested commands missing from it are reported as failed.
pub async fn collect_file(device: &Device, path: &Path, registry: &Arc<ParserRegistry>) -> Result<DeviceReport> {
    let key = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| device.name());
    info!("Extracting show commands from {} txt file...", path.display());

    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let blocks = segment(&text, registry.commands(device.os), device.segment_mode);

    let mut settled = IndexMap::new();
    let mut payloads = Vec::new();
    for command in &device.commands {
        let Some(block) = blocks.get(command) else {
            settled.insert(
                command.clone(),
                ParsedResult::failed(command, format!("{command} not found in {}", path.display())),
            );
            continue;
        };
        let payload = match device.format {
            OutputFormat::Text => Ok(Payload::Text(block.clone())),
            OutputFormat::Json => decode(command, block),
        };
        match payload {
            Ok(payload) => payloads.push((command.clone(), payload)),
            Err(result) => {
                settled.insert(command.clone(), result);
            }
        }
    }

    let parsed = parse_payloads(registry, device.os, payloads).await;
    let mut results = in_order(&device.commands, settled, parsed);
    let platform = device.os.platform().map_err(ConfigError::from)?;
    zip_results(&platform, device.format, &mut results);

    Ok(DeviceReport {
        key,
        outcome: Ok(results),
    })
}

fn driver_for(target: &LiveTarget, os: OsFamily) -> Result<GenericDriver> {
    let mut builder = DriverBuilder::new(&target.address)
        .port(target.port)
        .username(&target.username)
        .os(os)
        .timeout(target.timeout)
        .host_key_verification(target.host_key_verification);

    if let Some(password) = &target.password {
        builder = builder.secret_password(SecretString::from(password.expose_secret()));
    } else if let Some(key_file) = &target.key_file {
        builder = builder.private_key(key_file);
    }
    builder.build()
}

/// Validate and collect one device; failures become a failed report.
pub async fn process_device(device: &Device, registry: &Arc<ParserRegistry>) -> DeviceReport {
    let outcome: Result<DeviceReport> = async {
        validate(device, registry)?;
        match &device.source {
            Source::Live(target) => {
                let platform = device.os.platform().map_err(ConfigError::from)?;
                let mut driver = driver_for(target, device.os)?;
                collect_live(&mut driver, device, &target.address, &platform, registry).await
            }
            Source::File(path) => collect_file(device, path, registry).await,
        }
    }
    .await;

    outcome.unwrap_or_else(|e| {
        error!("Error encountered while processing {}: {e}", device.name());
        DeviceReport::failed(device.name(), e)
    })
}

/// Process one device and write `<output_path>/<key>.json`.
pub async fn process_and_write(device: &Device, registry: &Arc<ParserRegistry>) -> DeviceReport {
    let report = process_device(device, registry).await;
    write_report(&device.output_path, &report).await;
    report
}

/// Write the failure report of an entry that never became a device.
pub async fn report_invalid(invalid: InvalidDevice) -> DeviceReport {
    let report = DeviceReport::failed(invalid.name, Error::from(invalid.error));
    write_report(&invalid.output_path, &report).await;
    report
}

async fn write_report(dir: &Path, report: &DeviceReport) {
    let file_key = report.key.replace(['/', '\\'], "_");
    match output::write_json(dir, &file_key, &report.to_tree()).await {
        Ok(path) => info!("Wrote {}", path.display()),
        Err(e) => error!("{}: {e}", report.key),
    }
}

/// Run every entry concurrently; one report per entry, in input order.
///
/// Entries that failed to resolve are reported without any I/O to a device.
pub async fn run_batch(devices: Vec<Resolved>, registry: Arc<ParserRegistry>) -> Vec<DeviceReport> {
    let registry = &registry;
    join_all(devices.into_iter().map(|entry| async move {
        match entry {
            Ok(device) => process_and_write(&device, registry).await,
            Err(invalid) => report_invalid(invalid).await,
        }
    }))
    .await
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;
    use crate::config::Inventory;
    use crate::extract::TextParser;
    use crate::segment::SegmentMode;

    /// Driver answering from a fixed command table.
    struct ScriptedDriver {
        outputs: HashMap<String, String>,
        prompt: String,
        sent: Vec<String>,
        open: bool,
        closed: bool,
    }

    impl ScriptedDriver {
        fn new(prompt: &str, outputs: &[(&str, &str)]) -> Self {
            Self {
                outputs: outputs
                    .iter()
                    .map(|(cmd, out)| (cmd.to_string(), out.to_string()))
                    .collect(),
                prompt: prompt.to_string(),
                sent: Vec::new(),
                open: false,
                closed: false,
            }
        }
    }

    impl Driver for ScriptedDriver {
        async fn open(&mut self) -> Result<()> {
            self.open = true;
            Ok(())
        }

        async fn close(&mut self) -> Result<()> {
            self.open = false;
            self.closed = true;
            Ok(())
        }

        async fn send_command(&mut self, command: &str) -> Result<Response> {
            if !self.open {
                return Err(DriverError::NotConnected.into());
            }
            self.sent.push(command.to_string());
            let response = match self.outputs.get(command) {
                Some(out) => Response::new(command, out.clone(), out.clone(), self.prompt.clone(), Duration::ZERO),
                None => Response::new(command, "% Invalid command", "", self.prompt.clone(), Duration::ZERO)
                    .with_failure("% Invalid command"),
            };
            Ok(response)
        }

        fn is_open(&self) -> bool {
            self.open
        }
    }

    struct Upper;

    impl TextParser for Upper {
        fn parse(&self, text: &str) -> std::result::Result<Tree, ParseError> {
            Ok(Tree::from(text.to_uppercase()))
        }
    }

    struct Panics;

    impl TextParser for Panics {
        fn parse(&self, _text: &str) -> std::result::Result<Tree, ParseError> {
            panic!("index out of bounds")
        }
    }

    fn fake_registry() -> Arc<ParserRegistry> {
        let mut registry = ParserRegistry::new();
        for os in [OsFamily::Nxos, OsFamily::Ios] {
            registry.register(os, "show clock", Upper).unwrap();
            registry.register(os, "show users", Upper).unwrap();
            registry.register(os, "show crash", Panics).unwrap();
        }
        Arc::new(registry)
    }

    fn device(os: OsFamily, format: OutputFormat, commands: &[&str], output_path: &Path) -> Device {
        Device {
            source: Source::File(PathBuf::from("unused.txt")),
            os,
            format,
            output_path: output_path.to_path_buf(),
            commands: commands.iter().map(|c| c.to_string()).collect(),
            segment_mode: SegmentMode::Line,
            save_transcript: false,
        }
    }

    #[tokio::test]
    async fn test_live_text_collection() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = ScriptedDriver::new(
            "leaf1#",
            &[("show hostname", "leaf1.lab"), ("show clock", "12:00 utc"), ("show users", "admin")],
        );
        let mut device = device(OsFamily::Nxos, OutputFormat::Text, &["show users", "show clock", "show crash"], dir.path());
        device.save_transcript = true;
        let platform = OsFamily::Nxos.platform().unwrap();

        let report = collect_live(&mut driver, &device, "10.0.0.1", &platform, &fake_registry())
            .await
            .unwrap();

        assert_eq!(report.key, "leaf1.lab_10.0.0.1");
        let results = report.outcome.as_ref().unwrap();
        let commands: Vec<&String> = results.keys().collect();
        assert_eq!(commands, ["show users", "show clock", "show crash"]);
        assert_eq!(results["show clock"], ParsedResult::Value(json!("12:00 UTC")));
        // show crash is not scripted, so the device rejects it
        assert!(matches!(results["show crash"], ParsedResult::Failed { .. }));
        assert!(driver.closed);

        let transcript = std::fs::read_to_string(dir.path().join("leaf1.lab_10.0.0.1.txt")).unwrap();
        assert!(transcript.starts_with("show users\nadmin\nshow clock\n12:00 utc\n"));
    }

    #[tokio::test]
    async fn test_hostname_from_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = ScriptedDriver::new("core-sw1#", &[("show clock", "now")]);
        let device = device(OsFamily::Ios, OutputFormat::Text, &["show clock"], dir.path());
        let platform = OsFamily::Ios.platform().unwrap();

        let report = collect_live(&mut driver, &device, "10.0.0.9", &platform, &fake_registry())
            .await
            .unwrap();
        assert_eq!(report.key, "core-sw1_10.0.0.9");
    }

    #[tokio::test]
    async fn test_parser_panic_is_scoped() {
        let results = parse_payloads(
            &fake_registry(),
            OsFamily::Nxos,
            vec![
                ("show crash".to_string(), Payload::Text("x".into())),
                ("show clock".to_string(), Payload::Text("ok".into())),
            ],
        )
        .await;

        assert!(matches!(&results[0].1, ParsedResult::Failed { error, .. } if error.contains("panic")));
        assert_eq!(results[1].1, ParsedResult::Value(json!("OK")));
    }

    #[tokio::test]
    async fn test_live_json_decode_and_zip() {
        let dir = tempfile::tempdir().unwrap();
        let vlan = r#"{"TABLE_vlanbrief": {"ROW_vlanbrief": [{"vlanshowbr-vlanid": "1"}, {"vlanshowbr-vlanid": "10"}]},
                       "TABLE_mtuinfo": {"ROW_mtuinfo": [{"vlanshowinfo-vlanid": "1"}]}}"#;
        let mut driver = ScriptedDriver::new(
            "leaf1#",
            &[
                ("show hostname", "leaf1"),
                ("show vlan | json", vlan),
                ("show version | json", "Syntax error while parsing"),
            ],
        );
        let device = device(OsFamily::Nxos, OutputFormat::Json, &["show vlan", "show version"], dir.path());
        let platform = OsFamily::Nxos.platform().unwrap();
        let registry = Arc::new(ParserRegistry::builtin().unwrap());

        let report = collect_live(&mut driver, &device, "10.0.0.1", &platform, &registry)
            .await
            .unwrap();
        let results = report.outcome.unwrap();

        assert_eq!(
            results["show vlan"],
            ParsedResult::Value(json!([
                {"vlanbrief_vlanshowbr-vlanid": "1", "mtuinfo_vlanshowinfo-vlanid": "1"},
                {"vlanbrief_vlanshowbr-vlanid": "10"},
            ]))
        );
        assert!(matches!(
            &results["show version"],
            ParsedResult::DecodeFailed { output, .. } if output == "Syntax error while parsing"
        ));
        assert!(driver.sent.contains(&"show vlan | json".to_string()));
    }

    #[tokio::test]
    async fn test_json_transcript_holds_screen_text() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = ScriptedDriver::new(
            "leaf1#",
            &[
                ("show hostname", "leaf1"),
                ("show clock | json", r#"{"simple_time": "12:00:00"}"#),
                ("show users | json", r#"{"TABLE_sessions": {"ROW_sessions": {"name": "admin"}}}"#),
                ("show clock", "12:00:00 UTC"),
                ("show users", "admin pts/0"),
            ],
        );
        let mut device = device(OsFamily::Nxos, OutputFormat::Json, &["show clock", "show users"], dir.path());
        device.save_transcript = true;
        let platform = OsFamily::Nxos.platform().unwrap();

        let report = collect_live(&mut driver, &device, "10.0.0.1", &platform, &fake_registry())
            .await
            .unwrap();
        assert!(report.is_success());
        assert_eq!(
            driver.sent,
            ["show hostname", "show clock | json", "show users | json", "show clock", "show users"]
        );

        let transcript = std::fs::read_to_string(dir.path().join("leaf1_10.0.0.1.txt")).unwrap();
        assert_eq!(transcript, "show clock\n12:00:00 UTC\nshow users\nadmin pts/0\n");
    }

    #[tokio::test]
    async fn test_file_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaf3.txt");
        std::fs::write(&path, "leaf3# show clock\n12:00 utc\nleaf3# show users\nadmin\n").unwrap();

        let device = device(OsFamily::Nxos, OutputFormat::Text, &["show users", "show clock", "show crash"], dir.path());
        let report = collect_file(&device, &path, &fake_registry()).await.unwrap();

        assert_eq!(report.key, "leaf3");
        let results = report.outcome.unwrap();
        assert_eq!(results["show users"], ParsedResult::Value(json!("ADMIN")));
        assert_eq!(results["show clock"], ParsedResult::Value(json!("12:00 UTC")));
        assert!(matches!(&results["show crash"], ParsedResult::Failed { error, .. } if error.contains("not found")));
    }

    #[tokio::test]
    async fn test_batch_reports_every_device() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("leaf1.txt");
        std::fs::write(&good, "show clock\nnoon\n").unwrap();

        let mut ok = device(OsFamily::Nxos, OutputFormat::Text, &["show clock"], dir.path());
        ok.source = Source::File(good);
        let mut missing = device(OsFamily::Nxos, OutputFormat::Text, &["show clock"], dir.path());
        missing.source = Source::File(dir.path().join("absent.txt"));
        let mut unsupported = device(OsFamily::Nxos, OutputFormat::Text, &["show bgp"], dir.path());
        unsupported.source = Source::File(PathBuf::from("spine.txt"));

        let reports = run_batch(vec![Ok(ok), Ok(missing), Ok(unsupported)], fake_registry()).await;
        assert_eq!(reports.len(), 3);
        assert!(reports[0].is_success());
        assert!(!reports[1].is_success());
        assert_eq!(
            reports[2].to_tree(),
            json!({"spine.txt": {
                "msg": "Failed to process device spine.txt",
                "error": "Configuration error: Command 'show bgp' is not supported in nxos",
            }})
        );

        let written = std::fs::read_to_string(dir.path().join("leaf1.json")).unwrap();
        assert_eq!(
            serde_json::from_str::<Tree>(&written).unwrap(),
            json!({"leaf1": {"show clock": "NOON"}})
        );
        assert!(dir.path().join("spine.txt.json").exists());
    }

    #[tokio::test]
    async fn test_batch_runs_past_invalid_entry() {
        let dir = tempfile::tempdir().unwrap();
        let transcript = dir.path().join("leaf3.txt");
        std::fs::write(&transcript, "leaf3# show clock\nnoon\n").unwrap();

        let text = format!(
            "output_path: {out}\ndevices:\n  - address: 10.0.0.1\n    os_type: ios\n  - file: {file}\n    cli_output_format: text\n    commands: [show clock]\n",
            out = dir.path().display(),
            file = transcript.display(),
        );
        let registry = fake_registry();
        let resolved = Inventory::from_yaml(&text).unwrap().resolve(&registry).unwrap();

        let reports = run_batch(resolved, registry).await;
        assert_eq!(reports.len(), 2);
        assert_eq!(
            reports[0].to_tree(),
            json!({"10.0.0.1": {
                "msg": "Failed to process device 10.0.0.1",
                "error": "Configuration error: ios does not support JSON output format",
            }})
        );
        assert_eq!(reports[1].key, "leaf3");
        assert!(reports[1].is_success());

        assert!(dir.path().join("10.0.0.1.json").exists());
        let written = std::fs::read_to_string(dir.path().join("leaf3.json")).unwrap();
        assert_eq!(
            serde_json::from_str::<Tree>(&written).unwrap(),
            json!({"leaf3": {"show clock": "NOON"}})
        );
    }
}
