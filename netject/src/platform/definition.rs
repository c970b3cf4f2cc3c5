//! Platform definition for vendor-specific session behavior.

use regex::bytes::Regex;

use super::OsFamily;

/// Platform definition containing all vendor-specific configuration.
#[derive(Debug, Clone)]
pub struct PlatformDefinition {
    /// Platform name (e.g., "cisco_nxos", "cisco_iosxe").
    pub name: String,

    /// OS family this platform belongs to.
    pub os: OsFamily,

    /// Pattern matching any prompt the session may stop at.
    pub prompt_pattern: Regex,

    /// Patterns that indicate command failure.
    pub failed_when_contains: Vec<String>,

    /// Commands to run when connection is established.
    pub on_open_commands: Vec<String>,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,

    /// Pipe appended to a command to get JSON output, if the OS has one.
    pub json_pipe: Option<String>,

    /// Commands whose normalized JSON holds parallel tables to zip.
    pub zipped_commands: Vec<String>,
}

impl PlatformDefinition {
    /// Create a new platform definition with minimal required fields.
    pub fn new(name: impl Into<String>, os: OsFamily, prompt: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            os,
            prompt_pattern: Regex::new(prompt)?,
            failed_when_contains: vec![],
            on_open_commands: vec![],
            terminal_width: 511,
            terminal_height: 24,
            json_pipe: None,
            zipped_commands: vec![],
        })
    }

    /// Add a failure pattern.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Add an on_open command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Set terminal dimensions.
    pub fn with_terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Set the JSON output pipe (e.g. `"| json"`).
    pub fn with_json_pipe(mut self, pipe: impl Into<String>) -> Self {
        self.json_pipe = Some(pipe.into());
        self
    }

    /// Mark a command's JSON output as parallel tables.
    pub fn with_zipped_command(mut self, command: impl Into<String>) -> Self {
        self.zipped_commands.push(command.into());
        self
    }

    /// Check if the OS can return JSON.
    pub fn supports_json(&self) -> bool {
        self.json_pipe.is_some()
    }

    /// Command line requesting JSON output for `command`.
    pub fn json_command(&self, command: &str) -> Option<String> {
        self.json_pipe
            .as_ref()
            .map(|pipe| format!("{command} {pipe}"))
    }

    /// Check if `command`'s normalized JSON is zipped.
    pub fn is_zipped(&self, command: &str) -> bool {
        self.zipped_commands.iter().any(|c| c == command)
    }

    /// First failure pattern contained in `output`.
    pub fn detect_failure(&self, output: &str) -> Option<&str> {
        self.failed_when_contains
            .iter()
            .find(|pattern| output.contains(pattern.as_str()))
            .map(String::as_str)
    }

    /// Strip the command echo and trailing prompt from raw session output.
    pub fn normalize_output(&self, raw: &str, command: &str) -> String {
        let output = raw.trim_start_matches(['\r', '\n']);
        let output = output
            .strip_prefix(command)
            .unwrap_or(output)
            .trim_start_matches(['\r', '\n']);

        // Trailing prompt (last line)
        let output = match output.rfind('\n') {
            Some(pos) => &output[..pos],
            None if self.prompt_pattern.is_match(output.as_bytes()) => "",
            None => output,
        };
        output.trim_end_matches(['\r', '\n']).replace("\r\n", "\n")
    }
}
