//! Splitting a multi-command transcript into per-command blocks.
//!
//! A transcript is what a terminal capture or a saved `<host>.txt` looks
//! like: each command line followed by its output, back to back. The command
//! text itself is the only delimiter.
//!
//! Two matching modes exist. [`SegmentMode::Substring`] finds the first raw
//! occurrence of each command anywhere in the text. It misattributes blocks
//! when one command is a prefix of another (`show ip route` is found inside
//! `show ip route vrf all`) or when a command string shows up in some other
//! output. [`SegmentMode::Line`] (the default) only accepts a command that
//! fills its whole line, alone or after a device prompt such as `leaf1#`.
//! Output lines that merely end in a command string are ignored. When
//! several commands match one line the longest wins.

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

/// How command markers are located in a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentMode {
    /// Whole-line anchored, longest command first.
    #[default]
    Line,
    /// First raw substring occurrence.
    Substring,
}

/// A located command marker.
#[derive(Debug, Clone, Copy)]
struct Marker<'a> {
    command: &'a str,
    /// Where the previous block ends.
    start: usize,
    /// Where this block's text begins.
    end: usize,
}

/// Slice `transcript` into `command -> output` blocks.
///
/// Blocks are returned in order of appearance. A block spans from the end of
/// its command marker to the start of the next marker, trimmed. Commands that
/// never appear are absent from the result; only the first occurrence of a
/// command counts.
pub fn segment<'a, I>(transcript: &str, commands: I, mode: SegmentMode) -> IndexMap<String, String>
where
    I: IntoIterator<Item = &'a str>,
{
    let commands: Vec<&str> = commands.into_iter().filter(|c| !c.is_empty()).collect();

    let mut markers = match mode {
        SegmentMode::Substring => substring_markers(transcript, &commands),
        SegmentMode::Line => line_markers(transcript, &commands),
    };
    markers.sort_by_key(|m| (m.start, m.end));

    let mut blocks = IndexMap::with_capacity(markers.len());
    for (i, marker) in markers.iter().enumerate() {
        let stop = markers
            .get(i + 1)
            .map(|next| next.start)
            .unwrap_or(transcript.len())
            .max(marker.end);
        let text = transcript[marker.end..stop].trim();
        debug!("segment: '{}' -> {} bytes", marker.command, text.len());
        blocks.insert(marker.command.to_string(), text.to_string());
    }
    blocks
}

fn substring_markers<'a>(transcript: &str, commands: &[&'a str]) -> Vec<Marker<'a>> {
    let mut markers = Vec::new();
    for &command in commands {
        if markers.iter().any(|m: &Marker<'_>| m.command == command) {
            continue;
        }
        if let Some(pos) = transcript.find(command) {
            markers.push(Marker {
                command,
                start: pos,
                end: pos + command.len(),
            });
        }
    }
    markers
}

fn line_markers<'a>(transcript: &str, commands: &[&'a str]) -> Vec<Marker<'a>> {
    let mut markers: Vec<Marker<'a>> = Vec::new();
    let mut offset = 0;

    for line in transcript.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        let content = line.trim_end();
        let best = commands
            .iter()
            .filter(|&&command| ends_line(content, command))
            .max_by_key(|command| command.len());

        let Some(&command) = best else {
            continue;
        };
        if markers.iter().any(|m| m.command == command) {
            continue;
        }
        markers.push(Marker {
            command,
            start: line_start,
            end: line_start + content.len(),
        });
    }
    markers
}

/// Check if `command` is the whole of `line`, or follows a device prompt.
fn ends_line(line: &str, command: &str) -> bool {
    let Some(head) = line.strip_suffix(command) else {
        return false;
    };
    let head = head.trim();
    head.is_empty() || is_prompt(head)
}

/// A prompt is a device name followed by `#`, `>` or `$`.
fn is_prompt(text: &str) -> bool {
    let Some(name) = text.strip_suffix(['#', '>', '$']) else {
        return false;
    };
    (1..=63).contains(&name.chars().count())
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | '@' | '/' | ':' | '(' | ')'))
}
