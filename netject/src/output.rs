//! Per-device JSON documents and text transcripts.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::tree::Tree;

fn output_error(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
    move |source| Error::Output {
        path: path.to_path_buf(),
        source,
    }
}

/// Render `tree` as JSON indented by four spaces.
pub fn to_pretty_json(tree: &Tree) -> std::result::Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    tree.serialize(&mut serializer)?;
    Ok(out)
}

/// Write `tree` to `<dir>/<key>.json`, creating `dir` if needed.
pub async fn write_json(dir: &Path, key: &str, tree: &Tree) -> Result<PathBuf> {
    let path = dir.join(format!("{key}.json"));
    tokio::fs::create_dir_all(dir).await.map_err(output_error(&path))?;

    let bytes = to_pretty_json(tree).map_err(|e| Error::Output {
        path: path.clone(),
        source: io::Error::other(e),
    })?;
    tokio::fs::write(&path, bytes).await.map_err(output_error(&path))?;
    Ok(path)
}

/// Append `command\noutput\n` for every entry to `<dir>/<key>.txt`.
pub async fn append_transcript(dir: &Path, key: &str, entries: &[(String, String)]) -> Result<PathBuf> {
    let path = dir.join(format!("{key}.txt"));
    tokio::fs::create_dir_all(dir).await.map_err(output_error(&path))?;

    let mut text = String::new();
    for (command, output) in entries {
        text.push_str(command);
        text.push('\n');
        text.push_str(output);
        text.push('\n');
    }

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await
        .map_err(output_error(&path))?;
    file.write_all(text.as_bytes()).await.map_err(output_error(&path))?;
    file.flush().await.map_err(output_error(&path))?;
    Ok(path)
}
