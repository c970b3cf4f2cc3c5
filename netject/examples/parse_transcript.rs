//! Parse a saved transcript without touching a device.
//!
//! Splits a capture of back-to-back `show` commands into per-command blocks
//! and prints the parsed tree of every block as JSON.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example parse_transcript -- captures/leaf3.txt
//! cargo run --example parse_transcript -- captures/core-sw1.txt --os ios
//! ```

use std::path::PathBuf;

use clap::Parser;

use netject::output::to_pretty_json;
use netject::segment::{SegmentMode, segment};
use netject::tree::Node;
use netject::{OsFamily, ParserRegistry, Payload, Tree};

#[derive(Parser)]
struct Args {
    /// Transcript to parse
    transcript: PathBuf,

    /// OS family that produced the transcript (nxos | ios)
    #[arg(long, default_value = "nxos")]
    os: OsFamily,

    /// Match commands anywhere instead of on whole lines
    #[arg(long)]
    substring: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let text = std::fs::read_to_string(&args.transcript)?;
    let registry = ParserRegistry::builtin()?;

    let mode = if args.substring {
        SegmentMode::Substring
    } else {
        SegmentMode::Line
    };
    let blocks = segment(&text, registry.commands(args.os), mode);
    eprintln!("Found {} command(s) in {}", blocks.len(), args.transcript.display());

    let mut tree = Node::new();
    for (command, block) in blocks {
        let result = registry.dispatch(args.os, &command, Payload::Text(block))?;
        tree.insert(command, result.into_tree());
    }

    let json = to_pretty_json(&Tree::Object(tree))?;
    println!("{}", String::from_utf8_lossy(&json));
    Ok(())
}
