//! Receive buffer with tail-only prompt search.
//!
//! Prompts are only searched for in the last N bytes of the buffer, so a
//! long `show ip route vrf all` does not get rescanned on every read.

use std::ops::Range;

use regex::bytes::Regex;
use vte::{Parser, Perform};

/// Printable text of the stream, escape sequences dropped.
#[derive(Debug, Default)]
struct Printable {
    out: Vec<u8>,
}

impl Perform for Printable {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.out.push(byte);
        }
    }
}

/// Buffer for accumulating session output and finding prompts in its tail.
pub struct PatternBuffer {
    buffer: Vec<u8>,
    search_depth: usize,
    parser: Parser,
    printable: Printable,
}

impl PatternBuffer {
    /// Create a new pattern buffer searching the last `search_depth` bytes.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            search_depth,
            parser: Parser::new(),
            printable: Printable::default(),
        }
    }

    /// Append received bytes, stripping ANSI escape sequences.
    ///
    /// Parser state is kept between calls, so a sequence split across two
    /// reads is still removed.
    pub fn extend(&mut self, data: &[u8]) {
        self.parser.advance(&mut self.printable, data);
        self.buffer.append(&mut self.printable.out);
    }

    /// Byte range of the first match of `pattern` within the tail.
    pub fn search_tail(&self, pattern: &Regex) -> Option<Range<usize>> {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        pattern
            .find(&self.buffer[start..])
            .map(|m| start + m.start()..start + m.end())
    }

    /// Remove and return everything up to `end`; the rest stays buffered.
    pub fn take_until(&mut self, end: usize) -> Vec<u8> {
        let rest = self.buffer.split_off(end.min(self.buffer.len()));
        std::mem::replace(&mut self.buffer, rest)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}
