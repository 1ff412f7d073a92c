// Copyright 2026 the BF2 Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounded output accumulation and human-readable rendering.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write as _;

/// A byte sink that retains at most `max` bytes and counts the rest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputSink {
    bytes: Vec<u8>,
    max: usize,
    dropped: u64,
}

impl OutputSink {
    /// Creates a sink retaining at most `max` bytes.
    #[must_use]
    pub fn with_capacity_limit(max: usize) -> Self {
        Self {
            bytes: Vec::new(),
            max,
            dropped: 0,
        }
    }

    /// Appends `byte`, or counts it as dropped once the sink is full.
    pub fn push(&mut self, byte: u8) {
        if self.bytes.len() < self.max {
            self.bytes.push(byte);
        } else {
            self.dropped = self.dropped.saturating_add(1);
        }
    }

    /// Retained bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of bytes emitted past the cap.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Renders the retained bytes with [`render_byte`].
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.bytes.len());
        for &b in &self.bytes {
            push_rendered(&mut out, b);
        }
        out
    }

    /// The note appended to a run's output when bytes were dropped.
    #[must_use]
    pub fn omitted_note(&self) -> Option<String> {
        (self.dropped > 0).then(|| format!("... {} more characters omitted.", self.dropped))
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Renders one output byte.
///
/// Printable ASCII is literal; `\n \t \r \b \f` use their escape form; anything else is `\xHH`.
#[must_use]
pub fn render_byte(byte: u8) -> String {
    let mut out = String::new();
    push_rendered(&mut out, byte);
    out
}

fn push_rendered(out: &mut String, byte: u8) {
    match byte {
        b'\n' => out.push_str("\\n"),
        b'\t' => out.push_str("\\t"),
        b'\r' => out.push_str("\\r"),
        0x08 => out.push_str("\\b"),
        0x0c => out.push_str("\\f"),
        0x20..=0x7e => out.push(byte as char),
        _ => {
            let _ = write!(out, "\\x{byte:02x}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_caps_and_counts_overflow() {
        let mut sink = OutputSink::with_capacity_limit(3);
        for b in b"hello" {
            sink.push(*b);
        }
        assert_eq!(sink.bytes(), b"hel");
        assert_eq!(sink.dropped(), 2);
        assert_eq!(
            sink.omitted_note().as_deref(),
            Some("... 2 more characters omitted.")
        );
    }

    #[test]
    fn no_note_without_overflow() {
        let mut sink = OutputSink::with_capacity_limit(8);
        sink.push(b'a');
        assert_eq!(sink.omitted_note(), None);
    }

    #[test]
    fn zero_cap_drops_everything() {
        let mut sink = OutputSink::with_capacity_limit(0);
        sink.push(b'a');
        assert!(sink.bytes().is_empty());
        assert_eq!(sink.dropped(), 1);
    }

    #[test]
    fn rendering_escapes_control_bytes() {
        assert_eq!(render_byte(b'A'), "A");
        assert_eq!(render_byte(b' '), " ");
        assert_eq!(render_byte(b'\n'), "\\n");
        assert_eq!(render_byte(b'\t'), "\\t");
        assert_eq!(render_byte(b'\r'), "\\r");
        assert_eq!(render_byte(0x08), "\\b");
        assert_eq!(render_byte(0x0c), "\\f");
        assert_eq!(render_byte(0x00), "\\x00");
        assert_eq!(render_byte(0x7f), "\\x7f");
        assert_eq!(render_byte(0xff), "\\xff");
    }

    #[test]
    fn render_joins_bytes() {
        let mut sink = OutputSink::with_capacity_limit(16);
        for b in b"hi\n\x01" {
            sink.push(*b);
        }
        assert_eq!(sink.render(), "hi\\n\\x01");
    }
}
