// Copyright 2026 the BF2 Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-step tracing hooks for the BF2 VM.
//!
//! Tracing is optional. When a [`TraceSink`] is passed to the VM, run-collapsing is turned off so
//! the sink observes every instruction individually, and the lower traced operation limit
//! applies.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write as _;

use crate::opcode::Op;
use crate::output::render_byte;

/// A snapshot taken before an instruction executes, or once after the run halts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TraceStep<'a> {
    /// 1-based sequence number.
    pub seq: u64,
    /// The instruction about to execute (the last executed one in the closing snapshot), or
    /// `None` before anything ran.
    pub op: Option<Op>,
    /// Program position of `op`.
    pub pos: Option<usize>,
    /// Full tape contents before `op` executes.
    pub tape: &'a [u8],
    /// Pointer before `op` executes.
    pub pointer: usize,
    /// The byte `op` will emit, for `.` only.
    pub emitted: Option<u8>,
}

/// A sink that receives VM steps.
pub trait TraceSink {
    /// Called once with the initial tape, then once before every executed instruction.
    fn step(&mut self, step: TraceStep<'_>);

    /// Called once after the run halts, with the final tape and pointer.
    fn run_end(&mut self, _step: TraceStep<'_>) {}
}

/// Records each step as a human-readable line.
///
/// ```text
///   1 ->       [(0), 0]
///   2 ->   +   [(0), 0]
///   3 ->   .   [(1), 0]    => \x01
///   4 ->   .   [(1), 0]
/// ```
///
/// The last line is the closing snapshot, marked with the last executed instruction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TapeRecorder {
    lines: Vec<String>,
}

impl TapeRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded lines in step order.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Consumes the recorder and returns its lines.
    #[must_use]
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl TraceSink for TapeRecorder {
    fn step(&mut self, step: TraceStep<'_>) {
        self.push_line(&step);
    }

    fn run_end(&mut self, step: TraceStep<'_>) {
        self.push_line(&step);
    }
}

impl TapeRecorder {
    fn push_line(&mut self, step: &TraceStep<'_>) {
        let marker = step.op.map_or(' ', Op::as_char);
        let mut line = String::new();
        let _ = write!(
            line,
            " {:>3} ->   {marker}   {}",
            step.seq,
            format_tape(step.tape, step.pointer)
        );
        if let Some(byte) = step.emitted {
            let _ = write!(line, "    => {}", render_byte(byte));
        }
        self.lines.push(line);
    }
}

/// Formats `tape` as `[a, b, (c), d]` with the cell at `pointer` in parentheses.
#[must_use]
pub fn format_tape(tape: &[u8], pointer: usize) -> String {
    let mut out = String::with_capacity(tape.len() * 4 + 2);
    out.push('[');
    for (i, cell) in tape.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        if i == pointer {
            let _ = write!(out, "({cell})");
        } else {
            let _ = write!(out, "{cell}");
        }
    }
    out.push(']');
    out
}
