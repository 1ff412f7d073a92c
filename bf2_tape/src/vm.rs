// Copyright 2026 the BF2 Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interpreter for BF2 programs.
//!
//! The VM executes programs with explicit limits (operations, retained output) and reports every
//! fault as a [`Halt`] inside a complete [`RunResult`]; it never panics on program input.

use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::brackets::{BracketError, resolve};
use crate::compile::{Collapse, Instr, compile};
use crate::directive::{LengthWarning, preprocess_with_scheduler};
use crate::opcode::Op;
use crate::output::OutputSink;
use crate::program::Program;
use crate::schedule::{Control, NoYield, Progress, Scheduler};
use crate::trace::{TapeRecorder, TraceSink, TraceStep};

/// Execution limits and sizing for a VM run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Operation budget for untraced runs. Serves only as an infinite-loop guard.
    pub max_ops: u64,
    /// Operation budget for traced runs. Lower because every step is recorded.
    pub max_traced_ops: u64,
    /// Maximum number of output bytes retained; later bytes are counted, not stored.
    pub max_output: usize,
    /// Number of operations between scheduler checkpoints.
    pub yield_interval: u64,
    /// Tape length used when no usable length directive is present.
    pub default_tape_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_ops: 100_000_000,
            max_traced_ops: 10_000,
            max_output: 10_000,
            yield_interval: 100_000,
            default_tape_len: 10,
        }
    }
}

impl Limits {
    /// Operation budget for a run with or without tracing.
    #[must_use]
    pub fn op_limit(&self, traced: bool) -> u64 {
        if traced {
            self.max_traced_ops
        } else {
            self.max_ops
        }
    }

    /// Default tape length, never zero.
    #[must_use]
    pub fn default_tape_len(&self) -> usize {
        self.default_tape_len.max(1)
    }
}

/// Direction of a pointer move.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    /// `<`
    Left,
    /// `>`
    Right,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Why a run stopped. Exactly one halt terminates every run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Halt {
    /// The instruction pointer reached the end of the program.
    Normal,
    /// Loop resolution failed; nothing was executed.
    Bracket(BracketError),
    /// A pointer move left the tape.
    Bounds {
        /// Direction of the failing move.
        direction: Direction,
        /// Program position of the failing character.
        pos: usize,
    },
    /// The operation budget ran out.
    OperationLimit {
        /// The budget that applied to this run.
        limit: u64,
    },
    /// The host stopped the run at a checkpoint.
    Cancelled,
}

impl Halt {
    /// Returns `true` for [`Halt::Normal`].
    #[must_use]
    pub fn is_normal(&self) -> bool {
        matches!(self, Self::Normal)
    }

    /// The notice appended to a run's output text, if any.
    #[must_use]
    pub fn notice(&self) -> Option<String> {
        (!self.is_normal()).then(|| self.to_string())
    }
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "halted normally"),
            Self::Bracket(e) => write!(f, "{e}"),
            Self::Bounds { direction, pos } => {
                write!(f, "Pointer moved out of bounds ({direction}) at position {pos}.")
            }
            Self::OperationLimit { limit } => {
                write!(f, "Operation limit of {limit} reached; execution stopped.")
            }
            Self::Cancelled => write!(f, "Execution stopped by user."),
        }
    }
}

/// Machine state at the end of [`Vm::execute`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Execution {
    /// Why execution stopped.
    pub halt: Halt,
    /// Executed operations (one per instruction character).
    pub operations: u64,
    /// Final tape.
    pub tape: Vec<u8>,
    /// Final pointer. Always a valid tape index.
    pub pointer: usize,
    /// Emitted output.
    pub output: OutputSink,
}

/// The result bundle of a top-level run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunResult {
    /// Rendered output followed by any warning, omission, or halt text.
    pub output_text: String,
    /// Executed operations.
    pub operation_count: u64,
    /// Tape trace lines; empty unless tracing was requested.
    pub trace: Vec<String>,
    /// Why the run stopped.
    pub halt: Halt,
    /// Retained raw output bytes.
    pub output: Vec<u8>,
    /// Output bytes dropped past `Limits::max_output`.
    pub dropped_output: u64,
    /// Final tape.
    pub tape: Vec<u8>,
    /// Final pointer.
    pub pointer: usize,
    /// Set when the tape fell back to the default length.
    pub warning: Option<LengthWarning>,
}

/// Transient per-run state.
#[derive(Debug)]
struct Machine<'a> {
    tape: Vec<u8>,
    pointer: usize,
    input: &'a [u8],
    input_ix: usize,
    output: OutputSink,
    ops: u64,
}

/// Where to continue after applying (part of) an instruction.
enum Flow {
    /// Stay on the current instruction; more of its run remains.
    Partial,
    /// Continue at the given instruction index.
    Goto(usize),
}

impl<'a> Machine<'a> {
    fn new(tape_len: usize, input: &'a [u8], max_output: usize) -> Self {
        Self {
            tape: vec![0; tape_len],
            pointer: 0,
            input,
            input_ix: 0,
            output: OutputSink::with_capacity_limit(max_output),
            ops: 0,
        }
    }

    fn cell(&self) -> u8 {
        self.tape[self.pointer]
    }

    fn cell_mut(&mut self) -> &mut u8 {
        &mut self.tape[self.pointer]
    }

    /// Applies `units` characters of `instr`, of which `done` were already applied.
    ///
    /// `units` is at least 1 and at most `instr.count - done`.
    fn apply(&mut self, ip: usize, instr: &Instr, done: u32, units: u32) -> Result<Flow, Halt> {
        match instr.op {
            Op::Inc => {
                let cell = self.cell_mut();
                *cell = cell.wrapping_add((units % 256) as u8);
            }
            Op::Dec => {
                let cell = self.cell_mut();
                *cell = cell.wrapping_sub((units % 256) as u8);
            }
            Op::Right => {
                let room = self.tape.len() - 1 - self.pointer;
                if units as usize > room {
                    // `room` moves succeed, the next one faults.
                    self.ops += room as u64 + 1;
                    self.pointer += room;
                    return Err(Halt::Bounds {
                        direction: Direction::Right,
                        pos: instr.pos + done as usize + room,
                    });
                }
                self.pointer += units as usize;
            }
            Op::Left => {
                let room = self.pointer;
                if units as usize > room {
                    self.ops += room as u64 + 1;
                    self.pointer = 0;
                    return Err(Halt::Bounds {
                        direction: Direction::Left,
                        pos: instr.pos + done as usize + room,
                    });
                }
                self.pointer -= units as usize;
            }
            Op::Output => {
                let byte = self.cell();
                self.output.push(byte);
            }
            Op::Input => {
                let byte = match self.input.get(self.input_ix) {
                    Some(&b) => {
                        self.input_ix += 1;
                        b
                    }
                    None => 0,
                };
                *self.cell_mut() = byte;
            }
            Op::LoopOpen => {
                self.ops += 1;
                let next = if self.cell() == 0 { instr.jump + 1 } else { ip + 1 };
                return Ok(Flow::Goto(next));
            }
            Op::LoopClose => {
                self.ops += 1;
                let next = if self.cell() != 0 { instr.jump + 1 } else { ip + 1 };
                return Ok(Flow::Goto(next));
            }
        }
        self.ops += u64::from(units);
        if done + units < instr.count {
            Ok(Flow::Partial)
        } else {
            Ok(Flow::Goto(ip + 1))
        }
    }
}

/// A BF2 virtual machine.
///
/// A `Vm` holds only configuration; every run owns fresh state, so one `Vm` may serve any number
/// of sequential runs, and separate `Vm`s may run concurrently.
#[derive(Clone, Debug, Default)]
pub struct Vm {
    limits: Limits,
}

impl Vm {
    /// Creates a new VM with `limits`.
    #[must_use]
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    /// The limits this VM runs with.
    #[must_use]
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Runs BF2 `source` to completion, reading `,` from `input`.
    ///
    /// When `record_tape` is set the result carries one trace line per step.
    #[must_use]
    pub fn run(&self, source: &str, input: &[u8], record_tape: bool) -> RunResult {
        self.run_with_scheduler(source, input, record_tape, &mut NoYield)
    }

    /// Like [`Vm::run`], calling `scheduler` every `Limits::yield_interval` operations.
    pub fn run_with_scheduler(
        &self,
        source: &str,
        input: &[u8],
        record_tape: bool,
        scheduler: &mut dyn Scheduler,
    ) -> RunResult {
        let pre = preprocess_with_scheduler(source, &self.limits, scheduler);
        let mut recorder = record_tape.then(TapeRecorder::new);
        let exec = if pre.cancelled {
            self.idle(pre.tape_len, Halt::Cancelled)
        } else {
            self.execute(
                &pre.program,
                pre.tape_len,
                input,
                recorder.as_mut().map(|r| r as &mut dyn TraceSink),
                scheduler,
            )
        };

        let output_text = render_output_text(pre.warning, pre.tape_len, &exec);
        RunResult {
            output_text,
            operation_count: exec.operations,
            trace: recorder.map(TapeRecorder::into_lines).unwrap_or_default(),
            halt: exec.halt,
            dropped_output: exec.output.dropped(),
            output: exec.output.into_bytes(),
            tape: exec.tape,
            pointer: exec.pointer,
            warning: pre.warning,
        }
    }

    /// Runs a length-directive sub-program: no tracing, no directive parsing, empty input, and
    /// default tape length. `scheduler` sees the sub-program's own checkpoints.
    pub fn run_nested(&self, program: &Program, scheduler: &mut dyn Scheduler) -> Execution {
        self.execute(
            program,
            self.limits.default_tape_len(),
            &[],
            None,
            scheduler,
        )
    }

    /// State of a run that halted before executing anything.
    fn idle(&self, tape_len: usize, halt: Halt) -> Execution {
        Execution {
            halt,
            operations: 0,
            tape: vec![0; tape_len.max(1)],
            pointer: 0,
            output: OutputSink::with_capacity_limit(self.limits.max_output),
        }
    }

    /// Executes an already-preprocessed `program` on a zeroed tape of `tape_len` cells.
    ///
    /// Passing a `trace` sink disables run-collapsing and applies `Limits::max_traced_ops`.
    pub fn execute(
        &self,
        program: &Program,
        tape_len: usize,
        input: &[u8],
        mut trace: Option<&mut dyn TraceSink>,
        scheduler: &mut dyn Scheduler,
    ) -> Execution {
        let tape_len = tape_len.max(1);

        let brackets = match resolve(program) {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!(error = %e, "bf2 loop resolution failed");
                return self.idle(tape_len, Halt::Bracket(e));
            }
        };

        let mut m = Machine::new(tape_len, input, self.limits.max_output);
        let traced = trace.is_some();
        let collapse = if traced {
            Collapse::Never
        } else {
            Collapse::Runs
        };
        let compiled = compile(program, &brackets, collapse);
        let instrs = compiled.instrs();
        let limit = self.limits.op_limit(traced);
        let interval = self.limits.yield_interval.max(1);
        tracing::debug!(
            tape_len,
            instrs = instrs.len(),
            traced,
            limit,
            "bf2 run start"
        );

        let mut seq = 0_u64;
        if let Some(t) = trace.as_mut() {
            seq += 1;
            t.step(TraceStep {
                seq,
                op: None,
                pos: None,
                tape: &m.tape,
                pointer: m.pointer,
                emitted: None,
            });
        }

        let mut next_checkpoint = interval;
        let mut ip = 0_usize;
        // Characters of `instrs[ip]` already applied when a run was split.
        let mut done = 0_u32;
        let mut last_op = None;
        let halt = loop {
            let Some(instr) = instrs.get(ip) else {
                break Halt::Normal;
            };
            if m.ops >= limit {
                break Halt::OperationLimit { limit };
            }
            if m.ops >= next_checkpoint {
                next_checkpoint = m.ops.saturating_add(interval);
                let progress = Progress {
                    operations: m.ops,
                    pointer: m.pointer,
                };
                tracing::trace!(operations = m.ops, "bf2 checkpoint");
                if scheduler.checkpoint(progress) == Control::Stop {
                    break Halt::Cancelled;
                }
            }

            let budget = (limit - m.ops).min(next_checkpoint - m.ops);
            let units = u64::from(instr.count - done).min(budget) as u32;

            if let Some(t) = trace.as_mut() {
                seq += 1;
                t.step(TraceStep {
                    seq,
                    op: Some(instr.op),
                    pos: Some(instr.pos),
                    tape: &m.tape,
                    pointer: m.pointer,
                    emitted: (instr.op == Op::Output).then(|| m.cell()),
                });
            }

            last_op = Some(instr.op);
            match m.apply(ip, instr, done, units) {
                Ok(Flow::Partial) => done += units,
                Ok(Flow::Goto(next)) => {
                    ip = next;
                    done = 0;
                }
                Err(halt) => break halt,
            }
        };

        if let Some(t) = trace.as_mut() {
            t.run_end(TraceStep {
                seq: seq + 1,
                op: last_op,
                pos: None,
                tape: &m.tape,
                pointer: m.pointer,
                emitted: None,
            });
        }

        tracing::debug!(%halt, operations = m.ops, "bf2 run halted");
        Execution {
            halt,
            operations: m.ops,
            tape: m.tape,
            pointer: m.pointer,
            output: m.output,
        }
    }
}

/// Runs `source` with default [`Limits`].
#[must_use]
pub fn run(source: &str, input: &[u8], record_tape: bool) -> RunResult {
    Vm::default().run(source, input, record_tape)
}

fn render_output_text(warning: Option<LengthWarning>, tape_len: usize, exec: &Execution) -> String {
    if let Halt::Bracket(e) = &exec.halt {
        return e.to_string();
    }
    let mut lines: Vec<String> = Vec::new();
    if let Some(w) = warning {
        lines.push(w.message(tape_len));
    }
    let rendered = exec.output.render();
    if !rendered.is_empty() {
        lines.push(rendered);
    }
    if let Some(note) = exec.output.omitted_note() {
        lines.push(note);
    }
    if let Some(notice) = exec.halt.notice() {
        lines.push(notice);
    }
    lines.join("\n")
}
