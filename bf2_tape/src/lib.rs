// Copyright 2026 the BF2 Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `bf2_tape`: an execution engine for BF2.
//!
//! BF2 is Brainfuck with one extension: an optional `%...%` directive whose contents are
//! themselves BF2. The directive is run first, and the value it leaves in cell 0 sizes the main
//! program's tape (default 10 cells).
//!
//! A run goes through:
//! - [`directive::preprocess`]: strip whitespace, evaluate and remove the first `%...%` span
//! - [`brackets::resolve`]: match loops, or fail before executing anything
//! - [`compile::compile`]: lower to `{op, count}` instructions (runs collapsed unless traced)
//! - [`vm::Vm`]: execute under [`vm::Limits`], with optional [`trace::TraceSink`] and
//!   [`schedule::Scheduler`] hooks
//!
//! Every fault (bracket mismatch, pointer out of bounds, operation limit, cancellation) ends the
//! run with a [`vm::Halt`] and a complete [`vm::RunResult`].
//!
//! ## Example
//!
//! ```
//! use bf2_tape::vm::{Halt, Limits, Vm};
//!
//! // Two cells; read two bytes and echo them swapped.
//! let vm = Vm::new(Limits::default());
//! let out = vm.run("%++% ,>, .<.", b"AB", false);
//! assert_eq!(out.halt, Halt::Normal);
//! assert_eq!(out.output, b"BA");
//! assert_eq!(out.output_text, "BA");
//! ```

#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod brackets;
pub mod compile;
pub mod directive;
pub mod opcode;
pub mod output;
pub mod program;
pub mod schedule;
pub mod trace;
pub mod vm;
#[cfg(feature = "std")]
pub mod worker;

pub use vm::{Halt, Limits, RunResult, Vm, run};
