// Copyright 2026 the BF2 Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ahead-of-time lowering of a [`Program`] into a flat instruction list.
//!
//! The VM only ever executes a [`CompiledProgram`]. Run-collapsing is decided here, once, so
//! traced and untraced runs share a single interpreter loop.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;

use crate::brackets::BracketMap;
use crate::opcode::Op;
use crate::program::Program;

/// Whether runs of identical collapsible instructions are merged.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Collapse {
    /// Merge maximal runs of `>`, `<`, `+`, `-` into one instruction each.
    Runs,
    /// One instruction per character (required for per-step tracing).
    Never,
}

/// A lowered instruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Instr {
    /// The operation.
    pub op: Op,
    /// Number of source characters this instruction stands for (1 unless collapsed).
    pub count: u32,
    /// Program position of the first character.
    pub pos: usize,
    /// For `[`/`]`: instruction index of the matching bracket. Unused otherwise.
    pub jump: usize,
}

/// A program lowered to `{op, count}` instructions with resolved jump targets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompiledProgram {
    instrs: Vec<Instr>,
}

impl CompiledProgram {
    /// The instruction list.
    #[must_use]
    pub fn instrs(&self) -> &[Instr] {
        &self.instrs
    }

    /// Number of lowered instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    /// Returns `true` if there is nothing to execute.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }
}

/// One line per instruction: index, op with repeat count or jump target, source position.
///
/// ```text
/// 0000  + x3       @0
/// 0001  [ ->0003   @3
/// ```
impl fmt::Display for CompiledProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (ix, instr) in self.instrs.iter().enumerate() {
            let arg = match instr.op {
                Op::LoopOpen | Op::LoopClose => format!("->{:04}", instr.jump),
                _ if instr.count > 1 => format!("x{}", instr.count),
                _ => String::new(),
            };
            writeln!(f, "{ix:04}  {} {arg:<8} @{}", instr.op, instr.pos)?;
        }
        Ok(())
    }
}

/// Lowers `program` using the resolved `brackets`.
///
/// No-op characters are dropped. `brackets` must come from [`crate::brackets::resolve`] on the
/// same program.
#[must_use]
pub fn compile(program: &Program, brackets: &BracketMap, collapse: Collapse) -> CompiledProgram {
    let mut instrs: Vec<Instr> = Vec::new();
    // Program position -> instruction index, brackets only.
    let mut bracket_ix: HashMap<usize, usize> = HashMap::with_capacity(brackets.len() * 2);

    for (pos, op) in program.ops() {
        if collapse == Collapse::Runs
            && let Some(last) = instrs.last_mut()
            && extends_run(last, op, pos)
        {
            last.count += 1;
            continue;
        }
        if matches!(op, Op::LoopOpen | Op::LoopClose) {
            bracket_ix.insert(pos, instrs.len());
        }
        instrs.push(Instr {
            op,
            count: 1,
            pos,
            jump: 0,
        });
    }

    for instr in &mut instrs {
        if matches!(instr.op, Op::LoopOpen | Op::LoopClose)
            && let Some(partner) = brackets.get(instr.pos)
            && let Some(&ix) = bracket_ix.get(&partner)
        {
            instr.jump = ix;
        }
    }

    CompiledProgram { instrs }
}

/// Whether `op` at `pos` continues the run in `last`. Runs are capped at `u32::MAX`
/// characters; longer runs continue in a fresh instruction.
fn extends_run(last: &Instr, op: Op, pos: usize) -> bool {
    op.is_collapsible()
        && last.op == op
        && last.count < u32::MAX
        && last.pos + last.count as usize == pos
}
