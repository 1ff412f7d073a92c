// Copyright 2026 the BF2 Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Loop bracket resolution.
//!
//! Resolution rejects malformed programs before they reach the interpreter: a [`BracketMap`] is
//! either complete and well-nested, or it is not produced at all.

use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::opcode::Op;
use crate::program::Program;

/// A bracket mismatch found while resolving loops.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BracketError {
    /// A `]` with no open `[` before it.
    #[error("Mismatched ']' at position {pos}")]
    UnmatchedClose {
        /// Program position of the `]`.
        pos: usize,
    },
    /// A `[` that is never closed. Reports the innermost unmatched `[`.
    #[error("Mismatched '[' at position {pos}")]
    UnmatchedOpen {
        /// Program position of the `[`.
        pos: usize,
    },
}

impl BracketError {
    /// Program position the error refers to.
    #[must_use]
    pub fn pos(&self) -> usize {
        match self {
            Self::UnmatchedClose { pos } | Self::UnmatchedOpen { pos } => *pos,
        }
    }
}

/// Bidirectional association between matching `[` and `]` positions.
///
/// A position has an entry iff it holds a `[` or `]` in the resolved [`Program`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BracketMap {
    partner: HashMap<usize, usize>,
}

impl BracketMap {
    /// Returns the position matching the bracket at `pos`.
    #[must_use]
    pub fn get(&self, pos: usize) -> Option<usize> {
        self.partner.get(&pos).copied()
    }

    /// Number of matched pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.partner.len() / 2
    }

    /// Returns `true` if the program has no loops.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.partner.is_empty()
    }

    /// Iterates `(open, close)` pairs in ascending order of `open`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let mut pairs: Vec<(usize, usize)> = self
            .partner
            .iter()
            .filter(|(open, close)| open < close)
            .map(|(&open, &close)| (open, close))
            .collect();
        pairs.sort_unstable();
        pairs.into_iter()
    }
}

/// Matches every `[` with its `]` in a single left-to-right pass.
pub fn resolve(program: &Program) -> Result<BracketMap, BracketError> {
    let mut stack: Vec<usize> = Vec::new();
    let mut partner = HashMap::new();
    for (pos, op) in program.ops() {
        match op {
            Op::LoopOpen => stack.push(pos),
            Op::LoopClose => {
                let open = stack.pop().ok_or(BracketError::UnmatchedClose { pos })?;
                partner.insert(open, pos);
                partner.insert(pos, open);
            }
            _ => {}
        }
    }
    if let Some(pos) = stack.pop() {
        return Err(BracketError::UnmatchedOpen { pos });
    }
    Ok(BracketMap { partner })
}
