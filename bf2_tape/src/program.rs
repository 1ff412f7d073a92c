// Copyright 2026 the BF2 Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Whitespace-stripped BF2 program text.
//!
//! Positions reported by the resolver and the VM are character indices into a [`Program`].

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::opcode::Op;

/// An immutable sequence of program characters.
///
/// Built from source with all whitespace removed. Characters without an [`Op`] are kept (they
/// occupy positions) and execute as no-ops.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    chars: Vec<char>,
}

impl Program {
    /// Strips every whitespace character from `source`.
    #[must_use]
    pub fn strip(source: &str) -> Self {
        Self {
            chars: source.chars().filter(|c| !c.is_whitespace()).collect(),
        }
    }

    pub(crate) fn from_chars(chars: Vec<char>) -> Self {
        Self { chars }
    }

    /// Number of characters (positions) in the program.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Returns `true` if the program has no characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Returns the character at `pos`.
    #[must_use]
    pub fn get(&self, pos: usize) -> Option<char> {
        self.chars.get(pos).copied()
    }

    /// Returns the instruction at `pos`, or `None` for out-of-range positions and no-ops.
    #[must_use]
    pub fn op_at(&self, pos: usize) -> Option<Op> {
        self.get(pos).and_then(Op::from_char)
    }

    /// Returns the program characters.
    #[must_use]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Iterates `(pos, op)` for every instruction character, skipping no-ops.
    pub fn ops(&self) -> impl Iterator<Item = (usize, Op)> + '_ {
        self.chars
            .iter()
            .enumerate()
            .filter_map(|(pos, &c)| Op::from_char(c).map(|op| (pos, op)))
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: String = self.chars.iter().collect();
        f.write_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;

    #[test]
    fn strip_removes_all_whitespace() {
        let p = Program::strip(" +\t+\n\r[ - ]\u{a0}.");
        assert_eq!(p.to_string(), "++[-].");
        assert_eq!(p.len(), 6);
    }

    #[test]
    fn no_op_characters_keep_their_positions() {
        let p = Program::strip("a+%b-");
        assert_eq!(p.len(), 5);
        assert_eq!(p.op_at(0), None);
        assert_eq!(p.op_at(1), Some(Op::Inc));
        assert_eq!(p.op_at(4), Some(Op::Dec));
        let ops: Vec<_> = p.ops().collect();
        assert_eq!(ops, vec![(1, Op::Inc), (4, Op::Dec)]);
    }
}
