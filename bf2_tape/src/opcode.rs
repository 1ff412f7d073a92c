// Copyright 2026 the BF2 Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The eight BF2 instructions.
//!
//! Every other character in a program is a no-op.

use core::fmt;

/// A BF2 instruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    /// `>`: move the pointer one cell right.
    Right,
    /// `<`: move the pointer one cell left.
    Left,
    /// `+`: increment the current cell (wrapping).
    Inc,
    /// `-`: decrement the current cell (wrapping).
    Dec,
    /// `.`: emit the current cell.
    Output,
    /// `,`: read one input byte into the current cell (0 once input is exhausted).
    Input,
    /// `[`: skip past the matching `]` if the current cell is zero.
    LoopOpen,
    /// `]`: jump back past the matching `[` if the current cell is non-zero.
    LoopClose,
}

impl Op {
    /// Parses an instruction character.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '>' => Some(Self::Right),
            '<' => Some(Self::Left),
            '+' => Some(Self::Inc),
            '-' => Some(Self::Dec),
            '.' => Some(Self::Output),
            ',' => Some(Self::Input),
            '[' => Some(Self::LoopOpen),
            ']' => Some(Self::LoopClose),
            _ => None,
        }
    }

    /// Returns the source character for this instruction.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Right => '>',
            Self::Left => '<',
            Self::Inc => '+',
            Self::Dec => '-',
            Self::Output => '.',
            Self::Input => ',',
            Self::LoopOpen => '[',
            Self::LoopClose => ']',
        }
    }

    /// Returns `true` if a run of this instruction may be applied as one bulk update.
    #[must_use]
    pub const fn is_collapsible(self) -> bool {
        matches!(self, Self::Right | Self::Left | Self::Inc | Self::Dec)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[cfg(test)]
mod tests {
    use super::Op;

    #[test]
    fn op_chars_round_trip() {
        for c in "><+-.,[]".chars() {
            let op = Op::from_char(c).unwrap();
            assert_eq!(op.as_char(), c);
        }
        assert_eq!(Op::from_char('%'), None);
        assert_eq!(Op::from_char('a'), None);
    }

    #[test]
    fn op_collapsible_classification() {
        assert!(Op::Right.is_collapsible());
        assert!(Op::Left.is_collapsible());
        assert!(Op::Inc.is_collapsible());
        assert!(Op::Dec.is_collapsible());
        assert!(!Op::Output.is_collapsible());
        assert!(!Op::Input.is_collapsible());
        assert!(!Op::LoopOpen.is_collapsible());
        assert!(!Op::LoopClose.is_collapsible());
    }
}
