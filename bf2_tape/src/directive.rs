// Copyright 2026 the BF2 Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The `%...%` tape-length directive.
//!
//! The text between the first two `%` characters is itself a BF2 program. It is run on a fresh
//! [`Vm`] and the value it leaves in cell 0 becomes the main program's tape length. Only the
//! first pair is a directive; any later `%` is an ordinary no-op character.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::program::Program;
use crate::schedule::{NoYield, Scheduler};
use crate::vm::{Halt, Limits, Vm};

/// Why the tape fell back to the default length.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LengthWarning {
    /// The source has fewer than two `%` characters.
    Missing,
    /// The directive is `%%` (or whitespace only).
    Empty,
    /// The directive left cell 0 at zero.
    NonPositive,
}

impl LengthWarning {
    /// The warning line shown to users when the tape falls back to `fallback_len` cells.
    #[must_use]
    pub fn message(self, fallback_len: usize) -> String {
        format!("Warning: {self}. Using default length of {fallback_len}.")
    }
}

impl fmt::Display for LengthWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Users see the same line for all three causes.
        write!(f, "Tape length not defined")
    }
}

/// A source split into its main program and resolved tape length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preprocessed {
    /// The whitespace-stripped program with the first `%...%` span removed.
    pub program: Program,
    /// Tape length for the main run.
    pub tape_len: usize,
    /// Set when `tape_len` is the default.
    pub warning: Option<LengthWarning>,
    /// Set when the host stopped the run while the directive was executing.
    pub cancelled: bool,
}

/// Strips `source`, extracts the first `%...%` directive, and evaluates it.
///
/// The directive runs under the same `limits` as any other program (with its own operation
/// counter). Its tape is read regardless of how it halted.
#[must_use]
pub fn preprocess(source: &str, limits: &Limits) -> Preprocessed {
    preprocess_with_scheduler(source, limits, &mut NoYield)
}

/// Like [`preprocess`], passing the directive's checkpoints to `scheduler`.
///
/// A [`Control::Stop`](crate::schedule::Control::Stop) during the directive sets
/// [`Preprocessed::cancelled`].
pub fn preprocess_with_scheduler(
    source: &str,
    limits: &Limits,
    scheduler: &mut dyn Scheduler,
) -> Preprocessed {
    let stripped = Program::strip(source);
    let default_len = limits.default_tape_len();
    let fallback = |program: Program, warning: LengthWarning| {
        tracing::debug!(?warning, default_len, "bf2 tape length defaulted");
        Preprocessed {
            program,
            tape_len: default_len,
            warning: Some(warning),
            cancelled: false,
        }
    };

    let chars = stripped.chars();
    let mut marks = chars
        .iter()
        .enumerate()
        .filter(|(_, c)| **c == '%')
        .map(|(i, _)| i);
    let (Some(open), Some(close)) = (marks.next(), marks.next()) else {
        return fallback(stripped, LengthWarning::Missing);
    };

    let directive = Program::from_chars(chars[open + 1..close].to_vec());
    let mut rest: Vec<char> = Vec::with_capacity(chars.len() - (close - open + 1));
    rest.extend_from_slice(&chars[..open]);
    rest.extend_from_slice(&chars[close + 1..]);
    let program = Program::from_chars(rest);

    if directive.is_empty() {
        return fallback(program, LengthWarning::Empty);
    }

    let nested = Vm::new(limits.clone()).run_nested(&directive, scheduler);
    let cancelled = nested.halt == Halt::Cancelled;
    let declared = nested.tape.first().copied().unwrap_or(0);
    tracing::debug!(
        directive = %directive,
        declared,
        halt = %nested.halt,
        operations = nested.operations,
        "bf2 length directive evaluated"
    );
    if declared == 0 {
        return Preprocessed {
            cancelled,
            ..fallback(program, LengthWarning::NonPositive)
        };
    }

    Preprocessed {
        program,
        tape_len: usize::from(declared),
        warning: None,
        cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{Control, Progress};
    use alloc::string::ToString;

    fn pre(src: &str) -> Preprocessed {
        preprocess(src, &Limits::default())
    }

    #[test]
    fn directive_sizes_tape() {
        let p = pre("%++%>..");
        assert_eq!(p.tape_len, 2);
        assert_eq!(p.warning, None);
        assert_eq!(p.program.to_string(), ">..");
    }

    #[test]
    fn directive_may_appear_anywhere() {
        let p = pre("+>%+++%<-");
        assert_eq!(p.tape_len, 3);
        assert_eq!(p.program.to_string(), "+><-");
    }

    #[test]
    fn directive_can_loop() {
        // 5 * 6 = 30
        let p = pre("%+++++[>++++++<-]>[<+>-]%");
        assert_eq!(p.tape_len, 30);
        assert!(p.program.is_empty());
    }

    #[test]
    fn whitespace_inside_directive_is_ignored() {
        let p = pre("% + +\n+ %.");
        assert_eq!(p.tape_len, 3);
        assert_eq!(p.program.to_string(), ".");
    }

    #[test]
    fn missing_directive_defaults() {
        let p = pre("+++.");
        assert_eq!(p.tape_len, 10);
        assert_eq!(p.warning, Some(LengthWarning::Missing));
        assert_eq!(p.program.to_string(), "+++.");

        let p = pre("%+++.");
        assert_eq!(p.warning, Some(LengthWarning::Missing));
        assert_eq!(p.program.to_string(), "%+++.");
    }

    #[test]
    fn empty_directive_defaults_and_is_removed() {
        let p = pre("%  %+.");
        assert_eq!(p.tape_len, 10);
        assert_eq!(p.warning, Some(LengthWarning::Empty));
        assert_eq!(p.program.to_string(), "+.");
    }

    #[test]
    fn zero_length_defaults() {
        let p = pre("%+-%+");
        assert_eq!(p.tape_len, 10);
        assert_eq!(p.warning, Some(LengthWarning::NonPositive));

        // 256 wraps to 0.
        let src = format!("%{}%", "+".repeat(256));
        assert_eq!(pre(&src).warning, Some(LengthWarning::NonPositive));
    }

    #[test]
    fn only_first_pair_is_a_directive() {
        let p = pre("%++%+%+++%");
        assert_eq!(p.tape_len, 2);
        assert_eq!(p.program.to_string(), "+%+++%");
    }

    #[test]
    fn faulting_directive_still_yields_cell_zero() {
        // Unbalanced: the sub-run never executes, cell 0 stays 0.
        assert_eq!(pre("%+++[%").warning, Some(LengthWarning::NonPositive));
        // Bounds fault after cell 0 was set.
        let p = pre("%++++<%");
        assert_eq!(p.tape_len, 4);
        assert_eq!(p.warning, None);
    }

    #[test]
    fn nested_directive_markers_are_not_reparsed() {
        // The sub-program is "+" only; "%" cannot appear inside it.
        let p = pre("%+%%+++%");
        assert_eq!(p.tape_len, 1);
        assert_eq!(p.program.to_string(), "%+++%");
    }

    #[test]
    fn stopped_directive_is_reported() {
        let limits = Limits {
            yield_interval: 8,
            ..Limits::default()
        };
        let mut checkpoints = 0;
        let mut stop_second = |_: Progress| {
            checkpoints += 1;
            if checkpoints == 2 {
                Control::Stop
            } else {
                Control::Continue
            }
        };
        let p = preprocess_with_scheduler("%++[]%>.", &limits, &mut stop_second);
        assert!(p.cancelled);
        assert_eq!(checkpoints, 2);
        assert_eq!(p.tape_len, 2);
        assert_eq!(p.program.to_string(), ">.");

        // Directives that finish before a checkpoint never consult the host.
        let p = preprocess_with_scheduler("%++%>.", &limits, &mut |_: Progress| Control::Stop);
        assert!(!p.cancelled);
    }

    #[test]
    fn warning_message_names_fallback_length() {
        assert_eq!(
            LengthWarning::Missing.message(10),
            "Warning: Tape length not defined. Using default length of 10."
        );
    }
}
