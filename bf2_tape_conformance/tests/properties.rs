// Copyright 2026 the BF2 Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(missing_docs, reason = "integration test crate")]

use bf2_tape::schedule::{Control, Progress};
use bf2_tape::vm::{Halt, Limits, RunResult, Vm};
use proptest::prelude::*;

/// Balanced BF2 programs, optionally containing loops.
fn program() -> impl Strategy<Value = String> {
    let leaf = prop::collection::vec(
        prop::sample::select(vec!['+', '-', '>', '<', '.', ',', 'x']),
        0..16,
    )
    .prop_map(|cs| cs.into_iter().collect::<String>());
    leaf.prop_recursive(3, 96, 4, |inner| {
        prop::collection::vec(
            prop_oneof![inner.clone(), inner.prop_map(|body| format!("[{body}]"))],
            1..4,
        )
        .prop_map(|parts| parts.concat())
    })
}

/// A program with a length directive of 1..=16 cells.
fn sized_program() -> impl Strategy<Value = String> {
    (1_usize..=16, program()).prop_map(|(len, body)| format!("%{}%{body}", "+".repeat(len)))
}

fn same_state(a: &RunResult, b: &RunResult) -> Result<(), TestCaseError> {
    prop_assert_eq!(&a.tape, &b.tape);
    prop_assert_eq!(a.pointer, b.pointer);
    prop_assert_eq!(&a.output, &b.output);
    prop_assert_eq!(a.operation_count, b.operation_count);
    Ok(())
}

proptest! {
    #[test]
    fn collapsed_and_traced_runs_agree(src in sized_program(), input in ".{0,8}") {
        let limit = 2_000;
        let vm = Vm::new(Limits {
            max_ops: limit,
            max_traced_ops: limit,
            ..Limits::default()
        });
        let plain = vm.run(&src, input.as_bytes(), false);
        let traced = vm.run(&src, input.as_bytes(), true);
        same_state(&plain, &traced)?;
        prop_assert_eq!(&plain.halt, &traced.halt);
        prop_assert_eq!(&plain.output_text, &traced.output_text);
        // One line per executed instruction plus the initial and final snapshots; a faulting
        // move still gets its line.
        prop_assert_eq!(traced.trace.len() as u64, traced.operation_count + 2);
    }

    #[test]
    fn unbalanced_programs_never_execute(src in "[+\\-<>.\\[\\]]{0,24}") {
        let out = Vm::default().run(&src, b"", false);
        if let Halt::Bracket(e) = &out.halt {
            prop_assert_eq!(out.operation_count, 0);
            prop_assert_eq!(&out.output_text, &e.to_string());
            prop_assert!(out.tape.iter().all(|&c| c == 0));
        }
    }

    #[test]
    fn exhausted_input_reads_zero(input in ".{0,8}", preset in any::<u8>(), extra in 1_usize..8) {
        let reads = input.len() + extra;
        let src = format!("%+%{}{}", "+".repeat(usize::from(preset)), ",".repeat(reads));
        let out = Vm::default().run(&src, input.as_bytes(), false);
        prop_assert_eq!(&out.halt, &Halt::Normal);
        prop_assert_eq!(out.tape[0], 0);
    }

    #[test]
    fn cancelled_state_matches_limited_run(
        src in sized_program(),
        // At least as long as any directive, so the limited run sizes its tape identically.
        interval in 16_u64..64,
        stop_at in 1_u64..20,
    ) {
        let vm = Vm::new(Limits {
            max_ops: 10_000,
            yield_interval: interval,
            ..Limits::default()
        });
        let mut seen = 0;
        let mut sched = |_: Progress| {
            seen += 1;
            if seen == stop_at { Control::Stop } else { Control::Continue }
        };
        let cancelled = vm.run_with_scheduler(&src, b"", false, &mut sched);
        if cancelled.halt == Halt::Cancelled {
            prop_assert_eq!(cancelled.operation_count, interval * stop_at);
            let limited = Vm::new(Limits {
                max_ops: interval * stop_at,
                ..Limits::default()
            })
            .run(&src, b"", false);
            prop_assert_eq!(&limited.halt, &Halt::OperationLimit { limit: interval * stop_at });
            same_state(&cancelled, &limited)?;
        }
    }

    #[test]
    fn cell_values_wrap(n in 0_usize..1_024) {
        let out = Vm::default().run(&format!("%+%{}", "+".repeat(n)), b"", false);
        prop_assert_eq!(usize::from(out.tape[0]), n % 256);
        let out = Vm::default().run(&format!("%+%{}", "-".repeat(n)), b"", false);
        prop_assert_eq!(usize::from(out.tape[0]), (256 - n % 256) % 256);
    }
}
