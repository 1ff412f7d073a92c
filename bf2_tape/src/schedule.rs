// Copyright 2026 the BF2 Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cooperative scheduling for long-running programs.
//!
//! The VM calls [`Scheduler::checkpoint`] every `Limits::yield_interval` operations, always
//! between two instructions. A scheduler can use the call to let its host make progress (pump an
//! event loop, report progress, sleep) and can stop the run by returning [`Control::Stop`].

use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};

/// What the VM should do after a checkpoint.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Control {
    /// Resume at the next instruction.
    Continue,
    /// Halt with `Halt::Cancelled`.
    Stop,
}

/// Run progress reported at a checkpoint.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    /// Operations executed so far.
    pub operations: u64,
    /// Current pointer.
    pub pointer: usize,
}

/// A host hook invoked at the VM's suspension points.
pub trait Scheduler {
    /// Called between instructions. Must not assume any particular call frequency beyond
    /// "every `yield_interval` operations".
    fn checkpoint(&mut self, progress: Progress) -> Control;
}

impl<F> Scheduler for F
where
    F: FnMut(Progress) -> Control,
{
    fn checkpoint(&mut self, progress: Progress) -> Control {
        self(progress)
    }
}

/// A scheduler that never stops the run.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoYield;

impl Scheduler for NoYield {
    fn checkpoint(&mut self, _progress: Progress) -> Control {
        Control::Continue
    }
}

/// A cancellation flag shared between a run and its host.
///
/// Clones observe the same flag. Cancellation is cooperative: it takes effect at the run's next
/// checkpoint.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Safe to call at any time, from any thread, any number of times.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns `true` once [`CancelToken::cancel`] has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Scheduler for CancelToken {
    fn checkpoint(&mut self, _progress: Progress) -> Control {
        if self.is_cancelled() {
            Control::Stop
        } else {
            Control::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AT_ZERO: Progress = Progress {
        operations: 0,
        pointer: 0,
    };

    #[test]
    fn cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let mut seen_by_run = token.clone();
        assert_eq!(seen_by_run.checkpoint(AT_ZERO), Control::Continue);
        token.cancel();
        assert!(seen_by_run.is_cancelled());
        assert_eq!(seen_by_run.checkpoint(AT_ZERO), Control::Stop);
    }

    #[test]
    fn closures_are_schedulers() {
        let mut calls = 0;
        let mut sched = |p: Progress| {
            calls += 1;
            if p.operations >= 10 {
                Control::Stop
            } else {
                Control::Continue
            }
        };
        assert_eq!(sched.checkpoint(AT_ZERO), Control::Continue);
        assert_eq!(
            sched.checkpoint(Progress {
                operations: 10,
                pointer: 0
            }),
            Control::Stop
        );
        assert_eq!(calls, 2);
    }
}
