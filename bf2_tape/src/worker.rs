// Copyright 2026 the BF2 Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A message-passing host for running BF2 off the caller's thread.
//!
//! A [`Request`] is executed on a dedicated thread and answered with exactly one [`Response`].
//! Both are serde types with camelCase field names so they can cross a JSON boundary unchanged.
//! The caller keeps a [`RunHandle`] to cancel the run or wait for its response.

use std::string::String;
use std::sync::mpsc;
use std::thread;
use std::time::Instant;
use std::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::schedule::CancelToken;
use crate::vm::{Limits, Vm};

/// A run request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// BF2 source text.
    pub code: String,
    /// Bytes consumed by `,`.
    #[serde(default)]
    pub input: String,
    /// Whether to record a tape trace.
    #[serde(default)]
    pub record_tape: bool,
}

/// The answer to a [`Request`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    /// The run completed (with any halt reason, including cancellation).
    #[serde(rename_all = "camelCase")]
    Finished {
        /// Rendered output plus warnings and halt notices.
        output_text: String,
        /// Tape trace lines; empty unless requested.
        trace: Vec<String>,
        /// Executed operations.
        operation_count: u64,
        /// Wall-clock run time in milliseconds, measured on the worker thread.
        elapsed_ms: f64,
    },
    /// The request could not be run.
    Error {
        /// Human-readable reason.
        error: String,
    },
}

/// Failure to start a worker.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// The OS refused to create the thread.
    #[error("failed to spawn bf2 worker thread")]
    Spawn(#[source] std::io::Error),
}

/// Runs `request` on the current thread, stopping at the next checkpoint once `cancel` is set.
#[must_use]
pub fn handle(request: &Request, limits: &Limits, cancel: &CancelToken) -> Response {
    if request.code.is_empty() {
        return Response::Error {
            error: "Error: Code cannot be empty.".into(),
        };
    }
    let start = Instant::now();
    let mut scheduler = cancel.clone();
    let result = Vm::new(limits.clone()).run_with_scheduler(
        &request.code,
        request.input.as_bytes(),
        request.record_tape,
        &mut scheduler,
    );
    let elapsed_ms = start.elapsed().as_secs_f64() * 1_000.0;
    tracing::debug!(
        halt = %result.halt,
        operations = result.operation_count,
        elapsed_ms,
        "bf2 worker run finished"
    );
    Response::Finished {
        output_text: result.output_text,
        trace: result.trace,
        operation_count: result.operation_count,
        elapsed_ms,
    }
}

/// A run in progress on a worker thread.
#[derive(Debug)]
pub struct RunHandle {
    cancel: CancelToken,
    rx: mpsc::Receiver<Response>,
    thread: thread::JoinHandle<()>,
}

impl RunHandle {
    /// Requests cancellation. The run stops at its next checkpoint and still responds.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A token observing the same cancellation flag as this run.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Returns the response if the run has already finished.
    #[must_use]
    pub fn try_response(&self) -> Option<Response> {
        self.rx.try_recv().ok()
    }

    /// Blocks until the run responds.
    ///
    /// A run that panicked is reported as [`Response::Error`].
    #[must_use]
    pub fn wait(self) -> Response {
        match self.rx.recv() {
            Ok(response) => {
                let _ = self.thread.join();
                response
            }
            Err(_) => {
                let error = match self.thread.join() {
                    Err(payload) => panic_message(payload.as_ref()),
                    Ok(()) => "bf2 worker exited without responding".into(),
                };
                tracing::warn!(%error, "bf2 worker failed");
                Response::Error { error }
            }
        }
    }
}

/// Starts `request` on a new thread.
pub fn spawn(request: Request, limits: Limits) -> Result<RunHandle, WorkerError> {
    let cancel = CancelToken::new();
    let (tx, rx) = mpsc::channel();
    let worker_cancel = cancel.clone();
    let thread = thread::Builder::new()
        .name("bf2-worker".into())
        .spawn(move || {
            let response = handle(&request, &limits, &worker_cancel);
            // The handle may have been dropped; nobody is waiting then.
            let _ = tx.send(response);
        })
        .map_err(WorkerError::Spawn)?;
    Ok(RunHandle { cancel, rx, thread })
}

fn panic_message(payload: &(dyn core::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).into()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "bf2 worker panicked".into()
    }
}
