// Copyright 2026 the BF2 Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conformance tests for `bf2_tape` live in `tests/`.
//!
//! Run with:
//! `cargo test -p bf2_tape_conformance`
