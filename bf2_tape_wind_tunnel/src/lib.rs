// Copyright 2026 the BF2 Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `bf2_tape` live in `benches/`.
//!
//! Run with:
//! `cargo bench -p bf2_tape_wind_tunnel`
