// Copyright 2026 the BF2 Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Traced run example.
//!
//! Run with:
//! `cargo run -p bf2_tape --example trace`

use bf2_tape::brackets::resolve;
use bf2_tape::compile::{Collapse, compile};
use bf2_tape::directive::preprocess;
use bf2_tape::{Limits, Vm};

fn main() {
    // Copy the input byte to cell 1, then print both cells.
    let source = "%++% ,[->+<] >. <.";
    let limits = Limits::default();

    let pre = preprocess(source, &limits);
    let brackets = resolve(&pre.program).unwrap();
    println!("; tape length {}", pre.tape_len);
    print!("{}", compile(&pre.program, &brackets, Collapse::Runs));
    println!();

    let result = Vm::new(limits).run(source, b"\x03", true);
    println!("{}", result.output_text);
    println!("; {} operations", result.operation_count);
    for line in &result.trace {
        println!("{line}");
    }
}
