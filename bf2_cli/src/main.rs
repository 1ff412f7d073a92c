// Copyright 2026 the BF2 Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `bf2`: run a BF2 program from a file or stdin.
//!
//! Run with:
//! `cargo run -p bf2_cli -- program.bf2 --input "text"`

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use bf2_tape::brackets::resolve;
use bf2_tape::compile::{Collapse, compile};
use bf2_tape::directive::preprocess;
use bf2_tape::vm::Limits;
use bf2_tape::worker::{self, Request, Response};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bf2", version, about = "Run BF2 programs")]
struct Cli {
    /// Source file; reads stdin when omitted.
    file: Option<PathBuf>,

    /// Input consumed by `,`.
    #[arg(short, long, default_value = "")]
    input: String,

    /// Record and print a per-step tape trace.
    #[arg(short, long)]
    trace: bool,

    /// JSON file with `Limits` fields; missing fields keep their defaults.
    #[arg(long)]
    limits: Option<PathBuf>,

    /// Operation budget for untraced runs.
    #[arg(long)]
    max_ops: Option<u64>,

    /// Operation budget for traced runs.
    #[arg(long)]
    max_traced_ops: Option<u64>,

    /// Maximum number of output bytes kept.
    #[arg(long)]
    max_output: Option<usize>,

    /// Print the response as JSON.
    #[arg(long, conflicts_with = "raw")]
    json: bool,

    /// Write raw output bytes instead of the rendered output text.
    #[arg(long)]
    raw: bool,

    /// Print the compiled instruction listing instead of running.
    #[arg(long, conflicts_with_all = ["json", "raw", "trace"])]
    dump: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_limits(cli: &Cli) -> Result<Limits> {
    let mut limits = match &cli.limits {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading limits file {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing limits file {}", path.display()))?
        }
        None => Limits::default(),
    };
    if let Some(n) = cli.max_ops {
        limits.max_ops = n;
    }
    if let Some(n) = cli.max_traced_ops {
        limits.max_traced_ops = n;
    }
    if let Some(n) = cli.max_output {
        limits.max_output = n;
    }
    Ok(limits)
}

fn read_source(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        }
        None => {
            let mut src = String::new();
            io::stdin()
                .read_to_string(&mut src)
                .context("reading program from stdin")?;
            Ok(src)
        }
    }
}

fn dump(source: &str, limits: &Limits) -> Result<ExitCode> {
    let pre = preprocess(source, limits);
    let brackets = resolve(&pre.program)?;
    let compiled = compile(&pre.program, &brackets, Collapse::Runs);
    println!("; tape length {}", pre.tape_len);
    print!("{compiled}");
    Ok(ExitCode::SUCCESS)
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let limits = load_limits(cli)?;
    let source = read_source(cli.file.as_deref())?;
    if cli.dump {
        return dump(&source, &limits);
    }

    if cli.json {
        let request = Request {
            code: source,
            input: cli.input.clone(),
            record_tape: cli.trace,
        };
        let response = worker::spawn(request, limits)?.wait();
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(match response {
            Response::Finished { .. } => ExitCode::SUCCESS,
            Response::Error { .. } => ExitCode::FAILURE,
        });
    }

    let result = bf2_tape::Vm::new(limits).run(&source, cli.input.as_bytes(), cli.trace);
    tracing::info!(
        operations = result.operation_count,
        halt = %result.halt,
        "run finished"
    );
    if cli.raw {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&result.output)?;
        stdout.flush()?;
        if let Some(notice) = result.halt.notice() {
            eprintln!("{notice}");
        }
    } else {
        println!("{}", result.output_text);
        if cli.trace {
            println!();
            for line in &result.trace {
                println!("{line}");
            }
        }
    }
    Ok(exit_code(result.halt.is_normal()))
}

fn exit_code(normal: bool) -> ExitCode {
    if normal {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
