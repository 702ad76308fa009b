// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! CLI for the CPU feature verifier
//!
//! Loads an x86-64 object file (or raw code) and reports every CPU feature the
//! code needs that the target policy does not permit.
//!
//! # Usage
//!
//! ```bash
//! # Verify against the baseline x86-64 target
//! as -o test.o test.s
//! cpu-verifier test.o
//!
//! # Target a newer machine, without AES
//! cpu-verifier --policy x86-64-v3,-aes test.o
//!
//! # Raw code, listing everything it requires
//! cpu-verifier --raw --summary code.bin
//! ```
//!
//! Exit status: 0 if accepted, 1 if rejected, 2 on any other error.

use std::{fs, path::PathBuf, process::ExitCode};

use clap::Parser;
use cpu_features::policy::DEFAULT_POLICY;
use verifier::{FeaturePolicy, Validator, code_section};

#[derive(Parser)]
#[command(name = "cpu-verifier")]
#[command(version)]
#[command(about = "Check x86-64 code against a CPU feature policy", long_about = None)]
struct Cli {
    /// Permitted features: a level (x86-64, x86-64-v2, ...) and +/- adjustments
    #[arg(long, env = "CPU_VERIFIER_POLICY", default_value = DEFAULT_POLICY)]
    policy: FeaturePolicy,

    /// Treat the input as raw machine code instead of an object file
    #[arg(long)]
    raw: bool,

    /// Print the features the code requires
    #[arg(long)]
    summary: bool,

    /// Input file
    file: PathBuf,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let data = match fs::read(&cli.file) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Failed to read {}: {}", cli.file.display(), e);
            return ExitCode::from(2);
        }
    };

    let code = if cli.raw {
        &data[..]
    } else {
        match code_section(&data) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("{}: {}", cli.file.display(), e);
                return ExitCode::from(2);
            }
        }
    };

    let result = match Validator::verify_code(code, &cli.policy) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Decode error: {}", e);
            return ExitCode::from(2);
        }
    };

    if cli.summary {
        println!("Policy: {}", cli.policy);
        println!("Requires: {}", result.required_features());
    }

    for error in result.errors() {
        println!("{}", error);
    }

    if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        println!("Rejected: {} unsupported cpu feature(s)", result.errors().len());
        ExitCode::from(1)
    }
}
