//! # Validate Subcommand
//!
//! Check a configuration document against its reference schema and print
//! every violation, one per line.

use std::path::Path;

use anyhow::Result;
use clap::Args;

use srptn_schema::{render_violations, validate};

use crate::{to_json, SourceArgs};

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Print violations as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the validate subcommand. Exit code 1 when any violation is found.
pub fn run_validate(args: &ValidateArgs, workdir: &Path) -> Result<u8> {
    let inputs = args.source.load(workdir)?;
    let violations = validate(&inputs.document, &inputs.canonical);

    if args.json {
        println!("{}", to_json(&violations)?);
    } else if violations.is_empty() {
        println!("OK: {}", inputs.config_path.display());
    } else {
        println!("FAIL: {} ({} violation(s))", inputs.config_path.display(), violations.len());
        println!("{}", render_violations(&violations));
    }

    Ok(u8::from(!violations.is_empty()))
}
