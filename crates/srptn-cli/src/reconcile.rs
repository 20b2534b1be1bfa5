//! # Reconcile Subcommand
//!
//! Compare the shape of a configuration document with its reference
//! schema: fields to add, fields the reference does not know, and fields
//! with the wrong type.

use std::path::Path;

use anyhow::Result;
use clap::Args;

use srptn_schema::{infer, reconcile};

use crate::{to_json, SourceArgs};

/// Arguments for the reconcile subcommand.
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Print the diff as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the reconcile subcommand. Exit code 1 when a required field is
/// missing or a type disagrees; extra fields alone exit 0.
pub fn run_reconcile(args: &ReconcileArgs, workdir: &Path) -> Result<u8> {
    let inputs = args.source.load(workdir)?;
    let diff = reconcile(&infer(&inputs.document), &inputs.canonical);

    if args.json {
        println!("{}", to_json(&diff)?);
    } else {
        print!("{diff}");
        if diff.is_empty() {
            println!();
        }
    }

    Ok(u8::from(!diff.is_consistent()))
}
