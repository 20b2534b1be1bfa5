//! # Check Subcommand
//!
//! Validation plus reconciliation in one report. The exit code says
//! whether the analysis may be started.

use std::path::Path;

use anyhow::Result;
use clap::Args;

use srptn_schema::check;

use crate::{to_json, SourceArgs};

/// Arguments for the check subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the check subcommand. Exit code 0 when the configuration is
/// runnable.
pub fn run_check(args: &CheckArgs, workdir: &Path) -> Result<u8> {
    let inputs = args.source.load(workdir)?;
    let report = check(&inputs.document, &inputs.canonical);
    let runnable = report.is_runnable();
    tracing::debug!(runnable, config = %inputs.config_path.display(), "checked configuration");

    if args.json {
        println!(
            "{}",
            to_json(&serde_json::json!({ "runnable": runnable, "report": report }))?
        );
    } else {
        println!("{report}");
        if runnable {
            println!("OK: {} is ready to run", inputs.config_path.display());
        } else {
            println!("FAIL: {} needs changes before a run", inputs.config_path.display());
        }
    }

    Ok(u8::from(!runnable))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{analysis, VALID_CONFIG};

    fn args(json: bool) -> CheckArgs {
        CheckArgs {
            source: SourceArgs::default(),
            json,
        }
    }

    #[test]
    fn runnable_config_exits_zero() {
        let dir = analysis(VALID_CONFIG);
        assert_eq!(run_check(&args(false), dir.path()).unwrap(), 0);
        assert_eq!(run_check(&args(true), dir.path()).unwrap(), 0);
    }

    #[test]
    fn wrong_type_exits_one() {
        let dir = analysis("samples: s.tsv\npca:\n  activate: yes please\n  labels: []\n");
        assert_eq!(run_check(&args(false), dir.path()).unwrap(), 1);
    }
}
