//! # srptn CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use srptn_cli::check::{run_check, CheckArgs};
use srptn_cli::extend::{run_extend, ExtendArgs};
use srptn_cli::infer::{run_infer, InferArgs};
use srptn_cli::reconcile::{run_reconcile, ReconcileArgs};
use srptn_cli::validate::{run_validate, ValidateArgs};
use srptn_workflow::Settings;

/// srptn — RNA-seq workflow configuration checker
///
/// Validates analysis configurations against the schema shipped with the
/// workflow package, infers schemas from existing configurations, and
/// reports how a configuration's shape differs from the reference.
#[derive(Parser, Debug)]
#[command(name = "srptn", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Base directory for relative paths. Overrides `workdir` in SRPTN_CONFIG.
    #[arg(long, global = true)]
    workdir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a configuration against its reference schema.
    Validate(ValidateArgs),

    /// Infer a schema definition from a configuration document.
    Infer(InferArgs),

    /// Compare a configuration's shape with its reference schema.
    Reconcile(ReconcileArgs),

    /// Print the reference schema extended with the configuration's extra fields.
    Extend(ExtendArgs),

    /// Validate and reconcile; exit 0 only when the analysis may run.
    Check(CheckArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let workdir = match resolve_workdir(cli.workdir) {
        Ok(dir) => dir,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(1);
        }
    };

    tracing::debug!(workdir = %workdir.display(), "resolved workdir");

    let result = match cli.command {
        Commands::Validate(args) => run_validate(&args, &workdir),
        Commands::Infer(args) => run_infer(&args, &workdir),
        Commands::Reconcile(args) => run_reconcile(&args, &workdir),
        Commands::Extend(args) => run_extend(&args, &workdir),
        Commands::Check(args) => run_check(&args, &workdir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

/// `--workdir`, else the settings from SRPTN_CONFIG.
fn resolve_workdir(flag: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match flag {
        Some(dir) => Ok(dir),
        None => Ok(Settings::from_env()?.workdir),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use srptn_cli::OutputFormat;

    #[test]
    fn cli_parse_validate_analysis() {
        let cli = Cli::try_parse_from(["srptn", "validate", "--analysis", "analyses/liver"]).unwrap();
        if let Commands::Validate(args) = cli.command {
            assert_eq!(args.source.analysis, Some(PathBuf::from("analyses/liver")));
            assert!(args.source.config.is_none());
            assert!(!args.json);
        } else {
            panic!("expected validate");
        }
    }

    #[test]
    fn cli_parse_validate_files() {
        let cli = Cli::try_parse_from([
            "srptn",
            "validate",
            "--config",
            "config.yaml",
            "--schema",
            "config.schema.yaml",
            "--json",
        ])
        .unwrap();
        if let Commands::Validate(args) = cli.command {
            assert_eq!(args.source.config, Some(PathBuf::from("config.yaml")));
            assert_eq!(args.source.schema, Some(PathBuf::from("config.schema.yaml")));
            assert!(args.json);
        } else {
            panic!("expected validate");
        }
    }

    #[test]
    fn cli_parse_config_requires_schema() {
        assert!(Cli::try_parse_from(["srptn", "check", "--config", "c.yaml"]).is_err());
    }

    #[test]
    fn cli_parse_analysis_conflicts_with_config() {
        let result = Cli::try_parse_from([
            "srptn", "check", "--analysis", "a", "--config", "c.yaml", "--schema", "s.yaml",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parse_infer_defaults_to_yaml() {
        let cli = Cli::try_parse_from(["srptn", "infer", "config.yaml"]).unwrap();
        if let Commands::Infer(args) = cli.command {
            assert_eq!(args.document, PathBuf::from("config.yaml"));
            assert_eq!(args.format, OutputFormat::Yaml);
            assert!(args.output.is_none());
        } else {
            panic!("expected infer");
        }
    }

    #[test]
    fn cli_parse_infer_json_to_file() {
        let cli =
            Cli::try_parse_from(["srptn", "infer", "c.yaml", "--format", "json", "-o", "s.json"]).unwrap();
        if let Commands::Infer(args) = cli.command {
            assert_eq!(args.format, OutputFormat::Json);
            assert_eq!(args.output, Some(PathBuf::from("s.json")));
        } else {
            panic!("expected infer");
        }
    }

    #[test]
    fn cli_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["srptn", "reconcile", "-vv", "--workdir", "/data"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.workdir, Some(PathBuf::from("/data")));
        assert!(matches!(cli.command, Commands::Reconcile(_)));
    }

    #[test]
    fn cli_parse_extend_and_check() {
        let cli = Cli::try_parse_from(["srptn", "extend", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Extend(ref a) if a.json));
        let cli = Cli::try_parse_from(["srptn", "check"]).unwrap();
        assert!(matches!(cli.command, Commands::Check(_)));
    }

    #[test]
    fn cli_parse_requires_subcommand() {
        assert!(Cli::try_parse_from(["srptn"]).is_err());
    }

    #[test]
    fn workdir_flag_wins() {
        let dir = resolve_workdir(Some(PathBuf::from("/data"))).unwrap();
        assert_eq!(dir, PathBuf::from("/data"));
    }
}
