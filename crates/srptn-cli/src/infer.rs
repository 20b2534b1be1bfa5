//! # Infer Subcommand
//!
//! Print the schema inferred from one configuration document, in the
//! definition form a workflow package can ship as its config schema.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use srptn_schema::infer;
use srptn_workflow::{load_document, write_document};

use crate::{render_definition, resolve_path, OutputFormat};

/// Arguments for the infer subcommand.
#[derive(Args, Debug)]
pub struct InferArgs {
    /// Configuration document (YAML or JSON).
    pub document: PathBuf,

    /// Output format of the schema definition.
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    /// Write the definition to this file instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Execute the infer subcommand.
pub fn run_infer(args: &InferArgs, workdir: &Path) -> Result<u8> {
    let path = resolve_path(&args.document, workdir);
    let document =
        load_document(&path).with_context(|| format!("failed to load {}", path.display()))?;
    let rendered = render_definition(&infer(&document).to_definition(), args.format)?;

    match &args.output {
        Some(output) => {
            write_document(output, &rendered)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("OK: wrote {}", output.display());
        }
        None => print!("{rendered}"),
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{write, VALID_CONFIG};

    #[test]
    fn writes_inferred_definition() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "config.yaml", VALID_CONFIG);
        let output = dir.path().join("config.schema.json");
        let args = InferArgs {
            document: PathBuf::from("config.yaml"),
            format: OutputFormat::Json,
            output: Some(output.clone()),
        };
        assert_eq!(run_infer(&args, dir.path()).unwrap(), 0);

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(written["properties"]["pca"]["properties"]["labels"]["items"]["type"], "string");
        assert!(written.get("required").is_none());
    }

    #[test]
    fn empty_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "config.yaml", "");
        let args = InferArgs {
            document: PathBuf::from("config.yaml"),
            format: OutputFormat::Yaml,
            output: None,
        };
        let err = run_infer(&args, dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("configuration file is empty"), "{err:#}");
    }

    #[test]
    fn unwritable_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "config.yaml", VALID_CONFIG);
        let output = dir.path().join("missing/config.schema.yaml");
        let args = InferArgs {
            document: PathBuf::from("config.yaml"),
            format: OutputFormat::Yaml,
            output: Some(output.clone()),
        };
        let err = run_infer(&args, dir.path()).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("failed to write"), "{message}");
        assert!(message.contains("I/O error"), "{message}");
        assert!(!output.exists());
    }
}
