//! # Extend Subcommand
//!
//! Print the reference schema widened with the fields the document adds,
//! so forms can render them. Added paths are listed on stderr.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use serde_json::json;

use srptn_schema::extend;

use crate::{render_definition, to_json, OutputFormat, SourceArgs};

/// Arguments for the extend subcommand.
#[derive(Args, Debug)]
pub struct ExtendArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output format of the schema definition.
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    /// Print `{"added": [...], "schema": {...}}` as JSON.
    #[arg(long, conflicts_with = "format")]
    pub json: bool,
}

/// Execute the extend subcommand.
pub fn run_extend(args: &ExtendArgs, workdir: &Path) -> Result<u8> {
    let inputs = args.source.load(workdir)?;
    let extension = extend(&inputs.canonical, &inputs.document);
    let definition = extension.schema.to_definition();

    if args.json {
        println!(
            "{}",
            to_json(&json!({ "added": extension.added, "schema": definition }))?
        );
        return Ok(0);
    }

    print!("{}", render_definition(&definition, args.format)?);
    if !extension.is_unchanged() {
        eprintln!("added {} field(s) unknown to the reference schema:", extension.added.len());
        for path in &extension.added {
            eprintln!("  {}", path.to_breadcrumb());
        }
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{analysis, VALID_CONFIG};

    #[test]
    fn extends_with_document_fields() {
        let dir = analysis(&format!("{VALID_CONFIG}scatter:\n  activate: true\n"));
        let args = ExtendArgs {
            source: SourceArgs::default(),
            format: OutputFormat::Yaml,
            json: true,
        };
        assert_eq!(run_extend(&args, dir.path()).unwrap(), 0);
    }
}
