#![cfg(feature = "json_schema")]

use advfilter::core::models::ApiFilterRequest;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jsonschema::{Draft, JSONSchema};
use schemars::schema_for;
use std::{fs, path::PathBuf};

/// Generate the JSON Schema for filter requests or validate a query file against it.
#[derive(Parser, Debug)]
#[command(name = "query-schema", about = "Filter request schema generator and validator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the request JSON schema (or write it to a file)
    Schema {
        /// Optional output path for the schema JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a JSON or YAML query file against the request schema
    Validate {
        /// Path to the query file to validate
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Schema { output } => {
            let schema = schema_for!(ApiFilterRequest);
            let json = serde_json::to_string_pretty(&schema)?;

            if let Some(path) = output {
                fs::write(&path, json)?;
                eprintln!("Wrote schema to {}", path.display());
            } else {
                println!("{json}");
            }
        }
        Command::Validate { file } => {
            let schema = schema_for!(ApiFilterRequest);
            // jsonschema keeps a reference to the schema; leak a small boxed value to satisfy 'static.
            let schema_json = serde_json::to_value(schema)?;
            let schema_ref: &'static serde_json::Value = Box::leak(Box::new(schema_json));
            let compiled = JSONSchema::options()
                .with_draft(Draft::Draft7)
                .compile(schema_ref)
                .context("failed to compile request schema")?;

            let text = fs::read_to_string(&file).context("failed to read query file")?;
            let is_yaml = file
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "yml" || ext == "yaml");
            // Validate the raw document, not a re-serialized request, so bad operator codes show up here
            let value: serde_json::Value = if is_yaml {
                serde_yaml::from_str(&text).context("failed to parse YAML query")?
            } else {
                serde_json::from_str(&text).context("failed to parse JSON query")?
            };

            if let Err(errors) = compiled.validate(&value) {
                eprintln!("Validation errors for {}:", file.display());
                for err in errors {
                    eprintln!("- {} at {}", err, err.instance_path);
                }
                std::process::exit(1);
            } else {
                println!("{} is a valid filter request", file.display());
            }
        }
    }

    Ok(())
}
