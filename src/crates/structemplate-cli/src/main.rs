//! # structemplate
//!
//! Render manifest templates with StrSlot and path-target parameters.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use structemplate::config::load_values_file;
use structemplate::{get, parse_manifest, to_json, to_yaml, RenderOptions, Template, ValueMap};

#[derive(Parser)]
#[command(name = "structemplate")]
#[command(about = "Render YAML/JSON manifest templates with parameter values", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a manifest template
    Render {
        /// Manifest template (YAML or JSON, multi-document)
        #[arg(short, long)]
        manifest: PathBuf,

        /// Parameter definitions file (.yaml, .yml or .json)
        #[arg(short, long)]
        params: Option<PathBuf>,

        /// Parameter values file (.yaml, .yml or .json)
        #[arg(short, long)]
        values: Option<PathBuf>,

        /// Set a single value, e.g. --set PORT=8443 (parsed as YAML)
        #[arg(long = "set", value_name = "CODE=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, JsonValue)>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
        format: OutputFormat,

        /// Fail when a StrSlot placeholder has no value (also STRUCTEMPLATE_STRICT=true)
        #[arg(long)]
        strict: bool,
    },

    /// Print the value at a path of every document of a kind
    Get {
        /// Manifest file (YAML or JSON, multi-document)
        #[arg(short, long)]
        manifest: PathBuf,

        /// Document kind, e.g. TLSRoute
        #[arg(short, long)]
        kind: String,

        /// Path expression, e.g. .spec.hostnames
        #[arg(long, default_value = ".")]
        path: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(rust_log)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            manifest,
            params,
            values,
            set,
            format,
            strict,
        } => {
            let output = render(
                &manifest,
                params.as_deref(),
                values.as_deref(),
                set,
                format,
                strict,
            )?;
            print!("{}", output);
        }
        Commands::Get {
            manifest,
            kind,
            path,
        } => {
            for value in get_values(&manifest, &kind, &path)? {
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
        }
    }

    Ok(())
}

fn render(
    manifest: &Path,
    params: Option<&Path>,
    values_path: Option<&Path>,
    set: Vec<(String, JsonValue)>,
    format: OutputFormat,
    strict: bool,
) -> Result<String> {
    let template = Template::load(manifest, params)
        .with_context(|| format!("Failed to load template {}", manifest.display()))?;

    let mut values = match values_path {
        Some(path) => load_values_file(path)
            .with_context(|| format!("Failed to load values from {}", path.display()))?,
        None => ValueMap::new(),
    };
    values.extend(set);

    let mut options = RenderOptions::from_env()?;
    options.strict |= strict;
    tracing::info!(
        params = template.params.len(),
        values = values.len(),
        strict = options.strict,
        "rendering template"
    );
    let rendered = template
        .render(&values, &options)
        .context("Failed to render template")?;

    let output = match format {
        OutputFormat::Yaml => to_yaml(&rendered.documents)?,
        OutputFormat::Json => format!("{}\n", to_json(&rendered.documents)?),
    };
    Ok(output)
}

fn get_values(manifest: &Path, kind: &str, path: &str) -> Result<Vec<JsonValue>> {
    let content = std::fs::read_to_string(manifest)
        .with_context(|| format!("Failed to read {}", manifest.display()))?;
    let documents = parse_manifest(&content)?;

    let mut found = Vec::new();
    for document in documents.iter().filter(|d| d.kind().kind == kind) {
        let value = get(document.object(), path).with_context(|| {
            format!(
                "Failed to read {} from {} {}",
                path,
                kind,
                document.name().unwrap_or("<unnamed>")
            )
        })?;
        found.push(value);
    }

    if found.is_empty() {
        bail!("No documents of kind {} in {}", kind, manifest.display());
    }
    Ok(found)
}

/// Parse `CODE=VALUE`, reading VALUE as a YAML scalar or collection.
fn parse_assignment(raw: &str) -> std::result::Result<(String, JsonValue), String> {
    let (code, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected CODE=VALUE, got \"{}\"", raw))?;
    if code.is_empty() {
        return Err(format!("missing parameter code in \"{}\"", raw));
    }

    let value = match serde_yaml::from_str::<JsonValue>(value) {
        Ok(JsonValue::Null) if value.trim().is_empty() => JsonValue::String(String::new()),
        Ok(parsed) => structemplate::normalize_value(parsed).map_err(|e| e.to_string())?,
        Err(_) => JsonValue::String(value.to_string()),
    };
    Ok((code.to_string(), value))
}
