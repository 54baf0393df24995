//! Weft CLI application
//!
//! Renders one template against a JSON parameter set and writes the
//! result to stdout or a file. Warnings are printed to stderr so the
//! rendered document stays clean for piping.

mod args;

use anyhow::Context;
use args::Cli;
use clap::Parser;
use weft_core::{Engine, EngineConfig, Value, null_context};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with environment-based filtering
    // Set RUST_LOG=debug for verbose logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = EngineConfig {
        strict: cli.strict,
        template_dir: cli.root.clone(),
        tag_open: cli.tag_open.clone(),
        tag_close: cli.tag_close.clone(),
        ..EngineConfig::default()
    };
    let params = load_params(&cli)?;

    let engine = Engine::new(config);
    let rendered = engine.compile(&cli.template, null_context(), params).await?;

    for warning in &rendered.warnings {
        eprintln!("warning: {warning}");
    }

    match &cli.output {
        Some(path) => std::fs::write(path, &rendered.text)
            .with_context(|| format!("cannot write output to {}", path.display()))?,
        None => print!("{}", rendered.text),
    }

    Ok(())
}

fn load_params(cli: &Cli) -> anyhow::Result<Value> {
    let json = if let Some(path) = &cli.params {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read params file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("params file {} is not valid JSON", path.display()))?
    } else if let Some(inline) = &cli.params_json {
        serde_json::from_str(inline).context("--params-json is not valid JSON")?
    } else {
        serde_json::Value::Object(serde_json::Map::new())
    };
    Ok(Value::from_json(json))
}
