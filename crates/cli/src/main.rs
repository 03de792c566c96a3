//! Effectflow CLI: runs a workflow document and prints the final context.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context as _, Result};
use clap::{Parser, ValueEnum};
use effectflow_engine::{
    Context, Effect, EffectRegistry, PluginCatalog, build_workflow, parse_workflow_file, register_effect_plugins,
};
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[command(name = "effectflow")]
#[command(about = "Run an effectflow workflow document", long_about = None)]
#[command(version)]
struct Cli {
    /// Workflow document to run
    #[arg(short, long, env = "EFFECTFLOW_CONFIG")]
    config: PathBuf,

    /// Qualified effect plugins to register (module::path::Name), comma separated
    #[arg(long, value_delimiter = ',')]
    effects: Vec<String>,

    /// Initial context override as path=value; the value is parsed as YAML
    #[arg(long = "set", value_name = "PATH=VALUE")]
    overrides: Vec<String>,

    /// How to print the final context
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
    None,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let context = run(&cli)?;
    if let Some(rendered) = render(&context, cli.output)? {
        println!("{rendered}");
    }
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: &Cli) -> Result<Context> {
    let mut registry = EffectRegistry::with_builtins();
    let plugins = register_effect_plugins(&mut registry, &PluginCatalog::with_builtins(), &cli.effects)
        .context("failed to register effect plugins")?;
    if !plugins.is_empty() {
        debug!(plugins = ?plugins, "registered effect plugins");
    }

    let definition = parse_workflow_file(&cli.config, Arc::new(registry))?.with_overrides(&cli.overrides)?;
    info!(workflow = %definition.name(), config = %cli.config.display(), "loaded workflow");

    let (context, pipeline) = build_workflow(definition);
    pipeline.execute(&context)
}

fn render(context: &Context, format: OutputFormat) -> Result<Option<String>> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&context.to_value().to_json()).context("failed to render context as JSON")?,
        OutputFormat::Yaml => serde_yaml::to_string(context).context("failed to render context as YAML")?,
        OutputFormat::None => return Ok(None),
    };
    Ok(Some(rendered))
}
