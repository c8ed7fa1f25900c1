use anyhow::{Context, Result};
use clap::Parser;
use sprintlens::{
    cli::{Cli, OutputFormat},
    config::Config,
    report::Report,
    source::{JsonExportSource, RecordSource},
};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => Config::from_toml(path),
        None => Ok(Config::default()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = load_config(&cli)?;
    let dataset = JsonExportSource::from_path(&cli.input)?.load()?;

    let report = Report::build(&dataset, &config, &cli.report.sections(), &cli.selection())
        .context("Failed to build report")?;

    match cli.format {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => print!("{}", report),
    }

    Ok(())
}
