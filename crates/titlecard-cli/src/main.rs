mod args;

use anyhow::{Context, Result};
use clap::Parser;
use titlecard_core::RawOptions;
use titlecard_encode::PngEncoder;
use titlecard_render::TitleCardPipeline;

use crate::args::Cli;

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the result line or the dry-run JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut options = cli.raw_options();
    if let Some(path) = &cli.config {
        let file = RawOptions::load_from_file(path)?;
        tracing::debug!(path = %path.display(), "merging options file");
        options = options.or(file);
    }

    let config = options.resolve()?;
    let pipeline = TitleCardPipeline::new(&config)?;

    if cli.dry_run {
        let layout = pipeline.plan(&config)?;
        let report = serde_json::json!({ "config": config, "layout": layout });
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialize dry run")?
        );
        return Ok(());
    }

    let output = pipeline.render(&config)?;
    PngEncoder::new().write(&output.image, &config.output_path)?;
    println!("Title card saved to {}", config.output_path.display());
    Ok(())
}
