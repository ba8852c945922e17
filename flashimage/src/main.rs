mod cli;
mod config;
mod depfile;
mod progress;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use flashimage_lib::progress::ProgressHelper;
use flashimage_lib::{ProcessRunner, RecordedGraph, assemble, truncate};
use std::path::Path;
use std::process;

use crate::cli::{Cli, Commands, MergedConfig, merge_config};
use crate::config::FlashImageConfig;
use crate::progress::create_progress_callback;

fn load_config(path: &str) -> Result<FlashImageConfig> {
    let config = FlashImageConfig::from_file(path)
        .map_err(|e| anyhow!("Failed to load config file '{}': {}", path, e))?;
    config
        .validate()
        .map_err(|e| anyhow!("Invalid config file '{}': {}", path, e))?;
    Ok(config)
}

fn run(args: Cli) -> Result<()> {
    let file_config = args.config.as_deref().map(load_config).transpose()?;
    let MergedConfig {
        tool: config,
        progress,
        quiet,
    } = merge_config(&args, file_config)?;
    tracing::debug!("Effective configuration: {:?}", config);

    let progress = ProgressHelper::new(create_progress_callback(progress, quiet), 0);

    match args.command {
        Commands::FlashImage(params) => {
            assemble::flash_image(
                &config,
                &params.source,
                &params.target,
                &ProcessRunner,
                &progress,
            )
            .with_context(|| format!("Failed to build {}", params.target.display()))?;
        }
        Commands::Truncate(params) => {
            let report =
                truncate::truncate_flash_image(&config, &params.sources, &params.target, &progress)
                    .with_context(|| format!("Failed to truncate into {}", params.target.display()))?;
            if !quiet {
                println!(
                    "{}: {} -> {} bytes (block size {})",
                    params.target.display(),
                    report.original_len,
                    report.truncated_len,
                    report.block_size
                );
            }
        }
        Commands::Deps(params) => {
            let mut graph = RecordedGraph::new();
            assemble::emit_flash_image(&config, &params.source, &params.target, &mut graph)
                .with_context(|| format!("Failed to scan {}", params.source.display()))?;
            let rule = depfile::render(&params.target, graph.dependencies_of(&params.target));
            write_depfile(params.depfile.as_deref(), &rule)?;
        }
        Commands::TruncateDeps(params) => {
            let mut graph = RecordedGraph::new();
            truncate::emit_truncate(&config, &params.sources, &params.target, &mut graph)
                .with_context(|| format!("Failed to scan sources of {}", params.target.display()))?;
            let rule = depfile::render(&params.target, graph.dependencies_of(&params.target));
            write_depfile(params.depfile.as_deref(), &rule)?;
        }
    }

    Ok(())
}

fn write_depfile(path: Option<&Path>, rule: &str) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, rule)
            .with_context(|| format!("Failed to write depfile '{}'", path.display())),
        None => {
            print!("{}", rule);
            Ok(())
        }
    }
}

fn main() {
    // Log level can be controlled by setting the RUST_LOG environment variable, e.g.:
    // RUST_LOG=debug, RUST_LOG=flashimage_lib=trace, RUST_LOG=info
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {:?}", e);
        if let Some(output) = e
            .downcast_ref::<flashimage_lib::Error>()
            .and_then(|err| err.tool_output())
            .filter(|output| !output.is_empty())
        {
            eprintln!("fat_tool output:\n{}", output);
        }
        process::exit(1);
    }
}
