use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use flashimage_lib::FatToolConfig;
use std::path::PathBuf;
use strum::{Display, EnumString};

use crate::config::FlashImageConfig;

#[derive(EnumString, Display, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[strum(serialize_all = "lowercase")]
pub enum ProgressMode {
    /// Spinner on a terminal, plain lines otherwise
    #[clap(name = "auto")]
    Auto,
    #[clap(name = "plain")]
    Plain,
    #[clap(name = "none")]
    None,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "FAT flash image build helper", long_about = None)]
pub struct Cli {
    /// JSON configuration file path
    #[arg(long = "config", short = 'f')]
    pub config: Option<String>,

    /// Path of the fat_tool executable (default: fat_tool from PATH)
    #[arg(long = "tool", env = "FAT_TOOL")]
    pub tool: Option<PathBuf>,

    /// Save the standard output of fat_tool to this file
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Block size used for truncation, decimal or 0x hex (overrides -create in the config)
    #[arg(long = "block-size")]
    pub block_size: Option<String>,

    /// How to show progress (default: auto)
    #[arg(long = "progress", value_enum)]
    pub progress: Option<ProgressMode>,

    /// Suppress progress and summary output
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Assemble a flash image by running fat_tool over a command script
    #[command(name = "flash_image")]
    FlashImage(FlashImage),

    /// Remove trailing erased blocks from an image
    #[command(name = "truncate")]
    Truncate(Truncate),

    /// Print the files a flash image depends on as a Makefile rule
    #[command(name = "deps")]
    Deps(Deps),

    /// Print the files a truncated image depends on as a Makefile rule
    #[command(name = "truncate_deps")]
    TruncateDeps(TruncateDeps),
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Assemble a flash image by running fat_tool over a command script")]
pub struct FlashImage {
    /// fat_tool command script (.flc)
    pub source: PathBuf,

    /// Image to write
    pub target: PathBuf,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Remove trailing erased blocks from an image")]
pub struct Truncate {
    /// Truncated image to write
    pub target: PathBuf,

    /// The image to truncate and optionally the .ftc script it was made from
    #[arg(required = true, num_args = 1..=2)]
    pub sources: Vec<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Print the files a flash image depends on as a Makefile rule")]
pub struct Deps {
    /// fat_tool command script (.flc)
    pub source: PathBuf,

    /// Image built from the script
    pub target: PathBuf,

    /// Write the rule to this file instead of standard output
    #[arg(long = "depfile")]
    pub depfile: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Print the files a truncated image depends on as a Makefile rule")]
pub struct TruncateDeps {
    /// Truncated image
    pub target: PathBuf,

    /// The image to truncate and optionally the .ftc script it was made from
    #[arg(required = true, num_args = 1..=2)]
    pub sources: Vec<PathBuf>,

    /// Write the rule to this file instead of standard output
    #[arg(long = "depfile")]
    pub depfile: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedConfig {
    pub tool: FatToolConfig,
    pub progress: ProgressMode,
    pub quiet: bool,
}

/// Merge CLI arguments with the configuration file, CLI args take precedence
pub fn merge_config(args: &Cli, config: Option<FlashImageConfig>) -> Result<MergedConfig> {
    let base_config = config.unwrap_or_else(FlashImageConfig::with_defaults);

    let tool = args
        .tool
        .clone()
        .unwrap_or_else(|| PathBuf::from(&base_config.tool));

    let log_file = args
        .log_file
        .clone()
        .or_else(|| base_config.log_file.as_ref().map(PathBuf::from));

    let truncate_block_size = args.block_size.clone().or_else(|| {
        base_config
            .truncate_block_size
            .as_ref()
            .map(|size| size.as_text())
    });

    let progress = match args.progress {
        Some(p) => p,
        None => base_config
            .parse_progress()
            .map_err(|e| anyhow!("Invalid progress mode in config: {}", e))?,
    };

    Ok(MergedConfig {
        tool: FatToolConfig {
            tool,
            log_file,
            truncate_block_size,
        },
        progress,
        quiet: args.quiet,
    })
}
