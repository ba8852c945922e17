//! The `TruncateFlashImage` rule: drop trailing erased blocks from an image.

use crate::graph::BuildGraph;
use crate::progress::{ProgressHelper, ProgressOperation, ProgressStatus};
use crate::script::{Keyword, Script};
use crate::utils::Utils;
use crate::{CONFIG_EXTENSION, DEFAULT_BLOCK_SIZE, ERASE_VALUE, Error, FatToolConfig, Result, Rule};
use std::path::{Path, PathBuf};

/// The image to shrink and the optional script it was created from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncateSources {
    pub image: PathBuf,
    pub config: Option<PathBuf>,
}

impl TruncateSources {
    /// Sort the rule's sources into one image and at most one `.ftc` script.
    pub fn classify<P: AsRef<Path>>(sources: &[P]) -> Result<Self> {
        if sources.len() != 1 && sources.len() != 2 {
            return Err(Error::invalid_input(format!(
                "there must be 1 or 2 sources, one bin file and optionally one config, got {}",
                sources.len()
            )));
        }

        let mut image = None;
        let mut config = None;
        for source in sources {
            let source = source.as_ref();
            let is_config = source
                .extension()
                .is_some_and(|ext| ext == CONFIG_EXTENSION);
            if is_config {
                if config.is_some() {
                    return Err(Error::config("two config files specified"));
                }
                config = Some(source.to_path_buf());
            } else {
                if image.is_some() {
                    return Err(Error::config("two bin files specified"));
                }
                image = Some(source.to_path_buf());
            }
        }

        let image = image.ok_or_else(|| Error::config("no bin file specified"))?;
        Ok(Self { image, config })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncateReport {
    pub block_size: usize,
    pub original_len: usize,
    pub truncated_len: usize,
}

/// Pick the block size: explicit override, then `-create` in the script, then the default.
pub fn resolve_block_size(explicit: Option<&str>, script: Option<&Script>) -> Result<usize> {
    let block_size = match (explicit, script) {
        (Some(value), _) => Utils::parse_size(value)?,
        (None, Some(script)) => script
            .find(Keyword::Create)
            .filter_map(|create| create.arg(0)?.to_str())
            .find_map(|size| Utils::parse_size(size).ok())
            .ok_or_else(|| {
                Error::config("cannot determine block size from the configuration")
            })?,
        (None, None) => DEFAULT_BLOCK_SIZE,
    };

    if block_size == 0 {
        return Err(Error::config("block size must not be zero"));
    }
    Ok(block_size)
}

/// Cut `data` after its last block that is not completely erased.
///
/// The first block is always kept, whatever it holds.
pub fn truncate_image(data: &[u8], block_size: usize) -> Result<&[u8]> {
    if block_size == 0 {
        return Err(Error::config("block size must not be zero"));
    }
    if data.len() < block_size {
        return Err(Error::BlockTooSmall {
            file_size: data.len(),
            block_size,
        });
    }
    if data.len() % block_size != 0 {
        return Err(Error::NotBlockMultiple {
            file_size: data.len(),
            block_size,
        });
    }

    let end = data
        .chunks_exact(block_size)
        .enumerate()
        .skip(1)
        .rev()
        .find(|(index, block)| {
            let erased = block.iter().all(|&b| b == ERASE_VALUE);
            tracing::trace!(
                "Block {} at 0x{:08X} is {}",
                index,
                index * block_size,
                if erased { "erased" } else { "in use" }
            );
            !erased
        })
        .map_or(block_size, |(index, _)| (index + 1) * block_size);

    Ok(&data[..end])
}

/// Register the dependencies of a `TruncateFlashImage` build with `graph`.
pub fn emit_truncate<G, P>(
    config: &FatToolConfig,
    sources: &[P],
    target: &Path,
    graph: &mut G,
) -> Result<()>
where
    G: BuildGraph + ?Sized,
    P: AsRef<Path>,
{
    let sources = TruncateSources::classify(sources)?;
    graph.depends(target, &sources.image);
    if let Some(script) = &sources.config {
        graph.depends(target, script);
    }
    if let Some(block_size) = &config.truncate_block_size {
        graph.depends_on_value(target, block_size);
    }
    Ok(())
}

/// Write a truncated copy of the image in `sources` to `target`.
pub fn truncate_flash_image<P: AsRef<Path>>(
    config: &FatToolConfig,
    sources: &[P],
    target: &Path,
    progress: &ProgressHelper,
) -> Result<TruncateReport> {
    tracing::info!("{}", Rule::TruncateFlashImage.describe(target));

    let spinner = progress.create_spinner(ProgressOperation::TruncateImage {
        target: target.to_path_buf(),
    });
    let result = truncate_sources(config, sources, target);
    spinner.finish(if result.is_ok() {
        ProgressStatus::Success
    } else {
        ProgressStatus::Failed
    });
    result
}

fn truncate_sources<P: AsRef<Path>>(
    config: &FatToolConfig,
    sources: &[P],
    target: &Path,
) -> Result<TruncateReport> {
    let sources = TruncateSources::classify(sources)?;

    let script = match &sources.config {
        Some(path) => Some(Script::from_file(path)?),
        None => None,
    };
    let block_size = resolve_block_size(config.truncate_block_size.as_deref(), script.as_ref())?;
    tracing::debug!("Using block size {}", block_size);

    let data = std::fs::read(&sources.image)?;
    let truncated = truncate_image(&data, block_size)?;
    std::fs::write(target, truncated)?;

    let report = TruncateReport {
        block_size,
        original_len: data.len(),
        truncated_len: truncated.len(),
    };
    tracing::info!(
        "Truncated {} from {} to {} bytes ({} blocks of {})",
        sources.image.display(),
        report.original_len,
        report.truncated_len,
        report.truncated_len / block_size,
        block_size
    );
    Ok(report)
}
