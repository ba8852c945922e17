pub mod assemble;
pub mod deps;
pub mod error;
pub mod graph;
pub mod progress;
pub mod script;
pub mod truncate;
pub mod utils;

pub use crate::assemble::{ProcessRunner, ToolOutput, ToolRunner};
pub use crate::error::{Error, Result};
pub use crate::graph::{BuildGraph, RecordedGraph};
pub use crate::progress::{ProgressCallbackArc, ProgressHelper};
pub use crate::script::{Command, Keyword, Script};
pub use crate::truncate::{TruncateReport, TruncateSources};

use std::path::{Path, PathBuf};
use strum::Display;

/// Byte value of erased flash.
pub const ERASE_VALUE: u8 = 0xFF;

/// Block size used for truncation when nothing else specifies one.
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

/// Extension of the configuration accepted next to an image by the truncator.
pub const CONFIG_EXTENSION: &str = "ftc";

/// Name of the external tool binary.
pub const DEFAULT_TOOL: &str = "fat_tool";

/// The build rules this crate provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Rule {
    FlashImage,
    TruncateFlashImage,
}

impl Rule {
    /// The line shown to the user while the rule runs.
    pub fn describe(&self, target: &Path) -> String {
        format!("{} {}", self, target.display())
    }
}

/// Options shared by both rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatToolConfig {
    pub tool: PathBuf,
    /// Where the tool's standard output is saved after each run.
    pub log_file: Option<PathBuf>,
    /// Explicit truncation block size, decimal or `0x` hex.
    pub truncate_block_size: Option<String>,
}

impl Default for FatToolConfig {
    fn default() -> Self {
        Self {
            tool: PathBuf::from(DEFAULT_TOOL),
            log_file: None,
            truncate_block_size: None,
        }
    }
}

impl FatToolConfig {
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Self {
            tool: tool.into(),
            ..Self::default()
        }
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn with_block_size(mut self, size: impl Into<String>) -> Self {
        self.truncate_block_size = Some(size.into());
        self
    }
}
