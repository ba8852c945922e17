use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::cli::ProgressMode;

/// Default values used when neither the command line nor the config file set an option.
pub struct Defaults;

impl Defaults {
    pub const TOOL: &'static str = flashimage_lib::DEFAULT_TOOL;
    pub const PROGRESS: &'static str = "auto";
}

/// A block size written either as a JSON number or as a string like `"0x400"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockSize {
    Number(u64),
    Text(String),
}

impl BlockSize {
    pub fn as_text(&self) -> String {
        match self {
            BlockSize::Number(n) => n.to_string(),
            BlockSize::Text(s) => s.clone(),
        }
    }
}

/// Root of the JSON configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashImageConfig {
    #[serde(default = "default_tool")]
    pub tool: String,
    pub log_file: Option<String>,
    pub truncate_block_size: Option<BlockSize>,
    #[serde(default = "default_progress")]
    pub progress: String,
}

fn default_tool() -> String {
    Defaults::TOOL.to_string()
}
fn default_progress() -> String {
    Defaults::PROGRESS.to_string()
}

impl FlashImageConfig {
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: FlashImageConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn with_defaults() -> Self {
        Self {
            tool: Defaults::TOOL.to_string(),
            log_file: None,
            truncate_block_size: None,
            progress: Defaults::PROGRESS.to_string(),
        }
    }

    pub fn parse_progress(&self) -> Result<ProgressMode, String> {
        ProgressMode::from_str(&self.progress)
            .map_err(|_| format!("Invalid progress mode: {}", self.progress))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.tool.trim().is_empty() {
            return Err("Tool path must not be empty".to_string());
        }

        self.parse_progress()?;

        if let Some(ref block_size) = self.truncate_block_size {
            let text = block_size.as_text();
            match flashimage_lib::utils::Utils::parse_size(&text) {
                Ok(0) => return Err("Block size must not be zero".to_string()),
                Ok(_) => {}
                Err(e) => return Err(format!("Invalid truncate_block_size '{}': {}", text, e)),
            }
        }

        Ok(())
    }
}
