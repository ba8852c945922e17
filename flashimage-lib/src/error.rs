use std::path::PathBuf;
use thiserror::Error;

/// Convenient result type for `flashimage-lib`.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("integer parse error: {0}")]
    ParseInt(#[from] std::num::ParseIntError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("the file size {file_size} is too small for one block of the size {block_size}")]
    BlockTooSmall { file_size: usize, block_size: usize },

    #[error("the file size {file_size} is no multiple of the block size {block_size}")]
    NotBlockMultiple { file_size: usize, block_size: usize },

    #[error("failed to launch `{}`", tool.display())]
    ToolSpawn {
        tool: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{}` {}", tool.display(), exit_description(code))]
    ToolFailed {
        tool: PathBuf,
        /// Exit code, `None` when the tool was killed by a signal.
        code: Option<i32>,
        output: String,
    },
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Captured standard output of a failed tool run, if any.
    pub fn tool_output(&self) -> Option<&str> {
        match self {
            Self::ToolFailed { output, .. } => Some(output),
            _ => None,
        }
    }
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with code {}", code),
        None => "was terminated by a signal".to_string(),
    }
}
