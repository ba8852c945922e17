//! `fat_tool` command scripts (`.flc` / `.ftc` files).
//!
//! A script is line oriented and read as bytes. Blank lines and lines starting
//! with `#` are comments; every other line is split on whitespace and all tokens are passed,
//! in order, to the external tool. On top of the flat token list the parser
//! groups tokens into [`Command`]s so callers can look up the arguments of a
//! given keyword without scanning the raw text.

use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::str::FromStr;
use strum::{Display, EnumString};

/// Commands understood by `fat_tool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
pub enum Keyword {
    #[strum(serialize = "-create")]
    Create,
    #[strum(serialize = "-mount")]
    Mount,
    #[strum(serialize = "-saveimage")]
    SaveImage,
    #[strum(serialize = "-writeraw")]
    WriteRaw,
    #[strum(serialize = "-readraw")]
    ReadRaw,
    #[strum(serialize = "-writefile")]
    WriteFile,
    #[strum(serialize = "-write")]
    Write,
    #[strum(serialize = "-read")]
    Read,
    #[strum(serialize = "-mkdir")]
    Mkdir,
    #[strum(serialize = "-dir")]
    Dir,
    #[strum(serialize = "-cd")]
    Cd,
    #[strum(serialize = "-exists")]
    Exists,
    #[strum(serialize = "-delete")]
    Delete,
    #[strum(serialize = "-help")]
    Help,
}

/// One keyword together with the tokens following it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub keyword: Keyword,
    pub args: Vec<OsString>,
    /// 1-based line the keyword appeared on.
    pub line: usize,
}

impl Command {
    pub fn arg(&self, index: usize) -> Option<&OsStr> {
        self.args.get(index).map(OsString::as_os_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    tokens: Vec<OsString>,
    commands: Vec<Command>,
}

impl Script {
    pub fn parse(text: &str) -> Self {
        Self::from_bytes(text.as_bytes())
    }

    /// Parse raw script bytes. Comment lines are dropped before any decoding,
    /// so they may hold bytes in any encoding.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut script = Script::default();

        for (index, line) in bytes.split(|&b| b == b'\n').enumerate() {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.is_empty() || line.starts_with(b"#") {
                continue;
            }

            for raw in line
                .split(|b| b.is_ascii_whitespace())
                .filter(|raw| !raw.is_empty())
            {
                let token = decode(raw);
                let keyword = token.to_str().and_then(|t| Keyword::from_str(t).ok());

                if let Some(keyword) = keyword {
                    script.commands.push(Command {
                        keyword,
                        args: Vec::new(),
                        line: index + 1,
                    });
                } else if let Some(command) = script.commands.last_mut() {
                    command.args.push(token.clone());
                } else {
                    tracing::warn!(
                        "Token '{}' on line {} does not follow any command",
                        token.to_string_lossy(),
                        index + 1
                    );
                }
                script.tokens.push(token);
            }
        }

        script
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::from_bytes(&bytes))
    }

    /// All tokens in the order they are handed to the tool.
    pub fn tokens(&self) -> &[OsString] {
        &self.tokens
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn find(&self, keyword: Keyword) -> impl Iterator<Item = &Command> {
        self.commands.iter().filter(move |c| c.keyword == keyword)
    }
}

#[cfg(unix)]
fn decode(raw: &[u8]) -> OsString {
    use std::os::unix::ffi::OsStringExt;
    OsString::from_vec(raw.to_vec())
}

#[cfg(not(unix))]
fn decode(raw: &[u8]) -> OsString {
    OsString::from(String::from_utf8_lossy(raw).into_owned())
}
