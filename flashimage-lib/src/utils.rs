use crate::{Error, Result};
use std::path::{Component, Path, PathBuf};

pub struct Utils;
impl Utils {
    /// Parse a size argument the way `fat_tool` reads them: `0x`/`0X` hex or decimal.
    /// A leading sign is rejected.
    pub fn parse_size(s: &str) -> Result<usize> {
        let s = s.trim();

        let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => (hex, 16),
            None => (s, 10),
        };
        if digits.starts_with(['+', '-']) {
            return Err(Error::invalid_input(format!("size '{}' must not be signed", s)));
        }

        Ok(usize::from_str_radix(digits, radix)?)
    }

    /// Join `path` onto `base` and make the result absolute and free of `.`/`..`.
    ///
    /// Relative bases are resolved against the current directory. Nothing is
    /// looked up on disk, so the path does not have to exist yet.
    pub fn absolute_path(base: &Path, path: &Path) -> std::io::Result<PathBuf> {
        Self::absolute(&base.join(path))
    }

    /// Make `path` absolute against the current directory, removing `.`/`..`.
    pub fn absolute(path: &Path) -> std::io::Result<PathBuf> {
        Ok(Self::normalize(&std::path::absolute(path)?))
    }

    pub(crate) fn normalize(path: &Path) -> PathBuf {
        let mut out = PathBuf::new();
        for component in path.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    // `pop` refuses to walk above the root, matching `os.path.normpath`
                    out.pop();
                }
                other => out.push(other.as_os_str()),
            }
        }
        out
    }

    /// Directory holding `path`; an empty parent means the current directory.
    pub fn parent_dir(path: &Path) -> PathBuf {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}
