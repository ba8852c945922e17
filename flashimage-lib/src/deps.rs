//! Host files a script reads from or writes to.
//!
//! Paths in a script are relative to the directory of the script itself,
//! because the tool is started there.

use crate::script::{Keyword, Script};
use crate::utils::Utils;
use std::path::{Path, PathBuf};

// Keyword and position of the host-side input path.
const INPUTS: &[(Keyword, usize)] = &[
    (Keyword::WriteRaw, 0),
    (Keyword::WriteFile, 0),
    (Keyword::Write, 0),
    (Keyword::Mount, 0),
];

// Keyword and position of the host-side output path.
const OUTPUTS: &[(Keyword, usize)] = &[(Keyword::ReadRaw, 2), (Keyword::Read, 1)];

/// Absolute paths of every file the script feeds into the image, in order of appearance.
pub fn dependencies(script: &Script, base_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    collect(script, base_dir, INPUTS)
}

/// Absolute paths of the files the tool writes next to the image.
pub fn side_outputs(script: &Script, base_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    collect(script, base_dir, OUTPUTS)
}

fn collect(
    script: &Script,
    base_dir: &Path,
    positions: &[(Keyword, usize)],
) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for command in script.commands() {
        let Some(&(_, index)) = positions.iter().find(|(k, _)| *k == command.keyword) else {
            continue;
        };
        match command.arg(index) {
            Some(arg) => {
                let path = Utils::absolute_path(base_dir, Path::new(arg))?;
                tracing::debug!("{} on line {}: {}", command.keyword, command.line, path.display());
                paths.push(path);
            }
            None => tracing::debug!(
                "{} on line {} has no path argument, skipped",
                command.keyword,
                command.line
            ),
        }
    }
    Ok(paths)
}
