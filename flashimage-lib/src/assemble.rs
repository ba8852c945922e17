//! The `FlashImage` rule: run `fat_tool` over a script and save the image.

use crate::deps;
use crate::graph::BuildGraph;
use crate::progress::{ProgressHelper, ProgressOperation, ProgressStatus};
use crate::script::{Keyword, Script};
use crate::utils::Utils;
use crate::{Error, FatToolConfig, Result, Rule};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// What a finished tool run left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Launches the external tool.
///
/// `command_line[0]` is the program, the rest are its arguments. The child
/// runs in `working_dir`; the caller's own working directory is left alone.
pub trait ToolRunner {
    fn run(&self, command_line: &[OsString], working_dir: &Path) -> std::io::Result<ToolOutput>;
}

/// Runs the tool as a child process and waits for it.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&self, command_line: &[OsString], working_dir: &Path) -> std::io::Result<ToolOutput> {
        let (program, args) = command_line.split_first().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command line")
        })?;

        let output = Command::new(program)
            .args(args)
            .current_dir(working_dir)
            .output()?;

        Ok(ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// `<tool> <script tokens...> -saveimage <target>`
pub fn command_line(tool: &Path, script: &Script, target: &Path) -> Vec<OsString> {
    let mut args = Vec::with_capacity(script.tokens().len() + 3);
    args.push(tool.as_os_str().to_owned());
    args.extend(script.tokens().iter().cloned());
    args.push(OsString::from(Keyword::SaveImage.to_string()));
    args.push(target.as_os_str().to_owned());
    args
}

/// Register the inputs and side outputs of a `FlashImage` build with `graph`.
pub fn emit_flash_image<G: BuildGraph + ?Sized>(
    config: &FatToolConfig,
    source: &Path,
    target: &Path,
    graph: &mut G,
) -> Result<()> {
    let script = Script::from_file(source)?;
    let base_dir = Utils::parent_dir(source);

    for dependency in deps::dependencies(&script, &base_dir)? {
        graph.depends(target, &dependency);
    }
    for artifact in deps::side_outputs(&script, &base_dir)? {
        graph.clean(target, &artifact);
    }
    if let Some(log_file) = &config.log_file {
        graph.clean(target, log_file);
    }
    Ok(())
}

/// Assemble `target` from the script at `source`.
///
/// The tool's standard output is written to the configured log file. A
/// non-zero exit is returned as [`Error::ToolFailed`] with the output
/// attached; the log is still attempted then, but a failed write does not
/// replace that error.
pub fn flash_image<R: ToolRunner + ?Sized>(
    config: &FatToolConfig,
    source: &Path,
    target: &Path,
    runner: &R,
    progress: &ProgressHelper,
) -> Result<ToolOutput> {
    tracing::info!("{}", Rule::FlashImage.describe(target));

    let script = Script::from_file(source)?;
    let working_dir = Utils::absolute(&Utils::parent_dir(source))?;
    let target = Utils::absolute(target)?;
    let command_line = command_line(&tool_path(&config.tool)?, &script, &target);

    let spinner = progress.create_spinner(ProgressOperation::AssembleImage {
        target: target.clone(),
    });
    let result = run_tool(config, &command_line, &working_dir, runner);
    spinner.finish(if result.is_ok() {
        ProgressStatus::Success
    } else {
        ProgressStatus::Failed
    });
    result
}

// A bare program name is left for the `PATH` lookup. Anything with a directory
// part is made absolute because the child starts in the script's directory.
fn tool_path(tool: &Path) -> std::io::Result<PathBuf> {
    if tool.components().count() > 1 {
        Utils::absolute(tool)
    } else {
        Ok(tool.to_path_buf())
    }
}

fn run_tool<R: ToolRunner + ?Sized>(
    config: &FatToolConfig,
    command_line: &[OsString],
    working_dir: &Path,
    runner: &R,
) -> Result<ToolOutput> {
    tracing::debug!("Working directory: {}", working_dir.display());
    tracing::debug!("Command line: {:?}", command_line);

    let output = runner
        .run(command_line, working_dir)
        .map_err(|source| Error::ToolSpawn {
            tool: config.tool.clone(),
            source,
        })?;

    if !output.stderr.is_empty() {
        tracing::debug!("{} stderr:\n{}", config.tool.display(), output.stderr);
    }

    if !output.success() {
        tracing::error!(
            "{} failed with exit code {:?}",
            config.tool.display(),
            output.code
        );
        if let Some(log_file) = &config.log_file
            && let Err(e) = std::fs::write(log_file, &output.stdout)
        {
            tracing::warn!("Could not write tool log {}: {}", log_file.display(), e);
        }
        return Err(Error::ToolFailed {
            tool: config.tool.clone(),
            code: output.code,
            output: output.stdout,
        });
    }

    if let Some(log_file) = &config.log_file {
        tracing::debug!("Writing tool log to {}", log_file.display());
        std::fs::write(log_file, &output.stdout)?;
    }

    Ok(output)
}
