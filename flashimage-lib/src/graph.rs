//! Hooks into the dependency graph of whatever build system drives the rules.

use std::path::{Path, PathBuf};

/// Receives the extra edges a rule discovers while inspecting its sources.
pub trait BuildGraph {
    /// `target` must be rebuilt whenever `dependency` changes.
    fn depends(&mut self, target: &Path, dependency: &Path);

    /// `target` must be rebuilt whenever `value` changes.
    fn depends_on_value(&mut self, target: &Path, value: &str);

    /// `artifact` is produced as a side effect of `target` and goes away with it.
    fn clean(&mut self, target: &Path, artifact: &Path);
}

/// A [`BuildGraph`] that simply records every edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedGraph {
    pub dependencies: Vec<(PathBuf, PathBuf)>,
    pub values: Vec<(PathBuf, String)>,
    pub artifacts: Vec<(PathBuf, PathBuf)>,
}

impl RecordedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dependencies recorded for `target`, in registration order.
    pub fn dependencies_of<'a>(&'a self, target: &'a Path) -> impl Iterator<Item = &'a Path> {
        self.dependencies
            .iter()
            .filter(move |(t, _)| t == target)
            .map(|(_, d)| d.as_path())
    }

    pub fn artifacts_of<'a>(&'a self, target: &'a Path) -> impl Iterator<Item = &'a Path> {
        self.artifacts
            .iter()
            .filter(move |(t, _)| t == target)
            .map(|(_, a)| a.as_path())
    }
}

impl BuildGraph for RecordedGraph {
    fn depends(&mut self, target: &Path, dependency: &Path) {
        self.dependencies
            .push((target.to_path_buf(), dependency.to_path_buf()));
    }

    fn depends_on_value(&mut self, target: &Path, value: &str) {
        self.values.push((target.to_path_buf(), value.to_string()));
    }

    fn clean(&mut self, target: &Path, artifact: &Path) {
        self.artifacts
            .push((target.to_path_buf(), artifact.to_path_buf()));
    }
}
