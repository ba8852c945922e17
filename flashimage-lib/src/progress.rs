//! Progress callback system.
//!
//! The rules only report coarse steps (one spinner per rule run). Front-ends
//! decide how to render them by implementing [`ProgressCallback`].

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

/// What a progress spinner is tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressOperation {
    AssembleImage { target: PathBuf },
    TruncateImage { target: PathBuf },
}

impl std::fmt::Display for ProgressOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressOperation::AssembleImage { target } => {
                write!(f, "Assembling {}", target.display())
            }
            ProgressOperation::TruncateImage { target } => {
                write!(f, "Truncating {}", target.display())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Step prefix, a hexadecimal step number.
    pub prefix: String,
    pub operation: ProgressOperation,
}

/// Implement this trait to render progress in a specific environment.
pub trait ProgressCallback: Send + Sync {
    /// Start a new spinner and return its id.
    fn start(&self, info: ProgressInfo) -> ProgressId;

    fn finish(&self, id: ProgressId, status: ProgressStatus);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgressId(pub u64);

/// Callback that renders nothing.
#[derive(Debug, Default)]
pub struct NoOpProgressCallback;

impl ProgressCallback for NoOpProgressCallback {
    fn start(&self, _info: ProgressInfo) -> ProgressId {
        ProgressId(0)
    }

    fn finish(&self, _id: ProgressId, _status: ProgressStatus) {}
}

pub type ProgressCallbackArc = Arc<dyn ProgressCallback>;

pub fn no_op_progress_callback() -> ProgressCallbackArc {
    Arc::new(NoOpProgressCallback)
}

/// Hands out numbered spinners on top of a [`ProgressCallback`].
#[derive(Clone)]
pub struct ProgressHelper {
    callback: ProgressCallbackArc,
    step_counter: Arc<AtomicI32>,
}

impl ProgressHelper {
    pub fn new(callback: ProgressCallbackArc, initial_step: i32) -> Self {
        Self {
            callback,
            step_counter: Arc::new(AtomicI32::new(initial_step)),
        }
    }

    fn next_step(&self) -> i32 {
        self.step_counter.fetch_add(1, Ordering::SeqCst)
    }

    pub fn create_spinner(&self, operation: ProgressOperation) -> ProgressHandler {
        let step = self.next_step();
        let info = ProgressInfo {
            prefix: format!("0x{:02X}", step),
            operation,
        };
        let id = self.callback.start(info);
        ProgressHandler {
            callback: Arc::clone(&self.callback),
            id,
        }
    }
}

impl Default for ProgressHelper {
    fn default() -> Self {
        Self::new(no_op_progress_callback(), 0)
    }
}

pub struct ProgressHandler {
    callback: ProgressCallbackArc,
    id: ProgressId,
}

impl ProgressHandler {
    pub fn finish(self, status: ProgressStatus) {
        self.callback.finish(self.id, status);
    }
}
