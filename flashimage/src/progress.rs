//! CLI progress rendering
//!
//! Spinners are drawn with indicatif on a terminal; when stdout is redirected
//! (build logs, CI) each step is printed as a plain line instead.

use flashimage_lib::progress::{
    NoOpProgressCallback, ProgressCallback, ProgressCallbackArc, ProgressId, ProgressInfo,
    ProgressStatus,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, IsTerminal, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cli::ProgressMode;

fn status_text(status: ProgressStatus) -> &'static str {
    match status {
        ProgressStatus::Success => "done",
        ProgressStatus::Failed => "failed",
    }
}

/// Prints one line when a step starts and one when it ends.
pub struct PlainProgressCallback {
    steps: Mutex<HashMap<u64, ProgressInfo>>,
    next_id: Mutex<u64>,
}

impl PlainProgressCallback {
    pub fn new() -> Self {
        Self {
            steps: Mutex::new(HashMap::new()),
            next_id: Mutex::new(1),
        }
    }

    fn next_id(&self) -> u64 {
        let mut id = self.next_id.lock().unwrap();
        let current = *id;
        *id += 1;
        current
    }

    fn print_line(&self, line: &str) {
        let mut stdout = io::stdout();
        let _ = writeln!(stdout, "{}", line);
        let _ = stdout.flush();
    }
}

impl Default for PlainProgressCallback {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressCallback for PlainProgressCallback {
    fn start(&self, info: ProgressInfo) -> ProgressId {
        let id = self.next_id();
        self.print_line(&format!("[{}] {}", info.prefix, info.operation));
        self.steps.lock().unwrap().insert(id, info);
        ProgressId(id)
    }

    fn finish(&self, id: ProgressId, status: ProgressStatus) {
        let info = self.steps.lock().unwrap().remove(&id.0);
        if let Some(info) = info {
            self.print_line(&format!(
                "[{}] {}: {}",
                info.prefix,
                info.operation,
                status_text(status)
            ));
        }
    }
}

/// Spinner based progress using indicatif.
pub struct IndicatifProgressCallback {
    spinners: Arc<Mutex<HashMap<u64, ProgressBar>>>,
    next_id: Arc<Mutex<u64>>,
}

impl IndicatifProgressCallback {
    pub fn new() -> Self {
        Self {
            spinners: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(Mutex::new(1)),
        }
    }

    fn next_id(&self) -> u64 {
        let mut id = self.next_id.lock().unwrap();
        let current = *id;
        *id += 1;
        current
    }
}

impl Default for IndicatifProgressCallback {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressCallback for IndicatifProgressCallback {
    fn start(&self, info: ProgressInfo) -> ProgressId {
        let id = self.next_id();

        let spinner = ProgressBar::new_spinner();
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_style(
            ProgressStyle::with_template(&format!("[{}] {{spinner}} {{msg}}", info.prefix))
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(info.operation.to_string());

        self.spinners.lock().unwrap().insert(id, spinner);
        ProgressId(id)
    }

    fn finish(&self, id: ProgressId, status: ProgressStatus) {
        if let Ok(mut spinners) = self.spinners.lock()
            && let Some(spinner) = spinners.remove(&id.0)
        {
            let message = format!("{}: {}", spinner.message(), status_text(status));
            match status {
                ProgressStatus::Success => spinner.finish_with_message(message),
                ProgressStatus::Failed => spinner.abandon_with_message(message),
            }
        }
    }
}

pub fn create_progress_callback(mode: ProgressMode, quiet: bool) -> ProgressCallbackArc {
    if quiet {
        return Arc::new(NoOpProgressCallback);
    }
    match mode {
        ProgressMode::None => Arc::new(NoOpProgressCallback),
        ProgressMode::Plain => Arc::new(PlainProgressCallback::new()),
        ProgressMode::Auto if io::stdout().is_terminal() => {
            Arc::new(IndicatifProgressCallback::new())
        }
        ProgressMode::Auto => Arc::new(PlainProgressCallback::new()),
    }
}
