//! Stage progress display

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use partflash_core::pipeline::StageObserver;
use partflash_core::{RunFailure, Stage};
use std::time::Duration;

/// Create a standard spinner style
fn create_spinner_style() -> Result<ProgressStyle, Box<dyn std::error::Error>> {
    Ok(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?)
}

/// Whether the stage hands the terminal to an external tool
fn runs_tool(stage: Stage) -> bool {
    matches!(
        stage,
        Stage::ImageGenerated | Stage::Flashed | Stage::Read | Stage::Analyzed
    )
}

/// Stage reporter using indicatif spinners
///
/// Internal stages get a ticking spinner. Tool stages only print a status
/// line, since esptool and friends draw their own progress.
pub struct StageProgress {
    multi: MultiProgress,
    current: Option<ProgressBar>,
}

impl StageProgress {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            current: None,
        }
    }

    fn create_spinner(&mut self, message: String) {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(create_spinner_style().unwrap_or_else(|_| ProgressStyle::default_spinner()));
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));
        self.current = Some(pb);
    }

    fn status(&self, message: String) {
        // println on a hidden target is a no-op
        if self.multi.is_hidden() || self.multi.println(&message).is_err() {
            println!("{}", message);
        }
    }
}

impl Default for StageProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl StageObserver for StageProgress {
    fn entered(&mut self, stage: Stage) {
        if runs_tool(stage) {
            self.status(format!("==> {}", stage));
        } else {
            self.create_spinner(format!("{}...", stage));
        }
    }

    fn completed(&mut self, stage: Stage) {
        match self.current.take() {
            Some(pb) => pb.finish_with_message(format!("{} done", stage)),
            None => self.status(format!("    {} done", stage)),
        }
    }

    fn failed(&mut self, failure: &RunFailure) {
        if let Some(pb) = self.current.take() {
            pb.abandon_with_message(format!("{} failed", failure.stage));
        }
    }
}
