//! SPIFFS image generation through spiffsgen

use std::path::Path;

use partflash_core::tools::ImagePackager;
use partflash_core::Outcome;

use crate::process::{path_arg, ToolCommand, ToolRunner};

const NAME: &str = "spiffsgen";

/// `spiffsgen.py` as image packager
#[derive(Debug, Clone)]
pub struct Spiffsgen {
    command: ToolCommand,
    runner: ToolRunner,
}

impl Spiffsgen {
    /// Use `command` to invoke spiffsgen
    pub fn new(command: ToolCommand, runner: ToolRunner) -> Self {
        Self { command, runner }
    }

    fn args(target_size: u64, source_dir: &Path, output: &Path) -> Vec<String> {
        vec![
            target_size.to_string(),
            path_arg(source_dir),
            path_arg(output),
        ]
    }
}

impl ImagePackager for Spiffsgen {
    fn package(&self, target_size: u64, source_dir: &Path, output: &Path) -> Outcome {
        log::info!(
            "Packaging {} into a {} byte image",
            source_dir.display(),
            target_size
        );
        self.runner.run(
            NAME,
            &self.command,
            &Self::args(target_size, source_dir, output),
        )
    }
}
