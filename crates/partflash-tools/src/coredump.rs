//! Coredump analysis through espcoredump

use std::path::Path;

use partflash_core::tools::DumpAnalyzer;
use partflash_core::Outcome;

use crate::process::{path_arg, ToolCommand, ToolRunner};

const NAME: &str = "espcoredump";

/// `espcoredump.py info_corefile` as dump analyzer
#[derive(Debug, Clone)]
pub struct EspCoredump {
    command: ToolCommand,
    runner: ToolRunner,
}

impl EspCoredump {
    /// Use `command` to invoke espcoredump
    pub fn new(command: ToolCommand, runner: ToolRunner) -> Self {
        Self { command, runner }
    }

    fn args(dump: &Path, elf: &Path, format: &str) -> Vec<String> {
        vec![
            "info_corefile".into(),
            "-t".into(),
            format.to_string(),
            path_arg(dump),
            path_arg(elf),
        ]
    }
}

impl DumpAnalyzer for EspCoredump {
    fn analyze(&self, dump: &Path, elf: &Path, format: &str) -> Outcome<String> {
        log::info!("Analyzing {} against {}", dump.display(), elf.display());
        self.runner
            .run_captured(NAME, &self.command, &Self::args(dump, elf, format))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args() {
        let args = EspCoredump::args(
            Path::new("coredump.bin"),
            Path::new("build/app.elf"),
            "elf",
        );
        assert_eq!(
            args,
            ["info_corefile", "-t", "elf", "coredump.bin", "build/app.elf"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_report_is_tool_stdout() {
        let command = ToolCommand {
            program: "sh".into(),
            args: vec![
                "-c".into(),
                "echo \"dump=$4 elf=$5\"".into(),
                "espcoredump".into(),
            ],
        };
        let report = EspCoredump::new(command, ToolRunner::new())
            .analyze(Path::new("core.bin"), Path::new("app.elf"), "elf")
            .unwrap();
        assert_eq!(report.trim(), "dump=core.bin elf=app.elf");
    }
}
