//! Flash transfer through esptool

use partflash_core::tools::{FlashReader, FlashWriter, ReadRequest, WriteRequest};
use partflash_core::Outcome;

use crate::process::{path_arg, ToolCommand, ToolRunner};

const NAME: &str = "esptool";

/// `esptool.py` as flash writer and reader
#[derive(Debug, Clone)]
pub struct Esptool {
    command: ToolCommand,
    runner: ToolRunner,
}

impl Esptool {
    /// Use `command` to invoke esptool
    pub fn new(command: ToolCommand, runner: ToolRunner) -> Self {
        Self { command, runner }
    }

    fn write_args(request: &WriteRequest) -> Vec<String> {
        vec![
            "--chip".into(),
            request.chip.clone(),
            "--port".into(),
            request.port.clone(),
            "--baud".into(),
            request.baud.to_string(),
            "write_flash".into(),
            "-z".into(),
            request.offset_hex.clone(),
            path_arg(&request.image),
        ]
    }

    fn read_args(request: &ReadRequest) -> Vec<String> {
        vec![
            "--port".into(),
            request.port.clone(),
            "--baud".into(),
            request.baud.to_string(),
            "read_flash".into(),
            request.offset_hex.clone(),
            request.size_hex.clone(),
            path_arg(&request.output),
        ]
    }
}

impl FlashWriter for Esptool {
    fn write(&self, request: &WriteRequest) -> Outcome {
        log::info!(
            "Writing {} to {} at {}",
            request.image.display(),
            request.port,
            request.offset_hex
        );
        self.runner
            .run(NAME, &self.command, &Self::write_args(request))
    }
}

impl FlashReader for Esptool {
    fn read(&self, request: &ReadRequest) -> Outcome {
        log::info!(
            "Reading {} bytes at {} from {}",
            request.size_hex,
            request.offset_hex,
            request.port
        );
        self.runner.run(NAME, &self.command, &Self::read_args(request))
    }
}
