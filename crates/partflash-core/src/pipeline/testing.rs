//! Recording collaborators for orchestrator tests

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::Path;

use super::StageObserver;
use crate::error::{Outcome, RunFailure, Stage, ToolFailure};
use crate::port::PortEnumerator;
use crate::tools::{DumpAnalyzer, FlashReader, FlashWriter, ImagePackager, ReadRequest, WriteRequest};

pub const TABLE: &str = "\
# Name,   Type, SubType, Offset,   Size,     Flags
nvs,      data, nvs,     0x9000,   0x6000,
coredump, data, coredump,0x3F0000, 0x10000,
spiffs,   data, spiffs,  0x310000, 0x100000,
";

pub const TABLE_WITHOUT_COREDUMP: &str = "\
# Name,   Type, SubType, Offset,   Size,     Flags
nvs,      data, nvs,     0x9000,   0x6000,
spiffs,   data, spiffs,  0x310000, 0x100000,
";

/// Shared call log, in invocation order
#[derive(Default)]
pub struct CallLog(pub RefCell<Vec<String>>);

impl CallLog {
    pub fn push(&self, call: impl Into<String>) {
        self.0.borrow_mut().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.0.borrow().iter().any(|c| c.starts_with(prefix))
    }
}

pub struct FakePackager<'a> {
    pub log: &'a CallLog,
    pub fail: Option<&'static str>,
    /// Bytes written to the output; `None` writes nothing at all
    pub produce: Option<u64>,
}

impl ImagePackager for FakePackager<'_> {
    fn package(&self, target_size: u64, source_dir: &Path, output: &Path) -> Outcome {
        self.log
            .push(format!("package {} {}", target_size, source_dir.display()));
        if let Some(message) = self.fail {
            return Err(ToolFailure::new("spiffsgen", message));
        }
        if let Some(len) = self.produce {
            fs::write(output, vec![0xFFu8; len as usize]).unwrap();
        }
        Ok(())
    }
}

pub struct FakeWriter<'a> {
    pub log: &'a CallLog,
    pub fail: Option<&'static str>,
}

impl FlashWriter for FakeWriter<'_> {
    fn write(&self, request: &WriteRequest) -> Outcome {
        self.log.push(format!(
            "write {} {} {} {}",
            request.chip, request.port, request.baud, request.offset_hex
        ));
        match self.fail {
            Some(message) => Err(ToolFailure::new("esptool", message)),
            None => Ok(()),
        }
    }
}

pub struct FakeReader<'a> {
    pub log: &'a CallLog,
    pub fail: Option<&'static str>,
    pub produce: bool,
}

impl FlashReader for FakeReader<'_> {
    fn read(&self, request: &ReadRequest) -> Outcome {
        self.log.push(format!(
            "read {} {} {}",
            request.port, request.offset_hex, request.size_hex
        ));
        if let Some(message) = self.fail {
            return Err(ToolFailure::new("esptool", message));
        }
        if self.produce {
            fs::write(&request.output, b"coredump").unwrap();
        }
        Ok(())
    }
}

pub struct FakeAnalyzer<'a> {
    pub log: &'a CallLog,
    pub fail: Option<&'static str>,
}

impl DumpAnalyzer for FakeAnalyzer<'_> {
    fn analyze(&self, dump: &Path, elf: &Path, format: &str) -> Outcome<String> {
        self.log.push(format!(
            "analyze {} {} {}",
            dump.file_name().unwrap().to_string_lossy(),
            elf.file_name().unwrap().to_string_lossy(),
            format
        ));
        match self.fail {
            Some(message) => Err(ToolFailure::new("espcoredump", message)),
            None => Ok("==== CRASHED TASK ====".to_string()),
        }
    }
}

pub struct FakePorts<'a> {
    pub log: &'a CallLog,
    pub ports: Vec<&'static str>,
}

impl PortEnumerator for FakePorts<'_> {
    fn enumerate(&self) -> io::Result<Vec<String>> {
        self.log.push("enumerate");
        Ok(self.ports.iter().map(|p| p.to_string()).collect())
    }
}

/// Observer that records every transition
#[derive(Default)]
pub struct RecordingObserver {
    pub entered: Vec<Stage>,
    pub completed: Vec<Stage>,
    pub failed: Option<RunFailure>,
}

impl StageObserver for RecordingObserver {
    fn entered(&mut self, stage: Stage) {
        self.entered.push(stage);
    }

    fn completed(&mut self, stage: Stage) {
        self.completed.push(stage);
    }

    fn failed(&mut self, failure: &RunFailure) {
        assert!(self.failed.is_none(), "failed reported twice");
        self.failed = Some(failure.clone());
    }
}
