//! Child process execution for external tools
//!
//! Tools run to completion with their progress output passed through to the
//! terminal. Standard error is captured so a failure can be reported with
//! the tool's own message.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use partflash_core::{Outcome, ToolFailure};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Program and leading arguments used to invoke a tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Executable name or path
    pub program: String,
    /// Arguments placed before the operation's own arguments
    pub args: Vec<String>,
}

impl ToolCommand {
    /// A tool invoked directly by name
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Build from a command line split into words, e.g. `["python3", "-m", "esptool"]`
    ///
    /// Returns `None` for an empty list.
    pub fn from_words(words: &[String]) -> Option<Self> {
        let (program, args) = words.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

/// Runs tools as blocking child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolRunner {
    timeout: Option<Duration>,
}

impl ToolRunner {
    /// A runner that waits for tools indefinitely
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill tools that run longer than `timeout`
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Run a tool with its output passed through to the terminal
    pub fn run(&self, name: &str, command: &ToolCommand, args: &[String]) -> Outcome {
        self.execute(name, command, args, false).map(|_| ())
    }

    /// Run a tool and return its standard output
    pub fn run_captured(
        &self,
        name: &str,
        command: &ToolCommand,
        args: &[String],
    ) -> Outcome<String> {
        self.execute(name, command, args, true)
    }

    fn execute(
        &self,
        name: &str,
        command: &ToolCommand,
        args: &[String],
        capture_stdout: bool,
    ) -> Outcome<String> {
        log::debug!(
            "Running {} {} {}",
            command.program,
            command.args.join(" "),
            args.join(" ")
        );

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(if capture_stdout {
                Stdio::piped()
            } else {
                Stdio::inherit()
            })
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ToolFailure::new(name, format!("cannot start {}: {}", command.program, e))
            })?;

        let stdout = child.stdout.take().map(collect);
        let stderr = child.stderr.take().map(collect);

        let status = match self.timeout {
            Some(limit) => wait_with_timeout(&mut child, limit),
            None => child.wait().map(Some),
        };

        // Grandchildren of a killed tool may still hold the pipes open, so
        // the readers are only joined once the tool has exited by itself.
        let status = match status {
            Ok(Some(status)) => status,
            Ok(None) => {
                let limit = self.timeout.unwrap_or_default();
                return Err(ToolFailure::new(
                    name,
                    format!("timed out after {:?}", limit),
                ));
            }
            Err(e) => {
                return Err(ToolFailure::new(
                    name,
                    format!("cannot wait for {}: {}", command.program, e),
                ))
            }
        };

        let stdout = stdout.map(join).unwrap_or_default();
        let stderr = stderr.map(join).unwrap_or_default();

        if status.success() {
            for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
                log::debug!("{}: {}", name, line);
            }
            Ok(stdout)
        } else {
            Err(ToolFailure::new(name, failure_message(status, &stderr)))
        }
    }
}

/// Render a path as a tool argument
pub(crate) fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Poll the child until it exits or `limit` expires; `None` means it was killed
fn wait_with_timeout(child: &mut Child, limit: Duration) -> std::io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= limit {
            log::warn!("Killing tool after {:?}", limit);
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn collect<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join(handle: JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}

fn failure_message(status: ExitStatus, stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        match status.code() {
            Some(code) => format!("exited with status {}", code),
            None => "terminated by signal".to_string(),
        }
    } else {
        stderr.to_string()
    }
}
