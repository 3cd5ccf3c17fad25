//! Error types for partflash-core
//!
//! Every orchestrator failure is reported as a [`RunFailure`]: the stage the
//! run was in plus one of the [`Error`] categories. External tools report
//! their own failures as [`ToolFailure`], which the orchestrators wrap into
//! [`Error::ExternalTool`] without rewording.

use std::fmt;

use thiserror::Error;

/// A stage of a provisioning or dump run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Checking caller-supplied inputs before anything else happens
    Preconditions,
    /// Resolving the partition offset and size
    TableLookup,
    /// Measuring the source and planning the image size (provisioning)
    CapacityCheck,
    /// Running the image packager (provisioning)
    ImageGenerated,
    /// Running the flash writer (provisioning)
    Flashed,
    /// Choosing a device port (dump)
    PortCheck,
    /// Running the flash reader (dump)
    Read,
    /// Locating the debug binary (dump)
    ArtifactSearch,
    /// Running the dump analyzer (dump)
    Analyzed,
}

impl Stage {
    /// Stable name used in log lines and user-facing messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::Preconditions => "preconditions",
            Self::TableLookup => "table lookup",
            Self::CapacityCheck => "capacity check",
            Self::ImageGenerated => "image generation",
            Self::Flashed => "flash write",
            Self::PortCheck => "port check",
            Self::Read => "flash read",
            Self::ArtifactSearch => "artifact search",
            Self::Analyzed => "dump analysis",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failure categories surfaced to the operator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Partition table missing or malformed, or a requested field is absent
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Inputs rejected before touching the device
    #[error("validation error: {0}")]
    Validation(String),

    /// No serial port recognized as the target device
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    /// An external tool reported failure; the message is the tool's own
    #[error("{0}")]
    ExternalTool(#[from] ToolFailure),

    /// No debug binary found under the build tree
    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),
}

/// Result type alias using the core Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by an external collaborator
///
/// This is the `Failure(reason)` half of a tool outcome. The reason is kept
/// verbatim so the operator sees what the tool said.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{tool} failed: {message}")]
pub struct ToolFailure {
    /// Short name of the tool (e.g. "esptool")
    pub tool: String,
    /// Underlying message, unmodified
    pub message: String,
}

impl ToolFailure {
    /// Create a new tool failure
    pub fn new(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Outcome of an external step: `Ok` is success, `Err` carries the reason
pub type Outcome<T = ()> = std::result::Result<T, ToolFailure>;

/// Terminal failure of an orchestration run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} failed: {error}")]
pub struct RunFailure {
    /// Stage the run was in when it failed
    pub stage: Stage,
    /// What went wrong
    pub error: Error,
}

impl RunFailure {
    /// Create a run failure at `stage`
    pub fn new(stage: Stage, error: Error) -> Self {
        Self { stage, error }
    }
}
