//! Configuration file loading
//!
//! Configuration is read from TOML. Every key is optional:
//!
//! ```toml
//! chip = "esp32s3"
//! baud = 115200
//! partition_table = "partitions.csv"
//! port_tokens = ["usb"]
//! tool_timeout_secs = 300
//!
//! [provision]
//! partition = "spiffs"
//! source_dir = "data"
//! image = "spiffs_image.bin"
//! block_size = "4K"
//! image_size = "partition"
//! allow_empty_image = false
//!
//! [dump]
//! partition = "coredump"
//! output = "coredump.bin"
//! build_dir = "build"
//! debug_extension = "elf"
//!
//! [tools]
//! esptool = ["python3", "-m", "esptool"]
//! spiffsgen = ["spiffsgen.py"]
//! espcoredump = ["espcoredump.py"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use partflash_core::artifact::DEBUG_EXTENSION;
use partflash_core::capacity::DEFAULT_BLOCK_SIZE;
use partflash_core::partition::parse_quantity;
use partflash_core::pipeline::ImageSize;
use partflash_core::port::DEFAULT_DEVICE_TOKEN;
use partflash_core::Error;
use partflash_tools::ToolCommand;
use serde::Deserialize;

/// File looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "partflash.toml";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Chip identifier passed to esptool
    pub chip: String,
    /// Serial baud rate
    pub baud: u32,
    /// ESP-IDF partition table
    pub partition_table: PathBuf,
    /// Substrings identifying device ports
    pub port_tokens: Vec<String>,
    /// Kill external tools after this many seconds
    pub tool_timeout_secs: Option<u64>,
    /// Filesystem provisioning settings
    pub provision: ProvisionConfig,
    /// Coredump retrieval settings
    pub dump: DumpConfig,
    /// External tool command lines
    pub tools: ToolsConfig,
}

/// `[provision]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProvisionConfig {
    /// Filesystem partition name
    pub partition: String,
    /// Directory packed into the image
    pub source_dir: PathBuf,
    /// Generated image path
    pub image: PathBuf,
    /// Flash erase block size
    #[serde(deserialize_with = "deserialize_quantity")]
    pub block_size: u64,
    /// `aligned` or `partition`
    #[serde(deserialize_with = "deserialize_image_size")]
    pub image_size: ImageSize,
    /// Accept a source directory with no content
    pub allow_empty_image: bool,
}

/// `[dump]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DumpConfig {
    /// Coredump partition name
    pub partition: String,
    /// Raw dump path
    pub output: PathBuf,
    /// Build tree searched for the debug binary
    pub build_dir: PathBuf,
    /// Extension of debug binaries
    pub debug_extension: String,
    /// Also write the analysis report here
    pub report: Option<PathBuf>,
}

/// `[tools]` section, each entry a program followed by leading arguments
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    /// Flash writer and reader
    pub esptool: Vec<String>,
    /// Image packager
    pub spiffsgen: Vec<String>,
    /// Dump analyzer
    pub espcoredump: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chip: "esp32s3".to_string(),
            baud: 115200,
            partition_table: PathBuf::from("partitions.csv"),
            port_tokens: vec![DEFAULT_DEVICE_TOKEN.to_string()],
            tool_timeout_secs: None,
            provision: ProvisionConfig::default(),
            dump: DumpConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            partition: "spiffs".to_string(),
            source_dir: PathBuf::from("data"),
            image: PathBuf::from("spiffs_image.bin"),
            block_size: DEFAULT_BLOCK_SIZE,
            image_size: ImageSize::default(),
            allow_empty_image: false,
        }
    }
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            partition: "coredump".to_string(),
            output: PathBuf::from("coredump.bin"),
            build_dir: PathBuf::from("build"),
            debug_extension: DEBUG_EXTENSION.to_string(),
            report: None,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            esptool: vec!["esptool.py".to_string()],
            spiffsgen: vec!["spiffsgen.py".to_string()],
            espcoredump: vec!["espcoredump.py".to_string()],
        }
    }
}

impl Config {
    /// Load from `path`, or from `./partflash.toml` if present, or defaults
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(path) => Self::from_toml_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_toml_file(default)
                } else {
                    log::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parse a configuration file
    pub fn from_toml_file(path: &Path) -> Result<Self, Error> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| Error::Configuration(format!("{}: {}", path.display(), e)))?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration text
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(content).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.provision.block_size == 0 {
            return Err("block_size must be greater than zero".into());
        }
        if self.port_tokens.is_empty() {
            return Err("port_tokens must contain at least one token".into());
        }
        // An empty token would match every port
        if self.port_tokens.iter().any(|t| t.trim().is_empty()) {
            return Err("port_tokens must not contain blank tokens".into());
        }
        for (name, words) in [
            ("esptool", &self.tools.esptool),
            ("spiffsgen", &self.tools.spiffsgen),
            ("espcoredump", &self.tools.espcoredump),
        ] {
            if words.is_empty() {
                return Err(format!("tools.{} must name a program", name));
            }
        }
        Ok(())
    }
}

impl ToolsConfig {
    /// Command used for flash reads and writes
    pub fn esptool(&self) -> Result<ToolCommand, Error> {
        command("esptool", &self.esptool)
    }

    /// Command used for image generation
    pub fn spiffsgen(&self) -> Result<ToolCommand, Error> {
        command("spiffsgen", &self.spiffsgen)
    }

    /// Command used for dump analysis
    pub fn espcoredump(&self) -> Result<ToolCommand, Error> {
        command("espcoredump", &self.espcoredump)
    }
}

fn command(name: &str, words: &[String]) -> Result<ToolCommand, Error> {
    ToolCommand::from_words(words)
        .ok_or_else(|| Error::Configuration(format!("tools.{} must name a program", name)))
}

/// Deserialize a byte quantity given as an integer or as `0x...`/`4K`/`1M` text
fn deserialize_quantity<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum QuantityOrInt {
        Int(u64),
        Str(String),
    }

    match QuantityOrInt::deserialize(deserializer)? {
        QuantityOrInt::Int(n) => Ok(n),
        QuantityOrInt::Str(s) => parse_quantity(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid quantity: {}", s))),
    }
}

fn deserialize_image_size<'de, D>(deserializer: D) -> Result<ImageSize, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}
