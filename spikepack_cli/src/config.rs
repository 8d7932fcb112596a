use std::ffi::OsString;
use std::path::PathBuf;

use spikepack_codecs::{compressor_by_name, MtscompCommand};
use spikepack_core::Compressor;

pub const DEFAULT_LOG_FILE: &str = "compress.log";
pub const DEFAULT_COMPRESSOR: &str = "mtscomp";

const COMPRESSOR_VAR: &str = "SPIKEPACK_COMPRESSOR";
const MTSCOMP_VAR: &str = "SPIKEPACK_MTSCOMP";
const LOG_VAR: &str = "SPIKEPACK_LOG";

/// Runtime settings that sit outside the single positional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend name: `mtscomp` (the default, readable by SpikeGLX tooling) or
    /// `zstd` for the in-process chunked format.
    pub compressor: String,
    /// Explicit path to the mtscomp executable.
    pub mtscomp_program: Option<PathBuf>,
    /// Append-only log file, relative to the working directory by default.
    pub log_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.is_empty());
        Self {
            compressor: non_empty(COMPRESSOR_VAR)
                .map(|value| value.to_string_lossy().trim().to_ascii_lowercase())
                .unwrap_or_else(|| DEFAULT_COMPRESSOR.to_string()),
            mtscomp_program: non_empty(MTSCOMP_VAR).map(PathBuf::from),
            log_path: non_empty(LOG_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }

    pub fn build_compressor(&self) -> anyhow::Result<Box<dyn Compressor>> {
        match (self.compressor.as_str(), &self.mtscomp_program) {
            ("mtscomp", Some(program)) => Ok(Box::new(MtscompCommand::new(program))),
            (name, _) => compressor_by_name(name),
        }
    }
}
