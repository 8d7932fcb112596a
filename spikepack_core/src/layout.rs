//! File naming rules for raw recordings and the files derived from them.
//!
//! Every derived path swaps the trailing `.bin` of the recording's file name,
//! so `run_g0_t0.imec0.ap.bin` pairs with `run_g0_t0.imec0.ap.meta` and is
//! compressed into `run_g0_t0.imec0.ap.cbin` plus `run_g0_t0.imec0.ap.ch`.

use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

pub const RECORDING_SUFFIX: &str = ".bin";
pub const META_SUFFIX: &str = ".meta";
pub const CBIN_SUFFIX: &str = ".cbin";
pub const CH_SUFFIX: &str = ".ch";

/// Directory name pruned from every walk (phy's per-dataset cache).
pub const RESERVED_DIR: &str = ".phy";

const IMEC_SUFFIXES: [&str; 2] = [".ap.bin", ".lf.bin"];

/// Acquisition device family, inferred from the recording's file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    /// Neuropixels probe streams (`.ap.bin` / `.lf.bin`).
    Imec,
    /// Everything else, recorded through the NI-DAQ path.
    Nidq,
}

impl DeviceClass {
    pub fn from_file_name(name: impl AsRef<OsStr>) -> Self {
        let name = name.as_ref().as_encoded_bytes();
        if IMEC_SUFFIXES.iter().any(|suffix| name.ends_with(suffix.as_bytes())) {
            DeviceClass::Imec
        } else {
            DeviceClass::Nidq
        }
    }

    /// Metadata key holding the nominal sample rate for this device class.
    pub fn sample_rate_key(self) -> &'static str {
        match self {
            DeviceClass::Imec => "imSampRate",
            DeviceClass::Nidq => "niSampRate",
        }
    }
}

/// True when the path's file name ends with the recording suffix.
///
/// Matching is done on the raw name bytes, so names that are not valid UTF-8
/// are still recognized.
pub fn is_recording(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.as_encoded_bytes().ends_with(RECORDING_SUFFIX.as_bytes()))
}

/// A recording and every path derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingPaths {
    pub source: PathBuf,
    pub meta: PathBuf,
    pub cbin: PathBuf,
    pub ch: PathBuf,
    pub device: DeviceClass,
}

impl RecordingPaths {
    /// Derive sidecar and output paths; `None` if `source` is not a recording.
    pub fn new(source: &Path) -> Option<Self> {
        if !is_recording(source) {
            return None;
        }
        let name = source.file_name()?;
        // `.bin` is a single extension except for a file named exactly `.bin`,
        // which `Path` treats as an extensionless dotfile.
        let sibling = |suffix: &str| {
            if name == RECORDING_SUFFIX {
                source.with_file_name(suffix)
            } else {
                source.with_extension(&suffix[1..])
            }
        };
        Some(Self {
            source: source.to_path_buf(),
            meta: sibling(META_SUFFIX),
            cbin: sibling(CBIN_SUFFIX),
            ch: sibling(CH_SUFFIX),
            device: DeviceClass::from_file_name(name),
        })
    }

    /// The recording's bare file name, as it appears in log lines.
    pub fn file_name(&self) -> Cow<'_, str> {
        self.source
            .file_name()
            .map(OsStr::to_string_lossy)
            .unwrap_or_default()
    }
}
