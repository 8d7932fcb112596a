use std::fs;
use std::path::Path;

use tracing::{debug, error, info};

use crate::compressor::{CompressJob, Compressor};
use crate::error::{Error, Result};
use crate::layout::RecordingPaths;
use crate::meta::MetaMap;
use crate::params::RecordingParams;
use crate::walker::RecordingWalker;

/// Why a recording was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MetaMissing,
    MetaCorrupt,
    AlreadyCompressed,
}

/// Result of processing one recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Compressed and the source removed; `bytes` is the source size.
    Compressed { bytes: u64 },
    Skipped(SkipReason),
}

/// Tally of one walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Recording files discovered.
    pub visited: u64,
    pub compressed: u64,
    pub skipped: u64,
    /// Recordings (or walk entries) that raised an error.
    pub failed: u64,
    /// Raw bytes of the recordings that were compressed and removed.
    pub bytes_in: u64,
}

/// Per-file compression pipeline.
///
/// Each recording moves through
/// `discovered → metadata-resolved → compressed → source-deleted`, with early
/// exits when the sidecar is missing, the payload already exists, or the
/// sidecar is corrupt. The source is deleted only after the compressor
/// returns successfully.
pub struct Pipeline {
    compressor: Box<dyn Compressor>,
}

impl Pipeline {
    pub fn new(compressor: Box<dyn Compressor>) -> Self {
        Self { compressor }
    }

    pub fn compressor_name(&self) -> &'static str {
        self.compressor.name()
    }

    /// Process a single recording file.
    ///
    /// Skips are `Ok`. Missing or malformed acquisition keys, compressor
    /// failures and I/O errors are `Err`, and the source is left in place.
    pub fn process(&self, source: &Path) -> Result<Outcome> {
        let paths = RecordingPaths::new(source)
            .ok_or_else(|| Error::NotARecording(source.to_path_buf()))?;
        let name = paths.file_name();

        info!("checking .meta for {name}");
        if !paths.meta.exists() {
            info!("meta file missing for {name}");
            return Ok(Outcome::Skipped(SkipReason::MetaMissing));
        }
        if paths.cbin.exists() {
            debug!("cbin file already exists for {name}");
            return Ok(Outcome::Skipped(SkipReason::AlreadyCompressed));
        }

        let meta = match MetaMap::load(&paths.meta) {
            Ok(meta) => meta,
            Err(err) => {
                info!("meta file is corrupt for {name}: {err}");
                return Ok(Outcome::Skipped(SkipReason::MetaCorrupt));
            }
        };
        let params = RecordingParams::resolve(&meta, paths.device)?;
        let bytes = fs::metadata(source)?.len();

        debug!(
            compressor = self.compressor.name(),
            n_channels = params.n_channels,
            sample_rate = params.sample_rate,
            dtype = %params.dtype,
            "compressing {name}"
        );
        let job = CompressJob {
            source,
            cbin: &paths.cbin,
            ch: &paths.ch,
            params: &params,
        };
        self.compressor
            .compress(&job)
            .map_err(|cause| Error::Compressor {
                compressor: self.compressor.name(),
                cause,
            })?;

        fs::remove_file(source)?;
        info!("{name} removed");
        Ok(Outcome::Compressed { bytes })
    }

    /// Walk `root` and process every recording found.
    ///
    /// Fails only when `root` is not a readable directory; per-file errors
    /// are logged and counted.
    pub fn run(&self, root: &Path) -> Result<RunStats> {
        let mut stats = RunStats::default();

        for item in RecordingWalker::new(root)? {
            let path = match item {
                Ok(path) => path,
                Err(err) => {
                    error!("cannot read entry under {}: {err}", root.display());
                    stats.failed += 1;
                    continue;
                }
            };
            stats.visited += 1;

            match self.process(&path) {
                Ok(Outcome::Compressed { bytes }) => {
                    stats.compressed += 1;
                    stats.bytes_in += bytes;
                }
                Ok(Outcome::Skipped(_)) => stats.skipped += 1,
                Err(err) => {
                    error!("failed to compress {}: {err}", path.display());
                    stats.failed += 1;
                }
            }
        }

        Ok(stats)
    }
}
