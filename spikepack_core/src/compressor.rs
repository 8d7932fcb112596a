use std::path::Path;

use crate::params::RecordingParams;

/// Everything a backend needs to compress one recording.
#[derive(Debug, Clone, Copy)]
pub struct CompressJob<'a> {
    pub source: &'a Path,
    /// Destination for the compressed sample payload.
    pub cbin: &'a Path,
    /// Destination for the companion chunk index.
    pub ch: &'a Path,
    pub params: &'a RecordingParams,
}

/// Lossless compressor for interleaved multichannel recordings.
///
/// Implementations are all-or-nothing: on `Ok` both output files exist; on
/// `Err` neither output may be left behind. The source file is never touched
/// by the compressor itself.
pub trait Compressor {
    /// Short backend name for logs and error messages.
    fn name(&self) -> &'static str;

    fn compress(&self, job: &CompressJob<'_>) -> anyhow::Result<()>;
}
