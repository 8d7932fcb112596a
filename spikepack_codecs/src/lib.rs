mod mtscomp;
mod staging;
mod zstd_chunked;

pub use mtscomp::MtscompCommand;
pub use zstd_chunked::{ChunkIndex, ZstdChunked};

use spikepack_core::Compressor;

/// Resolve a compressor backend from its configured name.
pub fn compressor_by_name(name: &str) -> anyhow::Result<Box<dyn Compressor>> {
    match name {
        "zstd" => Ok(Box::new(ZstdChunked::default())),
        "mtscomp" => Ok(Box::new(MtscompCommand::default())),
        other => anyhow::bail!("unknown compressor '{}'. Valid options: zstd, mtscomp", other),
    }
}
