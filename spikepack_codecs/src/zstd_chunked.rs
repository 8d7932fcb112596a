use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use spikepack_core::{CompressJob, Compressor, SampleDtype};
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

use crate::staging::Staged;

pub const FORMAT_VERSION: &str = "1.0";
pub const ALGORITHM: &str = "zstd";

/// Chunk index stored in the `.ch` file as JSON.
///
/// `chunk_bounds` holds frame indices and `chunk_offsets` byte offsets into
/// the `.cbin`; both start at 0 and have one more entry than there are
/// chunks. `chunk_checksums` is the xxh3-64 of each chunk's raw bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkIndex {
    pub version: String,
    pub algorithm: String,
    pub level: i32,
    pub dtype: String,
    pub n_channels: usize,
    pub sample_rate: f64,
    pub chunk_bounds: Vec<u64>,
    pub chunk_offsets: Vec<u64>,
    pub chunk_checksums: Vec<u64>,
}

impl ChunkIndex {
    pub fn chunk_count(&self) -> usize {
        self.chunk_checksums.len()
    }

    pub fn n_frames(&self) -> u64 {
        self.chunk_bounds.last().copied().unwrap_or(0)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.algorithm != ALGORITHM {
            anyhow::bail!("unsupported algorithm '{}'", self.algorithm);
        }
        if self.version != FORMAT_VERSION {
            anyhow::bail!("unsupported index version '{}'", self.version);
        }
        let n = self.chunk_count();
        if self.chunk_bounds.len() != n + 1 || self.chunk_offsets.len() != n + 1 {
            anyhow::bail!(
                "index has {} checksums but {} bounds and {} offsets",
                n,
                self.chunk_bounds.len(),
                self.chunk_offsets.len()
            );
        }
        if self.chunk_bounds.windows(2).any(|w| w[1] < w[0])
            || self.chunk_offsets.windows(2).any(|w| w[1] < w[0])
        {
            anyhow::bail!("index bounds or offsets are not monotonic");
        }
        Ok(())
    }
}

/// In-process backend: independent zstd frames over fixed-duration chunks.
///
/// The recording is cut into chunks of `chunk_seconds` worth of whole frames
/// so every chunk decodes on its own. Both outputs are written to hidden temp
/// files and only renamed into place once compression has finished.
pub struct ZstdChunked {
    /// Compression level (1 = fast / larger, 22 = slow / smallest).
    pub level: i32,
    pub chunk_seconds: f64,
}

impl Default for ZstdChunked {
    fn default() -> Self {
        Self {
            level: 3,
            chunk_seconds: 1.0,
        }
    }
}

impl ZstdChunked {
    pub fn new(level: i32) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    fn write_outputs(&self, job: &CompressJob<'_>, staged: &Staged) -> anyhow::Result<ChunkIndex> {
        let params = job.params;
        let frame = params.bytes_per_frame().ok_or_else(|| {
            anyhow::anyhow!("{} channels of {} do not form a valid frame", params.n_channels, params.dtype)
        })?;
        let src = File::open(job.source).with_context(|| format!("opening {:?}", job.source))?;
        let len = src.metadata()?.len();
        let n_frames = params.frame_count(len).ok_or_else(|| {
            anyhow::anyhow!(
                "{:?} is {} bytes, not a whole number of {}-byte frames",
                job.source,
                len,
                frame
            )
        })?;
        let chunk_frames = ((params.sample_rate * self.chunk_seconds).round() as u64).max(1);

        let mut index = ChunkIndex {
            version: FORMAT_VERSION.to_string(),
            algorithm: ALGORITHM.to_string(),
            level: self.level,
            dtype: params.dtype.as_str().to_string(),
            n_channels: params.n_channels,
            sample_rate: params.sample_rate,
            chunk_bounds: vec![0],
            chunk_offsets: vec![0],
            chunk_checksums: Vec::new(),
        };

        let mut reader = BufReader::new(src);
        let mut out = BufWriter::new(File::create(staged.cbin())?);
        let mut buf = vec![0u8; chunk_frames.min(n_frames) as usize * frame];
        let mut done = 0u64;
        let mut offset = 0u64;

        while done < n_frames {
            let take = (n_frames - done).min(chunk_frames);
            let raw = &mut buf[..take as usize * frame];
            reader.read_exact(raw)?;
            let compressed = zstd::bulk::compress(raw, self.level)?;
            out.write_all(&compressed)?;

            done += take;
            offset += compressed.len() as u64;
            index.chunk_bounds.push(done);
            index.chunk_offsets.push(offset);
            index.chunk_checksums.push(xxh3_64(raw));
        }
        out.into_inner().map_err(|err| err.into_error())?.sync_all()?;

        let mut ch = BufWriter::new(File::create(staged.ch())?);
        serde_json::to_writer_pretty(&mut ch, &index)?;
        ch.into_inner().map_err(|err| err.into_error())?.sync_all()?;

        Ok(index)
    }

    /// Restore the raw recording from a `.cbin`/`.ch` pair, verifying every
    /// chunk checksum. Returns the number of raw bytes written.
    pub fn decompress(cbin: &Path, ch: &Path, output: &Path) -> anyhow::Result<u64> {
        let index: ChunkIndex = serde_json::from_reader(BufReader::new(
            File::open(ch).with_context(|| format!("opening {:?}", ch))?,
        ))
        .with_context(|| format!("parsing chunk index {:?}", ch))?;
        index.validate()?;
        let dtype: SampleDtype = index.dtype.parse().map_err(anyhow::Error::msg)?;
        let frame = index
            .n_channels
            .checked_mul(dtype.size())
            .ok_or_else(|| anyhow::anyhow!("index has an invalid channel count {}", index.n_channels))?;

        let mut src = BufReader::new(File::open(cbin).with_context(|| format!("opening {:?}", cbin))?);
        let mut dst = BufWriter::new(File::create(output)?);
        let mut total = 0u64;

        for i in 0..index.chunk_count() {
            let compressed_len = (index.chunk_offsets[i + 1] - index.chunk_offsets[i]) as usize;
            let raw_len = usize::try_from(index.chunk_bounds[i + 1] - index.chunk_bounds[i])
                .ok()
                .and_then(|frames| frames.checked_mul(frame))
                .ok_or_else(|| anyhow::anyhow!("chunk {} is too large", i))?;

            let mut compressed = vec![0u8; compressed_len];
            src.read_exact(&mut compressed)?;
            let raw = zstd::bulk::decompress(&compressed, raw_len)
                .with_context(|| format!("decoding chunk {}", i))?;
            if raw.len() != raw_len {
                anyhow::bail!("chunk {} decoded to {} bytes but index says {}", i, raw.len(), raw_len);
            }
            let computed = xxh3_64(&raw);
            if computed != index.chunk_checksums[i] {
                anyhow::bail!(
                    "chunk {} checksum mismatch: expected {:016x}, got {:016x}",
                    i,
                    index.chunk_checksums[i],
                    computed
                );
            }
            dst.write_all(&raw)?;
            total += raw.len() as u64;
        }
        dst.flush()?;

        Ok(total)
    }
}

impl Compressor for ZstdChunked {
    fn name(&self) -> &'static str {
        "zstd"
    }

    fn compress(&self, job: &CompressJob<'_>) -> anyhow::Result<()> {
        let staged = Staged::new(job)?;
        let index = self.write_outputs(job, &staged)?;
        staged.commit(job)?;
        debug!(
            chunks = index.chunk_count(),
            frames = index.n_frames(),
            compressed = index.chunk_offsets.last().copied().unwrap_or(0),
            "wrote {:?}",
            job.cbin
        );
        Ok(())
    }
}
