use std::path::Path;

use anyhow::Context;
use spikepack_core::CompressJob;
use tempfile::TempPath;

/// Hidden temp files next to the final outputs.
///
/// Backends write into [`Staged::cbin`] and [`Staged::ch`]; nothing appears
/// under the final names until [`Staged::commit`]. The `.ch` is renamed into
/// place first and the `.cbin` last, so an interrupted run never leaves the
/// payload that later runs treat as "already compressed". Uncommitted temp
/// files are deleted on drop.
pub(crate) struct Staged {
    cbin: TempPath,
    ch: TempPath,
}

impl Staged {
    pub fn new(job: &CompressJob<'_>) -> anyhow::Result<Self> {
        Ok(Self {
            cbin: stage_next_to(job.cbin, ".cbin")?,
            ch: stage_next_to(job.ch, ".ch")?,
        })
    }

    pub fn cbin(&self) -> &Path {
        &self.cbin
    }

    pub fn ch(&self) -> &Path {
        &self.ch
    }

    pub fn commit(self, job: &CompressJob<'_>) -> anyhow::Result<()> {
        self.ch
            .persist(job.ch)
            .with_context(|| format!("moving chunk index into {:?}", job.ch))?;
        if let Err(err) = self.cbin.persist(job.cbin) {
            let _ = std::fs::remove_file(job.ch);
            return Err(err).with_context(|| format!("moving payload into {:?}", job.cbin));
        }
        Ok(())
    }
}

fn stage_next_to(target: &Path, suffix: &str) -> anyhow::Result<TempPath> {
    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let file = tempfile::Builder::new()
        .prefix(".spikepack-")
        .suffix(suffix)
        .tempfile_in(dir)
        .with_context(|| format!("creating temp file in {:?}", dir))?;
    Ok(file.into_temp_path())
}
