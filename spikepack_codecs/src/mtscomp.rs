use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context;
use spikepack_core::{CompressJob, Compressor};

use crate::staging::Staged;

/// Delegates to the external `mtscomp` command-line tool.
///
/// Invoked as `mtscomp <src> <cbin> <ch> -d <dtype> -s <rate> -n <channels>`
/// with hidden temp paths for `<cbin>` and `<ch>`, which are renamed into
/// place only after mtscomp exits successfully. A non-zero exit is reported
/// with its captured stderr.
pub struct MtscompCommand {
    program: PathBuf,
}

impl Default for MtscompCommand {
    fn default() -> Self {
        Self::new("mtscomp")
    }
}

impl MtscompCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Compressor for MtscompCommand {
    fn name(&self) -> &'static str {
        "mtscomp"
    }

    fn compress(&self, job: &CompressJob<'_>) -> anyhow::Result<()> {
        let staged = Staged::new(job)?;
        let output = Command::new(&self.program)
            .arg(job.source)
            .arg(staged.cbin())
            .arg(staged.ch())
            .arg("-d")
            .arg(job.params.dtype.as_str())
            .arg("-s")
            .arg(job.params.sample_rate.to_string())
            .arg("-n")
            .arg(job.params.n_channels.to_string())
            .output()
            .with_context(|| format!("launching {:?}", self.program))?;

        if !output.status.success() {
            anyhow::bail!(
                "{:?} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        if std::fs::metadata(staged.ch())?.len() == 0 {
            anyhow::bail!(
                "{:?} reported success but did not produce a chunk index for {:?}",
                self.program,
                job.cbin
            );
        }
        staged.commit(job)
    }
}
