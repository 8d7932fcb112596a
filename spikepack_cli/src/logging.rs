use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use tracing::Dispatch;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

/// `MM/DD/YYYY hh:mm:ss AM/PM`
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

/// Append-only log file that receives every event of a run.
///
/// The subscriber is installed only inside [`LogSink::scope`], so nothing
/// outside the run writes to it. Lines are `<timestamp> <message>`; the
/// level filter comes from `RUST_LOG` and defaults to `info`.
pub struct LogSink {
    path: PathBuf,
    file: File,
    dispatch: Dispatch,
}

impl LogSink {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {:?}", path))?;
        let writer = file.try_clone()?;

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = tracing_subscriber::fmt()
            .with_writer(Mutex::new(writer))
            .with_env_filter(filter)
            .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
            .with_ansi(false)
            .with_target(false)
            .with_level(false)
            .finish();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            dispatch: Dispatch::new(subscriber),
        })
    }

    /// Run `f` with this sink as the active subscriber.
    pub fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    /// Flush the log to disk and release it.
    pub fn close(self) -> anyhow::Result<()> {
        self.file
            .sync_all()
            .with_context(|| format!("flushing log file {:?}", self.path))
    }
}
