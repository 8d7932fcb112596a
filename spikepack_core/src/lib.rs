pub mod compressor;
pub mod error;
pub mod layout;
pub mod meta;
pub mod params;
pub mod pipeline;
pub mod walker;

pub use compressor::{CompressJob, Compressor};
pub use error::{Error, Result};
pub use layout::{DeviceClass, RecordingPaths};
pub use meta::MetaMap;
pub use params::{RecordingParams, SampleDtype};
pub use pipeline::{Outcome, Pipeline, RunStats, SkipReason};
pub use walker::RecordingWalker;
