use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::layout::DeviceClass;
use crate::meta::MetaMap;

pub const CHANNELS_KEY: &str = "nSavedChans";

/// Storage type of a raw sample. Recordings are always interleaved int16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleDtype {
    #[default]
    Int16,
}

impl SampleDtype {
    pub fn as_str(self) -> &'static str {
        match self {
            SampleDtype::Int16 => "int16",
        }
    }

    /// Bytes per sample.
    pub fn size(self) -> usize {
        match self {
            SampleDtype::Int16 => 2,
        }
    }
}

impl fmt::Display for SampleDtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SampleDtype {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "int16" | "<i2" => Ok(SampleDtype::Int16),
            other => Err(format!("unsupported sample dtype '{other}'")),
        }
    }
}

/// Round a nominal rate to the nearest multiple of 100, ties to even.
///
/// Acquisition hardware records calibrated rates such as `29999.9`; the
/// compressor is handed the canonical equipment value instead.
pub fn round_to_hundred(rate: f64) -> f64 {
    (rate / 100.0).round_ties_even() * 100.0
}

/// Acquisition parameters needed to compress one recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordingParams {
    pub n_channels: usize,
    pub sample_rate: f64,
    pub dtype: SampleDtype,
}

impl RecordingParams {
    /// Resolve channel count and sample rate from a sidecar.
    ///
    /// The sample rate comes from `imSampRate` for imec streams and from
    /// `niSampRate` otherwise.
    pub fn resolve(meta: &MetaMap, device: DeviceClass) -> Result<Self> {
        let n_channels: usize = parse_key(meta, CHANNELS_KEY)?;
        let dtype = SampleDtype::Int16;
        if n_channels == 0 || n_channels.checked_mul(dtype.size()).is_none() {
            return Err(invalid(CHANNELS_KEY, meta));
        }

        let rate_key = device.sample_rate_key();
        let raw_rate: f64 = parse_key(meta, rate_key)?;
        let sample_rate = round_to_hundred(raw_rate);
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(invalid(rate_key, meta));
        }

        Ok(Self {
            n_channels,
            sample_rate,
            dtype,
        })
    }

    /// Bytes occupied by one sample across every channel.
    ///
    /// `None` when the channel count is zero or the size overflows `usize`.
    pub fn bytes_per_frame(&self) -> Option<usize> {
        self.n_channels
            .checked_mul(self.dtype.size())
            .filter(|&bytes| bytes > 0)
    }

    /// Number of whole frames in `byte_len` bytes, `None` on a partial frame
    /// or an unrepresentable frame size.
    pub fn frame_count(&self, byte_len: u64) -> Option<u64> {
        let frame = u64::try_from(self.bytes_per_frame()?).ok()?;
        (byte_len % frame == 0).then_some(byte_len / frame)
    }
}

fn parse_key<T: FromStr>(meta: &MetaMap, key: &'static str) -> Result<T> {
    let value = meta.require(key)?;
    value.trim().parse().map_err(|_| Error::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn invalid(key: &'static str, meta: &MetaMap) -> Error {
    Error::InvalidValue {
        key,
        value: meta.get(key).unwrap_or_default().to_string(),
    }
}
