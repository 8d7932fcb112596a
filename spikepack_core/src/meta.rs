use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};

/// Parsed `key=value` sidecar written next to each recording.
///
/// Parsing is strict: every line, after trailing whitespace is stripped, must
/// be valid UTF-8 and contain an `=`. The first `=` separates key from value.
/// When a key repeats, the last occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaMap {
    entries: HashMap<String, String>,
}

impl MetaMap {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut entries = HashMap::new();
        let mut buf = Vec::new();
        let mut line = 0;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line += 1;

            let text = std::str::from_utf8(trim_end(&buf)).map_err(|err| {
                Error::CorruptMeta {
                    line,
                    reason: format!("invalid UTF-8: {err}"),
                }
            })?;
            let (key, value) = text.split_once('=').ok_or_else(|| Error::CorruptMeta {
                line,
                reason: "missing '='".to_string(),
            })?;
            entries.insert(key.to_string(), value.to_string());
        }

        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Look up a key that must be present.
    pub fn require(&self, key: &'static str) -> Result<&str> {
        self.get(key).ok_or(Error::MissingKey(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Strip trailing ASCII whitespace, vertical tab included.
fn trim_end(mut bytes: &[u8]) -> &[u8] {
    while let [rest @ .., last] = bytes {
        if !(last.is_ascii_whitespace() || *last == 0x0B) {
            break;
        }
        bytes = rest;
    }
    bytes
}
