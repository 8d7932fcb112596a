use std::fs::{self, ReadDir};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::layout::{is_recording, RESERVED_DIR};

/// Lazy depth-first walk yielding every recording file under a root.
///
/// One `ReadDir` handle is held per directory level on an explicit stack, so
/// the walk never materializes the tree. Subtrees rooted at [`RESERVED_DIR`]
/// are pruned and symlinked directories are not followed. Failures on
/// individual entries are yielded as `Err` items and the walk carries on with
/// the next entry.
pub struct RecordingWalker {
    stack: Vec<ReadDir>,
}

impl RecordingWalker {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::NotADirectory(root.to_path_buf()));
        }
        Ok(Self {
            stack: vec![fs::read_dir(root)?],
        })
    }
}

impl Iterator for RecordingWalker {
    type Item = io::Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.stack.last_mut()?.next() {
                None => {
                    self.stack.pop();
                    continue;
                }
                Some(Err(err)) => return Some(Err(err)),
                Some(Ok(entry)) => entry,
            };
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(err) => return Some(Err(err)),
            };
            let path = entry.path();

            if file_type.is_dir() {
                if entry.file_name() == RESERVED_DIR {
                    continue;
                }
                match fs::read_dir(&path) {
                    Ok(dir) => self.stack.push(dir),
                    Err(err) => return Some(Err(err)),
                }
            } else if file_type.is_symlink() && path.is_dir() {
                continue;
            } else if is_recording(&path) {
                return Some(Ok(path));
            }
        }
    }
}
