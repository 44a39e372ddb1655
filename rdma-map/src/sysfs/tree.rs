//! SysTree reader
//!
//! Directory listing and whole-file reads over a hierarchical key/value
//! tree. The production implementation reads the real filesystem; tests
//! swap in synthetic trees.

use crate::error::{RdmaMapError, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Read-only access to a sysfs-like tree
pub trait SysTree: Send + Sync {
    /// List the entry names of the directory at `path`.
    ///
    /// The `.` and `..` pseudo-entries are never returned. Order is
    /// whatever the backing store yields.
    fn list_children(&self, path: &Path) -> Result<Vec<String>>;

    /// Read the whole file at `path`
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;

    /// Read the file at `path` as text, replacing invalid UTF-8
    fn read_string(&self, path: &Path) -> Result<String> {
        let data = self.read_file(path)?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}

pub(crate) fn is_pseudo_entry(name: &str) -> bool {
    name == "." || name == ".."
}

/// List `path`, treating an absent or unreadable directory as empty
pub(crate) fn children_or_empty(tree: &dyn SysTree, path: &Path) -> Vec<String> {
    match tree.list_children(path) {
        Ok(children) => children,
        Err(e) => {
            debug!("Skipping {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// SysTree backed by the host filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSysTree;

impl SysTree for FsSysTree {
    fn list_children(&self, path: &Path) -> Result<Vec<String>> {
        let entries = fs::read_dir(path).map_err(|e| RdmaMapError::from_io(path, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RdmaMapError::from_io(path, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_pseudo_entry(&name) {
                continue;
            }
            names.push(name);
        }
        Ok(names)
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| RdmaMapError::from_io(path, e))
    }
}

#[cfg(test)]
pub(crate) use mem::MemTree;

#[cfg(test)]
mod mem {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// In-memory tree that preserves insertion order of directory entries
    #[derive(Debug, Default)]
    pub(crate) struct MemTree {
        dirs: HashMap<PathBuf, Vec<String>>,
        files: HashMap<PathBuf, Vec<u8>>,
    }

    impl MemTree {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn file(mut self, path: impl AsRef<Path>, contents: &str) -> Self {
            let path = path.as_ref();
            self.link(path);
            self.files
                .insert(path.to_path_buf(), contents.as_bytes().to_vec());
            self
        }

        pub(crate) fn dir(mut self, path: impl AsRef<Path>) -> Self {
            let path = path.as_ref();
            self.link(path);
            self.dirs.entry(path.to_path_buf()).or_default();
            self
        }

        /// Append a raw entry name to a directory listing without creating it
        pub(crate) fn raw_entry(mut self, dir: impl AsRef<Path>, name: &str) -> Self {
            self.dirs
                .entry(dir.as_ref().to_path_buf())
                .or_default()
                .push(name.to_string());
            self
        }

        fn link(&mut self, path: &Path) {
            let mut child = path;
            while let (Some(parent), Some(name)) = (child.parent(), child.file_name()) {
                let name = name.to_string_lossy().into_owned();
                let entries = self.dirs.entry(parent.to_path_buf()).or_default();
                if !entries.contains(&name) {
                    entries.push(name);
                }
                child = parent;
            }
        }
    }

    impl SysTree for MemTree {
        fn list_children(&self, path: &Path) -> Result<Vec<String>> {
            let entries = self.dirs.get(path).ok_or_else(|| RdmaMapError::NotFound {
                path: path.to_path_buf(),
            })?;
            Ok(entries
                .iter()
                .filter(|name| !is_pseudo_entry(name))
                .cloned()
                .collect())
        }

        fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| RdmaMapError::NotFound {
                    path: path.to_path_buf(),
                })
        }
    }
}
