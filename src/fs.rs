//! Filesystem seam
//!
//! The orchestrator only touches files through `FileSystem`. `OsFileSystem`
//! walks real directories; `MemoryFileSystem` backs tests and counts writes.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use walkdir::{DirEntry, WalkDir};

use crate::error::FsError;

pub trait FileSystem: Send + Sync {
    /// Every file below `dir`, recursively, in a stable order.
    fn read_directory(&self, dir: &Path) -> Result<Vec<PathBuf>, FsError>;
    fn read_file(&self, path: &Path) -> Result<String, FsError>;
    fn write_file(&self, path: &Path, content: &str) -> Result<(), FsError>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPONENT FILES
// ═══════════════════════════════════════════════════════════════════════════════

const SKIPPED_DIRS: &[&str] = &["node_modules", "dist", "build"];

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}

/// `.tsx`/`.jsx` sources, minus declarations, tests and stories.
pub fn is_component_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let ext_ok = name.ends_with(".tsx") || name.ends_with(".jsx");
    let excluded = name.ends_with(".d.ts")
        || [".test.", ".spec.", ".stories."]
            .iter()
            .any(|marker| name.contains(marker));
    ext_ok && !excluded
}

/// `AlertDialog` -> `alert-dialog`, `alert_dialog` -> `alert-dialog`.
pub fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c == '_' || c == ' ' || c == '-' {
            if !out.ends_with('-') && !out.is_empty() {
                out.push('-');
            }
            prev_lower = false;
        } else if c.is_ascii_uppercase() {
            if prev_lower && !out.ends_with('-') {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

/// Component id for a source file. `index` files take their directory name.
pub fn component_id_for(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let stem = stem.split('.').next().unwrap_or(stem);
    if stem == "index" {
        let dir = path.parent()?.file_name()?.to_str()?;
        return Some(kebab_case(dir));
    }
    Some(kebab_case(stem))
}

// ═══════════════════════════════════════════════════════════════════════════════
// OS FILESYSTEM
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read_directory(&self, dir: &Path) -> Result<Vec<PathBuf>, FsError> {
        if !dir.is_dir() {
            return Err(FsError::NotFound(dir.to_path_buf()));
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_skipped_dir(e))
        {
            let entry = entry.map_err(|e| FsError::ReadDirectory {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf()),
                source: e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop")),
            })?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    fn read_file(&self, path: &Path) -> Result<String, FsError> {
        fs::read_to_string(path).map_err(|source| FsError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<(), FsError> {
        let write_err = |source| FsError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }
        fs::write(path, content).map_err(write_err)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MEMORY FILESYSTEM
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: Mutex<BTreeMap<PathBuf, String>>,
    writes: AtomicUsize,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        if let Ok(mut files) = self.files.lock() {
            files.insert(path.into(), content.into());
        }
        self
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        self.files.lock().ok()?.get(path).cloned()
    }
}

fn poisoned(path: &Path) -> std::io::Error {
    std::io::Error::other(format!("file table poisoned while accessing {}", path.display()))
}

impl FileSystem for MemoryFileSystem {
    fn read_directory(&self, dir: &Path) -> Result<Vec<PathBuf>, FsError> {
        let files = self.files.lock().map_err(|_| FsError::ReadDirectory {
            path: dir.to_path_buf(),
            source: poisoned(dir),
        })?;
        let listed: Vec<PathBuf> = files.keys().filter(|p| p.starts_with(dir)).cloned().collect();
        if listed.is_empty() {
            return Err(FsError::NotFound(dir.to_path_buf()));
        }
        Ok(listed)
    }

    fn read_file(&self, path: &Path) -> Result<String, FsError> {
        let files = self.files.lock().map_err(|_| FsError::Read {
            path: path.to_path_buf(),
            source: poisoned(path),
        })?;
        files
            .get(path)
            .cloned()
            .ok_or_else(|| FsError::NotFound(path.to_path_buf()))
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<(), FsError> {
        let mut files = self.files.lock().map_err(|_| FsError::Write {
            path: path.to_path_buf(),
            source: poisoned(path),
        })?;
        files.insert(path.to_path_buf(), content.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
