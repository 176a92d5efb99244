//! Filesystem-backed local store

use super::{LocalChild, LocalKind, LocalStore};
use crate::types::SyncError;
use camino::{Utf8Path, Utf8PathBuf};
use filetime::FileTime;
use std::fs::{self, File};
use std::io::{Error, ErrorKind, Write};
use std::path::Path;
use tracing::warn;

/// Local store rooted at the sync directory
#[derive(Debug, Clone)]
pub struct FsLocalStore {
    root: Utf8PathBuf,
}

impl FsLocalStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a store from an OS path, rejecting non-UTF-8 roots
    pub fn from_path(root: &Path) -> Result<Self, SyncError> {
        let root = Utf8PathBuf::from_path_buf(root.to_path_buf()).map_err(SyncError::NonUtf8Path)?;
        Ok(Self::new(root))
    }

    /// Absolute sync root
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn abs(&self, rel: &Utf8Path) -> Utf8PathBuf {
        if rel.as_str().is_empty() {
            self.root.clone()
        } else {
            self.root.join(rel)
        }
    }
}

impl LocalStore for FsLocalStore {
    fn list_children(&self, dir: &Utf8Path) -> Result<Vec<LocalChild>, SyncError> {
        let dir_path = self.abs(dir);
        fs::metadata(&dir_path).map_err(|e| map_io_error(dir, e))?;

        // Depth 1 only: the tree builder drives the breadth-first descent itself.
        let walker = ignore::WalkBuilder::new(&dir_path)
            .standard_filters(false)
            .follow_links(false)
            .max_depth(Some(1))
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut children = Vec::new();
        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Error while listing {}: {}. Entry skipped.", dir_path, e);
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }

            let file_type = match entry.file_type() {
                Some(ft) => ft,
                None => continue,
            };
            // Symlinks are never synced
            if file_type.is_symlink() {
                continue;
            }

            let name = match entry.file_name().to_str() {
                Some(name) => name.to_string(),
                None => {
                    warn!(
                        "Skipping {}: name is not valid UTF-8 and cannot be stored remotely",
                        entry.path().display()
                    );
                    continue;
                }
            };

            if file_type.is_dir() {
                children.push(LocalChild {
                    name,
                    kind: LocalKind::Dir,
                });
            } else if file_type.is_file() {
                let metadata = match entry.metadata() {
                    Ok(m) => m,
                    Err(e) => {
                        warn!(
                            "Failed to read metadata for {}: {}. File skipped.",
                            entry.path().display(),
                            e
                        );
                        continue;
                    }
                };
                let mtime = FileTime::from_last_modification_time(&metadata).unix_seconds();
                children.push(LocalChild {
                    name,
                    kind: LocalKind::File { mtime },
                });
            }
            // pipes, sockets and devices are skipped
        }

        Ok(children)
    }

    fn kind(&self, path: &Utf8Path) -> Result<Option<LocalKind>, SyncError> {
        let metadata = match fs::symlink_metadata(self.abs(path)) {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(map_io_error(path, e)),
        };
        let file_type = metadata.file_type();
        if file_type.is_dir() {
            Ok(Some(LocalKind::Dir))
        } else if file_type.is_file() {
            let mtime = FileTime::from_last_modification_time(&metadata).unix_seconds();
            Ok(Some(LocalKind::File { mtime }))
        } else {
            Ok(None)
        }
    }

    fn modified_time(&self, path: &Utf8Path) -> Result<i64, SyncError> {
        let metadata = fs::metadata(self.abs(path)).map_err(|e| map_io_error(path, e))?;
        Ok(FileTime::from_last_modification_time(&metadata).unix_seconds())
    }

    fn read_file(&self, path: &Utf8Path) -> Result<Vec<u8>, SyncError> {
        fs::read(self.abs(path)).map_err(|e| map_io_error(path, e))
    }

    /// Write-then-rename so a failed transfer never leaves a truncated file behind
    fn write_file(&self, path: &Utf8Path, content: &[u8], mtime: i64) -> Result<(), SyncError> {
        let dest = self.abs(path);
        let parent = dest
            .parent()
            .ok_or_else(|| SyncError::Validation(format!("No parent directory for {}", dest)))?;
        fs::create_dir_all(parent)?;

        let file_name = dest
            .file_name()
            .ok_or_else(|| SyncError::Validation(format!("No file name in {}", dest)))?;
        let part_path = parent.join(format!(".{}.part", file_name));

        let result = write_part(&part_path, content, mtime).and_then(|()| fs::rename(&part_path, &dest));
        if let Err(e) = result {
            if let Err(cleanup) = fs::remove_file(&part_path) {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!("Could not remove {}: {}", part_path, cleanup);
                }
            }
            return Err(e.into());
        }
        Ok(())
    }

    fn set_modified_time(&self, path: &Utf8Path, mtime: i64) -> Result<(), SyncError> {
        filetime::set_file_mtime(self.abs(path), FileTime::from_unix_time(mtime, 0))
            .map_err(|e| map_io_error(path, e))
    }

    fn create_dir(&self, path: &Utf8Path) -> Result<(), SyncError> {
        fs::create_dir_all(self.abs(path)).map_err(|e| map_io_error(path, e))
    }

    fn remove_dir_all(&self, path: &Utf8Path) -> Result<(), SyncError> {
        match fs::remove_dir_all(self.abs(path)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(map_io_error(path, e)),
        }
    }

    fn remove_file(&self, path: &Utf8Path) -> Result<(), SyncError> {
        match fs::remove_file(self.abs(path)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(map_io_error(path, e)),
        }
    }
}

fn write_part(part_path: &Utf8Path, content: &[u8], mtime: i64) -> std::io::Result<()> {
    let mut part_file = File::create(part_path)?;
    part_file.write_all(content)?;
    part_file.sync_all()?;
    // Drop the file handle before setting mtime and renaming (required on Windows)
    drop(part_file);
    filetime::set_file_mtime(part_path, FileTime::from_unix_time(mtime, 0))
}

fn map_io_error(path: &Utf8Path, error: Error) -> SyncError {
    if error.kind() == ErrorKind::NotFound {
        SyncError::LocalNotFound {
            path: path.to_path_buf(),
        }
    } else {
        SyncError::Io(error)
    }
}
