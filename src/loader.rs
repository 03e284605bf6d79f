// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Module loader (component C8): per-file exclusive locking keyed by
//! device+inode, so a script that imports itself (directly or through a
//! cycle) fails with a clear error instead of deadlocking or blowing the
//! native stack.
//!
//! §4.6's sequencing is load-bearing: the registry check happens *before*
//! the advisory OS lock is taken, so two concurrent attempts to import the
//! same file surface as "recursive import denied" rather than one of them
//! blocking on the other's lock.

use std::collections::HashMap;
use std::fs::File;
use std::io;
#[cfg(unix)]
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use fs2::FileExt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("recursive import denied: {path} (key {key})")]
    RecursiveImport { path: PathBuf, key: String },
    #[error("failed to lock {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Derive the registry key for an open file: `"dev:<st_dev>/ino:<st_ino>"`
/// where the platform exposes them (§3's "substitute the canonicalized
/// real path" fallback applies on platforms that don't — hard-linked
/// siblings then alias the same key, which is the accepted degradation).
#[cfg(unix)]
fn stream_identity(path: &Path, file: &File) -> Result<String, LoaderError> {
    let metadata = file.metadata().map_err(|source| LoaderError::Stat {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(format!("dev:{}/ino:{}", metadata.dev(), metadata.ino()))
}

#[cfg(not(unix))]
fn stream_identity(path: &Path, _file: &File) -> Result<String, LoaderError> {
    let real = path.canonicalize().map_err(|source| LoaderError::Stat {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(format!("path:{}", real.display()))
}

/// Registry of currently-open, currently-locked modules, keyed by stream
/// identity. Shared across the loader's clones; a mutex serializes
/// concurrent `lock`/`unlock` (§5), while the OS advisory lock itself
/// handles cross-process exclusion.
#[derive(Default)]
struct Registry {
    open: HashMap<String, ()>,
}

/// The module loader: owns the shared registry and hands out [`LockGuard`]
/// handles.
#[derive(Clone, Default)]
pub struct ModuleLoader {
    registry: Arc<Mutex<Registry>>,
}

impl ModuleLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `lock(path)`, per §4.6: open, stat, registry-insert-or-fail, OS
    /// lock, return a handle whose `Drop` releases both.
    #[tracing::instrument(level = "debug", skip(self), fields(path = %path.as_ref().display()))]
    pub fn lock(&self, path: impl AsRef<Path>) -> Result<LockGuard, LoaderError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LoaderError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let key = stream_identity(path, &file)?;

        {
            let mut registry = self.registry.lock().expect("loader registry poisoned");
            if registry.open.contains_key(&key) {
                tracing::warn!(%key, "recursive import denied");
                return Err(LoaderError::RecursiveImport {
                    path: path.to_path_buf(),
                    key,
                });
            }
            registry.open.insert(key.clone(), ());
        }

        if let Err(source) = file.lock_exclusive() {
            self.registry
                .lock()
                .expect("loader registry poisoned")
                .open
                .remove(&key);
            return Err(LoaderError::Lock {
                path: path.to_path_buf(),
                source,
            });
        }

        Ok(LockGuard {
            registry: self.registry.clone(),
            key,
            file,
        })
    }
}

/// A held import lock. Dropping it unlocks the file and removes the
/// registry entry, making the path importable again.
pub struct LockGuard {
    registry: Arc<Mutex<Registry>>,
    key: String,
    file: File,
}

impl LockGuard {
    #[must_use]
    pub fn file(&self) -> &File {
        &self.file
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
        self.registry
            .lock()
            .expect("loader registry poisoned")
            .open
            .remove(&self.key);
    }
}

#[cfg(test)]
mod loader_test {
    use super::*;
    use std::io::Write;

    fn temp_file(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{contents}").unwrap();
        f
    }

    #[test]
    fn lock_then_unlock_allows_relocking() {
        let loader = ModuleLoader::new();
        let tmp = temp_file("a");
        {
            let _guard = loader.lock(tmp.path()).unwrap();
        }
        let guard = loader.lock(tmp.path());
        assert!(guard.is_ok());
    }

    #[test]
    fn concurrent_lock_of_same_file_is_denied() {
        let loader = ModuleLoader::new();
        let tmp = temp_file("a");
        let first = loader.lock(tmp.path()).unwrap();
        let second = loader.lock(tmp.path());
        assert!(matches!(second, Err(LoaderError::RecursiveImport { .. })));
        drop(first);
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let loader = ModuleLoader::new();
        let err = loader.lock("/nonexistent/path/does/not/exist.asteria");
        assert!(matches!(err, Err(LoaderError::Open { .. })));
    }
}
