//   Copyright (c) 2024-2026 Anton Kundenko <singaraiona@gmail.com>
//   All rights reserved.
//
//   Permission is hereby granted, free of charge, to any person obtaining a copy
//   of this software and associated documentation files (the "Software"), to deal
//   in the Software without restriction, including without limitation the rights
//   to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
//   copies of the Software, and to permit persons to whom the Software is
//   furnished to do so, subject to the following conditions:
//
//   The above copyright notice and this permission notice shall be included in all
//   copies or substantial portions of the Software.
//
//   THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
//   IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
//   FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
//   AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
//   LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
//   OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
//   SOFTWARE.

use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

use arbor_engine::{EngineError, EngineErrorCode, NativeEngine};
use tracing::{debug, trace};

use crate::config::Config;
use crate::database::{Database, DatabaseInner};
use crate::error::{Error, Result};
use crate::handle::EngineContext;
use crate::identity::IdentityCache;

pub(crate) struct SessionInner {
    pub(crate) engine: EngineContext,
    pub(crate) config: Config,
    /// Open databases keyed by absolute path.
    pub(crate) databases: IdentityCache<DatabaseInner>,
}

/// Entry point: owns the engine and the database identity cache.
///
/// Every wrapper keeps the session alive, so dropping the `Session` value
/// while databases are open is fine.
#[derive(Clone)]
pub struct Session {
    inner: Rc<SessionInner>,
}

impl Session {
    pub fn new(engine: impl NativeEngine + 'static) -> Self {
        Self::with_config(engine, Config::default())
    }

    pub fn with_config(engine: impl NativeEngine + 'static, config: Config) -> Self {
        Session {
            inner: Rc::new(SessionInner {
                engine: EngineContext::new(Box::new(engine)),
                config,
                databases: IdentityCache::default(),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Open the database at `path`, creating it when missing and
    /// `create_if_missing` is set.
    ///
    /// While a `Database` for the same path is alive, the same instance is
    /// returned. If that instance has been removed but is still waiting for
    /// its dependents, this fails with [`Error::DatabaseRemoved`].
    ///
    /// Paths are made absolute and `.`/`..` are folded lexically; symlinks
    /// are not resolved. Two spellings that only meet through a symlink are
    /// different keys, and the engine rejects the second open with `Busy`.
    pub fn open(&self, path: impl AsRef<Path>, create_if_missing: bool) -> Result<Database> {
        let path = absolute(path.as_ref())?;
        let key = path.to_string_lossy().into_owned();
        if let Some(cached) = self.inner.databases.lookup(&key) {
            if cached.lifecycle.is_removed() {
                return Err(Error::DatabaseRemoved);
            }
            trace!(target: "arbor::lifecycle", path = %key, "database cache hit");
            return Ok(Database::from_inner(cached));
        }

        let engine = &self.inner.engine;
        let handle = match engine.with(|e| e.open(&path)) {
            Ok(handle) => handle,
            Err(Error::Engine(err)) if err.code == EngineErrorCode::NotFound => {
                if !create_if_missing {
                    return Err(Error::not_found("database", key));
                }
                engine.with(|e| e.create(Some(&path)))?
            }
            Err(err) => return Err(err),
        };
        debug!(target: "arbor::lifecycle", path = %key, "opened database");
        Ok(Database::adopt(&self.inner, handle, Some(key)))
    }

    /// Create a new database at `path`. Fails if something already exists
    /// there.
    pub fn create(&self, path: impl AsRef<Path>) -> Result<Database> {
        let path = absolute(path.as_ref())?;
        let key = path.to_string_lossy().into_owned();
        if self.inner.databases.lookup(&key).is_some() {
            return Err(EngineError::new(
                EngineErrorCode::AlreadyExists,
                format!("database is already open: {key}"),
            )
            .into());
        }
        let handle = self.inner.engine.with(|e| e.create(Some(&path)))?;
        debug!(target: "arbor::lifecycle", path = %key, "created database");
        Ok(Database::adopt(&self.inner, handle, Some(key)))
    }

    /// Create an in-memory database. It has no path and is never cached.
    pub fn open_temporary(&self) -> Result<Database> {
        let handle = self.inner.engine.with(|e| e.create(None))?;
        debug!(target: "arbor::lifecycle", "created temporary database");
        Ok(Database::adopt(&self.inner, handle, None))
    }

    /// Number of path-keyed databases currently alive in this session.
    pub fn live_databases(&self) -> usize {
        self.inner.databases.live()
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path).map_err(|e| {
        Error::from(EngineError::new(
            EngineErrorCode::Io,
            format!("cannot resolve {}: {e}", path.display()),
        ))
    })?;
    let mut normal = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normal.pop();
            }
            other => normal.push(other),
        }
    }
    Ok(normal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_segments_are_folded() {
        let base = std::path::absolute("dir").unwrap();
        let expected = base.join("store.db");
        assert_eq!(absolute(Path::new("dir/sub/../store.db")).unwrap(), expected);
        assert_eq!(absolute(Path::new("dir/./store.db")).unwrap(), expected);
    }
}
