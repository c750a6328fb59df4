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

//! File-backed reference engine.
//!
//! A database is a catalog file; every persistent object also owns a file
//! next to it (`<db path>.<id as 7 hex digits>` unless given a path), so
//! physical creation and deletion are visible on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::catalog::{column_full_name, Catalog, ObjectRecord, Scope};
use crate::consts::{ObjId, ObjectFlags, ObjectKind};
use crate::error::{EngineError, EngineErrorCode, EngineResult};
use crate::{
    ColumnSpec, CursorHandle, CursorOptions, Handle, NativeEngine, ObjectInfo, TableSpec,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Database(u64),
    Object { db: u64, id: ObjId },
}

impl Target {
    fn db(self) -> u64 {
        match self {
            Target::Database(db) | Target::Object { db, .. } => db,
        }
    }
}

struct OpenDatabase {
    path: Option<PathBuf>,
    catalog: Catalog,
}

impl OpenDatabase {
    fn persist(&self) -> EngineResult<()> {
        match &self.path {
            Some(path) => self.catalog.save(path),
            None => Ok(()),
        }
    }
}

struct CursorState {
    db: u64,
    scope: Scope,
    options: CursorOptions,
    after: Option<String>,
    skipped: usize,
    yielded: usize,
}

/// Reference [`NativeEngine`] keeping catalogs as JSON files.
pub struct FileEngine {
    databases: HashMap<u64, OpenDatabase>,
    handles: HashMap<u64, Target>,
    cursors: HashMap<u64, CursorState>,
    next_raw: u64,
    handle_limit: Option<usize>,
}

impl Default for FileEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FileEngine {
    pub fn new() -> Self {
        FileEngine {
            databases: HashMap::new(),
            handles: HashMap::new(),
            cursors: HashMap::new(),
            next_raw: 1,
            handle_limit: None,
        }
    }

    /// Cap the number of simultaneously issued handles and cursors. Past the
    /// cap the engine fails with [`EngineErrorCode::OutOfMemory`].
    pub fn with_handle_limit(mut self, limit: usize) -> Self {
        self.handle_limit = Some(limit);
        self
    }

    /// Number of handles currently issued and not yet closed or removed.
    pub fn open_handles(&self) -> usize {
        self.handles.len()
    }

    /// Number of cursors currently open.
    pub fn open_cursors(&self) -> usize {
        self.cursors.len()
    }

    fn next_raw(&mut self) -> u64 {
        let raw = self.next_raw;
        self.next_raw += 1;
        raw
    }

    fn check_capacity(&self) -> EngineResult<()> {
        match self.handle_limit {
            Some(limit) if self.handles.len() + self.cursors.len() >= limit => Err(EngineError::new(
                EngineErrorCode::OutOfMemory,
                format!("handle table exhausted ({limit} entries)"),
            )),
            _ => Ok(()),
        }
    }

    fn issue(&mut self, target: Target) -> EngineResult<Handle> {
        self.check_capacity()?;
        let raw = self.next_raw();
        self.handles.insert(raw, target);
        trace!(target: "arbor_engine", handle = raw, ?target, "issued handle");
        Ok(Handle::from_raw(raw))
    }

    fn target(&self, handle: Handle) -> EngineResult<Target> {
        self.handles
            .get(&handle.as_raw())
            .copied()
            .ok_or_else(|| EngineError::invalid_handle(handle.as_raw()))
    }

    fn database(&self, slot: u64) -> EngineResult<&OpenDatabase> {
        self.databases
            .get(&slot)
            .ok_or_else(|| EngineError::invalid_handle("database is closed"))
    }

    fn database_mut(&mut self, slot: u64) -> EngineResult<&mut OpenDatabase> {
        self.databases
            .get_mut(&slot)
            .ok_or_else(|| EngineError::invalid_handle("database is closed"))
    }

    /// Record behind an object handle; fails for stale handles.
    fn record(&self, handle: Handle) -> EngineResult<(u64, &ObjectRecord)> {
        match self.target(handle)? {
            Target::Database(_) => Err(EngineError::new(
                EngineErrorCode::InvalidArgument,
                "expected an object handle, got a database",
            )),
            Target::Object { db, id } => {
                let record = self
                    .database(db)?
                    .catalog
                    .get(id)
                    .ok_or_else(|| EngineError::invalid_handle(format!("object {id} was removed")))?;
                Ok((db, record))
            }
        }
    }

    fn database_slot(&self, handle: Handle) -> EngineResult<u64> {
        match self.target(handle)? {
            Target::Database(db) => Ok(db),
            Target::Object { .. } => Err(EngineError::new(
                EngineErrorCode::InvalidArgument,
                "expected a database handle",
            )),
        }
    }

    fn scope_of(&self, handle: Handle) -> EngineResult<(u64, Scope)> {
        match self.target(handle)? {
            Target::Database(db) => {
                self.database(db)?;
                Ok((db, Scope::Database))
            }
            Target::Object { .. } => {
                let (db, record) = self.record(handle)?;
                match record.kind {
                    ObjectKind::Table(_) => Ok((db, Scope::Table(record.id))),
                    _ => Err(EngineError::new(
                        EngineErrorCode::InvalidArgument,
                        format!("{} has no children", record.id),
                    )),
                }
            }
        }
    }

    fn forget_database(&mut self, slot: u64) {
        self.handles.retain(|_, t| t.db() != slot);
        self.cursors.retain(|_, c| c.db != slot);
        self.databases.remove(&slot);
    }

    fn object_path(db: &OpenDatabase, id: ObjId, requested: Option<&Path>) -> Option<PathBuf> {
        match requested {
            Some(path) => Some(path.to_path_buf()),
            None => db
                .path
                .as_ref()
                .map(|p| PathBuf::from(format!("{}.{:07X}", p.display(), id.0))),
        }
    }

    fn ensure_exists(db: &OpenDatabase, id: ObjId, what: &str) -> EngineResult<()> {
        if db.catalog.get(id).is_none() {
            return Err(EngineError::new(
                EngineErrorCode::InvalidArgument,
                format!("unknown {what}: {id}"),
            ));
        }
        Ok(())
    }

    fn persistence_check(db: &OpenDatabase, flags: ObjectFlags) -> EngineResult<()> {
        if flags.contains(ObjectFlags::PERSISTENT) && db.path.is_none() {
            return Err(EngineError::new(
                EngineErrorCode::InvalidArgument,
                "persistent object requires a persistent database",
            ));
        }
        Ok(())
    }

    fn create_object_file(path: Option<&Path>) -> EngineResult<()> {
        if let Some(path) = path {
            std::fs::File::create(path)
                .map_err(|e| EngineError::io(format!("create {}", path.display()), e))?;
        }
        Ok(())
    }

    fn delete_file(path: &Path) {
        if let Err(e) = std::fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(target: "arbor_engine", path = %path.display(), error = %e, "failed to delete object file");
            }
        }
    }
}

impl NativeEngine for FileEngine {
    fn open(&mut self, path: &Path) -> EngineResult<Handle> {
        if self.databases.values().any(|db| db.path.as_deref() == Some(path)) {
            return Err(EngineError::new(
                EngineErrorCode::Busy,
                format!("database is already open: {}", path.display()),
            ));
        }
        self.check_capacity()?;
        let catalog = Catalog::load(path)?;
        let slot = self.next_raw();
        self.databases.insert(
            slot,
            OpenDatabase {
                path: Some(path.to_path_buf()),
                catalog,
            },
        );
        debug!(target: "arbor_engine", path = %path.display(), "opened database");
        self.issue(Target::Database(slot))
    }

    fn create(&mut self, path: Option<&Path>) -> EngineResult<Handle> {
        if let Some(path) = path {
            if path.exists() {
                return Err(EngineError::new(
                    EngineErrorCode::AlreadyExists,
                    format!("database already exists: {}", path.display()),
                ));
            }
        }
        self.check_capacity()?;
        let db = OpenDatabase {
            path: path.map(Path::to_path_buf),
            catalog: Catalog::new(),
        };
        db.persist()?;
        let slot = self.next_raw();
        self.databases.insert(slot, db);
        debug!(target: "arbor_engine", path = ?path, "created database");
        self.issue(Target::Database(slot))
    }

    fn close(&mut self, handle: Handle) -> EngineResult<()> {
        let target = self.target(handle)?;
        self.handles.remove(&handle.as_raw());
        match target {
            Target::Database(slot) => {
                let result = self.database(slot)?.persist();
                self.forget_database(slot);
                debug!(target: "arbor_engine", handle = handle.as_raw(), "closed database");
                result
            }
            Target::Object { db, id } => {
                if self.database(db)?.catalog.get(id).is_none() {
                    return Err(EngineError::invalid_handle(format!("object {id} was removed")));
                }
                trace!(target: "arbor_engine", handle = handle.as_raw(), %id, "closed handle");
                Ok(())
            }
        }
    }

    fn remove(&mut self, handle: Handle) -> EngineResult<()> {
        match self.target(handle)? {
            Target::Database(slot) => {
                let db = self.database(slot)?;
                let files: Vec<PathBuf> = db.catalog.files().map(Path::to_path_buf).collect();
                let path = db.path.clone();
                for file in &files {
                    Self::delete_file(file);
                }
                if let Some(path) = &path {
                    std::fs::remove_file(path)
                        .map_err(|e| EngineError::io(format!("remove {}", path.display()), e))?;
                }
                self.forget_database(slot);
                debug!(target: "arbor_engine", path = ?path, "removed database");
                Ok(())
            }
            Target::Object { db: slot, id } => {
                let db = self.database_mut(slot)?;
                let removed = db.catalog.remove(id)?;
                db.persist()?;
                for record in &removed {
                    if let Some(path) = &record.path {
                        Self::delete_file(path);
                    }
                }
                // Handles into deleted objects die with them.
                self.handles.retain(|_, t| match *t {
                    Target::Object { db, id } if db == slot => {
                        !removed.iter().any(|r| r.id == id)
                    }
                    _ => true,
                });
                debug!(target: "arbor_engine", %id, count = removed.len(), "removed object");
                Ok(())
            }
        }
    }

    fn touch(&mut self, db: Handle) -> EngineResult<()> {
        let slot = self.database_slot(db)?;
        let db = self.database_mut(slot)?;
        db.catalog.touch();
        db.persist()
    }

    fn lookup(&mut self, scope: Handle, name: &str) -> EngineResult<Option<Handle>> {
        let (slot, scope) = self.scope_of(scope)?;
        let catalog = &self.database(slot)?.catalog;
        let id = match scope {
            Scope::Database => catalog.id_of(name),
            Scope::Table(table) => {
                let table_name = catalog.get(table).and_then(|t| t.name.as_deref());
                table_name.and_then(|t| catalog.id_of(&column_full_name(t, name)))
            }
        };
        match id {
            Some(id) => self.issue(Target::Object { db: slot, id }).map(Some),
            None => Ok(None),
        }
    }

    fn open_id(&mut self, scope: Handle, id: ObjId) -> EngineResult<Option<Handle>> {
        let slot = self.target(scope)?.db();
        if self.database(slot)?.catalog.get(id).is_none() {
            return Ok(None);
        }
        self.issue(Target::Object { db: slot, id }).map(Some)
    }

    fn info(&self, handle: Handle) -> EngineResult<ObjectInfo> {
        match self.target(handle)? {
            Target::Database(slot) => {
                let db = self.database(slot)?;
                let flags = if db.path.is_some() {
                    ObjectFlags::PERSISTENT
                } else {
                    ObjectFlags::empty()
                };
                Ok(ObjectInfo {
                    id: ObjId::NIL,
                    name: None,
                    kind: ObjectKind::Database,
                    flags,
                    compression: None,
                    domain: None,
                    range: None,
                    path: db.path.clone(),
                })
            }
            Target::Object { .. } => {
                let (_, record) = self.record(handle)?;
                Ok(ObjectInfo {
                    id: record.id,
                    name: record.name.clone(),
                    kind: record.kind,
                    flags: record.flags,
                    compression: record.compression,
                    domain: record.domain,
                    range: record.range,
                    path: record.path.clone(),
                })
            }
        }
    }

    fn id_of(&self, scope: Handle, name: &str) -> EngineResult<Option<ObjId>> {
        let slot = self.target(scope)?.db();
        Ok(self.database(slot)?.catalog.id_of(name))
    }

    fn name_of(&self, scope: Handle, id: ObjId) -> EngineResult<Option<String>> {
        let slot = self.target(scope)?.db();
        Ok(self
            .database(slot)?
            .catalog
            .get(id)
            .and_then(|r| r.name.clone()))
    }

    fn create_table(&mut self, db: Handle, spec: &TableSpec) -> EngineResult<Handle> {
        let slot = self.database_slot(db)?;
        self.check_capacity()?;
        let db = self.database_mut(slot)?;
        Self::persistence_check(db, spec.flags)?;
        if let Some(key) = spec.key_type {
            Self::ensure_exists(db, key, "key type")?;
        }
        if let Some(value) = spec.value_type {
            Self::ensure_exists(db, value, "value type")?;
        }
        if let Some(name) = &spec.name {
            if db.catalog.id_of(name).is_some() {
                return Err(EngineError::new(
                    EngineErrorCode::AlreadyExists,
                    format!("object already exists: <{name}>"),
                ));
            }
        }
        let id = db.catalog.allocate_id();
        let path = if spec.flags.contains(ObjectFlags::PERSISTENT) {
            Self::object_path(db, id, spec.path.as_deref())
        } else {
            None
        };
        Self::create_object_file(path.as_deref())?;
        db.catalog.insert(ObjectRecord {
            id,
            name: spec.name.clone(),
            kind: ObjectKind::Table(spec.table_type),
            flags: spec.flags,
            compression: None,
            domain: spec.key_type,
            range: spec.value_type,
            path,
        })?;
        db.persist()?;
        debug!(target: "arbor_engine", name = ?spec.name, %id, "created table");
        self.issue(Target::Object { db: slot, id })
    }

    fn create_column(&mut self, table: Handle, spec: &ColumnSpec) -> EngineResult<Handle> {
        let (slot, table_record) = self.record(table)?;
        if !table_record.kind.is_table() {
            return Err(EngineError::new(
                EngineErrorCode::InvalidArgument,
                format!("{} is not a table", table_record.id),
            ));
        }
        let table_id = table_record.id;
        let table_persistent = table_record.flags.contains(ObjectFlags::PERSISTENT);
        let table_name = table_record.name.clone().ok_or_else(|| {
            EngineError::new(
                EngineErrorCode::InvalidArgument,
                "columns require a named table",
            )
        })?;
        self.check_capacity()?;
        let db = self.database_mut(slot)?;
        if spec.flags.contains(ObjectFlags::PERSISTENT) && !table_persistent {
            return Err(EngineError::new(
                EngineErrorCode::InvalidArgument,
                format!("persistent column on temporary table <{table_name}>"),
            ));
        }
        Self::ensure_exists(db, spec.value_type, "value type")?;
        let full = column_full_name(&table_name, &spec.name);
        if db.catalog.id_of(&full).is_some() {
            return Err(EngineError::new(
                EngineErrorCode::AlreadyExists,
                format!("object already exists: <{full}>"),
            ));
        }
        let id = db.catalog.allocate_id();
        let path = if spec.flags.contains(ObjectFlags::PERSISTENT) {
            Self::object_path(db, id, spec.path.as_deref())
        } else {
            None
        };
        Self::create_object_file(path.as_deref())?;
        db.catalog.insert(ObjectRecord {
            id,
            name: Some(full.clone()),
            kind: ObjectKind::Column(spec.column_type),
            flags: spec.flags,
            compression: spec.compression,
            domain: Some(table_id),
            range: Some(spec.value_type),
            path,
        })?;
        db.persist()?;
        debug!(target: "arbor_engine", name = %full, %id, "created column");
        self.issue(Target::Object { db: slot, id })
    }

    fn rename(&mut self, handle: Handle, name: &str) -> EngineResult<()> {
        let (slot, record) = self.record(handle)?;
        let id = record.id;
        let db = self.database_mut(slot)?;
        db.catalog.rename_column(id, name)?;
        db.persist()
    }

    fn cursor_open(&mut self, scope: Handle, options: &CursorOptions) -> EngineResult<CursorHandle> {
        let (db, scope) = self.scope_of(scope)?;
        self.check_capacity()?;
        let raw = self.next_raw();
        self.cursors.insert(
            raw,
            CursorState {
                db,
                scope,
                options: options.clone(),
                after: None,
                skipped: 0,
                yielded: 0,
            },
        );
        trace!(target: "arbor_engine", cursor = raw, ?scope, "opened cursor");
        Ok(CursorHandle::from_raw(raw))
    }

    fn cursor_next(&mut self, cursor: CursorHandle) -> EngineResult<Option<ObjId>> {
        let state = self
            .cursors
            .get_mut(&cursor.as_raw())
            .ok_or_else(|| EngineError::invalid_handle(format!("cursor {}", cursor.as_raw())))?;
        let catalog = &self
            .databases
            .get(&state.db)
            .ok_or_else(|| EngineError::invalid_handle("database is closed"))?
            .catalog;
        if let Scope::Table(table) = state.scope {
            if catalog.get(table).is_none() {
                return Err(EngineError::invalid_handle(format!(
                    "cursor scope {table} was removed"
                )));
            }
        }
        if state.options.limit.is_some_and(|limit| state.yielded >= limit) {
            return Ok(None);
        }
        while let Some((name, key, id)) = catalog.next_child(state.scope, state.after.as_deref()) {
            state.after = Some(name);
            if state.options.max.as_deref().is_some_and(|max| key.as_str() > max) {
                return Ok(None);
            }
            if !state.options.admits(&key) {
                continue;
            }
            if state.skipped < state.options.offset {
                state.skipped += 1;
                continue;
            }
            state.yielded += 1;
            return Ok(Some(id));
        }
        Ok(None)
    }

    fn cursor_close(&mut self, cursor: CursorHandle) -> EngineResult<()> {
        match self.cursors.remove(&cursor.as_raw()) {
            Some(_) => {
                trace!(target: "arbor_engine", cursor = cursor.as_raw(), "closed cursor");
                Ok(())
            }
            None => Err(EngineError::invalid_handle(format!("cursor {}", cursor.as_raw()))),
        }
    }
}

impl Drop for FileEngine {
    fn drop(&mut self) {
        for db in self.databases.values() {
            if let Err(e) = db.persist() {
                warn!(target: "arbor_engine", path = ?db.path, error = %e, "failed to save catalog on shutdown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColumnType, DataType, TableType};

    fn users_spec() -> TableSpec {
        TableSpec {
            name: Some("Users".into()),
            path: None,
            table_type: TableType::HashKey,
            flags: ObjectFlags::PERSISTENT,
            key_type: Some(DataType::ShortText.obj_id()),
            value_type: None,
        }
    }

    fn age_spec() -> ColumnSpec {
        ColumnSpec {
            name: "age".into(),
            path: None,
            column_type: ColumnType::Scalar,
            flags: ObjectFlags::PERSISTENT,
            compression: None,
            value_type: DataType::Int32.obj_id(),
        }
    }

    #[test]
    fn objects_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db");
        let mut engine = FileEngine::new();

        let db = engine.create(Some(&path)).unwrap();
        let users = engine.create_table(db, &users_spec()).unwrap();
        let age = engine.create_column(users, &age_spec()).unwrap();
        let info = engine.info(age).unwrap();
        assert_eq!(info.name.as_deref(), Some("Users.age"));
        assert!(info.path.as_ref().unwrap().exists());
        engine.close(age).unwrap();
        engine.close(users).unwrap();
        engine.close(db).unwrap();
        assert_eq!(engine.open_handles(), 0);

        let db = engine.open(&path).unwrap();
        let users = engine.lookup(db, "Users").unwrap().unwrap();
        let age = engine.lookup(users, "age").unwrap().unwrap();
        assert_eq!(engine.info(age).unwrap().range, Some(DataType::Int32.obj_id()));
        assert!(engine.lookup(users, "missing").unwrap().is_none());
    }

    #[test]
    fn removing_a_table_deletes_its_files_and_stales_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db");
        let mut engine = FileEngine::new();
        let db = engine.create(Some(&path)).unwrap();
        let users = engine.create_table(db, &users_spec()).unwrap();
        let age = engine.create_column(users, &age_spec()).unwrap();
        let table_file = engine.info(users).unwrap().path.unwrap();
        let column_file = engine.info(age).unwrap().path.unwrap();

        engine.remove(users).unwrap();
        assert!(!table_file.exists());
        assert!(!column_file.exists());
        assert_eq!(
            engine.info(age).unwrap_err().code,
            EngineErrorCode::InvalidHandle
        );
        assert!(engine.close(age).is_err());
        assert_eq!(engine.open_handles(), 1);
    }

    #[test]
    fn removing_a_database_deletes_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db");
        let mut engine = FileEngine::new();
        let db = engine.create(Some(&path)).unwrap();
        let users = engine.create_table(db, &users_spec()).unwrap();
        let table_file = engine.info(users).unwrap().path.unwrap();
        engine.close(users).unwrap();

        engine.remove(db).unwrap();
        assert!(!path.exists());
        assert!(!table_file.exists());
        assert_eq!(engine.open_handles(), 0);
    }

    #[test]
    fn opening_twice_is_busy_and_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db");
        let mut engine = FileEngine::new();
        assert_eq!(engine.open(&path).unwrap_err().code, EngineErrorCode::NotFound);
        let _db = engine.create(Some(&path)).unwrap();
        assert_eq!(engine.open(&path).unwrap_err().code, EngineErrorCode::Busy);
    }

    #[test]
    fn temporary_databases_refuse_persistent_objects() {
        let mut engine = FileEngine::new();
        let db = engine.create(None).unwrap();
        let err = engine.create_table(db, &users_spec()).unwrap_err();
        assert_eq!(err.code, EngineErrorCode::InvalidArgument);

        let mut spec = users_spec();
        spec.flags = ObjectFlags::empty();
        let users = engine.create_table(db, &spec).unwrap();
        assert!(engine.info(users).unwrap().path.is_none());
    }

    #[test]
    fn cursor_honours_bounds_offset_and_limit() {
        let mut engine = FileEngine::new();
        let db = engine.create(None).unwrap();
        let mut spec = users_spec();
        spec.flags = ObjectFlags::empty();
        let users = engine.create_table(db, &spec).unwrap();
        for name in ["a", "b", "c", "d", "e"] {
            let mut col = age_spec();
            col.name = name.into();
            col.flags = ObjectFlags::empty();
            engine.create_column(users, &col).unwrap();
        }
        let options = CursorOptions {
            min: Some("b".into()),
            max: Some("e".into()),
            offset: 1,
            limit: Some(2),
        };
        let cursor = engine.cursor_open(users, &options).unwrap();
        let mut names = Vec::new();
        while let Some(id) = engine.cursor_next(cursor).unwrap() {
            names.push(engine.name_of(db, id).unwrap().unwrap());
        }
        assert_eq!(names, vec!["Users.c", "Users.d"]);
        engine.cursor_close(cursor).unwrap();
        assert!(engine.cursor_close(cursor).is_err());
    }

    #[test]
    fn handle_limit_reports_out_of_memory() {
        let mut engine = FileEngine::new().with_handle_limit(1);
        let db = engine.create(None).unwrap();
        let err = engine.cursor_open(db, &CursorOptions::default()).unwrap_err();
        assert_eq!(err.code, EngineErrorCode::OutOfMemory);
    }
}
