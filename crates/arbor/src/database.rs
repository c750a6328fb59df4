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

use std::path::PathBuf;
use std::rc::Rc;

use arbor_engine::{
    CursorOptions, DataType, EngineErrorCode, Handle, ObjId, ObjectInfo, ObjectKind, TableSpec,
};
use tracing::{debug, trace, warn};

use crate::column::ColumnInner;
use crate::cursor::{Cursor, CursorScope};
use crate::error::{Error, Result, ValidationError};
use crate::handle::{EngineContext, HandleRef};
use crate::identity::IdentityCache;
use crate::lifecycle::{self, Disposal, Lifecycle, LifecycleState, RetainCounter};
use crate::options::{TableOptions, TypeRef};
use crate::session::SessionInner;
use crate::table::{Table, TableInner};

pub(crate) struct DatabaseInner {
    pub(crate) session: Rc<SessionInner>,
    pub(crate) handle: HandleRef,
    /// Absolute path used as the session cache key. `None` for temporary
    /// databases.
    pub(crate) key: Option<String>,
    pub(crate) lifecycle: Lifecycle,
    retains: RetainCounter,
    pub(crate) tables: IdentityCache<TableInner>,
    /// Keyed by full name (`Table.column`).
    pub(crate) columns: IdentityCache<ColumnInner>,
}

impl DatabaseInner {
    pub(crate) fn engine(&self) -> &EngineContext {
        self.handle.engine()
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.lifecycle.is_removed() {
            return Err(Error::DatabaseRemoved);
        }
        Ok(())
    }

    pub(crate) fn live_handle(&self) -> Result<Handle> {
        self.check()?;
        self.handle.get().ok_or(Error::DatabaseRemoved)
    }

    pub(crate) fn retain(&self) {
        self.retains.retain();
    }

    /// Called by a dependent after it has disposed of its own handle.
    pub(crate) fn release(&self) {
        let remaining = self.retains.release();
        if remaining == 0 && self.lifecycle.state() == LifecycleState::LogicallyRemoved {
            match self.destroy() {
                Ok(()) => {
                    debug!(target: "arbor::lifecycle", path = ?self.key, "last dependent released, database deleted")
                }
                Err(err) => {
                    warn!(target: "arbor::lifecycle", path = ?self.key, error = %err, "deferred database deletion failed")
                }
            }
        }
    }

    /// Deferred deletion. On failure the database stays logically removed
    /// and deletion is retried when it drops.
    fn destroy(&self) -> Result<()> {
        lifecycle::dispose(&self.handle, &self.lifecycle, Disposal::Remove, "database")?;
        self.evict();
        Ok(())
    }

    fn evict(&self) {
        if let Some(key) = &self.key {
            self.session.databases.evict(key, self);
        }
    }
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        lifecycle::dispose_on_drop(&self.handle, &self.lifecycle, "database");
        if let Some(key) = &self.key {
            self.session.databases.forget(key);
        }
    }
}

/// An open database.
///
/// Cloning is cheap and yields the same instance. The native database is
/// closed when the last clone and the last table or column rooted at it are
/// dropped.
#[derive(Clone)]
pub struct Database {
    pub(crate) inner: Rc<DatabaseInner>,
}

impl Database {
    pub(crate) fn adopt(session: &Rc<SessionInner>, handle: Handle, key: Option<String>) -> Self {
        let inner = Rc::new(DatabaseInner {
            session: Rc::clone(session),
            handle: HandleRef::new(handle, session.engine.clone()),
            key,
            lifecycle: Lifecycle::default(),
            retains: RetainCounter::default(),
            tables: IdentityCache::default(),
            columns: IdentityCache::default(),
        });
        if let Some(key) = &inner.key {
            session.databases.insert(key.clone(), &inner);
        }
        Database { inner }
    }

    pub(crate) fn from_inner(inner: Rc<DatabaseInner>) -> Self {
        Database { inner }
    }

    pub fn ptr_eq(&self, other: &Database) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.lifecycle.state()
    }

    pub fn is_removed(&self) -> bool {
        self.inner.lifecycle.is_removed()
    }

    /// Live tables and columns rooted at this database.
    pub fn retain_count(&self) -> u64 {
        self.inner.retains.get()
    }

    fn info(&self) -> Result<ObjectInfo> {
        let handle = self.inner.live_handle()?;
        self.inner.engine().with(|e| e.info(handle))
    }

    /// `None` for temporary databases.
    pub fn path(&self) -> Result<Option<PathBuf>> {
        Ok(self.info()?.path)
    }

    pub fn is_persistent(&self) -> Result<bool> {
        Ok(self.info()?.is_persistent())
    }

    /// Mark the database as modified.
    pub fn touch(&self) -> Result<()> {
        let handle = self.inner.live_handle()?;
        self.inner.engine().with(|e| e.touch(handle))
    }

    /// Remove the database.
    ///
    /// With no live tables or columns the store is deleted now. Otherwise it
    /// is deleted when the last of them is dropped; until then every
    /// accessor on this database and its dependents reports
    /// [`Error::DatabaseRemoved`].
    pub fn remove(&self) -> Result<()> {
        let inner = &self.inner;
        inner.check()?;
        let dependents = inner.retains.get();
        if dependents > 0 {
            inner.lifecycle.mark_removed();
            debug!(target: "arbor::lifecycle", path = ?inner.key, dependents, "database removal deferred");
            return Ok(());
        }
        lifecycle::remove_now(&inner.handle, &inner.lifecycle, "database")?;
        inner.evict();
        Ok(())
    }

    /// Look up a table by name. `Ok(None)` when nothing by that name exists
    /// or the name denotes something other than a table.
    pub fn table(&self, name: &str) -> Result<Option<Table>> {
        let handle = self.inner.live_handle()?;
        let engine = self.inner.engine();
        let Some(found) = engine.with(|e| e.lookup(handle, name))? else {
            return Ok(None);
        };
        let info = match engine.with(|e| e.info(found)) {
            Ok(info) => info,
            Err(err) => {
                engine.close_quietly(found);
                return Err(err);
            }
        };
        Ok(self.wrap_table(found, info))
    }

    /// Iterate over all tables in name order.
    pub fn tables(&self, include_wrapper: bool) -> Result<Cursor<Database>> {
        self.tables_in(include_wrapper, &CursorOptions::default())
    }

    /// Iterate over the tables admitted by `options`.
    pub fn tables_in(
        &self,
        include_wrapper: bool,
        options: &CursorOptions,
    ) -> Result<Cursor<Database>> {
        let handle = self.inner.live_handle()?;
        Cursor::open(
            self.clone(),
            self.inner.engine().clone(),
            handle,
            include_wrapper,
            options,
        )
    }

    pub fn create_table(&self, options: &TableOptions) -> Result<Table> {
        let handle = self.inner.live_handle()?;
        options.validate()?;
        let key_type = options
            .key_type
            .as_ref()
            .map(|t| self.resolve_type(handle, t))
            .transpose()?;
        let value_type = options
            .value_type
            .as_ref()
            .map(|t| self.resolve_type(handle, t))
            .transpose()?;
        let spec = TableSpec {
            name: options.name.clone(),
            path: options.path.clone(),
            table_type: options.table_type,
            flags: options.flags(),
            key_type,
            value_type,
        };
        let engine = self.inner.engine();
        let created = engine.with(|e| e.create_table(handle, &spec))?;
        let info = match engine.with(|e| e.info(created)) {
            Ok(info) => info,
            Err(err) => {
                engine.close_quietly(created);
                return Err(err);
            }
        };
        debug!(target: "arbor::lifecycle", name = ?options.name, "created table");
        let name = options.name.clone().unwrap_or_default();
        self.wrap_table(created, info)
            .ok_or_else(|| Error::not_found("table", name))
    }

    fn resolve_type(&self, scope: Handle, t: &TypeRef) -> Result<ObjId> {
        resolve_type(self.inner.engine(), scope, t)
    }

    /// Turn a freshly resolved handle into a wrapper, honouring the identity
    /// cache. The handle is consumed either way.
    pub(crate) fn wrap_table(&self, handle: Handle, info: ObjectInfo) -> Option<Table> {
        let engine = self.inner.engine();
        if !matches!(info.kind, ObjectKind::Table(_)) {
            engine.close_quietly(handle);
            return None;
        }
        if let Some(name) = &info.name {
            if let Some(cached) = self.inner.tables.lookup(name) {
                engine.close_quietly(handle);
                trace!(target: "arbor::lifecycle", table = %name, "table cache hit");
                if cached.lifecycle.is_removed() {
                    return None;
                }
                return Some(Table { inner: cached });
            }
        }
        let inner = Rc::new(TableInner::new(Rc::clone(&self.inner), handle, info.name));
        if let Some(name) = &inner.name {
            self.inner.tables.insert(name.clone(), &inner);
        }
        Some(Table { inner })
    }
}

impl PartialEq for Database {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Database {}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.inner.key)
            .field("state", &self.inner.lifecycle.state())
            .field("retain_count", &self.inner.retains.get())
            .finish()
    }
}

impl std::fmt::Display for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner.key {
            Some(path) => write!(f, "database: {path}"),
            None => f.write_str("database: <temporary>"),
        }
    }
}

impl CursorScope for Database {
    type Item = Table;

    fn check(&self) -> Result<()> {
        self.inner.check()
    }

    fn resolve(&self, id: ObjId, include_wrapper: bool) -> Result<Option<(String, Option<Table>)>> {
        let scope = self.inner.live_handle()?;
        let engine = self.inner.engine();
        let Some(found) = engine.with(|e| e.open_id(scope, id))? else {
            return Ok(None);
        };
        let info = match engine.with(|e| e.info(found)) {
            Ok(info) => info,
            Err(err) => {
                engine.close_quietly(found);
                return Err(err);
            }
        };
        let name = match (&info.kind, &info.name) {
            (ObjectKind::Table(_), Some(name)) => name.clone(),
            _ => {
                engine.close_quietly(found);
                return Ok(None);
            }
        };
        if !include_wrapper {
            engine.close_quietly(found);
            return Ok(Some((name, None)));
        }
        Ok(self.wrap_table(found, info).map(|t| (name, Some(t))))
    }
}

pub(crate) fn resolve_type(engine: &EngineContext, scope: Handle, t: &TypeRef) -> Result<ObjId> {
    match t {
        TypeRef::Builtin(data_type) => Ok(data_type.obj_id()),
        TypeRef::Table(name) => {
            let id = engine.with(|e| e.id_of(scope, name))?;
            Ok(id.ok_or_else(|| ValidationError::UnknownType(name.clone()))?)
        }
    }
}

/// Map an object id back to the type it denotes.
pub(crate) fn type_ref_of(
    engine: &EngineContext,
    scope: Handle,
    id: Option<ObjId>,
) -> Result<Option<TypeRef>> {
    let Some(id) = id else {
        return Ok(None);
    };
    if let Some(t) = DataType::from_id(id.0) {
        return Ok(Some(TypeRef::Builtin(t)));
    }
    Ok(engine.with(|e| e.name_of(scope, id))?.map(TypeRef::Table))
}

pub(crate) fn unexpected_kind(expected: &str, kind: ObjectKind) -> Error {
    arbor_engine::EngineError::new(
        EngineErrorCode::Corrupt,
        format!("expected a {expected}, engine reports {kind:?}"),
    )
    .into()
}
