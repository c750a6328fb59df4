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
    ColumnSpec, CursorOptions, Handle, ObjId, ObjectFlags, ObjectInfo, ObjectKind, TableType,
};
use tracing::{debug, trace};

use crate::column::{Column, ColumnInner};
use crate::config::RemovalPolicy;
use crate::cursor::{Cursor, CursorScope};
use crate::database::{resolve_type, type_ref_of, unexpected_kind, Database, DatabaseInner};
use crate::error::{Error, Result};
use crate::handle::{EngineContext, HandleRef};
use crate::lifecycle::{self, Lifecycle, LifecycleState};
use crate::options::{ColumnOptions, TypeRef};

pub(crate) struct TableInner {
    /// Keeps the database alive and counted while this table exists.
    pub(crate) database: Rc<DatabaseInner>,
    pub(crate) handle: HandleRef,
    pub(crate) name: Option<String>,
    pub(crate) lifecycle: Lifecycle,
}

impl TableInner {
    pub(crate) fn new(database: Rc<DatabaseInner>, handle: Handle, name: Option<String>) -> Self {
        database.retain();
        let handle = HandleRef::new(handle, database.engine().clone());
        TableInner {
            database,
            handle,
            name,
            lifecycle: Lifecycle::default(),
        }
    }

    pub(crate) fn engine(&self) -> &EngineContext {
        self.handle.engine()
    }

    pub(crate) fn check(&self) -> Result<()> {
        self.database.check()?;
        if self.lifecycle.is_removed() {
            return Err(Error::TableRemoved);
        }
        Ok(())
    }

    pub(crate) fn live_handle(&self) -> Result<Handle> {
        self.check()?;
        self.handle.get().ok_or(Error::TableRemoved)
    }

    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }
}

impl Drop for TableInner {
    fn drop(&mut self) {
        if self.database.lifecycle.is_destroyed() {
            lifecycle::abandon(&self.handle, &self.lifecycle, "table");
        } else {
            lifecycle::dispose_on_drop(&self.handle, &self.lifecycle, "table");
        }
        if let Some(name) = &self.name {
            self.database.tables.forget(name);
        }
        self.database.release();
    }
}

/// A table of an open database.
///
/// Looking up the same name twice while a `Table` is alive yields the same
/// instance. Anonymous tables are never shared.
#[derive(Clone)]
pub struct Table {
    pub(crate) inner: Rc<TableInner>,
}

impl Table {
    pub fn ptr_eq(&self, other: &Table) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.lifecycle.state()
    }

    /// True if this table or its database has been removed.
    pub fn is_removed(&self) -> bool {
        self.inner.check().is_err()
    }

    fn info(&self) -> Result<ObjectInfo> {
        let handle = self.inner.live_handle()?;
        self.inner.engine().with(|e| e.info(handle))
    }

    /// `None` for anonymous tables.
    pub fn name(&self) -> Result<Option<String>> {
        self.inner.check()?;
        Ok(self.inner.name.clone())
    }

    pub fn path(&self) -> Result<Option<PathBuf>> {
        Ok(self.info()?.path)
    }

    pub fn table_type(&self) -> Result<TableType> {
        match self.info()?.kind {
            ObjectKind::Table(t) => Ok(t),
            other => Err(unexpected_kind("table", other)),
        }
    }

    pub fn key_type(&self) -> Result<Option<TypeRef>> {
        let info = self.info()?;
        let handle = self.inner.live_handle()?;
        type_ref_of(self.inner.engine(), handle, info.domain)
    }

    pub fn value_type(&self) -> Result<Option<TypeRef>> {
        let info = self.info()?;
        let handle = self.inner.live_handle()?;
        type_ref_of(self.inner.engine(), handle, info.range)
    }

    pub fn flags(&self) -> Result<ObjectFlags> {
        Ok(self.info()?.flags)
    }

    pub fn is_persistent(&self) -> Result<bool> {
        Ok(self.info()?.is_persistent())
    }

    pub fn database(&self) -> Result<Database> {
        self.inner.check()?;
        Ok(Database::from_inner(Rc::clone(&self.inner.database)))
    }

    /// Remove the table following the session's `table_removal` policy.
    pub fn remove(&self) -> Result<()> {
        let policy = self.inner.database.session.config.table_removal;
        self.remove_by(policy)
    }

    /// Remove the table, deleting it now when `force` is set and when this
    /// wrapper is dropped otherwise.
    pub fn remove_with(&self, force: bool) -> Result<()> {
        self.remove_by(RemovalPolicy::from_force(force))
    }

    fn remove_by(&self, policy: RemovalPolicy) -> Result<()> {
        let inner = &self.inner;
        inner.check()?;
        match policy {
            RemovalPolicy::Deferred => {
                inner.lifecycle.mark_removed();
                debug!(target: "arbor::lifecycle", table = inner.label(), "table removal deferred");
                Ok(())
            }
            RemovalPolicy::Immediate => {
                lifecycle::remove_now(&inner.handle, &inner.lifecycle, "table")?;
                if let Some(name) = &inner.name {
                    inner.database.tables.evict(name, inner);
                }
                debug!(target: "arbor::lifecycle", table = inner.label(), "table removed");
                Ok(())
            }
        }
    }

    /// Look up a column by its short name.
    pub fn column(&self, name: &str) -> Result<Option<Column>> {
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
        Ok(self.wrap_column(found, info))
    }

    /// Iterate over this table's columns in name order.
    pub fn columns(&self, include_wrapper: bool) -> Result<Cursor<Table>> {
        self.columns_in(include_wrapper, &CursorOptions::default())
    }

    /// Iterate over the columns whose short names `options` admits.
    pub fn columns_in(
        &self,
        include_wrapper: bool,
        options: &CursorOptions,
    ) -> Result<Cursor<Table>> {
        let handle = self.inner.live_handle()?;
        Cursor::open(
            self.clone(),
            self.inner.engine().clone(),
            handle,
            include_wrapper,
            options,
        )
    }

    pub fn create_column(&self, options: &ColumnOptions) -> Result<Column> {
        let handle = self.inner.live_handle()?;
        options.validate()?;
        let engine = self.inner.engine();
        let value_type = resolve_type(engine, handle, &options.value_type)?;
        let spec = ColumnSpec {
            name: options.name.clone(),
            path: options.path.clone(),
            column_type: options.column_type,
            flags: options.flags(),
            compression: options.compression,
            value_type,
        };
        let created = engine.with(|e| e.create_column(handle, &spec))?;
        let info = match engine.with(|e| e.info(created)) {
            Ok(info) => info,
            Err(err) => {
                engine.close_quietly(created);
                return Err(err);
            }
        };
        debug!(target: "arbor::lifecycle", table = self.inner.label(), column = %options.name, "created column");
        self.wrap_column(created, info)
            .ok_or_else(|| Error::not_found("column", options.name.clone()))
    }

    /// Column counterpart of `Database::wrap_table`. A cached column of a
    /// different table instance (one removed and recreated under the same
    /// name) is replaced.
    pub(crate) fn wrap_column(&self, handle: Handle, info: ObjectInfo) -> Option<Column> {
        let engine = self.inner.engine();
        let Some(full_name) = info.name.filter(|_| info.kind.is_column()) else {
            engine.close_quietly(handle);
            return None;
        };
        let columns = &self.inner.database.columns;
        if let Some(cached) = columns.lookup(&full_name) {
            if Rc::ptr_eq(&cached.table, &self.inner) {
                engine.close_quietly(handle);
                trace!(target: "arbor::lifecycle", column = %full_name, "column cache hit");
                if cached.lifecycle.is_removed() {
                    return None;
                }
                return Some(Column { inner: cached });
            }
        }
        let inner = Rc::new(ColumnInner::new(Rc::clone(&self.inner), handle, full_name));
        columns.insert(inner.key.borrow().clone(), &inner);
        Some(Column { inner })
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Table {}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.inner.name)
            .field("state", &self.inner.lifecycle.state())
            .finish()
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "table: {}", self.inner.label())
    }
}

impl CursorScope for Table {
    type Item = Column;

    fn check(&self) -> Result<()> {
        self.inner.check()
    }

    fn resolve(&self, id: ObjId, include_wrapper: bool) -> Result<Option<(String, Option<Column>)>> {
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
        let short = match (&info.kind, &info.name) {
            (ObjectKind::Column(_), Some(full)) => short_name(full).to_string(),
            _ => {
                engine.close_quietly(found);
                return Ok(None);
            }
        };
        if !include_wrapper {
            engine.close_quietly(found);
            return Ok(Some((short, None)));
        }
        Ok(self.wrap_column(found, info).map(|c| (short, Some(c))))
    }
}

/// `Table.column` -> `column`.
pub(crate) fn short_name(full: &str) -> &str {
    full.split_once('.').map_or(full, |(_, short)| short)
}
