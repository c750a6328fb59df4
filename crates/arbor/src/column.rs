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

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use arbor_engine::{ColumnType, Compression, Handle, ObjectFlags, ObjectInfo, ObjectKind};
use tracing::debug;

use crate::config::RemovalPolicy;
use crate::database::{type_ref_of, unexpected_kind, Database};
use crate::error::{Error, Result};
use crate::handle::{EngineContext, HandleRef};
use crate::lifecycle::{self, Lifecycle, LifecycleState};
use crate::options::{validate_name, TypeRef};
use crate::table::{short_name, Table, TableInner};

pub(crate) struct ColumnInner {
    pub(crate) table: Rc<TableInner>,
    pub(crate) handle: HandleRef,
    /// Full name, as cached in the database's column map. Follows renames.
    pub(crate) key: RefCell<String>,
    pub(crate) lifecycle: Lifecycle,
}

impl ColumnInner {
    pub(crate) fn new(table: Rc<TableInner>, handle: Handle, full_name: String) -> Self {
        table.database.retain();
        let handle = HandleRef::new(handle, table.engine().clone());
        ColumnInner {
            table,
            handle,
            key: RefCell::new(full_name),
            lifecycle: Lifecycle::default(),
        }
    }

    fn engine(&self) -> &EngineContext {
        self.handle.engine()
    }

    fn check(&self) -> Result<()> {
        self.table.check()?;
        if self.lifecycle.is_removed() {
            return Err(Error::ColumnRemoved);
        }
        Ok(())
    }

    fn live_handle(&self) -> Result<Handle> {
        self.check()?;
        self.handle.get().ok_or(Error::ColumnRemoved)
    }

    /// An immediately removed table takes its columns with it.
    fn ancestor_destroyed(&self) -> bool {
        self.table.lifecycle.is_destroyed() || self.table.database.lifecycle.is_destroyed()
    }
}

impl Drop for ColumnInner {
    fn drop(&mut self) {
        let key = self.key.get_mut().clone();
        if self.ancestor_destroyed() {
            lifecycle::abandon(&self.handle, &self.lifecycle, &key);
        } else {
            lifecycle::dispose_on_drop(&self.handle, &self.lifecycle, &key);
        }
        let database = &self.table.database;
        database.columns.forget(&key);
        database.release();
    }
}

/// A column of a named table.
#[derive(Clone)]
pub struct Column {
    pub(crate) inner: Rc<ColumnInner>,
}

impl Column {
    pub fn ptr_eq(&self, other: &Column) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.lifecycle.state()
    }

    /// True if this column, its table or its database has been removed.
    pub fn is_removed(&self) -> bool {
        self.inner.check().is_err()
    }

    fn info(&self) -> Result<ObjectInfo> {
        let handle = self.inner.live_handle()?;
        self.inner.engine().with(|e| e.info(handle))
    }

    /// Short name, without the table prefix.
    pub fn name(&self) -> Result<String> {
        let full = self.full_name()?;
        Ok(short_name(&full).to_string())
    }

    /// `Table.column`.
    pub fn full_name(&self) -> Result<String> {
        let info = self.info()?;
        info.name
            .ok_or_else(|| unexpected_kind("named column", info.kind))
    }

    pub fn path(&self) -> Result<Option<PathBuf>> {
        Ok(self.info()?.path)
    }

    pub fn column_type(&self) -> Result<ColumnType> {
        match self.info()?.kind {
            ObjectKind::Column(t) => Ok(t),
            other => Err(unexpected_kind("column", other)),
        }
    }

    pub fn value_type(&self) -> Result<Option<TypeRef>> {
        let info = self.info()?;
        let handle = self.inner.live_handle()?;
        type_ref_of(self.inner.engine(), handle, info.range)
    }

    pub fn compression(&self) -> Result<Option<Compression>> {
        Ok(self.info()?.compression)
    }

    pub fn is_persistent(&self) -> Result<bool> {
        Ok(self.info()?.is_persistent())
    }

    /// Only vector and index columns carry weights.
    pub fn with_weight(&self) -> Result<bool> {
        let info = self.info()?;
        Ok(matches!(
            info.kind,
            ObjectKind::Column(ColumnType::Vector | ColumnType::Index)
        ) && info.flags.contains(ObjectFlags::WITH_WEIGHT))
    }

    pub fn with_section(&self) -> Result<bool> {
        self.index_flag(ObjectFlags::WITH_SECTION)
    }

    pub fn with_position(&self) -> Result<bool> {
        self.index_flag(ObjectFlags::WITH_POSITION)
    }

    fn index_flag(&self, flag: ObjectFlags) -> Result<bool> {
        let info = self.info()?;
        Ok(info.kind == ObjectKind::Column(ColumnType::Index) && info.flags.contains(flag))
    }

    pub fn table(&self) -> Result<Table> {
        self.inner.check()?;
        Ok(Table {
            inner: Rc::clone(&self.inner.table),
        })
    }

    pub fn database(&self) -> Result<Database> {
        self.inner.check()?;
        Ok(Database::from_inner(Rc::clone(&self.inner.table.database)))
    }

    /// Rename the column. `name` is a short name.
    pub fn rename(&self, name: &str) -> Result<()> {
        let handle = self.inner.live_handle()?;
        validate_name(name)?;
        let engine = self.inner.engine();
        engine.with(|e| e.rename(handle, name))?;
        let new_key = engine
            .with(|e| e.info(handle))?
            .name
            .unwrap_or_else(|| name.to_string());
        let old_key = self.inner.key.replace(new_key.clone());
        self.inner
            .table
            .database
            .columns
            .rekey(&old_key, new_key.as_str(), &self.inner);
        debug!(target: "arbor::lifecycle", from = %old_key, to = %new_key, "renamed column");
        Ok(())
    }

    /// Remove the column following the session's `column_removal` policy.
    pub fn remove(&self) -> Result<()> {
        let policy = self.inner.table.database.session.config.column_removal;
        self.remove_by(policy)
    }

    /// Remove the column, now when `force` is set and on drop otherwise.
    pub fn remove_with(&self, force: bool) -> Result<()> {
        self.remove_by(RemovalPolicy::from_force(force))
    }

    fn remove_by(&self, policy: RemovalPolicy) -> Result<()> {
        let inner = &self.inner;
        inner.check()?;
        let key = inner.key.borrow().clone();
        if policy == RemovalPolicy::Deferred {
            inner.lifecycle.mark_removed();
            debug!(target: "arbor::lifecycle", column = %key, "column removal deferred");
            return Ok(());
        }
        lifecycle::remove_now(&inner.handle, &inner.lifecycle, &key)?;
        inner.table.database.columns.evict(&key, inner);
        debug!(target: "arbor::lifecycle", column = %key, "column removed");
        Ok(())
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Column {}

impl std::fmt::Debug for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("name", &*self.inner.key.borrow())
            .field("state", &self.inner.lifecycle.state())
            .finish()
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "column: {}", self.inner.key.borrow())
    }
}
