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

//! arbor-engine: the native engine interface consumed by `arbor`, plus a
//! file-backed reference implementation.
//!
//! The engine owns every native object. Callers hold opaque [`Handle`]s that
//! stay valid until passed to [`NativeEngine::close`] or
//! [`NativeEngine::remove`], or until the object they point into is deleted.

pub mod consts;
mod catalog;
mod error;
mod file_engine;

use std::path::{Path, PathBuf};

pub use consts::{
    ColumnType, Compression, DataType, ObjId, ObjectFlags, ObjectKind, TableType, UnknownConstant,
};
pub use error::{EngineError, EngineErrorCode, EngineResult};
pub use file_engine::FileEngine;

/// Maximum length in bytes of an object name.
pub const MAX_NAME_LEN: usize = 4096;

/// First id handed out to user objects. Lower ids are reserved for builtins.
pub const FIRST_USER_ID: u32 = 256;

/// Opaque, retained reference to a native object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u64);

impl Handle {
    pub fn from_raw(raw: u64) -> Self {
        Handle(raw)
    }

    pub fn as_raw(self) -> u64 {
        self.0
    }
}

/// Opaque reference to an open native cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CursorHandle(u64);

impl CursorHandle {
    pub fn from_raw(raw: u64) -> Self {
        CursorHandle(raw)
    }

    pub fn as_raw(self) -> u64 {
        self.0
    }
}

/// Header of a resolved object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub id: ObjId,
    /// Full name. `None` for anonymous objects and databases.
    pub name: Option<String>,
    pub kind: ObjectKind,
    pub flags: ObjectFlags,
    pub compression: Option<Compression>,
    /// Key type for tables, owning table for columns.
    pub domain: Option<ObjId>,
    /// Value type.
    pub range: Option<ObjId>,
    pub path: Option<PathBuf>,
}

impl ObjectInfo {
    pub fn is_persistent(&self) -> bool {
        self.flags.contains(ObjectFlags::PERSISTENT)
    }
}

/// Arguments for [`NativeEngine::create_table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub name: Option<String>,
    pub path: Option<PathBuf>,
    pub table_type: TableType,
    pub flags: ObjectFlags,
    pub key_type: Option<ObjId>,
    pub value_type: Option<ObjId>,
}

/// Arguments for [`NativeEngine::create_column`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Short name, without the `Table.` prefix.
    pub name: String,
    pub path: Option<PathBuf>,
    pub column_type: ColumnType,
    pub flags: ObjectFlags,
    pub compression: Option<Compression>,
    pub value_type: ObjId,
}

/// Bounds for [`NativeEngine::cursor_open`]. Bounds compare against the
/// child's short name and are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CursorOptions {
    pub min: Option<String>,
    pub max: Option<String>,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl CursorOptions {
    pub fn admits(&self, key: &str) -> bool {
        self.min.as_deref().is_none_or(|min| key >= min)
            && self.max.as_deref().is_none_or(|max| key <= max)
    }
}

/// The operations the lifecycle core needs from a native engine.
///
/// Every method returning a [`Handle`] hands out a new retained handle that
/// the caller must eventually pass to `close` or `remove`.
pub trait NativeEngine {
    /// Open an existing database.
    fn open(&mut self, path: &Path) -> EngineResult<Handle>;

    /// Create a database. `None` creates a temporary, in-memory database.
    fn create(&mut self, path: Option<&Path>) -> EngineResult<Handle>;

    /// Release a handle without deleting the object. For a database handle
    /// this closes the database.
    fn close(&mut self, handle: Handle) -> EngineResult<()>;

    /// Physically delete the object behind `handle`, consuming the handle.
    fn remove(&mut self, handle: Handle) -> EngineResult<()>;

    /// Mark a database as modified.
    fn touch(&mut self, db: Handle) -> EngineResult<()>;

    /// Resolve a child by name. In a database scope this finds tables and
    /// types; in a table scope it finds the table's columns by short name.
    fn lookup(&mut self, scope: Handle, name: &str) -> EngineResult<Option<Handle>>;

    /// Resolve any object of the scope's database by id.
    fn open_id(&mut self, scope: Handle, id: ObjId) -> EngineResult<Option<Handle>>;

    fn info(&self, handle: Handle) -> EngineResult<ObjectInfo>;

    /// Id of the named object in the scope's database.
    fn id_of(&self, scope: Handle, name: &str) -> EngineResult<Option<ObjId>>;

    /// Full name of an object in the scope's database.
    fn name_of(&self, scope: Handle, id: ObjId) -> EngineResult<Option<String>>;

    fn create_table(&mut self, db: Handle, spec: &TableSpec) -> EngineResult<Handle>;

    fn create_column(&mut self, table: Handle, spec: &ColumnSpec) -> EngineResult<Handle>;

    /// Rename an object. Columns take a short name.
    fn rename(&mut self, handle: Handle, name: &str) -> EngineResult<()>;

    /// Open a forward cursor over the children of `scope`: the tables of a
    /// database or the columns of a table. Bounds, offset and limit apply to
    /// those children only.
    fn cursor_open(&mut self, scope: Handle, options: &CursorOptions) -> EngineResult<CursorHandle>;

    fn cursor_next(&mut self, cursor: CursorHandle) -> EngineResult<Option<ObjId>>;

    fn cursor_close(&mut self, cursor: CursorHandle) -> EngineResult<()>;
}
