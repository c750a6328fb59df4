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

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use arbor::{
    ColumnOptions, Config, CursorOptions, DataType, FileEngine, NativeEngine, Session, TableOptions,
};
use arbor_engine::{
    ColumnSpec, CursorHandle, EngineError, EngineErrorCode, EngineResult, Handle, ObjId,
    ObjectInfo, ObjectKind, TableSpec,
};

/// What the engine saw. Shared with the test through an `Rc`.
#[derive(Debug, Default)]
pub struct Calls {
    pub closes: usize,
    pub removes: usize,
    pub database_removes: usize,
    pub cursor_opens: usize,
    pub cursor_closes: usize,
    pub open_handles: usize,
    pub open_cursors: usize,
    /// Fail `cursor_next` once this many calls have succeeded.
    pub fail_cursor_next_after: Option<usize>,
    pub cursor_next_calls: usize,
    /// Refuse this many upcoming `remove` calls.
    pub fail_removes: usize,
}

/// Forwards to a [`FileEngine`] and counts the calls the lifecycle code makes.
pub struct RecordingEngine {
    inner: FileEngine,
    calls: Rc<RefCell<Calls>>,
}

impl RecordingEngine {
    pub fn new(inner: FileEngine) -> (Self, Rc<RefCell<Calls>>) {
        let calls = Rc::new(RefCell::new(Calls::default()));
        (
            RecordingEngine {
                inner,
                calls: Rc::clone(&calls),
            },
            calls,
        )
    }

    fn sync<T>(&self, result: EngineResult<T>) -> EngineResult<T> {
        let mut calls = self.calls.borrow_mut();
        calls.open_handles = self.inner.open_handles();
        calls.open_cursors = self.inner.open_cursors();
        result
    }
}

impl NativeEngine for RecordingEngine {
    fn open(&mut self, path: &Path) -> EngineResult<Handle> {
        let r = self.inner.open(path);
        self.sync(r)
    }

    fn create(&mut self, path: Option<&Path>) -> EngineResult<Handle> {
        let r = self.inner.create(path);
        self.sync(r)
    }

    fn close(&mut self, handle: Handle) -> EngineResult<()> {
        self.calls.borrow_mut().closes += 1;
        let r = self.inner.close(handle);
        self.sync(r)
    }

    fn remove(&mut self, handle: Handle) -> EngineResult<()> {
        let is_database = self
            .inner
            .info(handle)
            .is_ok_and(|info| info.kind == ObjectKind::Database);
        {
            let mut calls = self.calls.borrow_mut();
            calls.removes += 1;
            if is_database {
                calls.database_removes += 1;
            }
            if calls.fail_removes > 0 {
                calls.fail_removes -= 1;
                return Err(EngineError::new(EngineErrorCode::Io, "injected delete failure"));
            }
        }
        let r = self.inner.remove(handle);
        self.sync(r)
    }

    fn touch(&mut self, db: Handle) -> EngineResult<()> {
        self.inner.touch(db)
    }

    fn lookup(&mut self, scope: Handle, name: &str) -> EngineResult<Option<Handle>> {
        let r = self.inner.lookup(scope, name);
        self.sync(r)
    }

    fn open_id(&mut self, scope: Handle, id: ObjId) -> EngineResult<Option<Handle>> {
        let r = self.inner.open_id(scope, id);
        self.sync(r)
    }

    fn info(&self, handle: Handle) -> EngineResult<ObjectInfo> {
        self.inner.info(handle)
    }

    fn id_of(&self, scope: Handle, name: &str) -> EngineResult<Option<ObjId>> {
        self.inner.id_of(scope, name)
    }

    fn name_of(&self, scope: Handle, id: ObjId) -> EngineResult<Option<String>> {
        self.inner.name_of(scope, id)
    }

    fn create_table(&mut self, db: Handle, spec: &TableSpec) -> EngineResult<Handle> {
        let r = self.inner.create_table(db, spec);
        self.sync(r)
    }

    fn create_column(&mut self, table: Handle, spec: &ColumnSpec) -> EngineResult<Handle> {
        let r = self.inner.create_column(table, spec);
        self.sync(r)
    }

    fn rename(&mut self, handle: Handle, name: &str) -> EngineResult<()> {
        self.inner.rename(handle, name)
    }

    fn cursor_open(&mut self, scope: Handle, options: &CursorOptions) -> EngineResult<CursorHandle> {
        self.calls.borrow_mut().cursor_opens += 1;
        let r = self.inner.cursor_open(scope, options);
        self.sync(r)
    }

    fn cursor_next(&mut self, cursor: CursorHandle) -> EngineResult<Option<ObjId>> {
        {
            let mut calls = self.calls.borrow_mut();
            if calls
                .fail_cursor_next_after
                .is_some_and(|n| calls.cursor_next_calls >= n)
            {
                return Err(EngineError::new(EngineErrorCode::Io, "injected read failure"));
            }
            calls.cursor_next_calls += 1;
        }
        self.inner.cursor_next(cursor)
    }

    fn cursor_close(&mut self, cursor: CursorHandle) -> EngineResult<()> {
        self.calls.borrow_mut().cursor_closes += 1;
        let r = self.inner.cursor_close(cursor);
        self.sync(r)
    }
}

pub fn recording_session(config: Config) -> (Session, Rc<RefCell<Calls>>) {
    let (engine, calls) = RecordingEngine::new(FileEngine::new());
    (Session::with_config(engine, config), calls)
}

pub fn db_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("store.db")
}

pub fn users_table() -> TableOptions {
    TableOptions::named("Users").persistent(true)
}

pub fn int_column(name: &str) -> ColumnOptions {
    ColumnOptions::new(name, DataType::Int32).persistent(true)
}
