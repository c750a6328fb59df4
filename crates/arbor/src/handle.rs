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

//! Shared engine access and the per-wrapper native handle slot.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use arbor_engine::{EngineError, EngineErrorCode, EngineResult, Handle, NativeEngine};
use tracing::warn;

use crate::error::Result;

/// The engine session shared by every wrapper of a [`Session`](crate::Session).
///
/// Borrows are scoped to a single closure call and never span wrapper
/// construction or drop.
#[derive(Clone)]
pub(crate) struct EngineContext(Rc<RefCell<Box<dyn NativeEngine>>>);

impl EngineContext {
    pub(crate) fn new(engine: Box<dyn NativeEngine>) -> Self {
        EngineContext(Rc::new(RefCell::new(engine)))
    }

    /// Run `f` against the engine, mapping its error into [`crate::Error`].
    pub(crate) fn with<R>(
        &self,
        f: impl FnOnce(&mut dyn NativeEngine) -> EngineResult<R>,
    ) -> Result<R> {
        let mut engine = self.0.try_borrow_mut().map_err(|_| {
            EngineError::new(EngineErrorCode::Busy, "engine is already in use")
        })?;
        Ok(f(&mut **engine)?)
    }

    /// Like [`with`](Self::with) but for drop paths: returns `None` instead
    /// of failing when the engine is already borrowed.
    pub(crate) fn try_with<R>(
        &self,
        f: impl FnOnce(&mut dyn NativeEngine) -> EngineResult<R>,
    ) -> Option<EngineResult<R>> {
        match self.0.try_borrow_mut() {
            Ok(mut engine) => Some(f(&mut **engine)),
            Err(_) => None,
        }
    }

    /// Close a handle nobody will wrap, logging failures.
    pub(crate) fn close_quietly(&self, handle: Handle) {
        match self.try_with(|e| e.close(handle)) {
            Some(Ok(())) => {}
            Some(Err(err)) => {
                warn!(target: "arbor::lifecycle", handle = handle.as_raw(), error = %err, "failed to close handle")
            }
            None => {
                warn!(target: "arbor::lifecycle", handle = handle.as_raw(), "engine busy, handle leaked")
            }
        }
    }
}

/// A retained native handle plus the engine it belongs to.
///
/// The slot is emptied once the handle has been closed or handed to the
/// engine for deletion.
pub(crate) struct HandleRef {
    handle: Cell<Option<Handle>>,
    engine: EngineContext,
}

impl HandleRef {
    pub(crate) fn new(handle: Handle, engine: EngineContext) -> Self {
        HandleRef {
            handle: Cell::new(Some(handle)),
            engine,
        }
    }

    pub(crate) fn get(&self) -> Option<Handle> {
        self.handle.get()
    }

    pub(crate) fn take(&self) -> Option<Handle> {
        self.handle.take()
    }

    /// Put back a handle taken for an operation that failed.
    pub(crate) fn restore(&self, handle: Handle) {
        self.handle.set(Some(handle));
    }

    pub(crate) fn engine(&self) -> &EngineContext {
        &self.engine
    }
}

impl std::fmt::Debug for HandleRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.handle.get() {
            Some(h) => write!(f, "HandleRef({})", h.as_raw()),
            None => f.write_str("HandleRef(null)"),
        }
    }
}
