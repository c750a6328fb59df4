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

//! Lazy, forward-only iteration over the children of a database or table.

use std::iter::FusedIterator;

use arbor_engine::{CursorHandle, CursorOptions, Handle, ObjId};
use tracing::{trace, warn};

use crate::error::{Error, Result};
use crate::handle::EngineContext;

mod private {
    pub trait Sealed {}

    impl Sealed for crate::Database {}
    impl Sealed for crate::Table {}
}

/// Something whose children can be enumerated: a [`Database`](crate::Database)
/// yields tables, a [`Table`](crate::Table) yields columns.
pub trait CursorScope: private::Sealed {
    type Item;

    /// Fails with the scope's removed kind once it has been removed.
    #[doc(hidden)]
    fn check(&self) -> Result<()>;

    /// Resolve a cursor entry. `Ok(None)` skips entries that are not
    /// children of the expected kind.
    #[doc(hidden)]
    fn resolve(&self, id: ObjId, include_wrapper: bool)
        -> Result<Option<(String, Option<Self::Item>)>>;
}

/// Yields `(name, wrapper)` pairs; the wrapper is `Some` only when requested.
///
/// Not restartable. The native cursor is closed exactly once: when the
/// sequence ends, after the first error, or when the cursor is dropped.
pub struct Cursor<S: CursorScope> {
    scope: S,
    engine: EngineContext,
    native: Option<CursorHandle>,
    include_wrapper: bool,
    finished: bool,
}

impl<S: CursorScope> Cursor<S> {
    pub(crate) fn open(
        scope: S,
        engine: EngineContext,
        scope_handle: Handle,
        include_wrapper: bool,
        options: &CursorOptions,
    ) -> Result<Self> {
        let native = engine.with(|e| e.cursor_open(scope_handle, options))?;
        trace!(target: "arbor::cursor", cursor = native.as_raw(), "opened cursor");
        Ok(Cursor {
            scope,
            engine,
            native: Some(native),
            include_wrapper,
            finished: false,
        })
    }

    /// True once the sequence has ended or failed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn close(&mut self) {
        let Some(native) = self.native.take() else {
            return;
        };
        match self.engine.try_with(|e| e.cursor_close(native)) {
            Some(Ok(())) => trace!(target: "arbor::cursor", cursor = native.as_raw(), "closed cursor"),
            Some(Err(err)) => {
                warn!(target: "arbor::cursor", cursor = native.as_raw(), error = %err, "failed to close cursor")
            }
            None => warn!(target: "arbor::cursor", cursor = native.as_raw(), "engine busy, cursor leaked"),
        }
    }

    fn finish(&mut self) {
        self.close();
        self.finished = true;
    }

    fn fail(&mut self, err: Error) -> Option<Result<(String, Option<S::Item>)>> {
        self.finish();
        Some(Err(err))
    }
}

impl<S: CursorScope> Iterator for Cursor<S> {
    type Item = Result<(String, Option<S::Item>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let Some(native) = self.native else {
            self.finished = true;
            return None;
        };
        loop {
            if let Err(err) = self.scope.check() {
                return self.fail(err);
            }
            let id = match self.engine.with(|e| e.cursor_next(native)) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    self.finish();
                    return None;
                }
                Err(err) => return self.fail(err),
            };
            match self.scope.resolve(id, self.include_wrapper) {
                Ok(Some(item)) => {
                    trace!(target: "arbor::cursor", name = %item.0, "cursor step");
                    return Some(Ok(item));
                }
                Ok(None) => trace!(target: "arbor::cursor", %id, "skipped entry"),
                Err(err) => return self.fail(err),
            }
        }
    }
}

impl<S: CursorScope> FusedIterator for Cursor<S> {}

impl<S: CursorScope> Drop for Cursor<S> {
    fn drop(&mut self) {
        self.close();
    }
}
