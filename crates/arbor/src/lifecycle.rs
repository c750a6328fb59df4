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

//! Removal state machine, retain accounting and native handle disposal.
//!
//! Every wrapper moves `Live -> LogicallyRemoved -> PhysicallyDestroyed`, or
//! straight from `Live` to `PhysicallyDestroyed` when it is dropped without
//! having been removed (its handle is closed, the object survives).

use std::cell::Cell;

use tracing::{debug, warn};

use crate::error::Result;
use crate::handle::HandleRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Live,
    /// Removal requested, native object not deleted yet.
    LogicallyRemoved,
    /// Terminal. The native handle is gone.
    PhysicallyDestroyed,
}

#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: Cell<LifecycleState>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Lifecycle {
            state: Cell::new(LifecycleState::Live),
        }
    }
}

impl Lifecycle {
    pub(crate) fn state(&self) -> LifecycleState {
        self.state.get()
    }

    pub(crate) fn is_removed(&self) -> bool {
        self.state.get() != LifecycleState::Live
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.state.get() == LifecycleState::PhysicallyDestroyed
    }

    /// `Live -> LogicallyRemoved`. Returns false if already past `Live`.
    pub(crate) fn mark_removed(&self) -> bool {
        if self.state.get() != LifecycleState::Live {
            return false;
        }
        self.state.set(LifecycleState::LogicallyRemoved);
        true
    }

    /// `LogicallyRemoved -> Live`, for a removal the engine refused.
    pub(crate) fn revive(&self) {
        if self.state.get() == LifecycleState::LogicallyRemoved {
            self.state.set(LifecycleState::Live);
        }
    }

    pub(crate) fn mark_destroyed(&self) {
        self.state.set(LifecycleState::PhysicallyDestroyed);
    }
}

/// Count of live dependents. Never goes below zero.
#[derive(Debug, Default)]
pub(crate) struct RetainCounter {
    count: Cell<u64>,
}

impl RetainCounter {
    pub(crate) fn get(&self) -> u64 {
        self.count.get()
    }

    pub(crate) fn retain(&self) {
        self.count.set(self.count.get() + 1);
    }

    /// Decrement and return the new count.
    pub(crate) fn release(&self) -> u64 {
        let next = self.count.get().saturating_sub(1);
        self.count.set(next);
        next
    }
}

/// What to do with a native handle on teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposal {
    /// Release the handle, the object stays addressable by name.
    Close,
    /// Delete the object.
    Remove,
}

impl Disposal {
    pub(crate) fn for_state(state: LifecycleState) -> Option<Disposal> {
        match state {
            LifecycleState::Live => Some(Disposal::Close),
            LifecycleState::LogicallyRemoved => Some(Disposal::Remove),
            LifecycleState::PhysicallyDestroyed => None,
        }
    }
}

/// Dispose of `handle` and mark the wrapper destroyed. On failure the handle
/// is put back so a later drop can retry.
pub(crate) fn dispose(
    handle: &HandleRef,
    lifecycle: &Lifecycle,
    disposal: Disposal,
    what: &str,
) -> Result<()> {
    let Some(raw) = handle.take() else {
        lifecycle.mark_destroyed();
        return Ok(());
    };
    let result = handle.engine().with(|e| match disposal {
        Disposal::Close => e.close(raw),
        Disposal::Remove => e.remove(raw),
    });
    match result {
        Ok(()) => {
            lifecycle.mark_destroyed();
            debug!(target: "arbor::lifecycle", object = what, ?disposal, "disposed native handle");
            Ok(())
        }
        Err(err) => {
            handle.restore(raw);
            Err(err)
        }
    }
}

/// Immediate removal. If the engine refuses, the wrapper goes back to `Live`
/// with its handle, as if `remove()` had never been called.
pub(crate) fn remove_now(handle: &HandleRef, lifecycle: &Lifecycle, what: &str) -> Result<()> {
    lifecycle.mark_removed();
    let result = dispose(handle, lifecycle, Disposal::Remove, what);
    if result.is_err() {
        lifecycle.revive();
    }
    result
}

/// Drop-time disposal. Failures are logged and the wrapper still ends up
/// destroyed.
pub(crate) fn dispose_on_drop(handle: &HandleRef, lifecycle: &Lifecycle, what: &str) {
    let Some(disposal) = Disposal::for_state(lifecycle.state()) else {
        return;
    };
    let Some(raw) = handle.take() else {
        lifecycle.mark_destroyed();
        return;
    };
    let result = handle.engine().try_with(|e| match disposal {
        Disposal::Close => e.close(raw),
        Disposal::Remove => e.remove(raw),
    });
    match result {
        Some(Ok(())) => {
            debug!(target: "arbor::lifecycle", object = what, ?disposal, "disposed native handle on drop")
        }
        Some(Err(err)) => {
            warn!(target: "arbor::lifecycle", object = what, ?disposal, error = %err, "disposal failed on drop")
        }
        None => {
            warn!(target: "arbor::lifecycle", object = what, ?disposal, "engine busy, disposal skipped")
        }
    }
    lifecycle.mark_destroyed();
}

/// Forget a handle whose ancestor has already been deleted. The engine has
/// invalidated it, so no native call is made.
pub(crate) fn abandon(handle: &HandleRef, lifecycle: &Lifecycle, what: &str) {
    if handle.take().is_some() {
        debug!(target: "arbor::lifecycle", object = what, "ancestor destroyed, handle dropped without native call");
    }
    lifecycle.mark_destroyed();
}
