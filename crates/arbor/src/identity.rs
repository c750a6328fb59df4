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

//! Weak name → wrapper maps.
//!
//! An entry whose wrapper has been dropped is indistinguishable from a
//! missing entry. Wrappers evict their own entry when they drop, so the map
//! stays bounded by the number of live wrappers.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

pub(crate) struct IdentityCache<T> {
    entries: RefCell<HashMap<String, Weak<T>>>,
}

impl<T> Default for IdentityCache<T> {
    fn default() -> Self {
        IdentityCache {
            entries: RefCell::new(HashMap::new()),
        }
    }
}

impl<T> IdentityCache<T> {
    pub(crate) fn lookup(&self, key: &str) -> Option<Rc<T>> {
        self.entries.borrow().get(key).and_then(Weak::upgrade)
    }

    /// Associate `key` with `value`, replacing whatever was there.
    pub(crate) fn insert(&self, key: impl Into<String>, value: &Rc<T>) {
        self.entries
            .borrow_mut()
            .insert(key.into(), Rc::downgrade(value));
    }

    /// Drop the entry for `key` if its wrapper is gone. Called from `Drop`,
    /// so a busy map is left alone.
    pub(crate) fn forget(&self, key: &str) {
        if let Ok(mut entries) = self.entries.try_borrow_mut() {
            if entries.get(key).is_some_and(|w| w.strong_count() == 0) {
                entries.remove(key);
            }
        }
    }

    /// Drop the entry for `key` if it refers to `value`.
    pub(crate) fn evict(&self, key: &str, value: &T) {
        if let Ok(mut entries) = self.entries.try_borrow_mut() {
            if entries
                .get(key)
                .is_some_and(|w| std::ptr::eq(w.as_ptr(), value))
            {
                entries.remove(key);
            }
        }
    }

    /// Move `value` from `old` to `new`.
    pub(crate) fn rekey(&self, old: &str, new: impl Into<String>, value: &Rc<T>) {
        self.evict(old, value);
        self.insert(new, value);
    }

    /// Number of entries whose wrapper is still alive.
    pub(crate) fn live(&self) -> usize {
        self.entries
            .borrow()
            .values()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    #[cfg(test)]
    fn raw_len(&self) -> usize {
        self.entries.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_returns_the_same_instance_while_alive() {
        let cache = IdentityCache::default();
        let a = Rc::new(1);
        cache.insert("a", &a);
        let hit = cache.lookup("a").unwrap();
        assert!(Rc::ptr_eq(&hit, &a));
        assert!(cache.lookup("b").is_none());
    }

    #[test]
    fn dropped_values_read_as_misses() {
        let cache = IdentityCache::default();
        let a = Rc::new(1);
        cache.insert("a", &a);
        drop(a);
        assert!(cache.lookup("a").is_none());
        assert_eq!(cache.live(), 0);
        assert_eq!(cache.raw_len(), 1);
        cache.forget("a");
        assert_eq!(cache.raw_len(), 0);
    }

    #[test]
    fn forget_keeps_live_entries() {
        let cache = IdentityCache::default();
        let a = Rc::new(1);
        cache.insert("a", &a);
        cache.forget("a");
        assert!(cache.lookup("a").is_some());
    }

    #[test]
    fn insert_overwrites_stale_entries() {
        let cache = IdentityCache::default();
        let old = Rc::new(1);
        cache.insert("a", &old);
        drop(old);
        let new = Rc::new(2);
        cache.insert("a", &new);
        assert_eq!(*cache.lookup("a").unwrap(), 2);
    }

    #[test]
    fn evict_only_removes_the_matching_value() {
        let cache = IdentityCache::default();
        let a = Rc::new(1);
        let b = Rc::new(1);
        cache.insert("k", &a);
        cache.evict("k", &*b);
        assert!(cache.lookup("k").is_some());
        cache.evict("k", &*a);
        assert!(cache.lookup("k").is_none());
    }

    #[test]
    fn rekey_moves_the_entry() {
        let cache = IdentityCache::default();
        let a = Rc::new(1);
        cache.insert("T.old", &a);
        cache.rekey("T.old", "T.new", &a);
        assert!(cache.lookup("T.old").is_none());
        assert!(Rc::ptr_eq(&cache.lookup("T.new").unwrap(), &a));
    }
}
