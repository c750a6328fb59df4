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

mod common;

use arbor::{Config, Error, FileEngine, Session, TableOptions};
use common::{db_path, int_column, recording_session, users_table};

// ---------------------------------------------------------------------------
// Databases
// ---------------------------------------------------------------------------

#[test]
fn same_path_yields_same_database() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::new(FileEngine::new());
    let a = session.open(db_path(&dir), true).unwrap();
    let b = session.open(db_path(&dir), false).unwrap();
    assert!(a.ptr_eq(&b));
    assert_eq!(session.live_databases(), 1);
}

#[test]
fn relative_and_absolute_paths_share_identity() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::new(FileEngine::new());
    let a = session.open(db_path(&dir), true).unwrap();
    let dotted = dir.path().join(".").join("store.db");
    let b = session.open(dotted, false).unwrap();
    assert!(a.ptr_eq(&b));
}

#[test]
fn parent_segments_share_identity() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::new(FileEngine::new());
    let a = session.open(db_path(&dir), true).unwrap();
    let detour = dir.path().join("sub").join("..").join("store.db");
    let b = session.open(detour, false).unwrap();
    assert!(a.ptr_eq(&b));
    assert_eq!(session.live_databases(), 1);
}

#[test]
fn missing_database_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::new(FileEngine::new());
    match session.open(db_path(&dir), false) {
        Err(Error::NotFound { kind, .. }) => assert_eq!(kind, "database"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn dropped_database_is_reopened_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::new(FileEngine::new());
    let db = session.open(db_path(&dir), true).unwrap();
    db.create_table(&users_table()).unwrap();
    drop(db);
    assert_eq!(session.live_databases(), 0);

    let db = session.open(db_path(&dir), false).unwrap();
    assert!(db.table("Users").unwrap().is_some());
}

#[test]
fn temporary_databases_are_independent() {
    let session = Session::new(FileEngine::new());
    let a = session.open_temporary().unwrap();
    let b = session.open_temporary().unwrap();
    assert!(!a.ptr_eq(&b));
    assert_eq!(a.path().unwrap(), None);
    assert_eq!(session.live_databases(), 0);
}

// ---------------------------------------------------------------------------
// Tables and columns
// ---------------------------------------------------------------------------

#[test]
fn repeated_lookups_share_one_table() {
    let dir = tempfile::tempdir().unwrap();
    let (session, calls) = recording_session(Config::default());
    let db = session.open(db_path(&dir), true).unwrap();
    let created = db.create_table(&users_table()).unwrap();

    let first = db.table("Users").unwrap().unwrap();
    let second = db.table("Users").unwrap().unwrap();
    assert!(first.ptr_eq(&created));
    assert!(second.ptr_eq(&created));
    assert_eq!(db.retain_count(), 1);

    // Each lookup resolved a fresh handle and released it on the cache hit.
    assert_eq!(calls.borrow().closes, 2);
    assert_eq!(calls.borrow().open_handles, 2);
}

#[test]
fn collected_table_is_rebuilt_on_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::new(FileEngine::new());
    let db = session.open(db_path(&dir), true).unwrap();
    drop(db.create_table(&users_table()).unwrap());
    assert_eq!(db.retain_count(), 0);

    let again = db.table("Users").unwrap().unwrap();
    assert_eq!(again.name().unwrap().as_deref(), Some("Users"));
    assert_eq!(db.retain_count(), 1);
}

#[test]
fn anonymous_tables_never_share() {
    let session = Session::new(FileEngine::new());
    let db = session.open_temporary().unwrap();
    let a = db.create_table(&TableOptions::anonymous()).unwrap();
    let b = db.create_table(&TableOptions::anonymous()).unwrap();
    assert!(!a.ptr_eq(&b));
    assert_eq!(a.name().unwrap(), None);
    assert_eq!(db.retain_count(), 2);
}

#[test]
fn wrong_kind_is_absent() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::new(FileEngine::new());
    let db = session.open(db_path(&dir), true).unwrap();
    // Builtin types live in the same namespace as tables.
    assert!(db.table("Int32").unwrap().is_none());
    assert!(db.table("Nope").unwrap().is_none());
}

#[test]
fn columns_share_identity_across_lookup_and_iteration() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::new(FileEngine::new());
    let db = session.open(db_path(&dir), true).unwrap();
    let users = db.create_table(&users_table()).unwrap();
    let age = users.create_column(&int_column("age")).unwrap();

    let looked_up = users.column("age").unwrap().unwrap();
    assert!(looked_up.ptr_eq(&age));

    let (name, wrapper) = users.columns(true).unwrap().next().unwrap().unwrap();
    assert_eq!(name, "age");
    assert!(wrapper.unwrap().ptr_eq(&age));
    assert_eq!(db.retain_count(), 2);
}

#[test]
fn renamed_column_keeps_its_identity() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::new(FileEngine::new());
    let db = session.open(db_path(&dir), true).unwrap();
    let users = db.create_table(&users_table()).unwrap();
    let age = users.create_column(&int_column("age")).unwrap();

    age.rename("years").unwrap();
    assert_eq!(age.name().unwrap(), "years");
    assert_eq!(age.full_name().unwrap(), "Users.years");
    assert!(users.column("age").unwrap().is_none());
    assert!(users.column("years").unwrap().unwrap().ptr_eq(&age));
}

#[test]
fn recreated_table_does_not_resurrect_old_columns() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::new(FileEngine::new());
    let db = session.open(db_path(&dir), true).unwrap();
    let old = db.create_table(&users_table()).unwrap();
    let old_age = old.create_column(&int_column("age")).unwrap();
    old.remove().unwrap();

    let fresh = db.create_table(&users_table()).unwrap();
    let fresh_age = fresh.create_column(&int_column("age")).unwrap();
    assert!(!fresh_age.ptr_eq(&old_age));
    assert!(fresh.column("age").unwrap().unwrap().ptr_eq(&fresh_age));
    assert_eq!(old_age.name(), Err(Error::TableRemoved));
}

#[test]
fn wrappers_display_kind_and_name() {
    let session = Session::new(FileEngine::new());
    let db = session.open_temporary().unwrap();
    let users = db.create_table(&TableOptions::named("Users")).unwrap();
    let age = users
        .create_column(&int_column("age").persistent(false))
        .unwrap();
    let scratch = db.create_table(&TableOptions::anonymous()).unwrap();

    assert_eq!(db.to_string(), "database: <temporary>");
    assert_eq!(users.to_string(), "table: Users");
    assert_eq!(scratch.to_string(), "table: <anonymous>");
    assert_eq!(age.to_string(), "column: Users.age");
    age.rename("years").unwrap();
    assert_eq!(age.to_string(), "column: Users.years");
}
