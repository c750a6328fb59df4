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

//! Identity-preserving wrappers over a native database engine.
//!
//! A [`Session`] opens [`Database`]s; databases hold [`Table`]s and tables
//! hold [`Column`]s. Each wrapper owns one native handle and keeps its parent
//! alive, so handles are always released child-first no matter in which order
//! the wrappers are dropped.
//!
//! ```no_run
//! use arbor::{ColumnOptions, DataType, FileEngine, Session, TableOptions};
//!
//! # fn main() -> arbor::Result<()> {
//! let session = Session::new(FileEngine::new());
//! let db = session.open("/tmp/store.db", true)?;
//! let users = db.create_table(&TableOptions::named("Users").persistent(true))?;
//! users.create_column(&ColumnOptions::new("age", DataType::Int32).persistent(true))?;
//!
//! // Same name, same instance.
//! assert!(db.table("Users")?.unwrap().ptr_eq(&users));
//!
//! for entry in users.columns(false)? {
//!     let (name, _) = entry?;
//!     println!("{name}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Removal is two-phase. `remove()` marks a wrapper removed; the native
//! object is deleted right away or when the wrapper drops, depending on the
//! [`RemovalPolicy`]. A database is only deleted once no table or column
//! rooted at it is alive.

mod column;
mod config;
mod cursor;
mod database;
mod error;
mod handle;
mod identity;
mod lifecycle;
mod options;
mod session;
mod table;

pub use column::Column;
pub use config::{Config, RemovalPolicy};
pub use cursor::{Cursor, CursorScope};
pub use database::Database;
pub use error::{Error, Result, ValidationError};
pub use lifecycle::LifecycleState;
pub use options::{validate_name, ColumnOptions, TableOptions, TypeRef};
pub use session::Session;
pub use table::Table;

pub use arbor_engine::{
    ColumnType, Compression, CursorOptions, DataType, EngineError, EngineErrorCode, FileEngine,
    NativeEngine, ObjectFlags, TableType,
};

/// Cursor over the tables of a database.
pub type TableCursor = Cursor<Database>;

/// Cursor over the columns of a table.
pub type ColumnCursor = Cursor<Table>;
