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

use arbor_engine::{ColumnType, EngineError, EngineErrorCode, TableType};
use thiserror::Error;

/// Errors returned by every public operation of this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The name does not resolve, or resolves to an object of another kind.
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("database has been removed")]
    DatabaseRemoved,

    #[error("table has been removed")]
    TableRemoved,

    #[error("column has been removed")]
    ColumnRemoved,

    #[error("invalid options: {0}")]
    Validation(#[from] ValidationError),

    /// The engine could not allocate a handle or cursor.
    #[error("allocation failed: {0}")]
    Allocation(String),

    #[error("engine error: {0}")]
    Engine(EngineError),
}

impl Error {
    /// True for the three "has been removed" kinds.
    pub fn is_removed(&self) -> bool {
        matches!(
            self,
            Error::DatabaseRemoved | Error::TableRemoved | Error::ColumnRemoved
        )
    }

    pub(crate) fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            name: name.into(),
        }
    }
}

impl From<EngineError> for Error {
    fn from(err: EngineError) -> Self {
        match err.code {
            EngineErrorCode::OutOfMemory => Error::Allocation(err.message),
            _ => Error::Engine(err),
        }
    }
}

/// Structurally invalid creation options. Raised before any native call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("name is {len} bytes long, the limit is {max}")]
    NameTooLong { len: usize, max: usize },

    #[error("name <{name}> contains invalid character {ch:?}")]
    InvalidNameChar { name: String, ch: char },

    #[error("unknown type: {0}")]
    UnknownType(String),

    #[error("{0} tables require a key type")]
    KeyTypeRequired(TableType),

    #[error("NO_KEY tables take no key type")]
    KeyTypeNotAllowed,

    #[error("{0} cannot be used as a key type")]
    InvalidKeyType(String),

    #[error("{flag} is not supported by {column_type} columns")]
    IncompatibleFlag {
        flag: &'static str,
        column_type: ColumnType,
    },

    #[error("INDEX columns must take a table as their value type")]
    IndexSourceRequired,

    #[error("an explicit path requires a persistent object")]
    PathRequiresPersistent,
}

pub type Result<T> = std::result::Result<T, Error>;
