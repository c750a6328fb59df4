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

use thiserror::Error;

/// Failure classes reported by a native engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorCode {
    NotFound,
    AlreadyExists,
    InvalidHandle,
    InvalidArgument,
    Busy,
    Io,
    Corrupt,
    OutOfMemory,
}

impl std::fmt::Display for EngineErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EngineErrorCode::NotFound => "not found",
            EngineErrorCode::AlreadyExists => "already exists",
            EngineErrorCode::InvalidHandle => "invalid handle",
            EngineErrorCode::InvalidArgument => "invalid argument",
            EngineErrorCode::Busy => "busy",
            EngineErrorCode::Io => "I/O error",
            EngineErrorCode::Corrupt => "corrupt store",
            EngineErrorCode::OutOfMemory => "out of memory",
        };
        f.write_str(s)
    }
}

/// An engine failure: a code plus the engine's own diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct EngineError {
    pub code: EngineErrorCode,
    pub message: String,
}

impl EngineError {
    pub fn new(code: EngineErrorCode, message: impl Into<String>) -> Self {
        EngineError {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_handle(what: impl std::fmt::Display) -> Self {
        Self::new(EngineErrorCode::InvalidHandle, format!("invalid handle: {what}"))
    }

    pub(crate) fn io(context: impl std::fmt::Display, err: std::io::Error) -> Self {
        Self::new(EngineErrorCode::Io, format!("{context}: {err}"))
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
