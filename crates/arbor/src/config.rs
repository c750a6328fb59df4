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

use serde::{Deserialize, Serialize};

/// When a removed table or column is physically deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    /// Delete the native object as part of `remove()`.
    #[default]
    Immediate,
    /// Mark the wrapper removed and delete when it is dropped.
    Deferred,
}

impl RemovalPolicy {
    /// `force` as accepted by `remove_with`: `true` deletes right away.
    pub fn from_force(force: bool) -> Self {
        if force {
            RemovalPolicy::Immediate
        } else {
            RemovalPolicy::Deferred
        }
    }
}

/// Session-wide settings.
///
/// Databases have no policy of their own: their deletion is always deferred
/// while tables or columns rooted at them are alive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub table_removal: RemovalPolicy,
    pub column_removal: RemovalPolicy,
}

impl Config {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = Config::from_json(r#"{"column_removal": "deferred"}"#).unwrap();
        assert_eq!(config.table_removal, RemovalPolicy::Immediate);
        assert_eq!(config.column_removal, RemovalPolicy::Deferred);
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(Config::from_json(r#"{"table_removal": "later"}"#).is_err());
    }

    #[test]
    fn json_round_trips() {
        let config = Config {
            table_removal: RemovalPolicy::Deferred,
            column_removal: RemovalPolicy::Immediate,
        };
        let text = config.to_json().unwrap();
        assert!(text.contains("\"deferred\""));
        assert_eq!(Config::from_json(&text).unwrap(), config);
    }
}
