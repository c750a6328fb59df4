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

//! Creation options for tables and columns.
//!
//! Options are plain structs with public fields. `validate` checks every
//! combination rule without touching the engine; `create_table` and
//! `create_column` call it before anything else.

use std::path::PathBuf;

use arbor_engine::{
    ColumnType, Compression, DataType, ObjectFlags, TableType, UnknownConstant, MAX_NAME_LEN,
};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A key or value type: either a builtin data type or a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    Builtin(DataType),
    Table(String),
}

impl From<DataType> for TypeRef {
    fn from(t: DataType) -> Self {
        TypeRef::Builtin(t)
    }
}

impl std::str::FromStr for TypeRef {
    type Err = UnknownConstant;

    /// Builtin names (`INT32` or `Int32`) resolve to [`TypeRef::Builtin`];
    /// anything else is taken as a table name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(UnknownConstant(s.to_string()));
        }
        Ok(s.parse::<DataType>()
            .map(TypeRef::Builtin)
            .unwrap_or_else(|_| TypeRef::Table(s.to_string())))
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeRef::Builtin(t) => f.write_str(t.type_name()),
            TypeRef::Table(name) => f.write_str(name),
        }
    }
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '#' | '@')
}

/// Check a table name or short column name.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong {
            len: name.len(),
            max: MAX_NAME_LEN,
        });
    }
    if let Some(ch) = name.chars().find(|c| !is_name_char(*c)) {
        return Err(ValidationError::InvalidNameChar {
            name: name.to_string(),
            ch,
        });
    }
    Ok(())
}

fn validate_type_ref(t: &TypeRef) -> Result<(), ValidationError> {
    match t {
        TypeRef::Builtin(_) => Ok(()),
        TypeRef::Table(name) => validate_name(name),
    }
}

/// Options for [`Database::create_table`](crate::Database::create_table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    /// `None` creates an anonymous table that can never be looked up.
    pub name: Option<String>,
    pub path: Option<PathBuf>,
    pub table_type: TableType,
    pub persistent: bool,
    pub key_normalize: bool,
    pub key_with_sis: bool,
    pub key_type: Option<TypeRef>,
    pub value_type: Option<TypeRef>,
}

impl Default for TableOptions {
    fn default() -> Self {
        TableOptions {
            name: None,
            path: None,
            table_type: TableType::HashKey,
            persistent: false,
            key_normalize: false,
            key_with_sis: false,
            key_type: Some(TypeRef::Builtin(DataType::ShortText)),
            value_type: None,
        }
    }
}

impl TableOptions {
    pub fn named(name: impl Into<String>) -> Self {
        TableOptions {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn anonymous() -> Self {
        TableOptions::default()
    }

    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    /// Switch the storage kind. `NO_KEY` clears the key type.
    pub fn table_type(mut self, table_type: TableType) -> Self {
        self.table_type = table_type;
        if !table_type.has_key() {
            self.key_type = None;
        }
        self
    }

    pub fn key_type(mut self, key_type: impl Into<TypeRef>) -> Self {
        self.key_type = Some(key_type.into());
        self
    }

    pub fn value_type(mut self, value_type: impl Into<TypeRef>) -> Self {
        self.value_type = Some(value_type.into());
        self
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if self.path.is_some() && !self.persistent {
            return Err(ValidationError::PathRequiresPersistent);
        }
        if self.table_type.has_key() {
            match &self.key_type {
                None => return Err(ValidationError::KeyTypeRequired(self.table_type)),
                Some(TypeRef::Builtin(t)) if !t.is_key_type() => {
                    return Err(ValidationError::InvalidKeyType(t.type_name().to_string()))
                }
                Some(t) => validate_type_ref(t)?,
            }
        } else if self.key_type.is_some() || self.key_normalize || self.key_with_sis {
            return Err(ValidationError::KeyTypeNotAllowed);
        }
        if let Some(t) = &self.value_type {
            validate_type_ref(t)?;
        }
        Ok(())
    }

    pub(crate) fn flags(&self) -> ObjectFlags {
        let mut flags = ObjectFlags::empty();
        flags.set(ObjectFlags::PERSISTENT, self.persistent);
        flags.set(ObjectFlags::KEY_NORMALIZE, self.key_normalize);
        flags.set(ObjectFlags::KEY_WITH_SIS, self.key_with_sis);
        flags
    }
}

/// Options for [`Table::create_column`](crate::Table::create_column).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnOptions {
    /// Short name, without the owning table's prefix.
    pub name: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_column_type")]
    pub column_type: ColumnType,
    pub value_type: TypeRef,
    #[serde(default)]
    pub persistent: bool,
    #[serde(default)]
    pub compression: Option<Compression>,
    #[serde(default)]
    pub with_weight: bool,
    #[serde(default)]
    pub with_section: bool,
    #[serde(default)]
    pub with_position: bool,
}

fn default_column_type() -> ColumnType {
    ColumnType::Scalar
}

impl ColumnOptions {
    pub fn new(name: impl Into<String>, value_type: impl Into<TypeRef>) -> Self {
        ColumnOptions {
            name: name.into(),
            path: None,
            column_type: ColumnType::Scalar,
            value_type: value_type.into(),
            persistent: false,
            compression: None,
            with_weight: false,
            with_section: false,
            with_position: false,
        }
    }

    pub fn column_type(mut self, column_type: ColumnType) -> Self {
        self.column_type = column_type;
        self
    }

    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_weight(mut self) -> Self {
        self.with_weight = true;
        self
    }

    pub fn with_section(mut self) -> Self {
        self.with_section = true;
        self
    }

    pub fn with_position(mut self) -> Self {
        self.with_position = true;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(&self.name)?;
        if self.path.is_some() && !self.persistent {
            return Err(ValidationError::PathRequiresPersistent);
        }
        let incompatible = |flag| ValidationError::IncompatibleFlag {
            flag,
            column_type: self.column_type,
        };
        match self.column_type {
            ColumnType::Scalar if self.with_weight => return Err(incompatible("WITH_WEIGHT")),
            ColumnType::Index if self.compression.is_some() => {
                return Err(incompatible("COMPRESS"))
            }
            _ => {}
        }
        if self.column_type != ColumnType::Index {
            if self.with_section {
                return Err(incompatible("WITH_SECTION"));
            }
            if self.with_position {
                return Err(incompatible("WITH_POSITION"));
            }
        } else if !matches!(self.value_type, TypeRef::Table(_)) {
            return Err(ValidationError::IndexSourceRequired);
        }
        validate_type_ref(&self.value_type)
    }

    pub(crate) fn flags(&self) -> ObjectFlags {
        let mut flags = ObjectFlags::empty();
        flags.set(ObjectFlags::PERSISTENT, self.persistent);
        flags.set(ObjectFlags::WITH_WEIGHT, self.with_weight);
        flags.set(ObjectFlags::WITH_SECTION, self.with_section);
        flags.set(ObjectFlags::WITH_POSITION, self.with_position);
        flags
    }
}
