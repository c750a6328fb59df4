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

//! Name ⇄ integer constant translation tables.
//!
//! Every table maps an engine constant to the upper-case name used in
//! option bags (`"INT32"`, `"HASH_KEY"`, ...). Lookups by name accept the
//! constant name only; builtin data types additionally accept the engine's
//! object name (`"Int32"`, `"ShortText"`).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Identifier of an object inside a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjId(pub u32);

impl ObjId {
    pub const NIL: ObjId = ObjId(0);
}

impl std::fmt::Display for ObjId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Returned when a name does not appear in a translation table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownConstant(pub String);

impl std::fmt::Display for UnknownConstant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown constant: {}", self.0)
    }
}

impl std::error::Error for UnknownConstant {}

macro_rules! constant_table {
    (
        $(#[$meta:meta])*
        pub enum $ty:ident : $repr:ty {
            $($variant:ident = $id:expr => $name:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $ty {
            $($variant,)+
        }

        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant,)+];

            /// Engine constant for this value.
            pub fn id(self) -> $repr {
                match self {
                    $($ty::$variant => $id,)+
                }
            }

            /// Inverse of [`id`](Self::id).
            pub fn from_id(id: $repr) -> Option<Self> {
                match id {
                    $(x if x == $id => Some($ty::$variant),)+
                    _ => None,
                }
            }

            /// Upper-case constant name.
            pub fn name(self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)+
                }
            }

            fn from_constant_name(s: &str) -> Option<Self> {
                match s {
                    $($name => Some($ty::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

constant_table! {
    /// Builtin scalar data types. Ids are fixed and reserved in every database.
    pub enum DataType: u32 {
        Void = 0 => "VOID",
        Db = 1 => "DB",
        Object = 2 => "OBJECT",
        Bool = 3 => "BOOL",
        Int8 = 4 => "INT8",
        UInt8 = 5 => "UINT8",
        Int16 = 6 => "INT16",
        UInt16 = 7 => "UINT16",
        Int32 = 8 => "INT32",
        UInt32 = 9 => "UINT32",
        Int64 = 10 => "INT64",
        UInt64 = 11 => "UINT64",
        Float = 12 => "FLOAT",
        Time = 13 => "TIME",
        ShortText = 14 => "SHORT_TEXT",
        Text = 15 => "TEXT",
        LongText = 16 => "LONG_TEXT",
        TokyoGeoPoint = 17 => "TOKYO_GEO_POINT",
        Wgs84GeoPoint = 18 => "WGS84_GEO_POINT",
    }
}

impl DataType {
    /// Name of the builtin type object registered in each database.
    pub fn type_name(self) -> &'static str {
        match self {
            DataType::Void => "Void",
            DataType::Db => "DB",
            DataType::Object => "Object",
            DataType::Bool => "Bool",
            DataType::Int8 => "Int8",
            DataType::UInt8 => "UInt8",
            DataType::Int16 => "Int16",
            DataType::UInt16 => "UInt16",
            DataType::Int32 => "Int32",
            DataType::UInt32 => "UInt32",
            DataType::Int64 => "Int64",
            DataType::UInt64 => "UInt64",
            DataType::Float => "Float",
            DataType::Time => "Time",
            DataType::ShortText => "ShortText",
            DataType::Text => "Text",
            DataType::LongText => "LongText",
            DataType::TokyoGeoPoint => "TokyoGeoPoint",
            DataType::Wgs84GeoPoint => "WGS84GeoPoint",
        }
    }

    pub fn obj_id(self) -> ObjId {
        ObjId(self.id())
    }

    /// Whether values of this type can serve as a table key.
    pub fn is_key_type(self) -> bool {
        !matches!(
            self,
            DataType::Void | DataType::Db | DataType::Object | DataType::Text | DataType::LongText
        )
    }
}

impl std::str::FromStr for DataType {
    type Err = UnknownConstant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::from_constant_name(s)
            .or_else(|| DataType::ALL.iter().copied().find(|t| t.type_name() == s))
            .ok_or_else(|| UnknownConstant(s.to_string()))
    }
}

constant_table! {
    /// Table storage kinds.
    pub enum TableType: u8 {
        HashKey = 0x00 => "HASH_KEY",
        PatKey = 0x01 => "PAT_KEY",
        DatKey = 0x02 => "DAT_KEY",
        NoKey = 0x03 => "NO_KEY",
    }
}

impl TableType {
    pub fn has_key(self) -> bool {
        self != TableType::NoKey
    }
}

constant_table! {
    /// Column storage kinds.
    pub enum ColumnType: u8 {
        Scalar = 0x00 => "SCALAR",
        Vector = 0x01 => "VECTOR",
        Index = 0x02 => "INDEX",
    }
}

constant_table! {
    /// Column compression schemes.
    pub enum Compression: u8 {
        Zlib = 0x01 => "ZLIB",
        Lz4 = 0x02 => "LZ4",
    }
}

macro_rules! from_str_by_name {
    ($($ty:ident),+) => {
        $(
            impl std::str::FromStr for $ty {
                type Err = UnknownConstant;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    $ty::from_constant_name(s).ok_or_else(|| UnknownConstant(s.to_string()))
                }
            }
        )+
    };
}

from_str_by_name!(TableType, ColumnType, Compression);

bitflags! {
    /// Object header flags that do not encode a storage kind.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ObjectFlags: u32 {
        const PERSISTENT = 1 << 0;
        const KEY_NORMALIZE = 1 << 1;
        const KEY_WITH_SIS = 1 << 2;
        const WITH_WEIGHT = 1 << 3;
        const WITH_SECTION = 1 << 4;
        const WITH_POSITION = 1 << 5;
    }
}

/// Structural kind of a resolved object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    Database,
    Type,
    Table(TableType),
    Column(ColumnType),
}

impl ObjectKind {
    pub fn is_table(self) -> bool {
        matches!(self, ObjectKind::Table(_))
    }

    pub fn is_column(self) -> bool {
        matches!(self, ObjectKind::Column(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_ids_are_dense_and_invertible() {
        for (i, t) in DataType::ALL.iter().enumerate() {
            assert_eq!(t.id() as usize, i);
            assert_eq!(DataType::from_id(t.id()), Some(*t));
        }
        assert_eq!(DataType::from_id(19), None);
    }

    #[test]
    fn names_parse_back() {
        assert_eq!("INT32".parse::<DataType>().unwrap(), DataType::Int32);
        assert_eq!("ShortText".parse::<DataType>().unwrap(), DataType::ShortText);
        assert_eq!("PAT_KEY".parse::<TableType>().unwrap(), TableType::PatKey);
        assert_eq!("INDEX".parse::<ColumnType>().unwrap(), ColumnType::Index);
        assert_eq!("LZ4".parse::<Compression>().unwrap(), Compression::Lz4);
        assert!("int32".parse::<DataType>().is_err());
        assert!("BTREE".parse::<TableType>().is_err());
    }

    #[test]
    fn key_type_eligibility() {
        assert!(DataType::ShortText.is_key_type());
        assert!(DataType::UInt64.is_key_type());
        assert!(!DataType::Text.is_key_type());
        assert!(!TableType::NoKey.has_key());
    }
}
