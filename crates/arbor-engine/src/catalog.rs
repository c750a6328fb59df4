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

//! On-disk object catalog of one database.
//!
//! The catalog is a JSON document at the database path. Only persistent user
//! objects are written; builtin types are registered again on every load and
//! temporary objects vanish with the open database.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::consts::{DataType, ObjId, ObjectFlags, ObjectKind};
use crate::error::{EngineError, EngineErrorCode, EngineResult};
use crate::{Compression, FIRST_USER_ID};

const CATALOG_FORMAT: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ObjectRecord {
    pub id: ObjId,
    pub name: Option<String>,
    pub kind: ObjectKind,
    pub flags: ObjectFlags,
    #[serde(default)]
    pub compression: Option<Compression>,
    pub domain: Option<ObjId>,
    pub range: Option<ObjId>,
    pub path: Option<PathBuf>,
}

impl ObjectRecord {
    fn is_persistent(&self) -> bool {
        self.flags.contains(ObjectFlags::PERSISTENT)
    }

    /// Owning table of a column.
    pub fn table(&self) -> Option<ObjId> {
        match self.kind {
            ObjectKind::Column(_) => self.domain,
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct CatalogFile {
    format: u32,
    next_id: u32,
    last_modified: u64,
    objects: Vec<ObjectRecord>,
}

/// Children addressed by a cursor or a scoped lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    Database,
    Table(ObjId),
}

#[derive(Debug)]
pub(crate) struct Catalog {
    next_id: u32,
    last_modified: u64,
    objects: BTreeMap<ObjId, ObjectRecord>,
    names: BTreeMap<String, ObjId>,
}

pub(crate) fn column_full_name(table: &str, column: &str) -> String {
    format!("{table}.{column}")
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl Catalog {
    pub fn new() -> Self {
        let mut catalog = Catalog {
            next_id: FIRST_USER_ID,
            last_modified: now_secs(),
            objects: BTreeMap::new(),
            names: BTreeMap::new(),
        };
        for t in DataType::ALL {
            catalog.index(ObjectRecord {
                id: t.obj_id(),
                name: Some(t.type_name().to_string()),
                kind: ObjectKind::Type,
                flags: ObjectFlags::empty(),
                compression: None,
                domain: None,
                range: None,
                path: None,
            });
        }
        catalog
    }

    pub fn load(path: &Path) -> EngineResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EngineError::new(
                    EngineErrorCode::NotFound,
                    format!("no database at {}", path.display()),
                )
            } else {
                EngineError::io(format!("read {}", path.display()), e)
            }
        })?;
        let file: CatalogFile = serde_json::from_slice(&bytes).map_err(|e| {
            EngineError::new(
                EngineErrorCode::Corrupt,
                format!("{}: {e}", path.display()),
            )
        })?;
        if file.format != CATALOG_FORMAT {
            return Err(EngineError::new(
                EngineErrorCode::Corrupt,
                format!("{}: unsupported catalog format {}", path.display(), file.format),
            ));
        }
        let mut catalog = Catalog::new();
        catalog.next_id = file.next_id.max(FIRST_USER_ID);
        catalog.last_modified = file.last_modified;
        for record in file.objects {
            if record.id.0 < FIRST_USER_ID {
                return Err(EngineError::new(
                    EngineErrorCode::Corrupt,
                    format!("{}: reserved id {} in catalog", path.display(), record.id),
                ));
            }
            catalog.index(record);
        }
        Ok(catalog)
    }

    pub fn save(&self, path: &Path) -> EngineResult<()> {
        let file = CatalogFile {
            format: CATALOG_FORMAT,
            next_id: self.next_id,
            last_modified: self.last_modified,
            objects: self
                .objects
                .values()
                .filter(|r| r.id.0 >= FIRST_USER_ID && r.is_persistent())
                .cloned()
                .collect(),
        };
        let bytes = serde_json::to_vec_pretty(&file)
            .map_err(|e| EngineError::new(EngineErrorCode::Corrupt, e.to_string()))?;
        let tmp = PathBuf::from(format!("{}.tmp", path.display()));
        std::fs::write(&tmp, bytes).map_err(|e| EngineError::io(format!("write {}", tmp.display()), e))?;
        std::fs::rename(&tmp, path).map_err(|e| EngineError::io(format!("rename {}", tmp.display()), e))
    }

    fn index(&mut self, record: ObjectRecord) {
        if let Some(name) = &record.name {
            self.names.insert(name.clone(), record.id);
        }
        self.objects.insert(record.id, record);
    }

    pub fn allocate_id(&mut self) -> ObjId {
        let id = ObjId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn insert(&mut self, record: ObjectRecord) -> EngineResult<()> {
        if let Some(name) = &record.name {
            if self.names.contains_key(name) {
                return Err(EngineError::new(
                    EngineErrorCode::AlreadyExists,
                    format!("object already exists: <{name}>"),
                ));
            }
        }
        self.index(record);
        self.last_modified = now_secs();
        Ok(())
    }

    pub fn get(&self, id: ObjId) -> Option<&ObjectRecord> {
        self.objects.get(&id)
    }

    pub fn id_of(&self, name: &str) -> Option<ObjId> {
        self.names.get(name).copied()
    }

    pub fn touch(&mut self) {
        self.last_modified = now_secs();
    }

    /// Delete an object. A table takes its columns with it. Objects still
    /// referenced from outside the removed set are refused.
    pub fn remove(&mut self, id: ObjId) -> EngineResult<Vec<ObjectRecord>> {
        let record = self
            .get(id)
            .ok_or_else(|| EngineError::invalid_handle(id))?;
        if record.kind == ObjectKind::Type {
            return Err(EngineError::new(
                EngineErrorCode::InvalidArgument,
                format!("builtin type cannot be removed: {id}"),
            ));
        }
        let mut doomed = vec![id];
        if record.kind.is_table() {
            doomed.extend(
                self.objects
                    .values()
                    .filter(|r| r.table() == Some(id))
                    .map(|r| r.id),
            );
        }
        if let Some(user) = self.objects.values().find(|r| {
            !doomed.contains(&r.id)
                && (r.range == Some(id) || (r.kind.is_table() && r.domain == Some(id)))
        }) {
            return Err(EngineError::new(
                EngineErrorCode::InvalidArgument,
                format!(
                    "<{}> is still referenced by <{}>",
                    record.name.as_deref().unwrap_or("(anonymous)"),
                    user.name.as_deref().unwrap_or("(anonymous)")
                ),
            ));
        }
        let mut removed = Vec::with_capacity(doomed.len());
        for id in doomed {
            if let Some(record) = self.objects.remove(&id) {
                if let Some(name) = &record.name {
                    self.names.remove(name);
                }
                removed.push(record);
            }
        }
        self.last_modified = now_secs();
        Ok(removed)
    }

    /// Rename a column. `short` excludes the table prefix.
    pub fn rename_column(&mut self, id: ObjId, short: &str) -> EngineResult<()> {
        let record = self
            .get(id)
            .ok_or_else(|| EngineError::invalid_handle(id))?;
        let table = record.table().ok_or_else(|| {
            EngineError::new(EngineErrorCode::InvalidArgument, "only columns can be renamed")
        })?;
        let table_name = self
            .get(table)
            .and_then(|t| t.name.clone())
            .ok_or_else(|| EngineError::invalid_handle(table))?;
        let full = column_full_name(&table_name, short);
        if self.names.contains_key(&full) {
            return Err(EngineError::new(
                EngineErrorCode::AlreadyExists,
                format!("object already exists: <{full}>"),
            ));
        }
        let record = self.objects.get_mut(&id).ok_or_else(|| EngineError::invalid_handle(id))?;
        if let Some(old) = record.name.replace(full.clone()) {
            self.names.remove(&old);
        }
        self.names.insert(full, id);
        self.last_modified = now_secs();
        Ok(())
    }

    /// Next child of `scope` whose name sorts after `after`, with the key
    /// used for bounds (full name for databases, short name for tables).
    /// Database children are tables only; builtin types and columns are
    /// passed over.
    pub fn next_child(&self, scope: Scope, after: Option<&str>) -> Option<(String, String, ObjId)> {
        let prefix = match scope {
            Scope::Database => String::new(),
            Scope::Table(table) => {
                let name = self.get(table)?.name.as_deref()?;
                column_full_name(name, "")
            }
        };
        let lower = match after {
            Some(after) => Bound::Excluded(after.to_string()),
            None => Bound::Included(prefix.clone()),
        };
        for (name, id) in self.names.range::<String, _>((lower, Bound::Unbounded)) {
            if !name.starts_with(&prefix) {
                return None;
            }
            let is_child = match scope {
                Scope::Database => self.get(*id).is_some_and(|r| r.kind.is_table()),
                Scope::Table(table) => self.get(*id).and_then(ObjectRecord::table) == Some(table),
            };
            if !is_child {
                continue;
            }
            let key = name[prefix.len()..].to_string();
            return Some((name.clone(), key, *id));
        }
        None
    }

    /// Persistent records whose files must go when the database is deleted.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.objects
            .values()
            .filter(|r| r.is_persistent())
            .filter_map(|r| r.path.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColumnType, TableType};

    fn table(catalog: &mut Catalog, name: &str) -> ObjId {
        let id = catalog.allocate_id();
        catalog
            .insert(ObjectRecord {
                id,
                name: Some(name.to_string()),
                kind: ObjectKind::Table(TableType::HashKey),
                flags: ObjectFlags::PERSISTENT,
                compression: None,
                domain: Some(DataType::ShortText.obj_id()),
                range: None,
                path: None,
            })
            .unwrap();
        id
    }

    fn column(catalog: &mut Catalog, table: ObjId, name: &str, range: ObjId) -> ObjId {
        let table_name = catalog.get(table).unwrap().name.clone().unwrap();
        let id = catalog.allocate_id();
        catalog
            .insert(ObjectRecord {
                id,
                name: Some(column_full_name(&table_name, name)),
                kind: ObjectKind::Column(ColumnType::Scalar),
                flags: ObjectFlags::PERSISTENT,
                compression: None,
                domain: Some(table),
                range: Some(range),
                path: None,
            })
            .unwrap();
        id
    }

    #[test]
    fn builtins_are_registered() {
        let catalog = Catalog::new();
        assert_eq!(catalog.id_of("Int32"), Some(DataType::Int32.obj_id()));
        assert_eq!(catalog.get(DataType::Int32.obj_id()).unwrap().kind, ObjectKind::Type);
    }

    #[test]
    fn duplicate_names_are_refused() {
        let mut catalog = Catalog::new();
        table(&mut catalog, "Users");
        let id = catalog.allocate_id();
        let err = catalog
            .insert(ObjectRecord {
                id,
                name: Some("Users".into()),
                kind: ObjectKind::Table(TableType::NoKey),
                flags: ObjectFlags::empty(),
                compression: None,
                domain: None,
                range: None,
                path: None,
            })
            .unwrap_err();
        assert_eq!(err.code, EngineErrorCode::AlreadyExists);
    }

    #[test]
    fn removing_a_table_cascades_to_columns() {
        let mut catalog = Catalog::new();
        let users = table(&mut catalog, "Users");
        column(&mut catalog, users, "age", DataType::Int32.obj_id());
        column(&mut catalog, users, "name", DataType::ShortText.obj_id());
        let removed = catalog.remove(users).unwrap();
        assert_eq!(removed.len(), 3);
        assert_eq!(catalog.id_of("Users.age"), None);
    }

    #[test]
    fn referenced_tables_cannot_be_removed() {
        let mut catalog = Catalog::new();
        let users = table(&mut catalog, "Users");
        let posts = table(&mut catalog, "Posts");
        column(&mut catalog, posts, "author", users);
        let err = catalog.remove(users).unwrap_err();
        assert_eq!(err.code, EngineErrorCode::InvalidArgument);
        assert!(err.message.contains("Posts.author"));
    }

    #[test]
    fn table_children_are_walked_in_name_order() {
        let mut catalog = Catalog::new();
        let users = table(&mut catalog, "Users");
        let other = table(&mut catalog, "UsersArchive");
        column(&mut catalog, users, "b", DataType::Int32.obj_id());
        column(&mut catalog, users, "a", DataType::Int32.obj_id());
        column(&mut catalog, other, "z", DataType::Int32.obj_id());

        let mut keys = Vec::new();
        let mut after = None;
        while let Some((name, key, _)) = catalog.next_child(Scope::Table(users), after.as_deref()) {
            keys.push(key);
            after = Some(name);
        }
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn database_children_are_tables_only() {
        let mut catalog = Catalog::new();
        let users = table(&mut catalog, "Users");
        table(&mut catalog, "Logs");
        column(&mut catalog, users, "age", DataType::Int32.obj_id());

        let mut keys = Vec::new();
        let mut after = None;
        while let Some((name, key, _)) = catalog.next_child(Scope::Database, after.as_deref()) {
            keys.push(key);
            after = Some(name);
        }
        assert_eq!(keys, vec!["Logs", "Users"]);
    }

    #[test]
    fn save_and_load_keep_only_persistent_user_objects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db");
        let mut catalog = Catalog::new();
        let users = table(&mut catalog, "Users");
        let tmp = catalog.allocate_id();
        catalog
            .insert(ObjectRecord {
                id: tmp,
                name: Some("Scratch".into()),
                kind: ObjectKind::Table(TableType::NoKey),
                flags: ObjectFlags::empty(),
                compression: None,
                domain: None,
                range: None,
                path: None,
            })
            .unwrap();
        catalog.save(&path).unwrap();

        let loaded = Catalog::load(&path).unwrap();
        assert_eq!(loaded.id_of("Users"), Some(users));
        assert_eq!(loaded.id_of("Scratch"), None);
        assert_eq!(loaded.id_of("Int32"), Some(DataType::Int32.obj_id()));
    }

    #[test]
    fn garbage_is_reported_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db");
        std::fs::write(&path, b"not json").unwrap();
        assert_eq!(Catalog::load(&path).unwrap_err().code, EngineErrorCode::Corrupt);
    }
}
