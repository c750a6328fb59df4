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

use std::str::FromStr;

use arbor::{
    Column, ColumnOptions, ColumnType, Compression, Database, Table, TableOptions, TableType,
    TypeRef,
};
use arbor_engine::UnknownConstant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Arbor(#[from] arbor::Error),
    #[error("unknown constant: {0}")]
    Constant(#[from] UnknownConstant),
    #[error("no such table: {0}")]
    NoTable(String),
    #[error("no such column: {0}")]
    NoColumn(String),
}

fn usage(text: &str) -> CommandError {
    CommandError::Usage(format!("usage: {text}"))
}

/// A parsed shell statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Tables,
    Columns(String),
    Show(Target),
    CreateTable(TableOptions),
    CreateColumn { table: String, options: ColumnOptions },
    Rename { table: String, column: String, to: String },
    Remove { target: Target, force: Option<bool> },
    Touch,
}

/// `Table` or `Table.column`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Table(String),
    Column { table: String, column: String },
}

impl FromStr for Target {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((table, column)) if !table.is_empty() && !column.is_empty() => {
                Ok(Target::Column {
                    table: table.to_string(),
                    column: column.to_string(),
                })
            }
            Some(_) => Err(CommandError::Usage(format!("bad object name: {s}"))),
            None => Ok(Target::Table(s.to_string())),
        }
    }
}

pub const STATEMENTS: &[(&str, &str)] = &[
    ("tables", "List tables"),
    ("columns", "columns <table>: list columns"),
    ("show", "show <table>[.<column>]: describe an object"),
    ("create", "create table|column ..."),
    ("rename", "rename <table>.<column> <name>"),
    ("remove", "remove <table>[.<column>] [force|defer]"),
    ("touch", "Bump the database modification time"),
];

pub fn parse(line: &str) -> Result<Command, CommandError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, rest)) = words.split_first() else {
        return Err(CommandError::Usage("empty statement".into()));
    };
    match head.to_ascii_lowercase().as_str() {
        "tables" => Ok(Command::Tables),
        "columns" => match rest {
            [table] => Ok(Command::Columns(table.to_string())),
            _ => Err(usage("columns <table>")),
        },
        "show" => match rest {
            [target] => Ok(Command::Show(target.parse()?)),
            _ => Err(usage("show <table>[.<column>]")),
        },
        "create" => match rest.split_first() {
            Some((&"table", args)) => parse_create_table(args),
            Some((&"column", args)) => parse_create_column(args),
            _ => Err(usage("create table|column ...")),
        },
        "rename" => match rest {
            [target, to] => match target.parse()? {
                Target::Column { table, column } => Ok(Command::Rename {
                    table,
                    column,
                    to: to.to_string(),
                }),
                Target::Table(_) => Err(CommandError::Usage("only columns can be renamed".into())),
            },
            _ => Err(usage("rename <table>.<column> <name>")),
        },
        "remove" => {
            let (target, force) = match rest {
                [target] => (target, None),
                [target, "force"] => (target, Some(true)),
                [target, "defer"] => (target, Some(false)),
                _ => return Err(usage("remove <table>[.<column>] [force|defer]")),
            };
            Ok(Command::Remove {
                target: target.parse()?,
                force,
            })
        }
        "touch" => Ok(Command::Touch),
        other => Err(CommandError::Usage(format!(
            "unknown statement: {other}. Type .help for commands."
        ))),
    }
}

/// Split `key=value`; bare words come back with an empty value.
fn option(word: &str) -> (&str, &str) {
    word.split_once('=').unwrap_or((word, ""))
}

fn parse_create_table(args: &[&str]) -> Result<Command, CommandError> {
    const USAGE: &str =
        "create table <name>|_ [persistent] [type=HASH_KEY] [key=<type>] [value=<type>] [path=<file>]";
    let Some((&name, flags)) = args.split_first() else {
        return Err(usage(USAGE));
    };
    let mut options = if name == "_" {
        TableOptions::anonymous()
    } else {
        TableOptions::named(name)
    };
    for &word in flags {
        match option(word) {
            ("persistent", "") => options = options.persistent(true),
            ("normalize", "") => options.key_normalize = true,
            ("sis", "") => options.key_with_sis = true,
            ("type", v) => options = options.table_type(TableType::from_str(&v.to_ascii_uppercase())?),
            ("key", v) => options = options.key_type(TypeRef::from_str(v)?),
            ("value", v) => options = options.value_type(TypeRef::from_str(v)?),
            ("path", v) if !v.is_empty() => options = options.path(v),
            _ => return Err(usage(USAGE)),
        }
    }
    Ok(Command::CreateTable(options))
}

fn parse_create_column(args: &[&str]) -> Result<Command, CommandError> {
    const USAGE: &str = "create column <table>.<name> <type> [persistent] [kind=SCALAR] \
                         [compress=ZLIB] [weight] [section] [position] [path=<file>]";
    let [target, value_type, flags @ ..] = args else {
        return Err(usage(USAGE));
    };
    let Target::Column { table, column } = target.parse()? else {
        return Err(usage(USAGE));
    };
    let mut options = ColumnOptions::new(column, TypeRef::from_str(value_type)?);
    for &word in flags {
        match option(word) {
            ("persistent", "") => options = options.persistent(true),
            ("weight", "") => options = options.with_weight(),
            ("section", "") => options = options.with_section(),
            ("position", "") => options = options.with_position(),
            ("kind", v) => {
                options = options.column_type(ColumnType::from_str(&v.to_ascii_uppercase())?)
            }
            ("compress", v) => {
                options = options.compression(Compression::from_str(&v.to_ascii_uppercase())?)
            }
            ("path", v) if !v.is_empty() => options = options.path(v),
            _ => return Err(usage(USAGE)),
        }
    }
    Ok(Command::CreateColumn { table, options })
}

/// What a statement printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Rows {
        headers: Vec<&'static str>,
        rows: Vec<Vec<String>>,
    },
    Message(String),
}

impl Output {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Output::Rows { headers, rows } => serde_json::Value::Array(
                rows.iter()
                    .map(|row| {
                        headers
                            .iter()
                            .zip(row)
                            .map(|(h, v)| (h.to_string(), serde_json::Value::from(v.as_str())))
                            .collect::<serde_json::Map<_, _>>()
                            .into()
                    })
                    .collect(),
            ),
            Output::Message(msg) => serde_json::json!({ "message": msg }),
        }
    }
}

fn table(db: &Database, name: &str) -> Result<Table, CommandError> {
    db.table(name)?
        .ok_or_else(|| CommandError::NoTable(name.to_string()))
}

fn column(db: &Database, table_name: &str, name: &str) -> Result<Column, CommandError> {
    table(db, table_name)?
        .column(name)?
        .ok_or_else(|| CommandError::NoColumn(format!("{table_name}.{name}")))
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn yes_no(flag: bool) -> String {
    let text = if flag { "yes" } else { "no" };
    text.to_string()
}

fn table_row(name: String, table: &Table) -> Result<Vec<String>, CommandError> {
    Ok(vec![
        name,
        table.table_type()?.to_string(),
        opt(table.key_type()?),
        opt(table.value_type()?),
        yes_no(table.is_persistent()?),
    ])
}

fn column_row(name: String, column: &Column) -> Result<Vec<String>, CommandError> {
    Ok(vec![
        name,
        column.column_type()?.to_string(),
        opt(column.value_type()?),
        opt(column.compression()?),
        yes_no(column.is_persistent()?),
    ])
}

const TABLE_HEADERS: &[&str] = &["name", "type", "key", "value", "persistent"];
const COLUMN_HEADERS: &[&str] = &["name", "kind", "value", "compression", "persistent"];

pub fn execute(db: &Database, command: Command) -> Result<Output, CommandError> {
    match command {
        Command::Tables => {
            let mut rows = Vec::new();
            for entry in db.tables(true)? {
                let (name, table) = entry?;
                match table {
                    Some(table) => rows.push(table_row(name, &table)?),
                    None => rows.push(vec![name]),
                }
            }
            Ok(Output::Rows {
                headers: TABLE_HEADERS.to_vec(),
                rows,
            })
        }
        Command::Columns(name) => {
            let table = table(db, &name)?;
            let mut rows = Vec::new();
            for entry in table.columns(true)? {
                let (name, column) = entry?;
                match column {
                    Some(column) => rows.push(column_row(name, &column)?),
                    None => rows.push(vec![name]),
                }
            }
            Ok(Output::Rows {
                headers: COLUMN_HEADERS.to_vec(),
                rows,
            })
        }
        Command::Show(Target::Table(name)) => {
            let t = table(db, &name)?;
            let flags = t.flags()?;
            let rows = vec![
                vec!["name".into(), name],
                vec!["type".into(), t.table_type()?.to_string()],
                vec!["key".into(), opt(t.key_type()?)],
                vec!["value".into(), opt(t.value_type()?)],
                vec!["flags".into(), format!("{flags:?}")],
                vec!["path".into(), opt(t.path()?.map(|p| p.display().to_string()))],
            ];
            Ok(Output::Rows {
                headers: vec!["property", "value"],
                rows,
            })
        }
        Command::Show(Target::Column { table, column: name }) => {
            let c = column(db, &table, &name)?;
            let rows = vec![
                vec!["name".into(), c.full_name()?],
                vec!["kind".into(), c.column_type()?.to_string()],
                vec!["value".into(), opt(c.value_type()?)],
                vec!["compression".into(), opt(c.compression()?)],
                vec!["weight".into(), yes_no(c.with_weight()?)],
                vec!["section".into(), yes_no(c.with_section()?)],
                vec!["position".into(), yes_no(c.with_position()?)],
                vec!["path".into(), opt(c.path()?.map(|p| p.display().to_string()))],
            ];
            Ok(Output::Rows {
                headers: vec!["property", "value"],
                rows,
            })
        }
        Command::CreateTable(options) => {
            let created = db.create_table(&options)?;
            let name = created.name()?.unwrap_or_else(|| "<anonymous>".into());
            Ok(Output::Message(format!("Created table {name}")))
        }
        Command::CreateColumn { table: t, options } => {
            let created = table(db, &t)?.create_column(&options)?;
            Ok(Output::Message(format!("Created column {}", created.full_name()?)))
        }
        Command::Rename { table: t, column: c, to } => {
            column(db, &t, &c)?.rename(&to)?;
            Ok(Output::Message(format!("Renamed {t}.{c} to {t}.{to}")))
        }
        Command::Remove { target, force } => {
            let what = match &target {
                Target::Table(name) => {
                    let t = table(db, name)?;
                    match force {
                        Some(force) => t.remove_with(force)?,
                        None => t.remove()?,
                    }
                    name.clone()
                }
                Target::Column { table: t, column: c } => {
                    let col = column(db, t, c)?;
                    match force {
                        Some(force) => col.remove_with(force)?,
                        None => col.remove()?,
                    }
                    format!("{t}.{c}")
                }
            };
            Ok(Output::Message(format!("Removed {what}")))
        }
        Command::Touch => {
            db.touch()?;
            Ok(Output::Message("Touched database".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor::{DataType, FileEngine, Session};

    fn run(db: &Database, line: &str) -> Output {
        execute(db, parse(line).unwrap()).unwrap()
    }

    fn names(output: &Output) -> Vec<String> {
        match output {
            Output::Rows { rows, .. } => rows.iter().map(|r| r[0].clone()).collect(),
            Output::Message(m) => panic!("expected rows, got {m}"),
        }
    }

    #[test]
    fn parses_create_statements() {
        let cmd = parse("create table Users persistent key=ShortText").unwrap();
        assert_eq!(
            cmd,
            Command::CreateTable(
                TableOptions::named("Users")
                    .persistent(true)
                    .key_type(DataType::ShortText)
            )
        );

        let cmd = parse("create column Terms.body Users kind=index section position").unwrap();
        let Command::CreateColumn { table, options } = cmd else {
            panic!("expected create column");
        };
        assert_eq!(table, "Terms");
        assert_eq!(options.column_type, ColumnType::Index);
        assert_eq!(options.value_type, TypeRef::Table("Users".into()));
        assert!(options.with_section && options.with_position);
    }

    #[test]
    fn rejects_malformed_statements() {
        assert!(matches!(parse("columns"), Err(CommandError::Usage(_))));
        assert!(matches!(parse("rename Users x"), Err(CommandError::Usage(_))));
        assert!(matches!(parse("remove Users now"), Err(CommandError::Usage(_))));
        assert!(matches!(
            parse("create table T type=BTREE"),
            Err(CommandError::Constant(_))
        ));
        assert!(matches!(parse("frobnicate"), Err(CommandError::Usage(_))));
    }

    #[test]
    fn drives_a_temporary_database() {
        let session = Session::new(FileEngine::new());
        let db = session.open_temporary().unwrap();

        run(&db, "create table Users");
        run(&db, "create table Logs type=no_key");
        run(&db, "create column Users.age Int32");
        run(&db, "create column Users.name ShortText kind=vector weight");
        assert_eq!(names(&run(&db, "tables")), vec!["Logs", "Users"]);
        assert_eq!(names(&run(&db, "columns Users")), vec!["age", "name"]);

        run(&db, "rename Users.age years");
        assert_eq!(names(&run(&db, "columns Users")), vec!["name", "years"]);

        run(&db, "remove Users.name");
        assert_eq!(names(&run(&db, "columns Users")), vec!["years"]);
        run(&db, "remove Logs force");
        assert_eq!(names(&run(&db, "tables")), vec!["Users"]);
        assert_eq!(db.retain_count(), 0);
    }

    #[test]
    fn missing_objects_are_reported() {
        let session = Session::new(FileEngine::new());
        let db = session.open_temporary().unwrap();
        let err = execute(&db, parse("columns Nope").unwrap()).unwrap_err();
        assert!(matches!(err, CommandError::NoTable(name) if name == "Nope"));
    }

    #[test]
    fn rows_render_as_json_objects() {
        let output = Output::Rows {
            headers: vec!["name", "type"],
            rows: vec![vec!["Users".into(), "HASH_KEY".into()]],
        };
        assert_eq!(
            output.to_json(),
            serde_json::json!([{ "name": "Users", "type": "HASH_KEY" }])
        );
    }
}
