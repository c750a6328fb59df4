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

//! The database retain count always equals the number of live table and
//! column wrappers, whatever order they are created, looked up and dropped in.

mod common;

use arbor::{Column, FileEngine, Session, Table, TableOptions};
use common::int_column;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    CreateTable(u8),
    LookupTable(u8),
    CreateColumn(u8, u8),
    LookupColumn(u8, u8),
    DropTable(usize),
    DropColumn(usize),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0u8..3).prop_map(Step::CreateTable),
        (0u8..3).prop_map(Step::LookupTable),
        (0u8..3, 0u8..3).prop_map(|(t, c)| Step::CreateColumn(t, c)),
        (0u8..3, 0u8..3).prop_map(|(t, c)| Step::LookupColumn(t, c)),
        any::<usize>().prop_map(Step::DropTable),
        any::<usize>().prop_map(Step::DropColumn),
    ]
}

fn table_name(t: u8) -> String {
    format!("T{t}")
}

/// Number of distinct live wrappers: clones share one retain.
fn distinct<T, F: Fn(&T, &T) -> bool>(items: &[T], same: F) -> usize {
    let mut count = 0;
    for (i, item) in items.iter().enumerate() {
        if !items[..i].iter().any(|earlier| same(earlier, item)) {
            count += 1;
        }
    }
    count
}

proptest! {
    #[test]
    fn retain_count_tracks_live_wrappers(steps in prop::collection::vec(step(), 1..40)) {
        let session = Session::new(FileEngine::new());
        let db = session.open_temporary().unwrap();
        let mut tables: Vec<Table> = Vec::new();
        let mut columns: Vec<Column> = Vec::new();

        for step in steps {
            match step {
                Step::CreateTable(t) => {
                    if let Ok(table) = db.create_table(&TableOptions::named(table_name(t))) {
                        tables.push(table);
                    }
                }
                Step::LookupTable(t) => {
                    if let Some(table) = db.table(&table_name(t)).unwrap() {
                        tables.push(table);
                    }
                }
                Step::CreateColumn(t, c) => {
                    if let Some(table) = db.table(&table_name(t)).unwrap() {
                        let options = int_column(&format!("c{c}")).persistent(false);
                        if let Ok(column) = table.create_column(&options) {
                            columns.push(column);
                        }
                    }
                }
                Step::LookupColumn(t, c) => {
                    if let Some(table) = db.table(&table_name(t)).unwrap() {
                        if let Some(column) = table.column(&format!("c{c}")).unwrap() {
                            columns.push(column);
                        }
                    }
                }
                Step::DropTable(i) => {
                    if !tables.is_empty() {
                        tables.swap_remove(i % tables.len());
                    }
                }
                Step::DropColumn(i) => {
                    if !columns.is_empty() {
                        columns.swap_remove(i % columns.len());
                    }
                }
            }

            // A live column keeps its table alive even when no `Table` is held.
            let mut live_tables: Vec<Table> = tables.clone();
            live_tables.extend(columns.iter().map(|c| c.table().unwrap()));
            let expected = distinct(&live_tables, Table::ptr_eq) + distinct(&columns, Column::ptr_eq);
            prop_assert_eq!(db.retain_count(), expected as u64);
        }

        drop(columns);
        drop(tables);
        prop_assert_eq!(db.retain_count(), 0);
    }
}
