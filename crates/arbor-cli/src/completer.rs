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

use std::sync::{Arc, Mutex, MutexGuard};

use arbor::{ColumnType, Compression, DataType, TableType};
use reedline::{Completer, Span, Suggestion};

use crate::commands::STATEMENTS;

pub const DOT_COMMANDS: &[(&str, &str)] = &[
    (".mode", "Set output format: table|json"),
    (".timer", "Show statement time: on|off"),
    (".config", "Show the session configuration"),
    (".help", "Show available commands"),
    (".quit", "Exit the shell"),
    (".exit", "Exit the shell"),
];

// ---------------------------------------------------------------------------
// Shared completion state (refreshed by the REPL loop, read by the completer)
// ---------------------------------------------------------------------------

#[derive(Default)]
struct CompletionState {
    tables: Vec<String>,
}

fn lock(state: &Arc<Mutex<CompletionState>>) -> MutexGuard<'_, CompletionState> {
    // Completion data is best-effort; a poisoned lock still holds usable names.
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[derive(Clone)]
pub struct CompletionUpdater {
    state: Arc<Mutex<CompletionState>>,
}

impl CompletionUpdater {
    pub fn set_tables(&self, tables: Vec<String>) {
        lock(&self.state).tables = tables;
    }
}

// ---------------------------------------------------------------------------
// StatementCompleter
// ---------------------------------------------------------------------------

pub struct StatementCompleter {
    state: Arc<Mutex<CompletionState>>,
}

impl StatementCompleter {
    pub fn new() -> (Self, CompletionUpdater) {
        let state = Arc::new(Mutex::new(CompletionState::default()));
        let updater = CompletionUpdater {
            state: Arc::clone(&state),
        };
        (StatementCompleter { state }, updater)
    }
}

fn suggestion(value: &str, description: &str, span: Span) -> Suggestion {
    Suggestion {
        value: value.to_string(),
        description: Some(description.to_string()),
        style: None,
        extra: None,
        span,
        append_whitespace: true,
        match_indices: None,
    }
}

fn starts_with_ignore_case(candidate: &str, prefix: &str) -> bool {
    candidate.len() >= prefix.len()
        && candidate.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

fn push_matching(
    out: &mut Vec<(String, &'static str)>,
    prefix: &str,
    names: impl IntoIterator<Item = String>,
    what: &'static str,
) {
    out.extend(
        names
            .into_iter()
            .filter(|name| starts_with_ignore_case(name, prefix))
            .map(|name| (name, what)),
    );
}

fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Candidate values for the word being typed, given the words before it.
fn candidates(previous: &[&str], prefix: &str, tables: &[String]) -> Vec<(String, &'static str)> {
    let mut out = Vec::new();
    match previous {
        [] => push_matching(
            &mut out,
            prefix,
            STATEMENTS.iter().map(|(s, _)| s.to_string()),
            "statement",
        ),
        ["create"] => push_matching(&mut out, prefix, words(&["table", "column"]), "object"),
        ["columns" | "show" | "remove" | "rename"] | ["create", "column"] => {
            push_matching(&mut out, prefix, tables.iter().cloned(), "table")
        }
        ["remove", _] => push_matching(&mut out, prefix, words(&["force", "defer"]), "removal"),
        ["create", "column", _] => push_matching(
            &mut out,
            prefix,
            DataType::ALL
                .iter()
                .map(|t| t.type_name().to_string())
                .chain(tables.iter().cloned()),
            "type",
        ),
        ["create", "table", _, ..] if prefix.starts_with("type=") => push_matching(
            &mut out,
            prefix,
            TableType::ALL.iter().map(|t| format!("type={}", t.name())),
            "table type",
        ),
        ["create", "table", _, ..] => push_matching(
            &mut out,
            prefix,
            words(&["persistent", "normalize", "sis", "type=", "key=", "value=", "path="]),
            "option",
        ),
        ["create", "column", _, _, ..] if prefix.starts_with("kind=") => push_matching(
            &mut out,
            prefix,
            ColumnType::ALL.iter().map(|t| format!("kind={}", t.name())),
            "column kind",
        ),
        ["create", "column", _, _, ..] if prefix.starts_with("compress=") => push_matching(
            &mut out,
            prefix,
            Compression::ALL
                .iter()
                .map(|t| format!("compress={}", t.name())),
            "compression",
        ),
        ["create", "column", _, _, ..] => push_matching(
            &mut out,
            prefix,
            words(&[
                "persistent", "weight", "section", "position", "kind=", "compress=", "path=",
            ]),
            "option",
        ),
        _ => {}
    }
    out
}

impl Completer for StatementCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let before = &line[..pos];
        let word_start = before
            .rfind(char::is_whitespace)
            .map(|i| i + 1)
            .unwrap_or(0);
        let prefix = &before[word_start..];
        let span = Span::new(word_start, pos);

        if before.trim_start().starts_with('.') {
            return DOT_COMMANDS
                .iter()
                .filter(|(cmd, _)| cmd.starts_with(prefix))
                .map(|(cmd, desc)| suggestion(cmd, desc, span))
                .collect();
        }

        let previous: Vec<&str> = before[..word_start].split_whitespace().collect();
        let state = lock(&self.state);
        candidates(&previous, prefix, &state.tables)
            .into_iter()
            .map(|(value, what)| suggestion(&value, what, span))
            .collect()
    }
}
