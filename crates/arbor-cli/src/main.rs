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

mod commands;
mod completer;
mod prompt;
mod render;
mod theme;
mod validator;

use std::path::{Path, PathBuf};

use arbor::{Config, Database, FileEngine, Session};
use clap::Parser;
use reedline::{
    default_emacs_keybindings, DescriptionMode, Emacs, FileBackedHistory, IdeMenu, KeyCode,
    KeyModifiers, MenuBuilder, Reedline, ReedlineEvent, ReedlineMenu, Signal,
};
use tracing::debug;

use commands::CommandError;
use completer::{CompletionUpdater, StatementCompleter, DOT_COMMANDS};
use prompt::DbPrompt;
use render::OutputFormat;
use validator::StatementValidator;

#[derive(Parser)]
#[command(name = "arbor", version, about = "Browse and edit arbor databases")]
struct Args {
    /// Database file; a temporary database is used when omitted
    path: Option<PathBuf>,
    /// Create the database if it does not exist
    #[arg(short, long)]
    create: bool,
    /// Session configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Execute a statement and exit; may be repeated
    #[arg(short, long = "execute")]
    execute: Vec<String>,
    /// Print results as JSON
    #[arg(long)]
    json: bool,
    /// Show statement execution time
    #[arg(short, long)]
    timer: bool,
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("ARBOR_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{}Error: {msg}{}", theme::ERROR, theme::R);
    std::process::exit(1);
}

fn load_config(path: Option<&Path>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("reading {}: {e}", path.display())));
    Config::from_json(&text).unwrap_or_else(|e| fail(format!("parsing {}: {e}", path.display())))
}

fn open_database(session: &Session, args: &Args) -> Database {
    let result = match &args.path {
        Some(path) => session.open(path, args.create),
        None => session.open_temporary(),
    };
    result.unwrap_or_else(|e| fail(e))
}

fn main() {
    let args = Args::parse();
    init_tracing();

    let session = Session::with_config(FileEngine::new(), load_config(args.config.as_deref()));
    let db = open_database(&session, &args);
    debug!(path = ?args.path, "database ready");

    let format = if args.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };

    if !args.execute.is_empty() {
        for statement in &args.execute {
            if let Err(e) = run_statement(&db, statement, format, args.timer) {
                fail(e);
            }
        }
        return;
    }

    let label = args
        .path
        .as_deref()
        .and_then(Path::file_name)
        .map_or_else(|| "temp".to_string(), |n| n.to_string_lossy().into_owned());
    run_repl(&session, &db, &label, format, args.timer);
}

fn run_statement(
    db: &Database,
    statement: &str,
    format: OutputFormat,
    timer: bool,
) -> Result<(), CommandError> {
    let command = commands::parse(statement)?;
    let start = std::time::Instant::now();
    let output = commands::execute(db, command)?;
    let elapsed = start.elapsed();
    render::print(&output, format);
    if timer {
        eprintln!(
            "{}Run Time: {:.3}s{}",
            theme::DIM,
            elapsed.as_secs_f64(),
            theme::R
        );
    }
    Ok(())
}

fn refresh_tables(updater: &CompletionUpdater, db: &Database) {
    let Ok(cursor) = db.tables(false) else {
        return;
    };
    let names = cursor
        .filter_map(|entry| entry.ok().map(|(name, _)| name))
        .collect();
    updater.set_tables(names);
}

fn run_repl(session: &Session, db: &Database, label: &str, mut format: OutputFormat, timer: bool) {
    print_banner();

    let (completer, updater) = StatementCompleter::new();
    refresh_tables(&updater, db);

    let hinter = reedline::DefaultHinter::default()
        .with_style(nu_ansi_term::Style::new().fg(nu_ansi_term::Color::DarkGray));

    let ide_menu = IdeMenu::default()
        .with_name("completion_menu")
        .with_min_completion_width(16)
        .with_max_completion_width(48)
        .with_max_completion_height(10)
        .with_padding(1)
        .with_description_mode(DescriptionMode::PreferRight)
        .with_default_border();

    let mut keybindings = default_emacs_keybindings();
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu("completion_menu".to_string()),
            ReedlineEvent::MenuNext,
        ]),
    );
    keybindings.add_binding(
        KeyModifiers::SHIFT,
        KeyCode::BackTab,
        ReedlineEvent::MenuPrevious,
    );

    let history_path = dirs_or_home().join(".arbor_history");
    let history = match FileBackedHistory::with_file(1000, history_path.clone()) {
        Ok(history) => Some(history),
        Err(e) => {
            eprintln!(
                "{}Warning: history disabled ({}): {e}{}",
                theme::ERROR,
                history_path.display(),
                theme::R
            );
            None
        }
    };

    let editor = Reedline::create()
        .with_completer(Box::new(completer))
        .with_validator(Box::new(StatementValidator))
        .with_hinter(Box::new(hinter))
        .with_menu(ReedlineMenu::EngineCompleter(Box::new(ide_menu)))
        .with_edit_mode(Box::new(Emacs::new(keybindings)));
    let mut editor = match history {
        Some(history) => editor.with_history(Box::new(history)),
        None => editor,
    };

    let prompt = DbPrompt::new(label);
    let mut show_timer = timer;

    loop {
        match editor.read_line(&prompt) {
            Ok(Signal::Success(line)) => {
                let statement = validator::join_continuations(&line);
                let trimmed = statement.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed.starts_with('.') {
                    if !handle_dot_command(trimmed, &mut format, &mut show_timer, session) {
                        break;
                    }
                    continue;
                }
                if let Err(e) = run_statement(db, trimmed, format, show_timer) {
                    eprintln!("{}Error: {e}{}", theme::ERROR, theme::R);
                }
                refresh_tables(&updater, db);
            }
            Ok(Signal::CtrlD) => break,
            Ok(Signal::CtrlC) => continue,
            Err(e) => {
                eprintln!("Error: {e}");
                break;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Dot commands
// ---------------------------------------------------------------------------

/// Returns `false` when the shell should exit.
fn handle_dot_command(
    cmd: &str,
    format: &mut OutputFormat,
    timer: &mut bool,
    session: &Session,
) -> bool {
    let parts: Vec<&str> = cmd.split_whitespace().collect();
    match parts.as_slice() {
        [".mode", "table"] => *format = OutputFormat::Table,
        [".mode", "json"] => *format = OutputFormat::Json,
        [".mode", ..] => println!("Usage: .mode table|json"),
        [".timer", "on"] => *timer = true,
        [".timer", "off"] => *timer = false,
        [".timer", ..] => println!("Usage: .timer on|off"),
        [".config"] => match session.config().to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("{}Error: {e}{}", theme::ERROR, theme::R),
        },
        [".help"] => print_help(),
        [".quit" | ".exit"] => return false,
        [other, ..] => println!("Unknown command: {other}. Type .help for commands."),
        [] => {}
    }
    true
}

// ---------------------------------------------------------------------------
// Banner & help
// ---------------------------------------------------------------------------

fn print_banner() {
    use theme::*;
    println!("{BOLD}{TITLE}arbor{R} v{}", env!("CARGO_PKG_VERSION"));
    println!("{DIM}type .help for commands{R}");
    println!();
}

fn print_help() {
    println!("Statements:");
    for (name, desc) in commands::STATEMENTS {
        println!("  {name:10} {desc}");
    }
    println!();
    println!("Commands:");
    for (name, desc) in DOT_COMMANDS {
        println!("  {name:10} {desc}");
    }
    println!();
    println!("Examples:");
    println!("  create table Users persistent key=ShortText");
    println!("  create column Users.age Int32 persistent");
    println!("  create column Users.tags ShortText kind=vector weight");
    println!("  columns Users");
    println!("  remove Users.age force");
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}
