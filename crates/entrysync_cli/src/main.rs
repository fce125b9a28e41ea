//! Terminal front end for one entry screen session.
//!
//! # Responsibility
//! - Drive the screen from line commands read on stdin.
//! - Print the rendered screen and toast notices after each command.
//!
//! Usage: `entrysync_cli [db_path]`. Without an argument the database path
//! comes from `ENTRYSYNC_DB_PATH` or the system temp dir. Setting
//! `ENTRYSYNC_LOG_DIR` (absolute) enables rolling file logs.

use entrysync_core::{
    EntryScreen, LocalStoreClient, NoticeQueue, RemoteStoreClient, ScreenView, StoreConfig,
};
use log::{info, warn};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

const LOG_DIR_ENV: &str = "ENTRYSYNC_LOG_DIR";
const SETTLE_TIMEOUT: Duration = Duration::from_millis(150);
const HELP: &str = "commands: type <text> | submit | edit <row> | delete <row> | show | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Type(String),
    Submit,
    Edit(usize),
    Delete(usize),
    Show,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (name, rest) = match line.trim_start().split_once(' ') {
        Some((name, rest)) => (name, rest),
        None => (line.trim(), ""),
    };
    match name {
        "type" => Ok(Command::Type(rest.to_string())),
        "submit" => Ok(Command::Submit),
        "edit" => parse_row(rest).map(Command::Edit),
        "delete" => parse_row(rest).map(Command::Delete),
        "show" => Ok(Command::Show),
        "quit" | "exit" => Ok(Command::Quit),
        "" => Err(HELP.to_string()),
        other => Err(format!("unknown command `{other}`; {HELP}")),
    }
}

/// Rows are numbered from 1 as printed by `show`.
fn parse_row(value: &str) -> Result<usize, String> {
    match value.trim().parse::<usize>() {
        Ok(row) if row > 0 => Ok(row),
        _ => Err(format!("row must be a positive number, got `{}`", value.trim())),
    }
}

fn format_view(view: &ScreenView) -> String {
    let mut out = String::new();
    out.push_str(&format!("draft: {:?}\n", view.draft_text));
    out.push_str(&format!("[{}]\n", view.submit_label.as_str()));
    if let Some(heading) = view.list_heading {
        out.push_str(heading);
        out.push('\n');
    }
    for (index, row) in view.rows.iter().enumerate() {
        out.push_str(&format!("{:>3}. {}\n", index + 1, row.label));
    }
    if let Some(message) = view.empty_message {
        out.push_str(message);
        out.push('\n');
    }
    out
}

/// Handles every store event that arrives within a short quiet window.
fn settle<C: RemoteStoreClient + ?Sized>(screen: &mut EntryScreen<C>) {
    while screen.wait_for_event(SETTLE_TIMEOUT) {}
}

fn run(
    screen: &mut EntryScreen<LocalStoreClient>,
    notices: &NoticeQueue,
    input: impl BufRead,
    mut output: impl Write,
) -> io::Result<()> {
    settle(screen);
    write!(output, "{}", format_view(&screen.view()))?;

    for line in input.lines() {
        let command = match parse_command(&line?) {
            Ok(command) => command,
            Err(message) => {
                writeln!(output, "{message}")?;
                continue;
            }
        };

        match command {
            Command::Type(text) => screen.set_draft_text(text),
            Command::Submit => {
                screen.submit();
            }
            Command::Edit(row) => match screen.entries().get(row - 1).cloned() {
                Some(entry) => screen.request_edit(&entry),
                None => writeln!(output, "no entry at row {row}")?,
            },
            Command::Delete(row) => match screen.entries().get(row - 1).map(|e| e.id.clone()) {
                Some(id) => screen.request_delete(&id),
                None => writeln!(output, "no entry at row {row}")?,
            },
            Command::Show => {}
            Command::Quit => break,
        }

        settle(screen);
        for notice in notices.drain() {
            writeln!(output, "* {notice}")?;
        }
        write!(output, "{}", format_view(&screen.view()))?;
        output.flush()?;
    }
    Ok(())
}

fn init_logging_from_env() {
    let Ok(log_dir) = std::env::var(LOG_DIR_ENV) else {
        return;
    };
    if let Err(err) = entrysync_core::init_logging(entrysync_core::default_log_level(), &log_dir) {
        eprintln!("entrysync_cli: logging disabled: {err}");
    }
}

fn main() -> ExitCode {
    init_logging_from_env();
    let config = match std::env::args().nth(1) {
        Some(path) if !path.trim().is_empty() => StoreConfig::file(path.trim()),
        _ => StoreConfig::from_env(),
    };
    let store = match LocalStoreClient::open(&config) {
        Ok(store) => Arc::new(store),
        Err(err) => {
            warn!("event=cli_start module=cli status=error error={}", err);
            eprintln!("entrysync_cli: failed to open store: {err}");
            return ExitCode::FAILURE;
        }
    };

    let notices = NoticeQueue::new();
    let mut screen = EntryScreen::new(store, notices.clone());
    screen.activate();
    info!("event=cli_start module=cli status=ok collection={}", config.collection);
    println!("entrysync_core version={}", entrysync_core::core_version());
    println!("{HELP}");

    let stdin = io::stdin();
    let result = run(&mut screen, &notices, stdin.lock(), io::stdout().lock());
    screen.teardown();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("entrysync_cli: {err}");
            ExitCode::FAILURE
        }
    }
}
