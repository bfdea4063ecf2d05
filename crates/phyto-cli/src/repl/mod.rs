//! Interactive dashboard.
//!
//! Lines starting with `/` drive the dashboard; anything else is sent to the
//! open treatment chat.

mod helper;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;

use phyto_application::{Dashboard, DiagnosisGateway, FlowError};

use crate::commands::utils::{analyze_with_progress, load_image};
use crate::render;
use helper::CliHelper;

/// A parsed input line.
#[derive(Debug, PartialEq)]
enum Input<'a> {
    Open(&'a str),
    Analyze,
    Clear,
    History,
    Treat(&'a str),
    Delete(&'a str),
    Close,
    Help,
    Quit,
    Message(&'a str),
    Unknown(&'a str),
}

fn parse(line: &str) -> Input<'_> {
    if line == "quit" || line == "exit" {
        return Input::Quit;
    }
    if !line.starts_with('/') {
        return Input::Message(line);
    }
    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };
    match (command, arg.is_empty()) {
        ("/open", false) => Input::Open(arg),
        ("/analyze", true) => Input::Analyze,
        ("/clear", true) => Input::Clear,
        ("/history", true) => Input::History,
        ("/treat", false) => Input::Treat(arg),
        ("/delete", false) => Input::Delete(arg),
        ("/close", true) => Input::Close,
        ("/help", _) => Input::Help,
        _ => Input::Unknown(line),
    }
}

/// Resolves a 1-based list position or an entry id.
fn resolve_entry(dashboard: &Dashboard, key: &str) -> Option<String> {
    let history = dashboard.history();
    match key.parse::<usize>() {
        Ok(n) if n >= 1 => history.entries().get(n - 1).map(|e| e.id.clone()),
        _ => history.get(key).map(|e| e.id.clone()),
    }
}

fn print_help() {
    let lines = [
        ("/open <path>", "select a leaf image"),
        ("/analyze", "classify the selected image"),
        ("/clear", "drop the selected image"),
        ("/history", "list past diagnoses"),
        ("/treat <n|id>", "open the treatment chat for a diagnosis"),
        ("/delete <n|id>", "remove a diagnosis"),
        ("/close", "close the treatment chat"),
        ("quit", "leave"),
    ];
    for (command, what) in lines {
        println!("  {:<16} {}", command.bright_cyan(), what.bright_black());
    }
}

fn alert(err: &FlowError) {
    eprintln!("{}", err.alert_text().red());
}

fn prompt(dashboard: &Dashboard) -> String {
    match dashboard.chat() {
        Some(chat) => format!("[{}] >> ", chat.diagnosis()),
        None => ">> ".to_string(),
    }
}

/// Handles one line. Returns `false` when the user asked to leave.
async fn dispatch(dashboard: &Dashboard, input: Input<'_>) -> bool {
    match input {
        Input::Quit => return false,
        Input::Help => print_help(),
        Input::Unknown(line) => {
            println!("{}", format!("Unknown command: {line}").bright_black());
        }
        Input::Open(path) => match load_image(Path::new(path)).await {
            Ok(image) => match dashboard.select_image(image) {
                Ok(_) => println!("{}", format!("Selected {path}").green()),
                Err(e) => alert(&e),
            },
            Err(e) => eprintln!("{}", format!("{e:#}").red()),
        },
        Input::Clear => match dashboard.clear_selection() {
            Ok(()) => println!("{}", "Selection cleared".bright_black()),
            Err(e) => alert(&e),
        },
        Input::Analyze => match analyze_with_progress(dashboard).await {
            Ok(entry) => println!("{}", render::entry_summary(&entry)),
            Err(e) => alert(&e),
        },
        Input::History => println!("{}", render::history(&dashboard.history())),
        Input::Treat(key) => match resolve_entry(dashboard, key) {
            Some(id) => match dashboard.open_chat(&id) {
                Ok(chat) => {
                    println!(
                        "{}",
                        format!(
                            "Treatment chat for {} ({}%). Type a question, /close to leave.",
                            chat.diagnosis(),
                            chat.confidence().rounded()
                        )
                        .bright_magenta()
                    );
                    for message in chat.messages() {
                        println!("{}", render::chat_message(message));
                    }
                }
                Err(e) => alert(&e),
            },
            None => alert(&FlowError::EntryNotFound(key.to_string())),
        },
        Input::Delete(key) => match resolve_entry(dashboard, key) {
            Some(id) => match dashboard.delete_entry(&id) {
                Ok(entry) => println!("{}", format!("Deleted {}", entry.label).bright_black()),
                Err(e) => alert(&e),
            },
            None => alert(&FlowError::EntryNotFound(key.to_string())),
        },
        Input::Close => dashboard.close_chat(),
        Input::Message(text) => {
            if dashboard.chat().is_none() {
                println!(
                    "{}",
                    "No chat open. Use /treat <n> to ask about a diagnosis.".bright_black()
                );
                return true;
            }
            let sent = match dashboard.set_chat_input(text) {
                Ok(()) => dashboard.send_message().await,
                Err(e) => Err(e),
            };
            match sent {
                Ok(reply) => println!("{}", render::chat_message(&reply)),
                Err(e) => alert(&e),
            }
        }
    }
    true
}

pub async fn run(gateway: Arc<dyn DiagnosisGateway>, demo: bool) -> Result<()> {
    let mut dashboard = Dashboard::new(gateway);
    if demo {
        dashboard = dashboard.with_demo_history();
    }

    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(CliHelper));

    println!("{}", "=== Phyto ===".bright_magenta().bold());
    println!(
        "{}",
        "Type '/open <image>' then '/analyze', '/help' for more, or 'quit' to exit.".bright_black()
    );
    println!();

    loop {
        match rl.readline(&prompt(&dashboard)) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                if !dispatch(&dashboard, parse(trimmed)).await {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    Ok(())
}
