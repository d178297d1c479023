use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;

use crate::assistant::{ChatSession, Turn};
use crate::cli::report::render_report;
use crate::cli::{report_source, require_session, responder};
use crate::conversation::{self, ConversationLog};
use crate::dashboard::{Dashboard, ReportState};
use crate::error::Result;
use crate::models::{ChatMessage, Sender};
use crate::settings::{load_settings, Settings};

const WRAP_WIDTH: usize = 72;

fn show_state(state: &ReportState) {
    if state.loading {
        println!("{}", "Loading report data...".dimmed());
        return;
    }
    if let Some(notice) = &state.error {
        eprintln!("{}", notice.red());
        return;
    }
    if let (true, Some(request)) = (state.generated, state.shown) {
        tracing::debug!(items = state.items.len(), total = state.total(), "report displayed");
        println!("{}", render_report(&request, &state.items));
    }
}

#[cfg(feature = "xlsx")]
fn export_current(settings: &Settings, state: &ReportState) {
    let Some(request) = state.shown.filter(|_| state.generated && !state.loading) else {
        println!("No report generated yet.");
        return;
    };
    let dir = crate::cli::report::export_dir(settings, None);
    match crate::export::export_report(&request, &state.items, &dir) {
        Ok(path) => println!("Wrote {}", path.display()),
        Err(e) => eprintln!("{}", format!("Export failed: {e}").red()),
    }
}

#[cfg(not(feature = "xlsx"))]
fn export_current(_settings: &Settings, _state: &ReportState) {
    println!("Spreadsheet export is not available in this build.");
}

fn print_message(message: &ChatMessage) {
    if message.sender == Sender::Assistant {
        println!("{}\n", conversation::render(message, WRAP_WIDTH));
    }
}

pub async fn run() -> Result<()> {
    let session = require_session()?;
    let settings = load_settings();

    let dashboard = Dashboard::new(report_source(&settings)?);
    let mut report = dashboard.subscribe();
    let log = ConversationLog::with_greeting().shared();
    let chat = ChatSession::new(log.clone(), dashboard.clone(), responder(&settings)?);

    let who = session.display_name().unwrap_or("there");
    println!(
        "{} ({} mode) signed in as {who}. Type /export to save the current report, /quit to leave.",
        "Cash Flow Assistant".bold(),
        settings.mode
    );
    let mut messages = {
        let log = conversation::lock(&log);
        log.messages().iter().for_each(print_message);
        log.subscribe()
    };

    // Confirmations still due; the session stays open until they land.
    let mut follow_ups: JoinSet<()> = JoinSet::new();
    let mut input_open = true;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if !input_open && follow_ups.is_empty() && !dashboard.snapshot().loading {
            break;
        }
        tokio::select! {
            biased;

            Ok(message) = messages.recv() => print_message(&message),
            Ok(()) = report.changed() => {
                let state = report.borrow_and_update().clone();
                show_state(&state);
            }
            Some(_) = follow_ups.join_next(), if !follow_ups.is_empty() => {}
            line = lines.next_line(), if input_open => {
                let Some(line) = line? else {
                    input_open = false;
                    continue;
                };
                match line.trim() {
                    "/quit" | "/exit" => input_open = false,
                    "/export" => export_current(&settings, &dashboard.snapshot()),
                    _ => {
                        if let Turn::Dispatched { request, follow_up } = chat.send(&line).await {
                            tracing::debug!(?request, "report requested from chat");
                            follow_ups.spawn(async move {
                                if let Err(e) = follow_up.await {
                                    tracing::warn!(error = %e, "confirmation task failed");
                                }
                            });
                        }
                    }
                }
            }
            else => break,
        }
    }

    // Flush whatever arrived with the last completed task.
    if report.has_changed().unwrap_or(false) {
        let state = report.borrow_and_update().clone();
        show_state(&state);
    }
    while let Ok(message) = messages.try_recv() {
        print_message(&message);
    }

    tracing::debug!(messages = conversation::lock(chat.log()).len(), "chat closed");
    Ok(())
}
