//! Interactive chat loop.

use std::io::{self, Write};

use ragchat_core::event_bus::ConversationEvent;
use ragchat_core::session::{ChatEntry, Sender};
use ragchat_core::sources::SourceKind;
use ragchat_core::{AskOutcome, ConversationController};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::command::{parse_line, ReplCommand, HELP};

/// Render one transcript entry for the terminal.
pub fn format_entry(entry: &ChatEntry, bot_name: &str) -> String {
    match entry.sender {
        Sender::Human => format!("you> {}", entry.message),
        Sender::Bot => format!("{bot_name}> {}", entry.message),
    }
}

pub fn print_transcript(entries: &[ChatEntry], bot_name: &str) {
    if entries.is_empty() {
        println!("(no messages yet)");
    }
    for entry in entries {
        println!("{}", format_entry(entry, bot_name));
    }
}

fn source_kinds() -> String {
    SourceKind::ALL
        .iter()
        .map(|kind| format!("  {:<14} {}", kind.as_str(), kind.label()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read lines from stdin until `/quit` or end of input.
pub async fn run(controller: &ConversationController, bot_name: &str) -> io::Result<()> {
    log::info!(
        "Chatting in {} using {}",
        controller.key(),
        controller.model().embedding_model
    );
    let mut events = controller.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Chatting with {bot_name}. Type /help for commands.");
    print_transcript(&controller.transcript(), bot_name);

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        let command = match parse_line(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match command {
            ReplCommand::Empty => continue,
            ReplCommand::Quit => break,
            ReplCommand::Help => println!("{HELP}"),
            ReplCommand::ListSources => println!("{}", source_kinds()),
            ReplCommand::Ask(query) => match controller.submit_ask(&query).await {
                Ok(AskOutcome::ReloadRequired(e)) => {
                    println!("Something went wrong: {e}");
                }
                Ok(AskOutcome::Answered(_)) => {}
                Err(e) => println!("{e}"),
            },
            ReplCommand::AddSource(draft) => {
                if let Err(e) = controller.submit_add_source(draft).await {
                    println!("{e}");
                }
            }
        }

        render_events(controller, &mut events, bot_name);
    }

    Ok(())
}

/// Print what changed since the last prompt. Workflows emit all of their
/// events before returning, so draining after each command sees them all.
fn render_events(
    controller: &ConversationController,
    events: &mut broadcast::Receiver<ConversationEvent>,
    bot_name: &str,
) {
    loop {
        match events.try_recv() {
            Ok(ConversationEvent::EntryAppended { entry, .. }) => {
                // The user's own question is already on screen.
                if entry.sender == Sender::Bot {
                    println!("{}", format_entry(&entry, bot_name));
                }
            }
            Ok(ConversationEvent::ReloadRequested) => {
                println!("Reloading conversation...");
                let transcript = controller.reload();
                print_transcript(&transcript, bot_name);
            }
            Ok(_) => {}
            Err(TryRecvError::Lagged(missed)) => {
                log::warn!("Missed {missed} conversation events");
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
}
