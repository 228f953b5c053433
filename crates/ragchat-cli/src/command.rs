//! Parsing of lines typed into the chat loop.

use std::fmt;

use ragchat_core::sources::{SourceDraft, SourceKind};

/// What a line of input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Blank line; nothing to do.
    Empty,
    Ask(String),
    AddSource(SourceDraft),
    ListSources,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    UnknownCommand(String),
    MissingKind,
    MissingLocator(SourceKind),
    UnknownKind(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnknownCommand(cmd) => {
                write!(f, "Unknown command: /{cmd} (try /help)")
            }
            ParseError::MissingKind => write!(f, "Usage: /add <kind> <locator>"),
            ParseError::MissingLocator(kind) => {
                write!(f, "Nothing to add: /add {kind} needs a locator")
            }
            ParseError::UnknownKind(kind) => {
                write!(f, "Unknown source kind: {kind} (see /sources)")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse one line of input.
///
/// Lines starting with `/` are commands; anything else is a question, sent
/// as typed. The locator of `/add` is everything after the kind, so text
/// sources may contain spaces.
pub fn parse_line(line: &str) -> Result<ReplCommand, ParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(ReplCommand::Empty);
    }

    let Some(command) = trimmed.strip_prefix('/') else {
        return Ok(ReplCommand::Ask(line.trim_end_matches(['\r', '\n']).to_string()));
    };

    let (name, rest) = split_word(command);
    match name {
        "quit" | "exit" | "q" => Ok(ReplCommand::Quit),
        "sources" => Ok(ReplCommand::ListSources),
        "help" | "?" => Ok(ReplCommand::Help),
        "add" => parse_add(rest),
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

fn parse_add(args: &str) -> Result<ReplCommand, ParseError> {
    let (kind, locator) = split_word(args);
    if kind.is_empty() {
        return Err(ParseError::MissingKind);
    }

    let kind: SourceKind = kind
        .parse()
        .map_err(|_| ParseError::UnknownKind(kind.to_string()))?;
    if locator.is_empty() {
        return Err(ParseError::MissingLocator(kind));
    }

    Ok(ReplCommand::AddSource(SourceDraft::new(kind, locator)))
}

/// Split off the first whitespace-delimited word; the remainder is trimmed.
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(at) => (&s[..at], s[at..].trim()),
        None => (s, ""),
    }
}

pub const HELP: &str = "\
Type a question and press enter to ask the bot.

Commands:
  /add <kind> <locator>   add a source (see /sources for kinds)
  /sources                list source kinds
  /help                   show this help
  /quit                   leave the chat";
