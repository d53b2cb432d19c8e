//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the chat session without sending queries
//! to the engine.

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Clear the conversation history.
    Clear,

    /// Show or change the engine URL.
    /// `None` shows the current URL.
    Engine(Option<String>),

    /// Upload a document for analysis.
    Upload(String),

    /// Ask the engine to open a file or folder.
    Open(String),

    /// Show records extracted from uploaded documents.
    Records,

    /// Show the engine's learned facts.
    Facts,

    /// Set the auto-save transcript path.
    TranscriptPath(String),

    /// Clear the auto-save transcript path.
    ClearTranscriptPath,

    /// Save the transcript to a specific file immediately.
    SaveTranscript(String),

    /// Load conversation history from a file.
    LoadTranscript(String),

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Display session statistics (turn count, engine URL, etc.).
    Stats,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular query.
///
/// # Examples
///
/// ```
/// # use omnimind::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/upload quote.pdf").is_some());
/// assert!(parse_command("Find my tax files").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "clear" => ChatCommand::Clear,
        "engine" => ChatCommand::Engine(argument.map(|s| s.to_string())),
        "upload" => match argument {
            Some(path) => ChatCommand::Upload(path.to_string()),
            None => ChatCommand::Invalid("/upload requires a file path".to_string()),
        },
        "open" => match argument {
            Some(path) => ChatCommand::Open(path.to_string()),
            None => ChatCommand::Invalid("/open requires a path".to_string()),
        },
        "records" | "quotes" => ChatCommand::Records,
        "facts" | "knowledge" => ChatCommand::Facts,
        "transcript" => match argument {
            Some(arg) if arg.eq_ignore_ascii_case("clear") => ChatCommand::ClearTranscriptPath,
            Some(arg) => ChatCommand::TranscriptPath(arg.to_string()),
            None => ChatCommand::Invalid("/transcript requires a file path".to_string()),
        },
        "save" => match argument {
            Some(arg) => ChatCommand::SaveTranscript(arg.to_string()),
            None => ChatCommand::Invalid("/save requires a file path".to_string()),
        },
        "load" => match argument {
            Some(arg) => ChatCommand::LoadTranscript(arg.to_string()),
            None => ChatCommand::Invalid("/load requires a file path".to_string()),
        },
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "stats" | "status" => ChatCommand::Stats,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /engine [url]          Show or change the engine URL
  /upload <file>         Upload a document for analysis
  /open <path>           Open a file or folder on the engine's machine
  /records               Show records extracted from uploads
  /facts                 Show what the engine has learned
  /clear                 Clear conversation history
  /transcript <file>     Enable auto-saving transcripts (or 'clear')
  /save <file>           Save the current transcript immediately
  /load <file>           Load a transcript from disk
  /stats                 Show session statistics
  /help                  Show this help message
  /quit                  Exit the chat

Press Ctrl-C while a request is running to cancel it; your query
returns to the input line for correction."#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_clear() {
        assert_eq!(parse_command("/clear"), Some(ChatCommand::Clear));
        assert_eq!(parse_command("/CLEAR"), Some(ChatCommand::Clear));
    }

    #[test]
    fn parse_engine() {
        assert_eq!(
            parse_command("/engine http://localhost:9000"),
            Some(ChatCommand::Engine(Some(
                "http://localhost:9000".to_string()
            )))
        );
        assert_eq!(parse_command("/engine"), Some(ChatCommand::Engine(None)));
    }

    #[test]
    fn parse_upload() {
        assert_eq!(
            parse_command("/upload quotes/acme.pdf"),
            Some(ChatCommand::Upload("quotes/acme.pdf".to_string()))
        );
        assert_eq!(
            parse_command("/upload"),
            Some(ChatCommand::Invalid(
                "/upload requires a file path".to_string()
            ))
        );
    }

    #[test]
    fn parse_open() {
        assert_eq!(
            parse_command("/open /Users/bob/report.pdf"),
            Some(ChatCommand::Open("/Users/bob/report.pdf".to_string()))
        );
        assert!(matches!(
            parse_command("/open"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("requires")
        ));
    }

    #[test]
    fn parse_records_and_facts() {
        assert_eq!(parse_command("/records"), Some(ChatCommand::Records));
        assert_eq!(parse_command("/quotes"), Some(ChatCommand::Records));
        assert_eq!(parse_command("/facts"), Some(ChatCommand::Facts));
        assert_eq!(parse_command("/knowledge"), Some(ChatCommand::Facts));
    }

    #[test]
    fn parse_transcript_commands() {
        assert_eq!(
            parse_command("/transcript chat.json"),
            Some(ChatCommand::TranscriptPath("chat.json".to_string()))
        );
        assert_eq!(
            parse_command("/transcript clear"),
            Some(ChatCommand::ClearTranscriptPath)
        );
        assert_eq!(
            parse_command("/save session.json"),
            Some(ChatCommand::SaveTranscript("session.json".to_string()))
        );
        assert_eq!(
            parse_command("/load session.json"),
            Some(ChatCommand::LoadTranscript("session.json".to_string()))
        );
    }

    #[test]
    fn parse_stats() {
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/status"), Some(ChatCommand::Stats));
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("Find my tax files"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn unknown_command_is_invalid() {
        assert!(matches!(
            parse_command("/frobnicate"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("frobnicate")
        ));
    }

    #[test]
    fn help_text_not_empty() {
        let help = help_text();
        assert!(!help.is_empty());
        assert!(help.contains("/quit"));
        assert!(help.contains("/clear"));
        assert!(help.contains("/upload"));
        assert!(help.contains("/engine"));
    }
}
