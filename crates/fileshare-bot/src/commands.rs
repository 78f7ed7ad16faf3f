//! Command parsing

/// Bot commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Upload,
    Batch,
    Caption,
}

impl Command {
    /// Parse the leading command token of a message text.
    ///
    /// Case-insensitive; a `@botname` suffix on the token is accepted.
    pub fn parse(text: &str) -> Option<Command> {
        let token = text.split_whitespace().next()?;
        let name = token.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or_default().to_lowercase();

        match name.as_str() {
            "help" => Some(Command::Help),
            "upload" => Some(Command::Upload),
            "batch" => Some(Command::Batch),
            "caption" => Some(Command::Caption),
            _ => None,
        }
    }
}

/// Text after the command token and the whitespace that follows it.
///
/// Empty when there is nothing after the command; trailing whitespace is
/// kept.
pub fn command_argument(text: &str) -> String {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(end) => text[end..].trim_start().to_string(),
        None => String::new(),
    }
}
