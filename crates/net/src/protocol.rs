//! Wire message shapes
//!
//! Every message is a single string. Notices carry a fixed 4-character tag
//! followed by a display name; anything else is a chat line.

/// Tag of a name announcement
pub const NAME_TAG: &str = "name";

/// Tag of a leave notice
pub const EXIT_TAG: &str = "exit";

/// A classified protocol message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Client announces its display name
    Name(String),
    /// Client is about to disconnect
    Exit(String),
    /// Plain chat line, delivered as-is
    Chat(String),
}

impl Message {
    /// Classify a raw wire string.
    ///
    /// A tag with nothing after it is treated as chat.
    pub fn parse(raw: &str) -> Self {
        if let Some(name) = raw.strip_prefix(NAME_TAG).filter(|n| !n.is_empty()) {
            Message::Name(name.to_string())
        } else if let Some(name) = raw.strip_prefix(EXIT_TAG).filter(|n| !n.is_empty()) {
            Message::Exit(name.to_string())
        } else {
            Message::Chat(raw.to_string())
        }
    }

    /// Encode to the wire string
    pub fn encode(&self) -> String {
        match self {
            Message::Name(name) => format!("{}{}", NAME_TAG, name),
            Message::Exit(name) => format!("{}{}", EXIT_TAG, name),
            Message::Chat(line) => line.clone(),
        }
    }
}

/// Broadcast text announcing a new member
pub fn join_notice(name: &str) -> String {
    format!("{} has joined the chat", name)
}

/// Broadcast text announcing a departure
pub fn leave_notice(name: &str) -> String {
    format!("{} has left the chat", name)
}

/// Chat line with the sender prefix clients attach
pub fn chat_line(name: &str, text: &str) -> String {
    format!("<{}> {}", name, text)
}
