use std::fmt;
use tokio_tungstenite::tungstenite::Message;

const MAX_DISPLAYED_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Text,
    Binary,
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameKind::Text => write!(f, "text"),
            FrameKind::Binary => write!(f, "binary"),
        }
    }
}

// A data frame as the harness sees it; control frames never become a Payload
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    // Converts a received Message into a Payload, control frames yield None
    pub fn from_message(message: Message) -> Option<Self> {
        match message {
            Message::Text(text) => Some(Payload::Text(text)),
            Message::Binary(data) => Some(Payload::Binary(data)),
            _ => None,
        }
    }

    pub fn into_message(self) -> Message {
        match self {
            Payload::Text(text) => Message::Text(text),
            Payload::Binary(data) => Message::Binary(data),
        }
    }

    pub fn kind(&self) -> FrameKind {
        match self {
            Payload::Text(_) => FrameKind::Text,
            Payload::Binary(_) => FrameKind::Binary,
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Text(text) => write!(f, "{:?}", text),
            Payload::Binary(data) => {
                let shown = &data[..data.len().min(MAX_DISPLAYED_BYTES)];
                write!(f, "<{} bytes> {:02x?}", data.len(), shown)
            }
        }
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(String::from(text))
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(data: Vec<u8>) -> Self {
        Payload::Binary(data)
    }
}
