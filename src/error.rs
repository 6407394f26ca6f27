use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;
use url::ParseError;

#[derive(Error, Debug)]
pub enum Error {
    // Connection Errors
    #[error("Connection refused by {0}")]
    ConnectionRefused(String),

    #[error("Connection closed by peer before the scenario finished")]
    ConnectionClosed,

    #[error("No response within {0:?}")]
    ResponseTimeout(Duration),

    #[error("Could not connect within {0:?}")]
    ConnectTimeout(Duration),

    #[error("Connection task aborted: {0}")]
    TaskAborted(String),

    // General Errors
    #[error("IO Error happened: {source}")]
    IOError {
        #[from]
        source: io::Error,
    },

    #[error("WebSocket error: {source}")]
    WebSocketError {
        #[from]
        source: WsError,
    },

    // URL Errors
    #[error("{source}")]
    URLParseError {
        #[from]
        source: ParseError,
    },

    #[error("Invalid scheme in WebSocket URL")]
    InvalidSchemeURL,

    #[error("URL has no host")]
    URLNoHost,

    // Configuration Errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    // The wire library wraps socket errors, so a refusal can show up either as a
    // plain io error or nested inside a WebSocket error
    pub fn is_refused(&self) -> bool {
        match self {
            Error::ConnectionRefused(_) => true,
            Error::IOError { source } => source.kind() == io::ErrorKind::ConnectionRefused,
            Error::WebSocketError {
                source: WsError::Io(source),
            } => source.kind() == io::ErrorKind::ConnectionRefused,
            _ => false,
        }
    }

    // Errors that end the exchange on a connection, as opposed to a per-message failure
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            Error::ConnectionClosed
                | Error::WebSocketError {
                    source: WsError::ConnectionClosed | WsError::AlreadyClosed
                }
        )
    }
}
