use crate::error::Error;
use crate::message::Payload;
use std::fmt;
use url::Url;

const TEMPLATE_PLACEHOLDER: &str = "{}";

/// How a server under test is expected to answer a data frame.
///
/// The harness never hardcodes the responses of a route: every endpoint carries
/// its own transform, and predicates compare the response against
/// `transform.apply(payload)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResponseTransform {
    /// Frames come back unmodified, with the same frame type.
    #[default]
    Identity,
    /// Frames come back with a literal prefix, e.g. `"Chat response: "`.
    Prefix(String),
    /// Every `{}` in the template is replaced by the payload.
    Template(String),
}

impl ResponseTransform {
    pub fn apply(&self, payload: &Payload) -> Payload {
        match (self, payload) {
            (ResponseTransform::Identity, payload) => payload.clone(),
            (ResponseTransform::Prefix(prefix), Payload::Text(text)) => {
                Payload::Text(format!("{}{}", prefix, text))
            }
            (ResponseTransform::Prefix(prefix), Payload::Binary(data)) => {
                let mut out = Vec::with_capacity(prefix.len() + data.len());
                out.extend_from_slice(prefix.as_bytes());
                out.extend_from_slice(data);
                Payload::Binary(out)
            }
            (ResponseTransform::Template(template), Payload::Text(text)) => {
                Payload::Text(template.replace(TEMPLATE_PLACEHOLDER, text))
            }
            (ResponseTransform::Template(template), Payload::Binary(data)) => Payload::Binary(
                template
                    .replace(TEMPLATE_PLACEHOLDER, &String::from_utf8_lossy(data))
                    .into_bytes(),
            ),
        }
    }
}

/// A WebSocket endpoint speaking the echo/chat contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEndpoint {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub transform: ResponseTransform,
}

impl TargetEndpoint {
    pub fn new(host: &str, port: u16, path: &str, transform: ResponseTransform) -> Self {
        Self {
            host: String::from(host),
            port,
            path: normalize_path(path),
            transform,
        }
    }

    pub fn echo(host: &str, port: u16) -> Self {
        Self::new(host, port, "/", ResponseTransform::Identity)
    }

    // Parses a ws:// URL, keeping the query string as part of the path
    pub fn parse(ws_url: &str, transform: ResponseTransform) -> Result<Self, Error> {
        let parsed_url = Url::parse(ws_url)?;

        let default_port: u16 = match parsed_url.scheme() {
            "ws" => 80,
            _ => return Err(Error::InvalidSchemeURL),
        };

        let host = parsed_url.host_str().ok_or(Error::URLNoHost)?;
        let port = parsed_url.port().unwrap_or(default_port);

        let path = match parsed_url.query() {
            Some(query) => format!("{}?{}", parsed_url.path(), query),
            None => parsed_url.path().to_string(),
        };

        Ok(Self::new(host, port, &path, transform))
    }

    pub fn with_path(&self, path: &str, transform: ResponseTransform) -> Self {
        Self::new(&self.host, self.port, path, transform)
    }

    pub fn uri(&self) -> String {
        format!("ws://{}:{}{}", self.host, self.port, self.path)
    }
}

impl fmt::Display for TargetEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri())
    }
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        String::from(path)
    } else {
        format!("/{}", path)
    }
}
