use crate::error::Error;
use crate::message::{FrameKind, Payload};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosedOutcome {
    Success,
    Failure,
}

// Lifecycle of a single connection attempt; ConnectFailed and Closed are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Idle,
    Connecting,
    ConnectFailed,
    Connected,
    SendingMessage(usize),
    AwaitingResponse(usize),
    Closed(ClosedOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    Succeeded,
    Failed,
    Refused,
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptStatus::Succeeded => write!(f, "succeeded"),
            AttemptStatus::Failed => write!(f, "failed"),
            AttemptStatus::Refused => write!(f, "refused"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageVerdict {
    Matched,
    Mismatch { expected: Payload, actual: Payload },
    UnexpectedFrameType { expected: FrameKind, actual: FrameKind },
    // The message never got a response: the connection closed, timed out or broke
    Failed(String),
}

impl MessageVerdict {
    pub fn is_match(&self) -> bool {
        matches!(self, MessageVerdict::Matched)
    }
}

impl fmt::Display for MessageVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageVerdict::Matched => write!(f, "matched"),
            MessageVerdict::Mismatch { expected, actual } => {
                write!(f, "expected {}, got {}", expected, actual)
            }
            MessageVerdict::UnexpectedFrameType { expected, actual } => {
                write!(f, "expected a {} frame, got a {} frame", expected, actual)
            }
            MessageVerdict::Failed(reason) => write!(f, "no response: {}", reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MessageOutcome {
    pub index: usize,
    // false when the message was never written to the socket
    pub sent: bool,
    pub verdict: MessageVerdict,
    pub round_trip: Option<Duration>,
}

/// Record of one WebSocket session and its scripted exchange.
#[derive(Debug)]
pub struct ConnectionAttempt {
    pub id: usize,
    pub uri: String,
    pub scenario: String,
    pub outcomes: Vec<MessageOutcome>,
    pub state: AttemptState,
    pub trail: Vec<AttemptState>,
    pub error: Option<Error>,
}

impl ConnectionAttempt {
    pub fn new(id: usize, uri: &str, scenario: &str) -> Self {
        Self {
            id,
            uri: String::from(uri),
            scenario: String::from(scenario),
            outcomes: Vec::new(),
            state: AttemptState::Idle,
            trail: vec![AttemptState::Idle],
            error: None,
        }
    }

    pub fn transition(&mut self, state: AttemptState) {
        log::debug!("attempt {}: {:?} -> {:?}", self.id, self.state, state);
        self.state = state;
        self.trail.push(state);
    }

    pub fn record(&mut self, outcome: MessageOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn status(&self) -> AttemptStatus {
        match &self.error {
            Some(err) if err.is_refused() => AttemptStatus::Refused,
            Some(_) => AttemptStatus::Failed,
            None if self.state == AttemptState::Closed(ClosedOutcome::Success) => {
                AttemptStatus::Succeeded
            }
            None => AttemptStatus::Failed,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status() == AttemptStatus::Succeeded
    }

    pub fn messages_sent(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.sent).count()
    }

    pub fn messages_matched(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.verdict.is_match())
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &MessageOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| !outcome.verdict.is_match())
    }

    pub fn total_round_trip(&self) -> Duration {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.round_trip)
            .sum()
    }

    pub fn average_round_trip(&self) -> Option<Duration> {
        let answered = self
            .outcomes
            .iter()
            .filter(|outcome| outcome.round_trip.is_some())
            .count();
        if answered == 0 {
            return None;
        }
        Some(self.total_round_trip() / answered as u32)
    }
}
