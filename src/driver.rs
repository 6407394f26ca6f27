use crate::attempt::{AttemptState, ClosedOutcome, ConnectionAttempt, MessageOutcome, MessageVerdict};
use crate::config::DriverConfig;
use crate::endpoint::TargetEndpoint;
use crate::error::Error;
use crate::message::Payload;
use crate::scenario::Scenario;
use futures::{SinkExt, StreamExt};
use log::*;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Drives a single WebSocket session through a scenario, in strict lock-step:
/// message N+1 is only written after the response (or failure) of message N.
pub struct ConnectionDriver {
    id: usize,
    endpoint: TargetEndpoint,
    config: DriverConfig,
    attempt_timeout: Option<Duration>,
}

impl ConnectionDriver {
    pub fn new(id: usize, endpoint: TargetEndpoint, config: DriverConfig) -> Self {
        Self {
            id,
            endpoint,
            config,
            attempt_timeout: None,
        }
    }

    // Bounds the whole attempt, expiry fails this attempt only
    pub fn with_attempt_timeout(mut self, attempt_timeout: Option<Duration>) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    pub async fn run(&self, scenario: &Scenario) -> ConnectionAttempt {
        let deadline = self.attempt_timeout.map(|limit| Instant::now() + limit);
        let uri = self.endpoint.uri();
        let mut attempt = ConnectionAttempt::new(self.id, &uri, &scenario.name);

        attempt.transition(AttemptState::Connecting);
        let mut ws = match self.connect(&uri, deadline).await {
            Ok(ws) => ws,
            Err(err) => {
                error!("attempt {}: could not connect to {}: {}", self.id, uri, err);
                let reason = err.to_string();
                for index in 0..scenario.len() {
                    attempt.record(unanswered(index, false, &reason));
                }
                attempt.error = Some(err);
                attempt.transition(AttemptState::ConnectFailed);
                return attempt;
            }
        };
        attempt.transition(AttemptState::Connected);
        info!("attempt {}: connected to {}", self.id, uri);

        // Once the connection breaks, every remaining message fails without being sent
        let mut broken: Option<String> = None;

        for (index, step) in scenario.steps.iter().enumerate() {
            if let Some(reason) = &broken {
                attempt.record(unanswered(index, false, reason));
                continue;
            }

            attempt.transition(AttemptState::SendingMessage(index));
            debug!("attempt {}: sending #{} {}", self.id, index, step.payload);
            let started = Instant::now();

            if let Err(err) = ws.send(step.payload.clone().into_message()).await {
                let err = Error::from(err);
                error!("attempt {}: failed to send message #{}: {}", self.id, index, err);
                attempt.record(unanswered(index, false, &err.to_string()));
                broken = Some(err.to_string());
                attempt.error = Some(err);
                continue;
            }

            attempt.transition(AttemptState::AwaitingResponse(index));
            match self.await_response(&mut ws, deadline).await {
                Ok(received) => {
                    let round_trip = started.elapsed();
                    let verdict = step.predicate.evaluate(&step.payload, &received);
                    if verdict.is_match() {
                        debug!("attempt {}: #{} matched in {:?}", self.id, index, round_trip);
                    } else {
                        warn!("attempt {}: message #{} {}", self.id, index, verdict);
                    }
                    attempt.record(MessageOutcome {
                        index,
                        sent: true,
                        verdict,
                        round_trip: Some(round_trip),
                    });
                }
                Err(err) => {
                    error!("attempt {}: message #{} got no response: {}", self.id, index, err);
                    attempt.record(unanswered(index, true, &err.to_string()));
                    broken = Some(err.to_string());
                    attempt.error = Some(err);
                }
            }
        }

        if broken.is_none() {
            if let Err(err) = ws.close(None).await {
                debug!("attempt {}: close handshake failed: {}", self.id, err);
            }
        }

        let outcome = if attempt.error.is_none() && attempt.messages_matched() == scenario.len() {
            ClosedOutcome::Success
        } else {
            ClosedOutcome::Failure
        };
        attempt.transition(AttemptState::Closed(outcome));
        attempt
    }

    async fn connect(&self, uri: &str, deadline: Option<Instant>) -> Result<WsStream, Error> {
        open_connection(uri, budget(self.config.connect_timeout, deadline)).await
    }

    async fn await_response(
        &self,
        ws: &mut WsStream,
        deadline: Option<Instant>,
    ) -> Result<Payload, Error> {
        let limit = budget(self.config.response_timeout, deadline);
        bounded(limit, next_payload(ws), Error::ResponseTimeout).await?
    }
}

/// Opens a WebSocket connection, failing with `ConnectTimeout` once `limit` is
/// exceeded and with `ConnectionRefused` when nothing listens on the peer.
pub async fn open_connection(uri: &str, limit: Option<Duration>) -> Result<WsStream, Error> {
    let result = bounded(limit, connect_async(uri), Error::ConnectTimeout).await?;

    match result {
        Ok((ws, _)) => Ok(ws),
        Err(err) => {
            let err = Error::from(err);
            if err.is_refused() {
                Err(Error::ConnectionRefused(String::from(uri)))
            } else {
                Err(err)
            }
        }
    }
}

// Reads until the next data frame, control frames are left to the library
pub async fn next_payload(ws: &mut WsStream) -> Result<Payload, Error> {
    while let Some(message) = ws.next().await {
        match message? {
            Message::Close(frame) => {
                debug!("peer sent close frame: {:?}", frame);
                return Err(Error::ConnectionClosed);
            }
            message => {
                if let Some(payload) = Payload::from_message(message) {
                    return Ok(payload);
                }
            }
        }
    }
    Err(Error::ConnectionClosed)
}

fn unanswered(index: usize, sent: bool, reason: &str) -> MessageOutcome {
    MessageOutcome {
        index,
        sent,
        verdict: MessageVerdict::Failed(String::from(reason)),
        round_trip: None,
    }
}

// The tighter of a per-operation timeout and whatever is left of the attempt deadline
fn budget(limit: Option<Duration>, deadline: Option<Instant>) -> Option<Duration> {
    let remaining = deadline.map(|deadline| deadline.saturating_duration_since(Instant::now()));
    match (limit, remaining) {
        (Some(limit), Some(remaining)) => Some(limit.min(remaining)),
        (limit, remaining) => limit.or(remaining),
    }
}

async fn bounded<F: Future>(
    limit: Option<Duration>,
    future: F,
    on_elapsed: fn(Duration) -> Error,
) -> Result<F::Output, Error> {
    match limit {
        Some(limit) => timeout(limit, future).await.map_err(|_| on_elapsed(limit)),
        None => Ok(future.await),
    }
}
