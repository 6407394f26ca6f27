use crate::attempt::{AttemptStatus, ConnectionAttempt};
use crate::config::DriverConfig;
use crate::driver::ConnectionDriver;
use crate::endpoint::TargetEndpoint;
use crate::error::Error;
use crate::report::write_attempt_failures;
use crate::scenario::Scenario;
use log::*;
use std::fmt;

/// Result of the automated single-connection sequence.
#[derive(Debug)]
pub struct SuiteReport {
    pub attempts: Vec<ConnectionAttempt>,
}

impl SuiteReport {
    pub fn passed(&self) -> bool {
        self.attempts.iter().all(|attempt| attempt.succeeded())
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for attempt in &self.attempts {
            writeln!(f, "\n=== {} scenario: {} ===", attempt.scenario, attempt.uri)?;
            if attempt.succeeded() {
                writeln!(
                    f,
                    "  ✓ {}/{} messages matched",
                    attempt.messages_matched(),
                    attempt.outcomes.len()
                )?;
            } else {
                write_attempt_failures(f, attempt)?;
            }
        }
        let verdict = if self.passed() { "passed" } else { "FAILED" };
        write!(f, "\nSuite {}", verdict)
    }
}

/// Runs the echo scenario then the chat scenario, one connection each, in order.
///
/// A refused connection aborts the whole suite: there is nothing listening, so
/// the caller is expected to exit non-zero. Any other failure is recorded in the
/// report and the suite carries on.
pub async fn run_suite(
    echo: &TargetEndpoint,
    chat: &TargetEndpoint,
    config: &DriverConfig,
) -> Result<SuiteReport, Error> {
    let plan = [
        (echo, Scenario::echo_suite(&echo.transform)),
        (chat, Scenario::chat_suite(&chat.transform)),
    ];

    let mut attempts = Vec::with_capacity(plan.len());
    for (id, (endpoint, scenario)) in plan.into_iter().enumerate() {
        let driver = ConnectionDriver::new(id + 1, endpoint.clone(), config.clone());
        let mut attempt = driver.run(&scenario).await;

        if attempt.status() == AttemptStatus::Refused {
            error!("connection refused by {}, is the server running?", endpoint);
            return Err(attempt
                .error
                .take()
                .unwrap_or_else(|| Error::ConnectionRefused(endpoint.uri())));
        }
        attempts.push(attempt);
    }

    Ok(SuiteReport { attempts })
}
