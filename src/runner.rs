use crate::attempt::{AttemptState, ConnectionAttempt};
use crate::config::LoadConfig;
use crate::driver::ConnectionDriver;
use crate::endpoint::TargetEndpoint;
use crate::error::Error;
use crate::report::RunReport;
use crate::scenario::Scenario;
use futures::future::join_all;
use log::*;
use std::time::Instant;

/// Fans out `connections` drivers at once against the same endpoint, each one
/// running its own burst scenario, and waits for every one of them to reach a
/// terminal state before building the report.
pub struct LoadRunner {
    endpoint: TargetEndpoint,
    config: LoadConfig,
}

impl LoadRunner {
    pub fn new(endpoint: TargetEndpoint, config: LoadConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self { endpoint, config })
    }

    pub async fn run(&self) -> RunReport {
        let LoadConfig {
            connections,
            messages_per_connection,
            message_size,
            ..
        } = self.config;

        info!(
            "starting load run: {} connections x {} messages against {}",
            connections, messages_per_connection, self.endpoint
        );

        let start = Instant::now();

        // No throttling: every connection is spawned before any of them is awaited
        let handles: Vec<_> = (1..=connections)
            .map(|id| {
                let driver = ConnectionDriver::new(id, self.endpoint.clone(), self.config.driver.clone())
                    .with_attempt_timeout(self.config.attempt_timeout);
                let scenario =
                    Scenario::burst(messages_per_connection, message_size, &self.endpoint.transform);
                tokio::spawn(async move { driver.run(&scenario).await })
            })
            .collect();

        // Join barrier; a panicked task only loses its own attempt
        let uri = self.endpoint.uri();
        let attempts: Vec<ConnectionAttempt> = join_all(handles)
            .await
            .into_iter()
            .zip(1..)
            .map(|(joined, id)| match joined {
                Ok(attempt) => attempt,
                Err(err) => {
                    error!("connection task {} did not finish: {}", id, err);
                    let mut attempt = ConnectionAttempt::new(id, &uri, "burst");
                    attempt.error = Some(Error::TaskAborted(err.to_string()));
                    attempt.transition(AttemptState::ConnectFailed);
                    attempt
                }
            })
            .collect();

        let report = RunReport::from_attempts(attempts, start.elapsed());
        info!(
            "load run finished: {}/{} connections succeeded",
            report.successful_connections, report.total_connections
        );
        report
    }
}
