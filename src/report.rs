use crate::attempt::{AttemptState, AttemptStatus, ConnectionAttempt};
use std::fmt;
use std::time::Duration;

/// Aggregated statistics over a set of connection attempts. Every count is a sum
/// over `attempts`, so no message is counted twice.
#[derive(Debug)]
pub struct RunReport {
    pub attempts: Vec<ConnectionAttempt>,
    pub total_connections: usize,
    pub successful_connections: usize,
    pub failed_connections: usize,
    pub refused_connections: usize,
    // Frames actually written to a socket
    pub total_messages_sent: usize,
    // Responses of succeeded attempts, so always successful_connections x K
    pub total_messages_received: usize,
    // Responses that satisfied their predicate, failed attempts included
    pub total_messages_matched: usize,
    pub elapsed: Duration,
    pub average_round_trip: Option<Duration>,
}

impl RunReport {
    pub fn from_attempts(mut attempts: Vec<ConnectionAttempt>, elapsed: Duration) -> Self {
        attempts.sort_by_key(|attempt| attempt.id);

        let count = |status: AttemptStatus| {
            attempts
                .iter()
                .filter(|attempt| attempt.status() == status)
                .count()
        };
        let successful_connections = count(AttemptStatus::Succeeded);
        let failed_connections = count(AttemptStatus::Failed);
        let refused_connections = count(AttemptStatus::Refused);

        let total_messages_sent: usize = attempts.iter().map(|a| a.messages_sent()).sum();
        let total_messages_received: usize = attempts
            .iter()
            .filter(|a| a.succeeded())
            .map(|a| a.messages_matched())
            .sum();
        let total_messages_matched: usize = attempts.iter().map(|a| a.messages_matched()).sum();

        let answered: usize = attempts
            .iter()
            .map(|a| a.outcomes.iter().filter(|o| o.round_trip.is_some()).count())
            .sum();
        let total_round_trip: Duration = attempts.iter().map(|a| a.total_round_trip()).sum();
        let average_round_trip = match answered {
            0 => None,
            n => Some(total_round_trip / n as u32),
        };

        Self {
            total_connections: attempts.len(),
            successful_connections,
            failed_connections,
            refused_connections,
            total_messages_sent,
            total_messages_received,
            total_messages_matched,
            elapsed,
            average_round_trip,
            attempts,
        }
    }

    /// Verified round trips per second of wall-clock time.
    pub fn throughput(&self) -> f64 {
        let seconds = self.elapsed.as_secs_f64();
        if seconds == 0.0 {
            return 0.0;
        }
        self.total_messages_received as f64 / seconds
    }

    pub fn all_succeeded(&self) -> bool {
        self.total_connections > 0 && self.successful_connections == self.total_connections
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(f, "Run Report")?;
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(
            f,
            "Connections: {} total, {} succeeded, {} failed, {} refused",
            self.total_connections,
            self.successful_connections,
            self.failed_connections,
            self.refused_connections
        )?;
        writeln!(f, "Messages sent: {}", self.total_messages_sent)?;
        writeln!(f, "Messages received: {}", self.total_messages_received)?;
        writeln!(f, "Responses matched: {}", self.total_messages_matched)?;
        writeln!(f, "Elapsed: {:.3}s", self.elapsed.as_secs_f64())?;
        writeln!(f, "Throughput: {:.1} messages/second", self.throughput())?;
        match self.average_round_trip {
            Some(latency) => writeln!(
                f,
                "Average round trip: {:.3} ms",
                latency.as_secs_f64() * 1000.0
            )?,
            None => writeln!(f, "Average round trip: n/a")?,
        }

        for attempt in self.attempts.iter().filter(|attempt| !attempt.succeeded()) {
            write_attempt_failures(f, attempt)?;
        }
        Ok(())
    }
}

// One line per attempt plus one line per failed message, enough to diagnose without rerunning
pub fn write_attempt_failures(f: &mut fmt::Formatter<'_>, attempt: &ConnectionAttempt) -> fmt::Result {
    write!(
        f,
        "  ✗ attempt {} ({}) {}",
        attempt.id,
        attempt.uri,
        attempt.status()
    )?;
    match &attempt.error {
        Some(err) => writeln!(f, ": {}", err)?,
        None => writeln!(f)?,
    }
    if attempt.state == AttemptState::ConnectFailed {
        return Ok(());
    }
    for outcome in attempt.failures() {
        writeln!(f, "      message #{}: {}", outcome.index, outcome.verdict)?;
    }
    Ok(())
}
