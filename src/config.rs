use crate::error::Error;
use std::time::Duration;

const DEFAULT_TIMEOUT: u64 = 10;

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub connect_timeout: Option<Duration>,
    pub response_timeout: Option<Duration>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            connect_timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT)),
            response_timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadConfig {
    pub connections: usize,
    pub messages_per_connection: usize,
    pub message_size: usize,
    // Upper bound for a whole attempt, on top of the per-response timeout
    pub attempt_timeout: Option<Duration>,
    pub driver: DriverConfig,
}

impl Default for LoadConfig {
    fn default() -> Self {
        LoadConfig {
            connections: 10,
            messages_per_connection: 5,
            message_size: 32,
            attempt_timeout: None,
            driver: DriverConfig::default(),
        }
    }
}

impl LoadConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.connections == 0 {
            return Err(Error::InvalidConfig(String::from(
                "connections must be greater than zero",
            )));
        }
        if self.messages_per_connection == 0 {
            return Err(Error::InvalidConfig(String::from(
                "messages per connection must be greater than zero",
            )));
        }
        Ok(())
    }
}
