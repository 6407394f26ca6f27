use clap::Parser;
use log::*;
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::BufReader;
use ws_harness::config::{DriverConfig, LoadConfig};
use ws_harness::endpoint::{ResponseTransform, TargetEndpoint};
use ws_harness::error::Error;
use ws_harness::interactive::run_interactive;
use ws_harness::runner::LoadRunner;
use ws_harness::server::{ReferenceServer, CHAT_PREFIX};
use ws_harness::suite::run_suite;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Full ws:// URL of the echo route, overrides --host, --port and --path
    #[arg(long)]
    url: Option<String>,
    /// Host of the server under test
    #[arg(long, default_value = "localhost")]
    host: String,
    #[arg(short, long, default_value_t = 8765)]
    port: u16,
    /// Echo route
    #[arg(long, default_value = "/")]
    path: String,
    /// Prefix the echo route adds to every message, e.g. "Echo: " (default: exact echo)
    #[arg(long)]
    echo_prefix: Option<String>,
    /// Expected echo response as a template, `{}` is replaced by the message (overrides --echo-prefix)
    #[arg(long)]
    echo_template: Option<String>,
    /// Chat route
    #[arg(long, default_value = "/chat")]
    chat_path: String,
    /// Prefix the chat route adds to every message
    #[arg(long, default_value = CHAT_PREFIX)]
    chat_prefix: String,
    /// Expected chat response as a template, `{}` is replaced by the message (overrides --chat-prefix)
    #[arg(long)]
    chat_template: Option<String>,
    /// Run the concurrent load test instead of the echo/chat suite
    #[arg(short, long)]
    multi: bool,
    #[arg(short, long, default_value_t = 10)]
    connections: usize,
    /// Messages per connection
    #[arg(short = 'n', long, default_value_t = 5)]
    messages: usize,
    /// Characters per load test message
    #[arg(long, default_value_t = 32)]
    message_size: usize,
    /// Per-response timeout in milliseconds, 0 waits forever
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,
    /// Upper bound for a whole load test connection in milliseconds
    #[arg(long)]
    attempt_timeout_ms: Option<u64>,
    /// Send lines from stdin on ROUTE and print the responses
    #[arg(short, long, value_name = "ROUTE", num_args = 0..=1, default_missing_value = "/")]
    interactive: Option<String>,
    /// Run the reference echo/chat server on --port instead of testing one
    #[arg(long)]
    serve: bool,
}

impl Cli {
    fn driver_config(&self) -> DriverConfig {
        let timeout = match self.timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        DriverConfig {
            connect_timeout: timeout,
            response_timeout: timeout,
        }
    }

    fn chat_transform(&self) -> ResponseTransform {
        match &self.chat_template {
            Some(template) => ResponseTransform::Template(template.clone()),
            None => ResponseTransform::Prefix(self.chat_prefix.clone()),
        }
    }

    fn echo_transform(&self) -> ResponseTransform {
        match (&self.echo_template, &self.echo_prefix) {
            (Some(template), _) => ResponseTransform::Template(template.clone()),
            (None, Some(prefix)) => ResponseTransform::Prefix(prefix.clone()),
            (None, None) => ResponseTransform::Identity,
        }
    }

    fn echo_endpoint(&self) -> Result<TargetEndpoint, Error> {
        match &self.url {
            Some(url) => TargetEndpoint::parse(url, self.echo_transform()),
            None => Ok(TargetEndpoint::new(
                &self.host,
                self.port,
                &self.path,
                self.echo_transform(),
            )),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{}", err);
            if err.is_refused() {
                eprintln!("✗ Connection refused. Is the server running?");
            } else {
                eprintln!("✗ Error: {}", err);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool, Error> {
    let echo = cli.echo_endpoint()?;

    if cli.serve {
        let server = ReferenceServer::bind(&format!("{}:{}", echo.host, echo.port)).await?
            .with_route(&echo.path, echo.transform.clone())
            .with_route(&cli.chat_path, cli.chat_transform());
        server.run().await?;
        return Ok(true);
    }

    if let Some(route) = &cli.interactive {
        let endpoint = echo.with_path(route, ResponseTransform::Identity);
        println!("=== Interactive Mode: {} ===", endpoint);
        let stdin = BufReader::new(tokio::io::stdin());
        run_interactive(&endpoint, &cli.driver_config(), stdin, tokio::io::stdout()).await?;
        return Ok(true);
    }

    if cli.multi {
        let config = LoadConfig {
            connections: cli.connections,
            messages_per_connection: cli.messages,
            message_size: cli.message_size,
            attempt_timeout: cli.attempt_timeout_ms.map(Duration::from_millis),
            driver: cli.driver_config(),
        };
        let report = LoadRunner::new(echo, config)?.run().await;
        println!("{}", report);
        return Ok(report.all_succeeded());
    }

    let chat = echo.with_path(&cli.chat_path, cli.chat_transform());
    println!("{}", "=".repeat(60));
    println!("WebSocket Client Test Suite");
    println!("{}", "=".repeat(60));
    let report = run_suite(&echo, &chat, &cli.driver_config()).await?;
    println!("{}", report);
    Ok(report.passed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_flags() {
        let cli = Cli::try_parse_from(["ws-harness", "-p", "9000", "-m", "-c", "3", "-n", "2"]).unwrap();
        assert_eq!(cli.port, 9000);
        assert!(cli.multi);
        assert_eq!(cli.connections, 3);
        assert_eq!(cli.messages, 2);

        let echo = cli.echo_endpoint().unwrap();
        assert_eq!(echo.uri(), "ws://localhost:9000/");
        assert_eq!(echo.transform, ResponseTransform::Identity);
    }

    #[test]
    fn test_url_and_echo_prefix() {
        let cli = Cli::try_parse_from([
            "ws-harness",
            "--url",
            "ws://127.0.0.1:9000/echo",
            "--echo-prefix",
            "Echo: ",
        ])
        .unwrap();

        let echo = cli.echo_endpoint().unwrap();
        assert_eq!(echo.host, "127.0.0.1");
        assert_eq!(echo.port, 9000);
        assert_eq!(echo.path, "/echo");
        assert_eq!(echo.transform, ResponseTransform::Prefix(String::from("Echo: ")));
    }

    #[test]
    fn test_invalid_url() {
        let cli = Cli::try_parse_from(["ws-harness", "--url", "http://127.0.0.1:9000"]).unwrap();
        assert!(matches!(cli.echo_endpoint(), Err(Error::InvalidSchemeURL)));
    }
}
