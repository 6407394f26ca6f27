use crate::config::DriverConfig;
use crate::driver::{next_payload, open_connection, WsStream};
use crate::endpoint::TargetEndpoint;
use crate::error::Error;
use crate::message::Payload;
use futures::SinkExt;
use log::*;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

const QUIT_COMMANDS: [&str; 3] = ["quit", "exit", "q"];

/// Line-oriented session: every input line goes out as a text frame and the
/// response is printed before the next line is read. Returns the number of
/// messages exchanged.
pub async fn run_interactive<R, W>(
    endpoint: &TargetEndpoint,
    config: &DriverConfig,
    input: R,
    mut output: W,
) -> Result<usize, Error>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let uri = endpoint.uri();
    let mut ws: WsStream = open_connection(&uri, config.connect_timeout).await?;
    info!("interactive session connected to {}", uri);
    output
        .write_all(b"Connected! Type messages to send, 'quit' to exit.\n\n")
        .await?;

    let mut lines = input.lines();
    let mut exchanged = 0;

    loop {
        output.write_all(b"You: ").await?;
        output.flush().await?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };
        let line = line.trim();
        if QUIT_COMMANDS.contains(&line.to_lowercase().as_str()) {
            output.write_all(b"Closing connection...\n").await?;
            break;
        }

        ws.send(Message::Text(String::from(line))).await?;
        let response = match config.response_timeout {
            Some(limit) => timeout(limit, next_payload(&mut ws))
                .await
                .map_err(|_| Error::ResponseTimeout(limit))??,
            None => next_payload(&mut ws).await?,
        };
        exchanged += 1;

        let shown = match response {
            Payload::Text(text) => text,
            binary => binary.to_string(),
        };
        output
            .write_all(format!("Server: {}\n\n", shown).as_bytes())
            .await?;
    }

    if let Err(err) = ws.close(None).await {
        debug!("close handshake failed: {}", err);
    }
    output.flush().await?;
    Ok(exchanged)
}
