use crate::endpoint::ResponseTransform;
use crate::error::Error;
use crate::message::Payload;
use futures::{SinkExt, StreamExt};
use log::*;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;

pub const CHAT_PREFIX: &str = "Chat response: ";

type Routes = HashMap<String, ResponseTransform>;

/// Stand-in server for the echo/chat contract. Each registered path answers
/// data frames with its own transform; any other path is refused with a 404
/// during the upgrade.
pub struct ReferenceServer {
    listener: TcpListener,
    routes: Routes,
}

impl ReferenceServer {
    // Binds with the default routes: `/` echoes, `/chat` prefixes
    pub async fn bind(addr: &str) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr).await?;
        let mut routes = Routes::new();
        routes.insert(String::from("/"), ResponseTransform::Identity);
        routes.insert(
            String::from("/chat"),
            ResponseTransform::Prefix(String::from(CHAT_PREFIX)),
        );
        Ok(Self { listener, routes })
    }

    // Adds or replaces a route
    pub fn with_route(mut self, path: &str, transform: ResponseTransform) -> Self {
        self.routes.insert(String::from(path), transform);
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self) -> Result<(), Error> {
        let routes = Arc::new(self.routes);
        info!("Reference server listening on: {}", self.listener.local_addr()?);

        loop {
            let (stream, peer) = self.listener.accept().await?;
            info!("Peer address: {}", peer);
            tokio::spawn(handle_connection(peer, stream, routes.clone()));
        }
    }

    pub fn spawn(self) -> JoinHandle<Result<(), Error>> {
        tokio::spawn(self.run())
    }
}

async fn handle_connection(peer: SocketAddr, stream: TcpStream, routes: Arc<Routes>) {
    let mut selected: Option<ResponseTransform> = None;

    let callback = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let path = request.uri().path();
        match routes.get(path) {
            Some(transform) => {
                debug!("{} upgraded on {}", peer, path);
                selected = Some(transform.clone());
                Ok(response)
            }
            None => {
                warn!("{} requested unknown route {}", peer, path);
                let mut rejection = ErrorResponse::new(Some(format!("no route for {}", path)));
                *rejection.status_mut() = StatusCode::NOT_FOUND;
                Err(rejection)
            }
        }
    };

    let mut ws = match accept_hdr_async(stream, callback).await {
        Ok(ws) => ws,
        Err(err) => {
            error!("Error when performing handshake with {}: {}", peer, err);
            return;
        }
    };
    let transform = selected.unwrap_or_default();

    while let Some(result) = ws.next().await {
        let message = match result {
            Ok(message) => message,
            Err(err) => {
                error!("Received error from {}: {}", peer, err);
                break;
            }
        };
        // Close replies are handled by the library, the stream ends right after
        let payload = match Payload::from_message(message) {
            Some(payload) => payload,
            None => continue,
        };
        let reply: Message = transform.apply(&payload).into_message();
        if ws.send(reply).await.is_err() {
            error!("Failed to send message to {}", peer);
            break;
        }
    }
    info!("Client {} disconnected", peer);
}
