//! Push-update stream over WebSocket.
//!
//! Frames are JSON text. The client sends `RateRequest` subscribe intents;
//! the server sends `StreamMessage` values tagged by `type`.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use catalog_types::{RateRequest, RateStream, RateStreamConnector, StreamError, StreamMessage};

/// Derives the stream endpoint from the rate service's HTTP address.
///
/// `http://host:8080` becomes `ws://host:8080/rates/stream`.
pub fn stream_url(rates_url: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(rates_url)?;
    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => anyhow::bail!("unsupported rate service scheme: {other}"),
    };
    url.set_scheme(scheme)
        .map_err(|_| anyhow::anyhow!("cannot derive stream url from {rates_url}"))?;
    let path = format!("{}/rates/stream", url.path().trim_end_matches('/'));
    url.set_path(&path);
    Ok(url)
}

/// Opens WebSocket subscriptions to a fixed endpoint.
pub struct WsRateConnector {
    url: Url,
}

impl WsRateConnector {
    pub fn new(url: Url) -> Self {
        Self { url }
    }
}

#[async_trait]
impl RateStreamConnector for WsRateConnector {
    async fn connect(&self) -> Result<Box<dyn RateStream>, StreamError> {
        let (socket, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|e| StreamError::Disconnected(format!("connect {}: {e}", self.url)))?;
        tracing::debug!(url = %self.url, "WebSocket handshake complete");
        Ok(Box::new(WsRateStream { socket }))
    }
}

pub struct WsRateStream {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl RateStream for WsRateStream {
    async fn subscribe(&mut self, req: RateRequest) -> Result<(), StreamError> {
        let json =
            serde_json::to_string(&req).map_err(|e| StreamError::Malformed(e.to_string()))?;
        self.socket
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| StreamError::Disconnected(e.to_string()))
    }

    async fn next_message(&mut self) -> Option<Result<StreamMessage, StreamError>> {
        loop {
            let frame = match self.socket.next().await? {
                Ok(frame) => frame,
                Err(e) => return Some(Err(StreamError::Disconnected(e.to_string()))),
            };

            let decoded = match frame {
                Message::Text(text) => serde_json::from_str::<StreamMessage>(text.as_str()),
                Message::Binary(bytes) => serde_json::from_slice::<StreamMessage>(&bytes),
                Message::Close(_) => return None,
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            };

            return Some(decoded.map_err(|e| StreamError::Malformed(e.to_string())));
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.socket.close(None).await {
            tracing::debug!(error = %e, "Error closing rate stream");
        }
    }
}
