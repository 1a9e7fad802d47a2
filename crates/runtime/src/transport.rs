//! Authenticated transports for one discovered credential set.
//!
//! A [`TransportSession`] owns the request/response channel (HTTPS with
//! Basic auth) and can open the push channel (WebSocket on the same port).
//! Sessions are immutable: on reconnection the supervisor tears the old one
//! down and builds a fresh one from the newly located descriptor.
//!
//! Both channels relax certificate validation only because the target is
//! pinned to loopback; see [`crate::tls`] for the boundary.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::handshake::client::generate_key;
use tokio_tungstenite::tungstenite::http::Request;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream, connect_async_tls_with_config};
use tracing::{debug, warn};

use lcu_protocol::{ChampSelectSession, GameflowSession, GamePhase, subscribe_frame};

use crate::diag::ConnectionLog;
use crate::error::{Error, Result};
use crate::lockfile::{ConnectionDescriptor, TransportScheme};
use crate::tls;

/// Fixed username the LCU pairs with the lockfile secret.
const AUTH_USERNAME: &str = "riot";

/// The service only ever listens on loopback.
const LOOPBACK_HOST: &str = "127.0.0.1";

/// Budget for one REST round trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// `GET` → JSON string literal naming the gameflow phase.
pub const PHASE_ENDPOINT: &str = "/lol-gameflow/v1/gameflow-phase";
/// `GET` → champ-select session object.
pub const CHAMP_SELECT_ENDPOINT: &str = "/lol-champ-select/v1/session";
/// `GET` → gameflow session with the queue's game mode nested inside.
pub const GAMEFLOW_SESSION_ENDPOINT: &str = "/lol-gameflow/v1/session";

/// One authenticated session against a discovered descriptor.
pub struct TransportSession {
    client: reqwest::Client,
    base_url: String,
    descriptor: ConnectionDescriptor,
    log: ConnectionLog,
}

impl TransportSession {
    /// Builds the REST side of the session. No network traffic happens here;
    /// reachability is established by the caller's first probe.
    pub fn connect(descriptor: ConnectionDescriptor, log: ConnectionLog) -> Result<Self> {
        if !tls::is_loopback_host(LOOPBACK_HOST) {
            return Err(Error::NonLoopbackEndpoint(LOOPBACK_HOST.to_string()));
        }

        // Self-signed chain tolerance is gated on the loopback pin above.
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(Error::ClientSetup)?;

        let base_url = format!(
            "{}://{LOOPBACK_HOST}:{}",
            descriptor.scheme.as_str(),
            descriptor.port
        );

        Ok(Self {
            client,
            base_url,
            descriptor,
            log,
        })
    }

    /// Issues `GET <endpoint>` and returns the response body.
    ///
    /// Non-2xx, connect errors, and timeouts all come back as typed errors;
    /// nothing here panics and no log line carries the secret.
    pub async fn get_text(&self, endpoint: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .basic_auth(AUTH_USERNAME, Some(&self.descriptor.secret))
            .send()
            .await
            .map_err(|source| {
                if source.is_timeout() {
                    self.log.push(format!("timeout {endpoint}"));
                } else {
                    self.log.push(format!("HTTP error {endpoint}"));
                }
                Error::Request {
                    endpoint: endpoint.to_string(),
                    source,
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(target = "lcu.transport", endpoint, status = status.as_u16(), "request failed");
            self.log
                .push(format!("GET {endpoint} => {}", status.as_u16()));
            return Err(Error::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| Error::Request {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    /// Probes the current gameflow phase.
    pub async fn phase(&self) -> Result<GamePhase> {
        let body = self.get_text(PHASE_ENDPOINT).await?;
        Ok(GamePhase::from_wire(body.trim().trim_matches('"')))
    }

    /// Fetches the current champ-select session.
    pub async fn champ_select(&self) -> Result<ChampSelectSession> {
        let body = self.get_text(CHAMP_SELECT_ENDPOINT).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetches the active game mode, `None` when no queue is active.
    pub async fn game_mode(&self) -> Result<Option<String>> {
        let body = self.get_text(GAMEFLOW_SESSION_ENDPOINT).await?;
        let session: GameflowSession = serde_json::from_str(&body)?;
        Ok(session.game_mode().map(str::to_string))
    }

    /// Opens the event stream and subscribes to `topics`.
    ///
    /// Returns only after every subscribe frame has been accepted by the
    /// socket; failure anywhere drops the partial connection and resolves to
    /// [`Error::StreamUnavailable`], which callers treat as "keep polling".
    pub async fn open_event_stream(&self, topics: &[&str]) -> Result<EventStream> {
        let (ws_scheme, connector) = match self.descriptor.scheme {
            TransportScheme::Https => {
                let config = tls::loopback_client_config(LOOPBACK_HOST)?;
                ("wss", Some(Connector::Rustls(Arc::new(config))))
            }
            TransportScheme::Http => ("ws", Some(Connector::Plain)),
        };
        let url = format!("{ws_scheme}://{LOOPBACK_HOST}:{}/", self.descriptor.port);

        let auth = BASE64.encode(format!("{AUTH_USERNAME}:{}", self.descriptor.secret));
        let request = Request::builder()
            .uri(&url)
            .header("Host", format!("{LOOPBACK_HOST}:{}", self.descriptor.port))
            .header("Connection", "Upgrade")
            .header("Upgrade", "websocket")
            .header("Sec-WebSocket-Version", "13")
            .header("Sec-WebSocket-Key", generate_key())
            .header("Authorization", format!("Basic {auth}"))
            .body(())
            .map_err(|err| Error::StreamUnavailable(format!("request build failed: {err}")))?;

        let (ws, _response) = connect_async_tls_with_config(request, None, false, connector)
            .await
            .map_err(|err| {
                self.log.push("websocket connect failed");
                Error::StreamUnavailable(format!("connect failed: {err}"))
            })?;

        let (mut write, read) = ws.split();
        for topic in topics {
            // A failed subscribe disposes the split halves and with them the
            // socket; the caller sees a plain "stream unavailable".
            write
                .send(Message::Text(subscribe_frame(topic)))
                .await
                .map_err(|err| {
                    self.log.push("websocket subscribe failed");
                    Error::StreamUnavailable(format!("subscribe failed: {err}"))
                })?;
            debug!(target = "lcu.transport", topic, "subscribed");
        }

        self.log.push("websocket connected");
        Ok(EventStream { write, read })
    }
}

impl std::fmt::Debug for TransportSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The descriptor's own Debug already redacts the secret.
        f.debug_struct("TransportSession")
            .field("base_url", &self.base_url)
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Open, subscribed push channel.
///
/// The idle wait in [`next_text`](Self::next_text) is deliberately
/// unbounded: the stream can sit silent for the length of a game. Only
/// connect and REST calls are time-limited.
pub struct EventStream {
    write: WsSink,
    read: WsSource,
}

impl EventStream {
    /// Waits for the next text frame. `None` means the socket closed or
    /// errored and the stream is finished.
    pub async fn next_text(&mut self) -> Option<String> {
        while let Some(message) = self.read.next().await {
            match message {
                Ok(Message::Text(text)) => return Some(text),
                Ok(Message::Close(_)) => return None,
                // Pings are answered by tungstenite itself; binary frames
                // don't occur on this protocol.
                Ok(_) => continue,
                Err(err) => {
                    warn!(target = "lcu.transport", error = %err, "event stream read error");
                    return None;
                }
            }
        }
        None
    }

    /// Closes the socket politely; errors are irrelevant at this point.
    pub async fn close(mut self) {
        let _ = self.write.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lockfile::TransportScheme;

    fn descriptor() -> ConnectionDescriptor {
        ConnectionDescriptor {
            port: 2999,
            secret: "abc123".to_string(),
            scheme: TransportScheme::Https,
        }
    }

    #[test]
    fn session_builds_loopback_base_url() {
        let session = TransportSession::connect(descriptor(), ConnectionLog::new()).unwrap();
        assert_eq!(session.base_url, "https://127.0.0.1:2999");
    }

    #[test]
    fn session_debug_does_not_expose_secret() {
        let session = TransportSession::connect(descriptor(), ConnectionLog::new()).unwrap();
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("abc123"), "secret leaked: {rendered}");
    }

    #[tokio::test]
    async fn rest_call_against_dead_port_is_a_typed_error() {
        // Port 9 (discard) on loopback: nothing is listening in any sane
        // environment, so the request must fail fast and without panicking.
        let session = TransportSession::connect(
            ConnectionDescriptor {
                port: 9,
                secret: "s".to_string(),
                scheme: TransportScheme::Https,
            },
            ConnectionLog::new(),
        )
        .unwrap();

        match session.phase().await {
            Err(Error::Request { endpoint, .. }) => assert_eq!(endpoint, PHASE_ENDPOINT),
            other => panic!("expected request error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stream_open_against_dead_port_is_unavailable() {
        let session = TransportSession::connect(
            ConnectionDescriptor {
                port: 9,
                secret: "s".to_string(),
                scheme: TransportScheme::Https,
            },
            ConnectionLog::new(),
        )
        .unwrap();

        let result = session
            .open_event_stream(&[lcu_protocol::TOPIC_GAMEFLOW_PHASE])
            .await;
        assert!(matches!(result, Err(Error::StreamUnavailable(_))));
    }
}
