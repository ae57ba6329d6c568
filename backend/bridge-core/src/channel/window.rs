//! Window-style channel binding over a loopback WebSocket.
//!
//! The parent context listens with [`WindowListener`]; the framed context
//! connects with [`connect_window`]. Either way the result is an
//! [`Endpoint`] of kind [`ChannelKind::Window`] whose envelopes travel as
//! JSON text frames.
//!
//! # Security
//!
//! - Binds to loopback only (see [`crate::config::WindowConfig::validate`])
//! - Non-loopback peers are dropped without a handshake

use crate::channel::endpoint::{ChannelKind, Endpoint};
use crate::config::WindowConfig;
use crate::error::channel::ChannelError;
use crate::rpc::wire::{Envelope, RpcMessage};

use common::ErrorLocation;

use std::net::SocketAddr;
use std::panic::Location;

use backoff::{ExponentialBackoff, backoff::Backoff};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, trace, warn};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::spawn as TokioSpawn;
use tokio::sync::mpsc;
use tokio::time::sleep as TokioSleep;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async, connect_async};
use url::Url;
use uuid::Uuid;

impl Endpoint {
    /// Wrap an established WebSocket as a window-style endpoint.
    ///
    /// Spawns one task writing outgoing envelopes and one reading incoming
    /// frames; both stop when either side closes.
    ///
    /// A frame that does not decode is not silently lost when its port and
    /// request id can still be read: an undecodable request is answered with
    /// a `Throw`, an undecodable reply fails the local waiter.
    pub fn from_websocket<S>(ws_stream: WebSocketStream<S>) -> Endpoint
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut write, mut read) = ws_stream.split();
        let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<Envelope>();
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel::<Envelope>();
        let answer_tx = outgoing_tx.downgrade();

        TokioSpawn(async move {
            while let Some(envelope) = outgoing_rx.recv().await {
                let json = match serde_json::to_string(&envelope) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to encode envelope for port {}: {e}", envelope.port);
                        continue;
                    }
                };

                if let Err(e) = write.send(Message::Text(json.into())).await {
                    warn!("Window channel write failed, closing: {e}");
                    break;
                }
            }

            let _ = write.close().await;
            debug!("Window channel writer stopped");
        });

        TokioSpawn(async move {
            while let Some(frame) = read.next().await {
                let raw: &[u8] = match &frame {
                    Ok(Message::Text(text)) => text.as_str().as_bytes(),
                    Ok(Message::Binary(data)) => &data[..],
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("Window channel read failed, closing: {e}");
                        break;
                    }
                };

                let envelope = match decode_frame(raw) {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        warn!("Undecodable window frame: {e}");
                        match recover_undecodable(raw, &e) {
                            Some(Recovery::AnswerPeer(answer)) => {
                                if let Some(answer_tx) = answer_tx.upgrade() {
                                    let _ = answer_tx.send(answer);
                                }
                            }
                            Some(Recovery::FailLocally(failure)) => {
                                if incoming_tx.send(failure).is_err() {
                                    break;
                                }
                            }
                            None => trace!("Undecodable frame carries no request id, dropped"),
                        }
                        continue;
                    }
                };

                if incoming_tx.send(envelope).is_err() {
                    break;
                }
            }

            debug!("Window channel reader stopped");
        });

        Endpoint::from_queues(ChannelKind::Window, outgoing_tx, incoming_rx)
    }
}

#[track_caller]
fn decode_frame(raw: &[u8]) -> Result<Envelope, ChannelError> {
    Ok(serde_json::from_slice::<Envelope>(raw)?)
}

/// What to do about a frame that could not be decoded.
enum Recovery {
    /// Send a `Throw` back to the peer that made the request.
    AnswerPeer(Envelope),
    /// Hand a `Throw` to the local caller waiting on the reply.
    FailLocally(Envelope),
}

/// Salvage port, message type and id from a frame that failed to decode.
fn recover_undecodable(raw: &[u8], error: &ChannelError) -> Option<Recovery> {
    let frame = serde_json::from_slice::<serde_json::Value>(raw).ok()?;
    let port = frame
        .get("port")
        .and_then(serde_json::Value::as_str)
        .and_then(|port| Uuid::parse_str(port).ok())?;
    let message = frame.get("message")?;
    let id = message.get("id").and_then(serde_json::Value::as_u64)?;
    let throw = Envelope {
        port,
        message: RpcMessage::Throw {
            id,
            message: error.to_string(),
        },
    };

    match message.get("type").and_then(serde_json::Value::as_str)? {
        "Get" | "Apply" => Some(Recovery::AnswerPeer(throw)),
        "Return" | "Throw" => Some(Recovery::FailLocally(throw)),
        _ => None,
    }
}

/// Listening side of window-style channels.
pub struct WindowListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl WindowListener {
    /// Bind the configured loopback address. Port 0 picks a free port.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Io`] if the address cannot be bound.
    pub async fn bind(config: &WindowConfig) -> Result<Self, ChannelError> {
        let address = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&address).await?;
        let local_addr = listener.local_addr()?;

        info!("Window channel listening on {local_addr}");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// `ws://` URL the framed context should connect to.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Io`] if the bound address does not form a URL.
    #[track_caller]
    pub fn url(&self) -> Result<Url, ChannelError> {
        Url::parse(&format!("ws://{}", self.local_addr)).map_err(|e| ChannelError::Io {
            message: format!("Invalid window URL for {}: {e}", self.local_addr),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Wait for the next loopback peer and complete the WebSocket handshake.
    ///
    /// Non-loopback peers are skipped silently.
    ///
    /// # Errors
    ///
    /// - [`ChannelError::Io`] - accept failed
    /// - [`ChannelError::Handshake`] - WebSocket upgrade failed
    pub async fn accept(&self) -> Result<Endpoint, ChannelError> {
        loop {
            let (stream, addr) = self.listener.accept().await?;

            if !addr.ip().is_loopback() {
                warn!("Rejected non-loopback window connection from {addr}");
                continue;
            }

            let ws_stream = accept_async(stream).await.map_err(|e| {
                error!("Window handshake with {addr} failed: {e}");
                ChannelError::Handshake {
                    message: format!("WebSocket handshake failed: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                }
            })?;

            info!("Window context connected from {addr}");
            return Ok(Endpoint::from_websocket(ws_stream));
        }
    }
}

/// Connect to a parent context, retrying until it is listening.
///
/// # Errors
///
/// - [`ChannelError::Rejected`] - URL is not a `ws://` URL
/// - [`ChannelError::Handshake`] - still unreachable after
///   `connect_max_elapsed_ms`
pub async fn connect_window(url: &Url, config: &WindowConfig) -> Result<Endpoint, ChannelError> {
    if url.scheme() != "ws" {
        return Err(ChannelError::Rejected {
            message: format!("Window channels require a ws:// URL, got {url}"),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let mut backoff = ExponentialBackoff {
        max_elapsed_time: Some(config.connect_max_elapsed()),
        ..Default::default()
    };

    debug!("Connecting window channel to {url}");

    loop {
        match connect_async(url.as_str()).await {
            Ok((ws_stream, _)) => {
                info!("Window channel connected to {url}");
                return Ok(Endpoint::from_websocket(ws_stream));
            }
            Err(e) => match backoff.next_backoff() {
                Some(duration) => {
                    trace!("Window parent not reachable ({e}), retrying after {duration:?}");
                    TokioSleep(duration).await;
                }
                None => {
                    return Err(ChannelError::Handshake {
                        message: format!(
                            "Window parent at {url} unreachable within {:?}: {e}",
                            config.connect_max_elapsed()
                        ),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
            },
        }
    }
}
