use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use paste_logging::{paste_debug, paste_info, paste_warn};
use reqwest::header::CONTENT_TYPE;
use tokio_util::sync::CancellationToken;

use crate::client::{map_reqwest_error, parse_base_url};
use crate::push::{
    connect_packet, decode_payload, decode_socket_packet, push_event, EnginePacket, Handshake,
    PushDecodeError, SocketPacket,
};
use crate::{ApiError, EngineEvent, EventSink, FailureKind};

const ENGINE_IO_PATH: &str = "socket.io/";

#[derive(Debug, Clone)]
pub struct PushSettings {
    pub connect_timeout: Duration,
    /// Long-poll timeout used until the handshake announces ping intervals.
    pub poll_timeout: Duration,
    pub reconnect_delay: Duration,
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            poll_timeout: Duration::from_secs(60),
            reconnect_delay: Duration::from_secs(2),
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The server closed the transport or the namespace.
    Closed,
    /// The engine is shutting down.
    Cancelled,
}

/// Socket.IO client over Engine.IO long-polling.
pub struct PollingChannel {
    client: reqwest::Client,
    endpoint: reqwest::Url,
    settings: PushSettings,
    request_seq: AtomicU64,
}

impl PollingChannel {
    pub fn new(base_url: &str, settings: PushSettings) -> Result<Self, ApiError> {
        let endpoint = parse_base_url(base_url)?
            .join(ENGINE_IO_PATH)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            settings,
            request_seq: AtomicU64::new(0),
        })
    }

    /// Keeps a session open until `cancel` fires, reconnecting after drops.
    pub async fn run(&self, sink: &dyn EventSink, cancel: CancellationToken) {
        loop {
            match self.session(sink, &cancel).await {
                Ok(SessionEnd::Cancelled) => return,
                Ok(SessionEnd::Closed) => paste_info!("Push channel closed by server"),
                Err(err) => paste_warn!("Push channel dropped: {err}"),
            }
            sink.emit(EngineEvent::PushConnection { connected: false });

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(self.settings.reconnect_delay) => {}
            }
        }
    }

    /// Runs one Engine.IO session from handshake to close.
    pub async fn session(
        &self,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<SessionEnd, ApiError> {
        let opening = tokio::select! {
            _ = cancel.cancelled() => return Ok(SessionEnd::Cancelled),
            body = self.get(None, self.settings.poll_timeout) => body?,
        };
        let mut packets = decode_payload(&opening).map_err(map_decode_error)?.into_iter();
        let handshake = match packets.next() {
            Some(EnginePacket::Open(handshake)) => handshake,
            other => {
                return Err(ApiError::new(
                    FailureKind::Decode,
                    format!("expected open packet, got {other:?}"),
                ))
            }
        };
        paste_debug!("Push session {} opened", handshake.sid);
        let poll_timeout = poll_timeout(&handshake, self.settings.poll_timeout);

        self.post(&handshake.sid, &connect_packet()).await?;
        if let Some(end) = self.dispatch(&handshake.sid, packets, sink).await? {
            return Ok(end);
        }

        loop {
            let body = tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = self.post(&handshake.sid, &EnginePacket::Close.encode()).await;
                    return Ok(SessionEnd::Cancelled);
                }
                body = self.get(Some(&handshake.sid), poll_timeout) => body?,
            };
            let packets = decode_payload(&body).map_err(map_decode_error)?;
            if let Some(end) = self.dispatch(&handshake.sid, packets.into_iter(), sink).await? {
                return Ok(end);
            }
        }
    }

    async fn dispatch(
        &self,
        sid: &str,
        packets: impl Iterator<Item = EnginePacket>,
        sink: &dyn EventSink,
    ) -> Result<Option<SessionEnd>, ApiError> {
        for packet in packets {
            match packet {
                EnginePacket::Ping(data) => {
                    self.post(sid, &EnginePacket::Pong(data).encode()).await?;
                }
                EnginePacket::Message(message) => match decode_socket_packet(&message) {
                    Ok(SocketPacket::Connect) => {
                        paste_info!("Push channel connected");
                        sink.emit(EngineEvent::PushConnection { connected: true });
                    }
                    Ok(SocketPacket::Event { name, args, .. }) => match push_event(&name, &args) {
                        Ok(Some(event)) => sink.emit(EngineEvent::Push(event)),
                        Ok(None) => paste_debug!("Ignoring push event {name}"),
                        Err(err) => paste_warn!("Dropping push event {name}: {err}"),
                    },
                    Ok(SocketPacket::Disconnect) => return Ok(Some(SessionEnd::Closed)),
                    Ok(SocketPacket::ConnectError(message)) => {
                        return Err(ApiError::new(FailureKind::Network, message));
                    }
                    Ok(SocketPacket::Ack | SocketPacket::Binary) => {}
                    Err(err) => paste_warn!("Dropping push message: {err}"),
                },
                EnginePacket::Close => return Ok(Some(SessionEnd::Closed)),
                EnginePacket::Open(_)
                | EnginePacket::Pong(_)
                | EnginePacket::Upgrade
                | EnginePacket::Noop => {}
            }
        }
        Ok(None)
    }

    fn url(&self, sid: Option<&str>) -> reqwest::Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("EIO", "4");
            query.append_pair("transport", "polling");
            // Cache buster, as the browser client sends.
            let seq = self.request_seq.fetch_add(1, Ordering::Relaxed);
            query.append_pair("t", &seq.to_string());
            if let Some(sid) = sid {
                query.append_pair("sid", sid);
            }
        }
        url
    }

    async fn get(&self, sid: Option<&str>, timeout: Duration) -> Result<String, ApiError> {
        let response = self
            .client
            .get(self.url(sid))
            .timeout(timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        response.text().await.map_err(map_reqwest_error)
    }

    async fn post(&self, sid: &str, body: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url(Some(sid)))
            .header(CONTENT_TYPE, "text/plain;charset=UTF-8")
            .body(body.to_string())
            .timeout(self.settings.connect_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        Ok(())
    }
}

/// The server answers a poll at the latest after one ping interval; allow the
/// ping timeout on top before treating the connection as dead.
fn poll_timeout(handshake: &Handshake, fallback: Duration) -> Duration {
    if handshake.ping_interval == 0 {
        return fallback;
    }
    Duration::from_millis(handshake.ping_interval + handshake.ping_timeout)
}

fn map_decode_error(err: PushDecodeError) -> ApiError {
    ApiError::new(FailureKind::Decode, err.to_string())
}
