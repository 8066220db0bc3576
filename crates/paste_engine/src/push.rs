//! Engine.IO v4 / Socket.IO v5 packet codec for the push channel.
//!
//! Long-polling payloads carry one or more Engine.IO packets separated by the
//! record separator `0x1e`. Each packet starts with a one-digit type; message
//! packets (`4`) wrap a Socket.IO packet, whose own type digit is followed by
//! an optional namespace, an optional ack id and a JSON body.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{CompletePayload, ErrorPayload, ProgressPayload, PushEvent};

pub const RECORD_SEPARATOR: char = '\u{1e}';

pub const EVENT_PROGRESS: &str = "download_progress";
pub const EVENT_COMPLETE: &str = "download_complete";
pub const EVENT_ERROR: &str = "download_error";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushDecodeError {
    #[error("empty packet")]
    Empty,
    #[error("unknown packet type {0:?}")]
    UnknownPacketType(char),
    #[error("invalid json: {0}")]
    InvalidJson(String),
    #[error("malformed event: {0}")]
    MalformedEvent(String),
}

/// Session parameters from the Engine.IO open packet. Intervals are milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handshake {
    pub sid: String,
    #[serde(rename = "pingInterval", default)]
    pub ping_interval: u64,
    #[serde(rename = "pingTimeout", default)]
    pub ping_timeout: u64,
    #[serde(rename = "maxPayload", default)]
    pub max_payload: u64,
    #[serde(default)]
    pub upgrades: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(handshake) => {
                format!("0{}", serde_json::to_string(handshake).unwrap_or_default())
            }
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(data) => format!("2{data}"),
            EnginePacket::Pong(data) => format!("3{data}"),
            EnginePacket::Message(data) => format!("4{data}"),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

/// Splits a polling response body into packets.
pub fn decode_payload(body: &str) -> Result<Vec<EnginePacket>, PushDecodeError> {
    body.split(RECORD_SEPARATOR)
        .filter(|raw| !raw.is_empty())
        .map(decode_packet)
        .collect()
}

pub fn decode_packet(raw: &str) -> Result<EnginePacket, PushDecodeError> {
    let mut chars = raw.chars();
    let kind = chars.next().ok_or(PushDecodeError::Empty)?;
    let data = chars.as_str();
    match kind {
        '0' => serde_json::from_str(data)
            .map(EnginePacket::Open)
            .map_err(|err| PushDecodeError::InvalidJson(err.to_string())),
        '1' => Ok(EnginePacket::Close),
        '2' => Ok(EnginePacket::Ping(data.to_string())),
        '3' => Ok(EnginePacket::Pong(data.to_string())),
        '4' => Ok(EnginePacket::Message(data.to_string())),
        '5' => Ok(EnginePacket::Upgrade),
        '6' => Ok(EnginePacket::Noop),
        other => Err(PushDecodeError::UnknownPacketType(other)),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect,
    Disconnect,
    Event {
        name: String,
        args: Vec<Value>,
        ack: Option<u64>,
    },
    Ack,
    ConnectError(String),
    /// Binary packets; attachments are not fetched.
    Binary,
}

/// Decodes the Socket.IO packet carried in an Engine.IO message.
///
/// Namespaces are stripped: the client only joins the default namespace.
pub fn decode_socket_packet(raw: &str) -> Result<SocketPacket, PushDecodeError> {
    let mut chars = raw.chars();
    let kind = chars.next().ok_or(PushDecodeError::Empty)?;
    let rest = strip_namespace(chars.as_str());
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    let (ack_raw, body) = rest.split_at(digits);
    let ack = ack_raw.parse().ok();

    match kind {
        '0' => Ok(SocketPacket::Connect),
        '1' => Ok(SocketPacket::Disconnect),
        '2' => {
            let value: Value = serde_json::from_str(body)
                .map_err(|err| PushDecodeError::InvalidJson(err.to_string()))?;
            let Value::Array(mut items) = value else {
                return Err(PushDecodeError::MalformedEvent(
                    "event body is not an array".to_string(),
                ));
            };
            if items.is_empty() {
                return Err(PushDecodeError::MalformedEvent("missing event name".to_string()));
            }
            let Value::String(name) = items.remove(0) else {
                return Err(PushDecodeError::MalformedEvent(
                    "event name is not a string".to_string(),
                ));
            };
            Ok(SocketPacket::Event {
                name,
                args: items,
                ack,
            })
        }
        '3' => Ok(SocketPacket::Ack),
        '4' => {
            let message = serde_json::from_str::<Value>(body)
                .ok()
                .and_then(|value| {
                    value
                        .get("message")
                        .and_then(Value::as_str)
                        .map(ToOwned::to_owned)
                })
                .unwrap_or_else(|| body.to_string());
            Ok(SocketPacket::ConnectError(message))
        }
        '5' | '6' => Ok(SocketPacket::Binary),
        other => Err(PushDecodeError::UnknownPacketType(other)),
    }
}

fn strip_namespace(rest: &str) -> &str {
    if !rest.starts_with('/') {
        return rest;
    }
    match rest.find(',') {
        Some(idx) => &rest[idx + 1..],
        None => "",
    }
}

/// Maps a Socket.IO event onto a job event. Unrelated event names yield `None`.
pub fn push_event(name: &str, args: &[Value]) -> Result<Option<PushEvent>, PushDecodeError> {
    let payload = || {
        args.first().cloned().ok_or_else(|| {
            PushDecodeError::MalformedEvent(format!("{name} without payload"))
        })
    };
    let event = match name {
        EVENT_PROGRESS => PushEvent::Progress(from_value::<ProgressPayload>(payload()?)?),
        EVENT_COMPLETE => PushEvent::Complete(from_value::<CompletePayload>(payload()?)?),
        EVENT_ERROR => PushEvent::Error(from_value::<ErrorPayload>(payload()?)?),
        _ => return Ok(None),
    };
    Ok(Some(event))
}

fn from_value<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, PushDecodeError> {
    serde_json::from_value(value).map_err(|err| PushDecodeError::MalformedEvent(err.to_string()))
}

/// Socket.IO connect request for the default namespace, wrapped for Engine.IO.
pub fn connect_packet() -> String {
    EnginePacket::Message("0".to_string()).encode()
}
