//! Broker wire protocol
//!
//! Every frame is a 4-byte little-endian length followed by a JSON body:
//!
//! ```text
//! +-----------+----------------------------------------------+
//! | len (u32) | {"kind":"request","uid":..,"call":..,...}     |
//! +-----------+----------------------------------------------+
//! ```
//!
//! Requests flow both ways: the client calls `session.*`, `printers.*` and
//! `print`; during the trust handshake the broker calls `certificate` and
//! `sign` back on the client.

use crate::error::TransportError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::PrintJob;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use uuid::Uuid;

/// Upper bound on a single frame body
pub const MAX_FRAME_LEN: usize = 8 * 1024 * 1024;

/// RPC names understood by the broker
pub mod call {
    pub const SESSION_START: &str = "session.start";
    pub const SESSION_STOP: &str = "session.stop";
    pub const PRINTERS_FIND: &str = "printers.find";
    pub const PRINTERS_DEFAULT: &str = "printers.default";
    pub const PRINT: &str = "print";

    // Broker -> client
    pub const CERTIFICATE: &str = "certificate";
    pub const SIGN: &str = "sign";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Frame {
    Request {
        uid: Uuid,
        call: String,
        #[serde(default)]
        params: Value,
    },
    Response {
        uid: Uuid,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Event {
        event: BrokerEvent,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

/// Unsolicited lifecycle notices pushed by the broker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrokerEvent {
    Closed,
    Error,
}

impl Frame {
    /// New request with a fresh correlation id
    pub fn request(call: &str, params: Value) -> Self {
        Frame::Request {
            uid: Uuid::new_v4(),
            call: call.to_string(),
            params,
        }
    }

    pub fn ok(uid: Uuid, result: Value) -> Self {
        Frame::Response {
            uid,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(uid: Uuid, error: impl Into<String>) -> Self {
        Frame::Response {
            uid,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// Body of a `print` request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintPayload {
    pub printer: String,
    pub format: String,
    pub data: String,
}

impl PrintPayload {
    pub fn from_job(job: &PrintJob) -> Self {
        Self {
            printer: job.printer.as_str().to_string(),
            format: "base64".to_string(),
            data: STANDARD.encode(&job.data),
        }
    }
}

/// Body of a `sign` request sent by the broker
#[derive(Debug, Clone, Deserialize)]
pub struct SignParams {
    pub challenge: String,
}

/// Read one frame
///
/// EOF before the length prefix is reported as [`TransportError::Closed`].
pub async fn read_frame<R>(reader: &mut R) -> Result<Frame, TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(TransportError::Protocol(format!(
            "frame of {} bytes exceeds limit of {}",
            len, MAX_FRAME_LEN
        )));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;

    serde_json::from_slice(&body).map_err(|e| TransportError::Protocol(e.to_string()))
}

/// Write one frame
pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    let body = serde_json::to_vec(frame).map_err(|e| TransportError::Protocol(e.to_string()))?;
    if body.len() > MAX_FRAME_LEN {
        return Err(TransportError::Protocol(format!(
            "frame of {} bytes exceeds limit of {}",
            body.len(),
            MAX_FRAME_LEN
        )));
    }

    let mut data = Vec::with_capacity(4 + body.len());
    data.extend_from_slice(&(body.len() as u32).to_le_bytes());
    data.extend_from_slice(&body);

    writer.write_all(&data).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_frame_json_shape() {
        let uid = Uuid::nil();
        let frame = Frame::Request {
            uid,
            call: call::PRINTERS_FIND.into(),
            params: Value::Null,
        };
        let v = serde_json::to_value(&frame).unwrap();
        assert_eq!(v["kind"], "request");
        assert_eq!(v["call"], "printers.find");

        let resp = serde_json::to_value(Frame::err(uid, "nope")).unwrap();
        assert_eq!(resp, json!({"kind": "response", "uid": uid, "error": "nope"}));

        let event: Frame = serde_json::from_value(json!({"kind": "event", "event": "closed"})).unwrap();
        assert_eq!(
            event,
            Frame::Event {
                event: BrokerEvent::Closed,
                message: None
            }
        );
    }

    #[test]
    fn test_print_payload_is_base64() {
        let job = PrintJob::new("Kasir-1", vec![0x1B, 0x40, b'A']);
        let payload = PrintPayload::from_job(&job);
        assert_eq!(payload.printer, "Kasir-1");
        assert_eq!(payload.format, "base64");
        assert_eq!(STANDARD.decode(&payload.data).unwrap(), job.data);
    }

    #[tokio::test]
    async fn test_frames_over_duplex() {
        let (mut a, mut b) = tokio::io::duplex(1024);
        let sent = Frame::request(call::SIGN, json!({"challenge": "abc"}));
        write_frame(&mut a, &sent).await.unwrap();
        assert_eq!(read_frame(&mut b).await.unwrap(), sent);

        drop(a);
        assert_eq!(read_frame(&mut b).await, Err(TransportError::Closed));
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (mut a, mut b) = tokio::io::duplex(64);
        a.write_all(&((MAX_FRAME_LEN as u32) + 1).to_le_bytes())
            .await
            .unwrap();
        assert!(matches!(
            read_frame(&mut b).await,
            Err(TransportError::Protocol(_))
        ));
    }
}
