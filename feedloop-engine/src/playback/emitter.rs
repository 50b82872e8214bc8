//! Message bus emitter
//!
//! Publishes one envelope per source row to a named channel. Delivery
//! is best-effort: a publish failure surfaces as an error to the caller
//! and playback continues with the next row.

use crate::error::{Error, Result};
use async_trait::async_trait;
use feedloop_common::events::BusEnvelope;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Publishes row payloads to a named channel on the message bus.
///
/// Implementations must tolerate the bus being unreachable: failures
/// are reported per publish, never as a process-ending error.
#[async_trait]
pub trait Emitter: Send + Sync {
    async fn publish(&self, channel: &str, payload: &str) -> Result<()>;
}

/// Emitter over a newline-delimited JSON TCP connection.
///
/// The connection is established lazily on the first publish, so an
/// unreachable bus at construction time does not crash the session;
/// the failure surfaces as a delivery error on the first publish
/// attempt instead. A failed write drops the cached connection and the
/// next publish reconnects.
pub struct TcpEmitter {
    addr: String,
    conn: Mutex<Option<TcpStream>>,
}

impl TcpEmitter {
    pub fn new(addr: impl Into<String>) -> Self {
        let addr = addr.into();
        info!("Bus emitter targeting {}", addr);
        Self {
            addr,
            conn: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Emitter for TcpEmitter {
    async fn publish(&self, channel: &str, payload: &str) -> Result<()> {
        let delivery = |reason: String| Error::Delivery {
            channel: channel.to_string(),
            reason,
        };

        let envelope = BusEnvelope {
            channel: channel.to_string(),
            payload: payload.to_string(),
        };
        let mut line = serde_json::to_vec(&envelope)
            .map_err(|e| Error::Internal(format!("envelope serialization: {}", e)))?;
        line.push(b'\n');

        let mut guard = self.conn.lock().await;
        let stream = match guard.as_mut() {
            Some(stream) => stream,
            None => {
                let stream = TcpStream::connect(&self.addr)
                    .await
                    .map_err(|e| delivery(format!("connect {}: {}", self.addr, e)))?;
                debug!("Connected to bus at {}", self.addr);
                guard.insert(stream)
            }
        };

        if let Err(e) = stream.write_all(&line).await {
            // Drop the broken connection; the next publish reconnects
            *guard = None;
            return Err(delivery(format!("write: {}", e)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn publishes_envelopes_as_json_lines() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut lines = BufReader::new(socket).lines();
            let mut received = Vec::new();
            while let Ok(Some(line)) = lines.next_line().await {
                received.push(line);
                if received.len() == 2 {
                    break;
                }
            }
            received
        });

        let emitter = TcpEmitter::new(addr.to_string());
        emitter.publish("ticks", "1,2,3").await.unwrap();
        emitter.publish("quotes", "a|b").await.unwrap();

        let received = server.await.unwrap();
        let first: BusEnvelope = serde_json::from_str(&received[0]).unwrap();
        assert_eq!(first.channel, "ticks");
        assert_eq!(first.payload, "1,2,3");
        let second: BusEnvelope = serde_json::from_str(&received[1]).unwrap();
        assert_eq!(second.channel, "quotes");
    }

    #[tokio::test]
    async fn unreachable_bus_surfaces_as_delivery_error() {
        // Bind then drop to get a port with nothing listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let emitter = TcpEmitter::new(addr.to_string());
        let err = emitter.publish("ticks", "row").await.unwrap_err();
        assert!(matches!(err, Error::Delivery { .. }));

        // The emitter stays usable; the next publish just fails again
        let err = emitter.publish("ticks", "row").await.unwrap_err();
        assert!(matches!(err, Error::Delivery { .. }));
    }
}
