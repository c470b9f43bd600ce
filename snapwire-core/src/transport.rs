//! One-shot TCP delivery of framed payloads.

use std::time::Duration;

use bytes::Bytes;
use futures::SinkExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::debug;

use crate::codec::FrameCodec;
use crate::endpoint::EndpointConfig;
use crate::error::SnapError;

// ── TransportConfig ──────────────────────────────────────────────

/// Deadlines for one delivery attempt.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Time allowed to establish the TCP connection.
    pub connect_timeout: Duration,
    /// Time allowed for the framed write (and the final shutdown).
    pub write_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(10),
        }
    }
}

// ── TransferClient ───────────────────────────────────────────────

/// Stateless client that delivers one framed payload per call.
///
/// Fire and forget: nothing is read back from the peer, so a completed
/// flush is the sole success signal. Each call opens its own
/// connection and releases it on every exit path — success, error, or
/// abandonment — so concurrent pipeline runs never share a socket.
#[derive(Debug, Clone, Default)]
pub struct TransferClient {
    config: TransportConfig,
}

impl TransferClient {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    /// Connect to `endpoint`, write `payload` as one frame, close.
    ///
    /// The sink retries partial writes internally until the whole
    /// frame (prefix and payload) is out or the transport errors, so
    /// success here means all `4 + payload.len()` bytes were written.
    pub async fn send(&self, payload: Bytes, endpoint: &EndpointConfig) -> Result<(), SnapError> {
        let stream = timeout(
            self.config.connect_timeout,
            TcpStream::connect((endpoint.host(), endpoint.port())),
        )
        .await
        .map_err(|_| SnapError::Timeout(self.config.connect_timeout))?
        .map_err(SnapError::Transport)?;

        debug!(%endpoint, bytes = payload.len(), "connected");

        // The stream lives inside `framed`; dropping it on any early
        // return below closes the socket.
        let mut framed = Framed::new(stream, FrameCodec::default());

        timeout(self.config.write_timeout, framed.send(payload))
            .await
            .map_err(|_| SnapError::Timeout(self.config.write_timeout))?
            .map_err(|e| match e {
                SnapError::Io(io) => SnapError::Transport(io),
                other => other,
            })?;

        timeout(self.config.write_timeout, framed.get_mut().shutdown())
            .await
            .map_err(|_| SnapError::Timeout(self.config.write_timeout))?
            .map_err(SnapError::Transport)?;

        debug!(%endpoint, "frame delivered, connection closed");
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tokio_test::assert_ok;

    async fn ephemeral_listener() -> (TcpListener, EndpointConfig) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let endpoint = EndpointConfig::new(addr.ip().to_string(), addr.port()).unwrap();
        (listener, endpoint)
    }

    #[tokio::test]
    async fn wire_format_is_prefix_then_payload() {
        let (listener, endpoint) = ephemeral_listener().await;
        let payload = Bytes::from(vec![0xAB; 1000]);

        let client = TransferClient::default();
        let send = tokio::spawn(async move { client.send(payload, &endpoint).await });

        let (mut stream, _) = listener.accept().await.unwrap();

        // Read the raw bytes the way the receiving peer would.
        let mut prefix = [0u8; 4];
        stream.read_exact(&mut prefix).await.unwrap();
        assert_eq!(prefix, [0x00, 0x00, 0x03, 0xE8]);

        let mut body = vec![0u8; 1000];
        stream.read_exact(&mut body).await.unwrap();
        assert!(body.iter().all(|&b| b == 0xAB));

        // Nothing follows the frame; the sender closes.
        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());

        assert_ok!(send.await.unwrap());
    }

    #[tokio::test]
    async fn connection_refused_is_a_transport_error() {
        // Bind then drop to get a port nobody is listening on.
        let (listener, endpoint) = ephemeral_listener().await;
        drop(listener);

        let client = TransferClient::default();
        let err = client
            .send(Bytes::from_static(b"payload"), &endpoint)
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn slow_reader_still_gets_the_whole_frame() {
        let (listener, endpoint) = ephemeral_listener().await;
        // Large enough to overflow socket buffers, forcing the sink to
        // spread the frame across many partial writes.
        let payload = Bytes::from(vec![0x5A; 8 * 1024 * 1024]);
        let expected = payload.len();

        let client = TransferClient::new(TransportConfig {
            connect_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(30),
        });
        let send = tokio::spawn(async move { client.send(payload, &endpoint).await });

        let (mut stream, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        let mut chunk = vec![0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            received.extend_from_slice(&chunk[..n]);
            // Drain slowly relative to the sender.
            tokio::time::sleep(Duration::from_micros(50)).await;
        }

        assert_eq!(received.len(), 4 + expected);
        assert_ok!(send.await.unwrap());
    }
}
