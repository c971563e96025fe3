use oscbridge_engine::Engine;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

/// Largest datagram we accept; anything longer is truncated.
const RECV_BUF_SIZE: usize = 1024;

/// Receive datagrams until cancelled, handing each to the engine as one
/// opaque string. Receive errors are logged and the loop keeps going.
pub async fn run(socket: UdpSocket, engine: Engine, cancel: CancellationToken) {
    let mut buf = [0u8; RECV_BUF_SIZE];
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            received = socket.recv_from(&mut buf) => match received {
                Ok((len, src)) => {
                    trace!(%src, len, "datagram received");
                    let message = String::from_utf8_lossy(&buf[..len]).into_owned();
                    engine.handle_message(&message).await;
                }
                Err(e) => warn!(error = %e, "receive failed"),
            },
        }
    }
}
