//! TCP binding: one JSON message per line, both directions.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::server::ServerHandle;

/// Accept connections forever.
pub async fn serve(listener: TcpListener, handle: ServerHandle) -> std::io::Result<()> {
    info!(addr = %listener.local_addr()?, "listening");
    loop {
        let (stream, peer) = listener.accept().await?;
        let handle = handle.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(stream, handle).await {
                debug!(%peer, error = %err, "connection ended with error");
            }
        });
    }
}

/// Pump one socket until either side closes.
pub async fn handle_connection(stream: TcpStream, handle: ServerHandle) -> std::io::Result<()> {
    let peer = stream.peer_addr()?;
    let (reader, mut writer) = stream.into_split();
    let (conn, mut events) = handle.connect();
    info!(%peer, %conn, "client connected");

    let writer_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let mut line = match event.to_json() {
                Ok(line) => line,
                Err(err) => {
                    warn!(%conn, event = event.name(), error = %err, "failed to encode event");
                    continue;
                }
            };
            line.push('\n');
            if writer.write_all(line.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    let mut lines = BufReader::new(reader).lines();
    let result = loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => handle.send_raw(conn, line),
            Ok(None) => break Ok(()),
            Err(err) => break Err(err),
        }
    };

    handle.disconnect(conn);
    writer_task.abort();
    info!(%peer, %conn, "client disconnected");
    result
}
