// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port-forwarding proxy session for the cloud backend: bridges a local
//! TCP listener to a WebSocket session against the in-sandbox
//! controller's forwarded port, generalizing the attach bridge's
//! client/controller byte-stream bridge to binary passthrough instead of
//! terminal text framing.

use alc_core::{Error, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

/// A live local->remote port forward. Dropping this does not stop the
/// forward; call `close` explicitly so the accept loop and any open
/// bridges are torn down.
pub struct PortForward {
    local_port: u16,
    accept_task: JoinHandle<()>,
}

impl PortForward {
    /// Bind an ephemeral local port and start forwarding every accepted
    /// connection to `remote_addr`'s raw-mode WebSocket endpoint.
    pub async fn open(remote_addr: String, auth_token: Option<String>) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| Error::Provisioning(format!("failed to bind local forward port: {e}")))?;
        let local_port = listener
            .local_addr()
            .map_err(|e| Error::Provisioning(format!("failed to read local forward port: {e}")))?
            .port();

        let accept_task = tokio::spawn(async move {
            loop {
                let (client, _) = match listener.accept().await {
                    Ok(pair) => pair,
                    Err(_) => return,
                };
                let remote_addr = remote_addr.clone();
                let auth_token = auth_token.clone();
                tokio::spawn(async move {
                    if let Err(err) = bridge_one(client, &remote_addr, auth_token.as_deref()).await {
                        tracing::warn!(%err, "port forward connection closed with error");
                    }
                });
            }
        });

        Ok(Self { local_port, accept_task })
    }

    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    /// Stop accepting new connections. In-flight bridges drain on their
    /// own once either side closes.
    pub fn close(self) {
        self.accept_task.abort();
    }
}

async fn bridge_one(mut client: TcpStream, remote_addr: &str, auth_token: Option<&str>) -> Result<()> {
    let url = match auth_token {
        Some(token) => format!("ws://{remote_addr}/ws?mode=raw&token={token}"),
        None => format!("ws://{remote_addr}/ws?mode=raw"),
    };

    let remote_tcp = TcpStream::connect(remote_addr)
        .await
        .map_err(|e| Error::Controller(format!("port forward connect to {remote_addr} failed: {e}")))?;
    let (ws_stream, _) = tokio_tungstenite::client_async(&url, remote_tcp)
        .await
        .map_err(|e| Error::Controller(format!("port forward websocket handshake failed: {e}")))?;

    let (mut ws_writer, mut ws_reader) = ws_stream.split();
    let (mut client_reader, mut client_writer) = client.split();

    let mut buf = [0u8; 8192];
    loop {
        tokio::select! {
            result = client_reader.read(&mut buf) => {
                match result {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if ws_writer.send(Message::Binary(buf[..n].to_vec().into())).await.is_err() {
                            break;
                        }
                    }
                }
            }
            msg = ws_reader.next() => {
                match msg {
                    Some(Ok(Message::Binary(data))) => {
                        if client_writer.write_all(&data).await.is_err() || client_writer.flush().await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "proxy_tests.rs"]
mod tests;
