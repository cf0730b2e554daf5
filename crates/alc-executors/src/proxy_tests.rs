// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use futures_util::StreamExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

async fn echo_ws_server(listener: TcpListener) {
    loop {
        let Ok((stream, _)) = listener.accept().await else { return };
        tokio::spawn(async move {
            let Ok(ws) = tokio_tungstenite::accept_async(stream).await else { return };
            let (mut write, mut read) = ws.split();
            while let Some(Ok(msg)) = read.next().await {
                if msg.is_close() {
                    break;
                }
                if write.send(msg).await.is_err() {
                    break;
                }
            }
        });
    }
}

#[tokio::test]
async fn forwards_bytes_round_trip_through_websocket_echo() {
    let ws_listener = TcpListener::bind("127.0.0.1:0").await.expect("bind ws");
    let ws_addr = ws_listener.local_addr().expect("addr");
    tokio::spawn(echo_ws_server(ws_listener));

    let forward = PortForward::open(ws_addr.to_string(), None).await.expect("open forward");
    let port = forward.local_port();

    let mut client = TcpStream::connect(("127.0.0.1", port)).await.expect("connect forward");
    client.write_all(b"hello").await.expect("write");

    let mut buf = [0u8; 5];
    client.read_exact(&mut buf).await.expect("read echo");
    assert_eq!(&buf, b"hello");

    forward.close();
}

#[tokio::test]
async fn open_assigns_a_nonzero_ephemeral_port() {
    let forward = PortForward::open("127.0.0.1:1".to_string(), None).await.expect("open forward");
    assert_ne!(forward.local_port(), 0);
    forward.close();
}
