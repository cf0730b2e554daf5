// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Raw HTTP/1.1 client for talking to an in-sandbox controller over TCP.
//!
//! The controller's wire protocol is a collaborator, not defined here —
//! this just gets bytes there and back with Content-Length framing, the
//! same way every backend in this crate reaches it, whether over a
//! container's published port or the standalone backend's local port.

use alc_core::{Error, Result};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// HTTP GET with a bearer auth token.
pub async fn get_authed(addr: &str, path: &str, token: &str) -> Result<String> {
    let request = format!(
        "GET {path} HTTP/1.1\r\nHost: localhost\r\nAuthorization: Bearer {token}\r\n\r\n"
    );
    timed_request(addr, &request).await
}

/// HTTP POST with a bearer auth token.
pub async fn post_authed(addr: &str, path: &str, body: &str, token: &str) -> Result<String> {
    let request = format!(
        "POST {path} HTTP/1.1\r\nHost: localhost\r\nAuthorization: Bearer {token}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len(),
    );
    timed_request(addr, &request).await
}

/// HTTP GET with no authentication, for controllers that aren't yet
/// behind a token (health checks before the instance exists).
pub async fn get(addr: &str, path: &str) -> Result<String> {
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n\r\n");
    timed_request(addr, &request).await
}

/// Connect, send, and read with a 5-second timeout covering the entire
/// operation — connect, write, and read.
async fn timed_request(addr: &str, request: &str) -> Result<String> {
    tokio::time::timeout(Duration::from_secs(5), send_request(addr, request))
        .await
        .map_err(|_| Error::Controller("HTTP request timed out".into()))?
}

async fn send_request(addr: &str, request: &str) -> Result<String> {
    let mut stream = TcpStream::connect(addr)
        .await
        .map_err(|e| Error::Controller(format!("TCP connect to {addr} failed: {e}")))?;
    stream
        .write_all(request.as_bytes())
        .await
        .map_err(|e| Error::Controller(format!("write failed: {e}")))?;

    let mut reader = BufReader::new(&mut stream);
    read_http_response(&mut reader).await
}

/// Read and parse an HTTP/1.1 response from a buffered stream.
async fn read_http_response<R: tokio::io::AsyncRead + Unpin>(reader: &mut BufReader<R>) -> Result<String> {
    let mut status_line = String::new();
    reader
        .read_line(&mut status_line)
        .await
        .map_err(|e| Error::Controller(format!("read status failed: {e}")))?;

    let status_code =
        status_line.split_whitespace().nth(1).and_then(|s| s.parse::<u16>().ok()).unwrap_or(0);

    let mut content_length: usize = 0;
    loop {
        let mut line = String::new();
        reader
            .read_line(&mut line)
            .await
            .map_err(|e| Error::Controller(format!("read header failed: {e}")))?;
        if line == "\r\n" || line.is_empty() {
            break;
        }
        let line_lower = line.to_ascii_lowercase();
        if let Some(val) = line_lower.strip_prefix("content-length:") {
            content_length = val.trim().parse().unwrap_or(0);
        }
    }

    let body = if content_length > 0 {
        let mut buf = vec![0u8; content_length];
        reader
            .read_exact(&mut buf)
            .await
            .map_err(|e| Error::Controller(format!("read body failed: {e}")))?;
        String::from_utf8_lossy(&buf).into_owned()
    } else {
        String::new()
    };

    if status_code >= 400 {
        return Err(Error::Controller(format!("HTTP {status_code}: {}", body.trim())));
    }

    Ok(body)
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
