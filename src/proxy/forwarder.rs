//! Request forwarding
//!
//! This module connects to a selected backend, replays the inbound request
//! against it, and relays the backend's response. Any failure along the
//! way becomes a fixed-format 500 response to the original caller.

use anyhow::{Context, Result};
use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder};
use crate::proxy::backend::{Backend, BackendPool};

/// Default buffer size for reading backend responses
const BUFFER_SIZE: usize = 8192;

/// Handles proxying requests to backend servers
pub struct ProxyHandler {
    /// Pool of backend servers
    pool: BackendPool,
}

impl ProxyHandler {
    /// Create a new proxy handler
    pub fn new(pool: BackendPool) -> Self {
        Self { pool }
    }

    /// Select the next backend and forward the request to it.
    ///
    /// Exactly one attempt: a failing backend is not retried and no other
    /// backend is tried for the same request.
    pub async fn handle(&self, request: &Request) -> Response {
        let backend = self.pool.next().await;
        self.forward(&backend, request).await
    }

    /// Forward a request to a specific backend.
    ///
    /// Never returns an error: failures are converted into the 500
    /// `Error: ...` response here, at the forwarder boundary.
    pub async fn forward(&self, backend: &Backend, request: &Request) -> Response {
        match self.try_forward(backend, request).await {
            Ok(response) => {
                tracing::info!(
                    backend = backend.display_name(),
                    status = response.status,
                    method = %request.method,
                    path = %request.path,
                    "Forwarded request to backend"
                );
                response
            }
            Err(e) => {
                tracing::error!(
                    backend = backend.display_name(),
                    error = %e,
                    method = %request.method,
                    path = %request.path,
                    "Error forwarding to backend"
                );
                Response::forward_error(&e)
            }
        }
    }

    async fn try_forward(&self, backend: &Backend, request: &Request) -> Result<Response> {
        let target = build_target(&backend.url, &request.path);
        let target_url = url::Url::parse(&target)
            .with_context(|| format!("invalid target URL: {}", target))?;

        let host = target_url.host_str().context("target URL missing host")?;
        let port = target_url.port_or_known_default().unwrap_or(80);

        // Fresh connection per request, no timeout: a hung backend hangs
        // only this request's task.
        let mut stream = TcpStream::connect((host, port))
            .await
            .context("failed to connect to backend")?;

        let request_bytes = build_http_request(request, &target_url);
        stream.write_all(&request_bytes).await?;
        stream.flush().await?;

        read_http_response(&mut stream, &request.method).await
    }
}

/// Build the outbound target by concatenating the backend base URL with
/// the inbound path, stripping at most one leading slash from the path.
///
/// No further joining or normalization: the base URL supplies the
/// separator, and query strings or extra slashes pass through literally.
pub fn build_target(base: &str, path: &str) -> String {
    let path = path.strip_prefix('/').unwrap_or(path);
    format!("{}{}", base, path)
}

/// Serialize the outbound HTTP request.
///
/// Every inbound header is copied best-effort: a header that cannot
/// legally appear on a serialized header line is skipped, never fatal.
/// Content-Length is recomputed, and a non-empty body is re-sent as plain
/// text content.
pub fn build_http_request(request: &Request, target: &url::Url) -> Vec<u8> {
    let mut buffer = Vec::new();

    // Request line against the target's path + query
    let mut path = target.path().to_string();
    if let Some(query) = target.query() {
        path.push('?');
        path.push_str(query);
    }
    if path.is_empty() {
        path.push('/');
    }

    buffer.extend_from_slice(format!("{} {} {}\r\n", request.method, path, request.version).as_bytes());

    let has_body = !request.body.is_empty();

    for (key, value) in &request.headers {
        if !header_is_serializable(key, value) {
            tracing::debug!(header = %key, "Skipping header that cannot be forwarded");
            continue;
        }
        // Recomputed below
        if key.eq_ignore_ascii_case("Content-Length") {
            continue;
        }
        // The body is re-sent as plain text content
        if has_body && key.eq_ignore_ascii_case("Content-Type") {
            continue;
        }
        buffer.extend_from_slice(format!("{}: {}\r\n", key, value).as_bytes());
    }

    if has_body {
        buffer.extend_from_slice(b"Content-Type: text/plain; charset=utf-8\r\n");
        buffer.extend_from_slice(format!("Content-Length: {}\r\n", request.body.len()).as_bytes());
    }

    // End of headers
    buffer.extend_from_slice(b"\r\n");

    if has_body {
        buffer.extend_from_slice(&request.body);
    }

    buffer
}

// A header line is "key: value\r\n"; anything that would break out of
// that line cannot be copied onto the wire.
fn header_is_serializable(key: &str, value: &str) -> bool {
    !key.is_empty()
        && !key.contains([':', ' ', '\r', '\n'])
        && !value.contains(['\r', '\n'])
}

/// Read a full HTTP response from the backend: status verbatim, headers
/// with duplicate keys joined by commas, whole body buffered.
async fn read_http_response(stream: &mut TcpStream, method: &Method) -> Result<Response> {
    let mut buffer = BytesMut::with_capacity(BUFFER_SIZE);

    // Read response headers
    loop {
        let n = stream.read_buf(&mut buffer).await?;

        if n == 0 {
            anyhow::bail!("connection closed before complete response received");
        }

        // Check if we've received complete headers (look for \r\n\r\n)
        if let Some(headers_end) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
            let headers_bytes = buffer.split_to(headers_end + 4);
            let (status, headers) = parse_response_headers(&headers_bytes)?;

            // A HEAD response advertises the GET Content-Length without
            // sending a body, and 1xx/204/304 never carry one; reading
            // those bytes would wait on data that never arrives.
            let body = if response_has_no_body(method, status) {
                Vec::new()
            } else {
                read_response_body(stream, &mut buffer, &headers).await?
            };

            return Ok(ResponseBuilder::new(status)
                .headers(join_duplicate_headers(headers))
                .body(body)
                .build());
        }

        // Prevent unbounded header growth
        if buffer.len() > 64 * 1024 {
            anyhow::bail!("response headers too large");
        }
    }
}

fn response_has_no_body(method: &Method, status: u16) -> bool {
    *method == Method::HEAD || status < 200 || status == 204 || status == 304
}

fn parse_response_headers(headers_bytes: &[u8]) -> Result<(u16, Vec<(String, String)>)> {
    let headers_str =
        std::str::from_utf8(headers_bytes).context("invalid UTF-8 in response headers")?;

    let mut lines = headers_str.lines();

    // Parse status line
    let status_line = lines.next().context("empty response")?;
    let parts: Vec<&str> = status_line.splitn(3, ' ').collect();

    if parts.len() < 2 {
        anyhow::bail!("invalid status line: {}", status_line);
    }

    // Relayed verbatim, any status is valid
    let status: u16 = parts[1].parse().context("invalid status code")?;

    let mut headers = Vec::new();
    for line in lines {
        if line.is_empty() {
            break;
        }

        if let Some((key, value)) = line.split_once(':') {
            headers.push((key.trim().to_string(), value.trim().to_string()));
        }
    }

    Ok((status, headers))
}

/// Collapse repeated header keys into one comma-joined value, keeping the
/// position of the first occurrence.
pub fn join_duplicate_headers(headers: Vec<(String, String)>) -> Vec<(String, String)> {
    let mut joined: Vec<(String, String)> = Vec::new();

    for (key, value) in headers {
        match joined
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            Some((_, existing)) => {
                existing.push(',');
                existing.push_str(&value);
            }
            None => joined.push((key, value)),
        }
    }

    joined
}

async fn read_response_body(
    stream: &mut TcpStream,
    buffer: &mut BytesMut,
    headers: &[(String, String)],
) -> Result<Vec<u8>> {
    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("Content-Length"))
        .and_then(|(_, v)| v.parse::<usize>().ok());

    let Some(content_length) = content_length else {
        // No Content-Length: read until the backend closes the connection
        let mut body = buffer.to_vec();
        buffer.clear();
        loop {
            let mut chunk = [0u8; BUFFER_SIZE];
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
        return Ok(body);
    };

    if content_length == 0 {
        return Ok(Vec::new());
    }

    let mut body = Vec::with_capacity(content_length);

    // Use data already buffered past the headers first
    let from_buffer = buffer.len().min(content_length);
    body.extend_from_slice(&buffer[..from_buffer]);
    buffer.advance(from_buffer);

    while body.len() < content_length {
        let mut chunk = [0u8; BUFFER_SIZE];
        let want = (content_length - body.len()).min(BUFFER_SIZE);
        let n = stream.read(&mut chunk[..want]).await?;

        if n == 0 {
            anyhow::bail!("connection closed before complete body received");
        }

        body.extend_from_slice(&chunk[..n]);
    }

    Ok(body)
}
