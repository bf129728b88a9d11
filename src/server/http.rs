//! HTTP/1.1 Framing
//!
//! Just enough HTTP for a JSON API: one request per connection, headers
//! terminated by CRLFCRLF, body sized by `Content-Length`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::models::response::ErrorBody;
use crate::utils::error::{AppError, AppResult};

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Largest accepted request line plus headers
const MAX_HEAD_BYTES: usize = 16 * 1024;

const READ_CHUNK: usize = 8 * 1024;

/// Why a request could not be read
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Malformed request: {0}")]
    Malformed(String),

    #[error("Request body exceeds {MAX_BODY_BYTES} bytes")]
    PayloadTooLarge,

    #[error("Connection closed before the request was complete")]
    Incomplete,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RequestError {
    /// Response to send back, if the connection is still usable
    pub fn to_response(&self) -> Option<HttpResponse> {
        match self {
            RequestError::Malformed(msg) => Some(HttpResponse::error(
                400,
                ErrorBody::new("Invalid request", msg.clone()),
            )),
            RequestError::PayloadTooLarge => Some(HttpResponse::error(
                413,
                ErrorBody::new("Payload too large", self.to_string()),
            )),
            RequestError::Incomplete | RequestError::Io(_) => None,
        }
    }
}

/// A parsed request
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    pub method: String,
    /// Path without the query string
    pub path: String,
    pub query: Option<String>,
    /// Header names are lower-cased
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .push((name.to_ascii_lowercase(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Decode the JSON body. An empty body decodes as `{}`.
    pub fn json<T: DeserializeOwned>(&self) -> AppResult<T> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_str("{}")?);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// A response ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// JSON response. Serialization failure degrades to a 500.
    pub fn json<T: Serialize>(status: u16, body: &T) -> Self {
        match serde_json::to_vec(body) {
            Ok(bytes) => Self::new(status)
                .with_header("Content-Type", "application/json")
                .with_body(bytes),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize response body");
                Self::new(500)
                    .with_header("Content-Type", "application/json")
                    .with_body(br#"{"error":"Internal server error","message":"Something went wrong. Please try again."}"#.to_vec())
            }
        }
    }

    pub fn ok<T: Serialize>(body: &T) -> Self {
        Self::json(200, body)
    }

    pub fn error(status: u16, body: ErrorBody) -> Self {
        Self::json(status, &body)
    }

    /// Map an [`AppError`], exposing detail only when `include_details`
    pub fn from_app_error(err: &AppError, include_details: bool) -> Self {
        let body = ErrorBody::new(err.category(), err.user_message())
            .with_details(err.to_string(), include_details);
        Self::error(err.status_code(), body)
    }

    pub fn no_content() -> Self {
        Self::new(204)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Serialize with CORS headers for `allowed_origin`
    pub fn to_bytes(&self, allowed_origin: &str) -> Vec<u8> {
        let mut head = format!("HTTP/1.1 {} {}\r\n", self.status, reason_phrase(self.status));
        for (name, value) in &self.headers {
            head.push_str(&format!("{}: {}\r\n", name, value));
        }
        head.push_str(&format!("Access-Control-Allow-Origin: {}\r\n", allowed_origin));
        head.push_str("Access-Control-Allow-Credentials: true\r\n");
        head.push_str("Access-Control-Allow-Methods: GET, POST, PUT, DELETE, OPTIONS\r\n");
        head.push_str("Access-Control-Allow-Headers: Content-Type, Authorization\r\n");
        head.push_str("Vary: Origin\r\n");
        head.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        head.push_str("Connection: close\r\n\r\n");

        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

/// Read one request from `stream`
pub async fn read_request<R>(stream: &mut R) -> Result<HttpRequest, RequestError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    let head_end = loop {
        if let Some(pos) = find_head_end(&buf) {
            break pos;
        }
        if buf.len() > MAX_HEAD_BYTES {
            return Err(RequestError::Malformed("headers too large".to_string()));
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(RequestError::Incomplete);
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = std::str::from_utf8(&buf[..head_end])
        .map_err(|_| RequestError::Malformed("headers are not valid UTF-8".to_string()))?;
    let mut request = parse_head(head)?;

    let content_length = match request.header("content-length") {
        Some(value) => value
            .trim()
            .parse::<usize>()
            .map_err(|_| RequestError::Malformed(format!("invalid Content-Length: {}", value)))?,
        None => 0,
    };
    if content_length > MAX_BODY_BYTES {
        return Err(RequestError::PayloadTooLarge);
    }

    let mut body = buf.split_off(head_end + 4);
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(RequestError::Incomplete);
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);
    request.body = body;

    Ok(request)
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n")
}

fn parse_head(head: &str) -> Result<HttpRequest, RequestError> {
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let (method, target, version) = match (parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(target), Some(version)) => (method, target, version),
        _ => {
            return Err(RequestError::Malformed(format!(
                "bad request line: {:?}",
                request_line
            )))
        }
    };
    if !version.starts_with("HTTP/1.") {
        return Err(RequestError::Malformed(format!("unsupported version: {}", version)));
    }

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query.to_string())),
        None => (target, None),
    };

    let mut request = HttpRequest::new(&method.to_ascii_uppercase(), path);
    request.query = query;
    for line in lines.filter(|line| !line.is_empty()) {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| RequestError::Malformed(format!("bad header line: {:?}", line)))?;
        request = request.with_header(name.trim(), value.trim());
    }
    Ok(request)
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        413 => "Payload Too Large",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        504 => "Gateway Timeout",
        _ => "Unknown",
    }
}
