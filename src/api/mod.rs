//! HTTP boundary for the detection pipeline.
//!
//! Minimal HTTP/1.1 over `std::net::TcpListener`; one connection is served
//! at a time on a background thread, which matches the one-pipeline-run-at-
//! a-time contract of the core. Routes:
//!
//! - `POST /detect`  submit one image, returns the detection records as JSON
//! - `GET /ledger`   download the CSV ledger verbatim
//! - `GET /health`   liveness probe
//!
//! `POST /detect` accepts either a `multipart/form-data` body with an
//! `image` file part (the browser upload contract) or a raw image body with
//! an optional `X-Filename` header.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::error::Error;
use crate::pipeline::DetectionPipeline;

/// Large enough for a typical camera still; requests beyond this are refused.
const MAX_REQUEST_BYTES: usize = 16 * 1024 * 1024;

const FALLBACK_FILENAME: &str = "upload";

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub addr: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:5001".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct ApiHandle {
    pub addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl ApiHandle {
    pub fn stop(mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(join) = self.join.take() {
            join.join()
                .map_err(|_| anyhow!("api server thread panicked"))?;
        }
        Ok(())
    }
}

pub struct ApiServer {
    cfg: ApiConfig,
    pipeline: DetectionPipeline,
}

impl ApiServer {
    pub fn new(cfg: ApiConfig, pipeline: DetectionPipeline) -> Self {
        Self { cfg, pipeline }
    }

    pub fn spawn(self) -> Result<ApiHandle> {
        let configured_addr: SocketAddr = self.cfg.addr.parse()?;
        let listener = TcpListener::bind(configured_addr)?;
        let addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_thread = shutdown.clone();
        let mut pipeline = self.pipeline;
        let join = std::thread::spawn(move || {
            if let Err(err) = run_api(listener, &mut pipeline, shutdown_thread) {
                log::error!("detect api stopped: {}", err);
            }
        });

        Ok(ApiHandle {
            addr,
            shutdown,
            join: Some(join),
        })
    }
}

fn run_api(
    listener: TcpListener,
    pipeline: &mut DetectionPipeline,
    shutdown: Arc<AtomicBool>,
) -> Result<()> {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        match listener.accept() {
            Ok((stream, _)) => {
                if let Err(err) = handle_connection(stream, pipeline) {
                    log::warn!("detect api request rejected: {}", err);
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(50));
                continue;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn handle_connection(mut stream: TcpStream, pipeline: &mut DetectionPipeline) -> Result<()> {
    let request = match read_request(&mut stream) {
        Ok(request) => request,
        Err(err) => {
            // Still tell the client something went wrong before dropping
            // the connection.
            let _ = write_json_response(&mut stream, 400, r#"{"error":"bad_request"}"#);
            return Err(err);
        }
    };

    if request.method == "OPTIONS" {
        // CORS preflight for the browser frontend.
        write_response(&mut stream, 204, "text/plain", b"")?;
        return Ok(());
    }

    match (request.method.as_str(), request.path.as_str()) {
        ("POST", "/detect") => handle_detect(&mut stream, pipeline, &request),
        ("GET", "/health") => write_json_response(&mut stream, 200, r#"{"status":"ok"}"#),
        ("GET", "/ledger") => handle_ledger_download(&mut stream, pipeline),
        (_, "/detect") | (_, "/health") | (_, "/ledger") => {
            write_json_response(&mut stream, 405, r#"{"error":"method_not_allowed"}"#)
        }
        _ => write_json_response(&mut stream, 404, r#"{"error":"not_found"}"#),
    }
}

fn handle_detect(
    stream: &mut TcpStream,
    pipeline: &mut DetectionPipeline,
    request: &HttpRequest,
) -> Result<()> {
    let payload = match extract_image_payload(request) {
        Ok(payload) => payload,
        Err(Error::MissingImage) => {
            return write_json_response(stream, 400, r#"{"error":"no_image_provided"}"#);
        }
        Err(err) => return Err(err.into()),
    };

    let image = match image::load_from_memory(&payload.bytes) {
        Ok(image) => image.to_rgb8(),
        Err(err) => {
            log::warn!("undecodable image payload '{}': {}", payload.filename, err);
            return write_json_response(stream, 400, r#"{"error":"invalid_image"}"#);
        }
    };

    match pipeline.run(&image, &payload.filename) {
        Ok(records) => {
            let body = serde_json::to_vec(&records)?;
            write_response(stream, 200, "application/json", &body)
        }
        Err(err) => {
            log::error!("pipeline failed for '{}': {}", payload.filename, err);
            let body = match err {
                Error::Ledger(_) => r#"{"error":"ledger_unavailable"}"#,
                Error::Model(_) => r#"{"error":"model_failure"}"#,
                _ => r#"{"error":"internal"}"#,
            };
            write_json_response(stream, 500, body)
        }
    }
}

fn handle_ledger_download(stream: &mut TcpStream, pipeline: &DetectionPipeline) -> Result<()> {
    match pipeline.ledger().read_bytes() {
        Ok(bytes) => {
            let header = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/csv\r\nContent-Disposition: attachment; filename=\"results.csv\"\r\nAccess-Control-Allow-Origin: *\r\nContent-Length: {}\r\n\r\n",
                bytes.len()
            );
            stream.write_all(header.as_bytes())?;
            stream.write_all(&bytes)?;
            Ok(())
        }
        Err(Error::LedgerNotFound) => {
            write_json_response(stream, 404, r#"{"error":"ledger_not_found"}"#)
        }
        Err(err) => Err(err.into()),
    }
}

struct ImagePayload {
    filename: String,
    bytes: Vec<u8>,
}

/// Pulls the image bytes and filename out of the request: the `image` file
/// part of a multipart body, or the raw body with `X-Filename`.
fn extract_image_payload(request: &HttpRequest) -> crate::error::Result<ImagePayload> {
    if let Some(content_type) = request.headers.get("content-type") {
        if let Some(boundary) = multipart_boundary(content_type) {
            let (filename, bytes) =
                parse_multipart(&request.body, &boundary).ok_or(Error::MissingImage)?;
            if bytes.is_empty() {
                return Err(Error::MissingImage);
            }
            return Ok(ImagePayload {
                filename: filename.unwrap_or_else(|| FALLBACK_FILENAME.to_string()),
                bytes,
            });
        }
    }

    if request.body.is_empty() {
        return Err(Error::MissingImage);
    }
    let filename = request
        .headers
        .get("x-filename")
        .cloned()
        .or_else(|| request.query_param("filename"))
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string());
    Ok(ImagePayload {
        filename,
        bytes: request.body.clone(),
    })
}

fn multipart_boundary(content_type: &str) -> Option<String> {
    let (kind, params) = content_type.split_once(';')?;
    if !kind.trim().eq_ignore_ascii_case("multipart/form-data") {
        return None;
    }
    for param in params.split(';') {
        if let Some((key, value)) = param.split_once('=') {
            if key.trim().eq_ignore_ascii_case("boundary") {
                return Some(value.trim().trim_matches('"').to_string());
            }
        }
    }
    None
}

/// Extracts the first file part from a multipart/form-data body. Returns the
/// part's filename (when the Content-Disposition carries one) and its bytes.
fn parse_multipart(body: &[u8], boundary: &str) -> Option<(Option<String>, Vec<u8>)> {
    let delimiter = format!("--{}", boundary).into_bytes();
    let mut offset = find(body, &delimiter, 0)?;
    loop {
        offset += delimiter.len();
        if body[offset..].starts_with(b"--") {
            return None; // closing delimiter, no file part found
        }
        // Part headers run to the first blank line.
        let header_end = find(body, b"\r\n\r\n", offset)?;
        let headers = String::from_utf8_lossy(&body[offset..header_end]);
        let data_start = header_end + 4;
        let data_end = find(body, &delimiter, data_start)?;
        // Data is terminated by CRLF before the next delimiter; a part may
        // be empty, with the delimiter directly after the blank line.
        let data = if data_end >= data_start + 2 {
            body[data_start..data_end - 2].to_vec()
        } else {
            Vec::new()
        };

        if headers.to_ascii_lowercase().contains("content-disposition") {
            let filename = part_filename(&headers);
            if filename.is_some() || part_name(&headers).as_deref() == Some("image") {
                return Some((filename, data));
            }
        }
        offset = data_end;
    }
}

fn part_filename(headers: &str) -> Option<String> {
    disposition_param(headers, "filename=\"")
}

fn part_name(headers: &str) -> Option<String> {
    disposition_param(headers, "name=\"")
}

fn disposition_param(headers: &str, key: &str) -> Option<String> {
    let start = headers.find(key)? + key.len();
    let end = headers[start..].find('"')? + start;
    Some(headers[start..end].to_string())
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| pos + from)
}

fn read_request(stream: &mut TcpStream) -> Result<HttpRequest> {
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    let mut buf = [0u8; 8192];
    let mut data = Vec::new();
    let header_end = loop {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            break find(&data, b"\r\n\r\n", 0).ok_or_else(|| anyhow!("truncated request"))?;
        }
        data.extend_from_slice(&buf[..n]);
        if data.len() > MAX_REQUEST_BYTES {
            return Err(anyhow!("request too large"));
        }
        if let Some(pos) = find(&data, b"\r\n\r\n", 0) {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().ok_or_else(|| anyhow!("empty request"))?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().ok_or_else(|| anyhow!("missing method"))?;
    let raw_path = parts.next().ok_or_else(|| anyhow!("missing path"))?;
    let mut headers = HashMap::new();
    for line in lines {
        if let Some((k, v)) = line.split_once(':') {
            headers.insert(k.trim().to_lowercase(), v.trim().to_string());
        }
    }

    let content_length: usize = headers
        .get("content-length")
        .map(|v| v.parse())
        .transpose()
        .map_err(|_| anyhow!("invalid content-length"))?
        .unwrap_or(0);
    if content_length > MAX_REQUEST_BYTES {
        return Err(anyhow!("request body too large"));
    }

    let mut body = data[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            return Err(anyhow!("connection closed mid-body"));
        }
        body.extend_from_slice(&buf[..n]);
    }
    body.truncate(content_length);

    let path = raw_path.split('?').next().unwrap_or(raw_path).to_string();
    Ok(HttpRequest {
        method: method.to_string(),
        path,
        raw_path: raw_path.to_string(),
        headers,
        body,
    })
}

fn write_json_response(stream: &mut TcpStream, status: u16, body: &str) -> Result<()> {
    write_response(stream, status, "application/json", body.as_bytes())
}

fn write_response(
    stream: &mut TcpStream,
    status: u16,
    content_type: &str,
    body: &[u8],
) -> Result<()> {
    let status_line = match status {
        200 => "HTTP/1.1 200 OK",
        204 => "HTTP/1.1 204 No Content",
        400 => "HTTP/1.1 400 Bad Request",
        404 => "HTTP/1.1 404 Not Found",
        405 => "HTTP/1.1 405 Method Not Allowed",
        _ => "HTTP/1.1 500 Internal Server Error",
    };
    let header = format!(
        "{status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {len}\r\nAccess-Control-Allow-Origin: *\r\nAccess-Control-Allow-Methods: GET, POST, OPTIONS\r\nAccess-Control-Allow-Headers: Content-Type, X-Filename\r\nCache-Control: no-store\r\n\r\n",
        status_line = status_line,
        content_type = content_type,
        len = body.len()
    );
    stream.write_all(header.as_bytes())?;
    stream.write_all(body)?;
    Ok(())
}

#[derive(Debug)]
struct HttpRequest {
    method: String,
    path: String,
    raw_path: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl HttpRequest {
    fn query_param(&self, key: &str) -> Option<String> {
        let query = self.raw_path.split('?').nth(1)?;
        for pair in query.split('&') {
            if let Some((k, v)) = pair.split_once('=') {
                if k == key {
                    return Some(v.to_string());
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multipart_file_part_is_extracted() {
        let body = b"--XBOUND\r\nContent-Disposition: form-data; name=\"image\"; filename=\"car.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n\x01\x02\x03\r\n--XBOUND--\r\n";
        let (filename, data) = parse_multipart(body, "XBOUND").unwrap();
        assert_eq!(filename.as_deref(), Some("car.jpg"));
        assert_eq!(data, vec![1, 2, 3]);
    }

    #[test]
    fn multipart_skips_non_file_fields() {
        let body = b"--B\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--B\r\nContent-Disposition: form-data; name=\"image\"; filename=\"a.png\"\r\n\r\nDATA\r\n--B--\r\n";
        let (filename, data) = parse_multipart(body, "B").unwrap();
        assert_eq!(filename.as_deref(), Some("a.png"));
        assert_eq!(data, b"DATA".to_vec());
    }

    #[test]
    fn multipart_empty_file_part_yields_empty_data() {
        // Closing delimiter directly after the blank header line.
        let body = b"--B\r\nContent-Disposition: form-data; name=\"image\"; filename=\"x\"\r\n\r\n--B--\r\n";
        let (filename, data) = parse_multipart(body, "B").unwrap();
        assert_eq!(filename.as_deref(), Some("x"));
        assert!(data.is_empty());
    }

    #[test]
    fn multipart_without_file_part_is_rejected() {
        let body = b"--B\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--B--\r\n";
        assert!(parse_multipart(body, "B").is_none());
    }

    #[test]
    fn boundary_is_parsed_from_content_type() {
        assert_eq!(
            multipart_boundary("multipart/form-data; boundary=----WebKit123").as_deref(),
            Some("----WebKit123")
        );
        assert_eq!(multipart_boundary("application/json"), None);
    }
}
