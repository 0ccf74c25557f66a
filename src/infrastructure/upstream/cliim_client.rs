//! HTTP client for the Caoliao (cli.im) upload and QR detection endpoints.
//!
//! The upstream contract is not ours and is not consistent: the upload endpoint
//! reports success with a `status` that reads as `"1"`, the detector with the
//! number `1`. Both checks are kept separate on purpose.

use super::headers::BrowserProfile;
use crate::domain::qrcode::{
    entity::{DecodedContent, InboundUpload, UploadToken},
    errors::{MalformedKind, RelayError, Stage},
    recognizer::{QrRecognizer, RecognitionSession},
};
use async_trait::async_trait;
use reqwest::{
    Url,
    header::HeaderMap,
    multipart::{Form, Part},
};
use serde_json::{Map, Value};
use std::{sync::Arc, time::Duration};

pub const DEFAULT_UPLOAD_URL: &str = "https://upload.api.cli.im/upload.php?kid=cliim";
pub const DEFAULT_DECODE_URL: &str = "https://qrdetector-api.cli.im/v1/detect_binary";

/// Number of characters of a malformed body kept for diagnostics.
pub const EXCERPT_CHARS: usize = 200;

const UPLOAD_FIELD: &str = "Filedata";
const UPLOAD_FALLBACK: &str = "Upload failed";
const DECODE_FALLBACK: &str = "Decode failed";

struct Endpoints {
    upload_url: Url,
    decode_url: Url,
    upload_headers: HeaderMap,
    decode_headers: HeaderMap,
}

/// Opens one [`CliimSession`] per inbound request.
pub struct CliimRecognizer {
    endpoints: Arc<Endpoints>,
    timeout: Duration,
}

impl CliimRecognizer {
    /// # Errors
    ///
    /// Returns an error if either URL does not parse or the browser profile
    /// contains a value that cannot be sent as a header.
    pub fn new(
        upload_url: &str,
        decode_url: &str,
        profile: &BrowserProfile,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let endpoints = Endpoints {
            upload_url: Url::parse(upload_url)
                .map_err(|e| anyhow::anyhow!("Invalid upload URL {}: {}", upload_url, e))?,
            decode_url: Url::parse(decode_url)
                .map_err(|e| anyhow::anyhow!("Invalid decode URL {}: {}", decode_url, e))?,
            upload_headers: profile.upload_headers()?,
            decode_headers: profile.decode_headers()?,
        };
        Ok(Self {
            endpoints: Arc::new(endpoints),
            timeout,
        })
    }
}

impl QrRecognizer for CliimRecognizer {
    fn open_session(&self) -> Result<Box<dyn RecognitionSession>, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| client_unavailable(&e))?;
        Ok(Box::new(CliimSession {
            client,
            endpoints: self.endpoints.clone(),
        }))
    }
}

/// Owns the outbound connection pool of a single request.
pub struct CliimSession {
    client: reqwest::Client,
    endpoints: Arc<Endpoints>,
}

#[async_trait]
impl RecognitionSession for CliimSession {
    async fn upload(&self, upload: &InboundUpload) -> Result<UploadToken, RelayError> {
        let body = reqwest::Body::from(upload.data.clone());
        let part = Part::stream_with_length(body, upload.len() as u64)
            .file_name(upload.filename.clone())
            .mime_str(&upload.content_type)
            .map_err(|e| transport_error(Stage::Upload, &e))?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let raw = self
            .client
            .post(self.endpoints.upload_url.clone())
            .headers(self.endpoints.upload_headers.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_error(Stage::Upload, &e))?
            .text()
            .await
            .map_err(|e| transport_error(Stage::Upload, &e))?;

        let token = interpret_upload_body(&raw)?;
        tracing::debug!(path = %token.as_str(), "upstream accepted upload");
        Ok(token)
    }

    async fn decode(&self, token: &UploadToken) -> Result<DecodedContent, RelayError> {
        let raw = self
            .client
            .post(self.endpoints.decode_url.clone())
            .headers(self.endpoints.decode_headers.clone())
            .form(&[("remove_background", "1"), ("image_path", token.as_str())])
            .send()
            .await
            .map_err(|e| transport_error(Stage::Decode, &e))?
            .text()
            .await
            .map_err(|e| transport_error(Stage::Decode, &e))?;

        let content = interpret_decode_body(&raw)?;
        tracing::debug!(content_len = content.0.len(), "upstream decoded qr code");
        Ok(content)
    }
}

/// Reads the upload endpoint's answer into the stored image path.
pub fn interpret_upload_body(raw: &str) -> Result<UploadToken, RelayError> {
    let body = parse_object(Stage::Upload, raw)?;

    if status_text(body.get("status")) != "1" {
        return Err(RelayError::UpstreamRejected(upstream_message(
            &body,
            "info",
            UPLOAD_FALLBACK,
        )));
    }

    nested_str(&body, "path")
        .map(|path| UploadToken(path.to_string()))
        .ok_or_else(|| malformed(Stage::Upload, MalformedKind::MissingField("data.path"), raw))
}

/// Reads the detector's answer into the decoded QR payload.
pub fn interpret_decode_body(raw: &str) -> Result<DecodedContent, RelayError> {
    let body = parse_object(Stage::Decode, raw)?;

    let succeeded = body.get("status").and_then(Value::as_f64) == Some(1.0);
    if !succeeded {
        return Err(RelayError::UpstreamRejected(upstream_message(
            &body,
            "message",
            DECODE_FALLBACK,
        )));
    }

    nested_str(&body, "qrcode_content")
        .map(|content| DecodedContent(content.to_string()))
        .ok_or_else(|| {
            malformed(
                Stage::Decode,
                MalformedKind::MissingField("data.qrcode_content"),
                raw,
            )
        })
}

/// First [`EXCERPT_CHARS`] characters of `raw`, cut on a character boundary.
pub fn excerpt(raw: &str) -> String {
    raw.chars().take(EXCERPT_CHARS).collect()
}

fn parse_object(stage: Stage, raw: &str) -> Result<Map<String, Value>, RelayError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(body)) => Ok(body),
        _ => Err(malformed(stage, MalformedKind::NotJson, raw)),
    }
}

fn malformed(stage: Stage, kind: MalformedKind, raw: &str) -> RelayError {
    RelayError::UpstreamMalformed {
        stage,
        kind,
        excerpt: excerpt(raw),
    }
}

// Upload status arrives as either `"1"` or `1`.
fn status_text(status: Option<&Value>) -> String {
    match status {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn upstream_message(body: &Map<String, Value>, key: &str, fallback: &str) -> String {
    match body.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => fallback.to_string(),
        Some(other) => other.to_string(),
    }
}

fn nested_str<'a>(body: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    body.get("data")?.get(key)?.as_str()
}

fn transport_error(stage: Stage, err: &reqwest::Error) -> RelayError {
    tracing::debug!(stage = %stage, upstream_error = %err);
    let reason = if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        "connection failed".to_string()
    } else {
        err.to_string()
    };
    RelayError::TransportFailure { stage, reason }
}

// No request has left yet when the client cannot be built; the failure is
// attributed to the upload step because that is the call it prevents.
fn client_unavailable(err: &dyn std::fmt::Display) -> RelayError {
    tracing::debug!(client_error = %err);
    RelayError::TransportFailure {
        stage: Stage::Upload,
        reason: format!("client unavailable: {}", err),
    }
}
