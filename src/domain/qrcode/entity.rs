use bytes::Bytes;

/// Content type forwarded upstream when the client did not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// Filename forwarded upstream when the client did not provide one.
pub const DEFAULT_FILENAME: &str = "upload";

/// A file received on the inbound endpoint, alive for the duration of one request.
///
/// The bytes are never inspected locally. Empty or non-image payloads are forwarded
/// as-is and the upstream decides whether to accept them.
#[derive(Debug, Clone)]
pub struct InboundUpload {
    pub data: Bytes,
    pub filename: String,
    pub content_type: String,
}

impl InboundUpload {
    pub fn new(data: Bytes, filename: Option<String>, content_type: Option<String>) -> Self {
        Self {
            data,
            filename: filename
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_FILENAME.to_string()),
            content_type: content_type
                .filter(|ct| !ct.is_empty())
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Opaque storage path handed back by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadToken(pub String);

impl UploadToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Text payload recognised in the QR code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedContent(pub String);

impl DecodedContent {
    pub fn into_inner(self) -> String {
        self.0
    }
}
