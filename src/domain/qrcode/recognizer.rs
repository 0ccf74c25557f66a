use super::entity::{DecodedContent, InboundUpload, UploadToken};
use super::errors::RelayError;
use async_trait::async_trait;

/// Outbound connection scope shared by the two calls of a single request.
///
/// Dropping the session releases its connections, so every exit path of a
/// request (success, rejection, transport failure, cancellation) cleans up.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecognitionSession: Send + Sync {
    /// Sends the file to the upstream store and returns the path it was saved under.
    async fn upload(&self, upload: &InboundUpload) -> Result<UploadToken, RelayError>;

    /// Asks the upstream detector to read the QR code stored at `token`.
    async fn decode(&self, token: &UploadToken) -> Result<DecodedContent, RelayError>;
}

/// Factory for per-request sessions.
#[cfg_attr(test, mockall::automock)]
pub trait QrRecognizer: Send + Sync {
    fn open_session(&self) -> Result<Box<dyn RecognitionSession>, RelayError>;
}
