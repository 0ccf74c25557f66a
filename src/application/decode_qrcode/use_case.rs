use crate::{
    application::decode_qrcode::dto::DecodeQrCodeResponse,
    domain::qrcode::{entity::InboundUpload, errors::RelayError, recognizer::QrRecognizer},
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Relays one uploaded image through the upstream recogniser.
///
/// The two upstream calls run strictly in sequence on a session opened for this
/// request only: decode is never attempted unless upload succeeded, and the
/// session is dropped on every return path. Nothing is retried.
pub struct DecodeQrCodeUseCase {
    recognizer: Arc<dyn QrRecognizer>,
}

impl DecodeQrCodeUseCase {
    pub fn new(recognizer: Arc<dyn QrRecognizer>) -> Self {
        Self { recognizer }
    }

    /// Uploads the file, then asks the upstream to decode it.
    ///
    /// # Errors
    ///
    /// Returns the first [`RelayError`] raised by either step.
    #[instrument(skip(self, upload), fields(
        filename = %upload.filename,
        content_type = %upload.content_type,
        size = upload.len()
    ))]
    pub async fn execute(&self, upload: InboundUpload) -> Result<DecodeQrCodeResponse, RelayError> {
        if upload.is_empty() {
            warn!("Forwarding empty upload, upstream decides");
        }

        let session = self.recognizer.open_session()?;
        let token = session.upload(&upload).await?;
        let content = session.decode(&token).await?;

        info!("QR code decoded");
        Ok(DecodeQrCodeResponse {
            content: content.into_inner(),
        })
    }
}
