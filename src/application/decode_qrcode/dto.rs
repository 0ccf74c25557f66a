use serde::Serialize;

/// Success envelope returned by `POST /decode_qrcode/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodeQrCodeResponse {
    pub content: String,
}
