use crate::{
    application::decode_qrcode::dto::DecodeQrCodeResponse,
    domain::qrcode::entity::InboundUpload,
    presentation::http::{errors::AppError, state::AppState},
};
use axum::{
    Json,
    extract::{Multipart, State},
};

const FILE_FIELD: &str = "file";

pub async fn decode_qrcode(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<DecodeQrCodeResponse>, AppError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?;
        upload = Some(InboundUpload::new(data, filename, content_type));
    }

    let upload = upload.ok_or(AppError::MissingField(FILE_FIELD))?;
    let response = state.decode_qrcode.execute(upload).await?;
    Ok(Json(response))
}
