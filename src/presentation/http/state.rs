use crate::{application::decode_qrcode::use_case::DecodeQrCodeUseCase, config::Config};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub decode_qrcode: Arc<DecodeQrCodeUseCase>,
}
