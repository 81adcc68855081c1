use ai::ImageCaptionInput;
use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;

use crate::{error::ApiError, Ctx};

#[derive(Debug, Serialize)]
pub struct CaptionResponse {
    pub caption: String,
}

/// POST /api/caption. One image per request, synchronous: the response is
/// only written once generation and stylization have finished.
pub async fn generate(
    State(ctx): State<Ctx>,
    mut multipart: Multipart,
) -> Result<Json<CaptionResponse>, ApiError> {
    let mut image_bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadUpload(e.to_string()))?
    {
        if field.name() == Some("image") {
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadUpload(e.to_string()))?;
            image_bytes = Some(data.to_vec());
        }
    }

    let image_bytes = image_bytes
        .filter(|bytes| !bytes.is_empty())
        .ok_or(ApiError::MissingImage)?;

    let caption = ctx
        .caption_model
        .process_single(ImageCaptionInput { image_bytes })
        .await
        .map_err(|e| ApiError::Caption(e.to_string()))?;

    let stylized = stylizer::stylize(&caption, &mut rand::thread_rng());
    tracing::info!(caption = %stylized, "caption generated");

    Ok(Json(CaptionResponse { caption: stylized }))
}
