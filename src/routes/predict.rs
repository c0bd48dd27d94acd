use crate::{error::PredictError, model_service::PredictRequest, prediction::Prediction, server::SharedState};
use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use bytes::Bytes;
use tracing::instrument;

/// Uploads above this are rejected before the pipeline runs.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// `POST /predict/{plant}`, multipart form with an `image` part. Validation
/// happens in a fixed order: known plant first (before any model I/O), then
/// presence, content type, and size of the image part.
#[instrument(skip(state, multipart))]
pub async fn predict(
    State(state): State<SharedState>,
    Path(plant): Path<String>,
    multipart: Multipart,
) -> Result<Json<Prediction>, PredictError> {
    let entry = state
        .catalog
        .find(&plant)
        .ok_or(PredictError::InvalidPlant)?
        .clone();

    let (content_type, image_data) = read_image_part(multipart).await?;

    match content_type.as_deref().map(top_level_segment) {
        Some("image") => {}
        _ => return Err(PredictError::InvalidImageType),
    }
    if image_data.len() > MAX_IMAGE_BYTES {
        return Err(PredictError::ImageTooLarge {
            size: image_data.len(),
        });
    }

    let request = PredictRequest {
        image_data: image_data.to_vec(),
        plant,
        model_location: entry.model,
        labels: entry.labels,
    };
    let prediction = state.model_service.predict(request).await?;

    Ok(Json(prediction))
}

async fn read_image_part(
    mut multipart: Multipart,
) -> Result<(Option<String>, Bytes), PredictError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PredictError::InvalidBody(e.to_string()))?
    {
        if field.name() == Some("image") {
            let content_type = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| PredictError::InvalidBody(e.to_string()))?;
            return Ok((content_type, data));
        }
    }

    Err(PredictError::MissingImage)
}

fn top_level_segment(content_type: &str) -> &str {
    content_type.split('/').next().unwrap_or_default()
}
