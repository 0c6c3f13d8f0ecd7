use crate::{
    classification::Prediction,
    inference_service::PredictionError,
    model_service::ModelService,
    server::SharedState,
};
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::instrument;

pub const IMAGE_FIELD: &str = "image";

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("Invalid multipart request: {0}")]
    Rejection(#[from] MultipartRejection),
    #[error("Failed to read multipart field: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Missing image field `{0}`")]
    MissingImage(&'static str),
    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

// Every failure, bad upload included, is reported as a 500 with an `error` body.
impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        tracing::error!("Prediction request failed: {}", self);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[instrument(skip(state, multipart))]
pub async fn predict_image<M: ModelService>(
    State(state): State<SharedState<M>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Prediction>, PredictError> {
    let mut multipart = multipart?;
    let mut image_data: Option<Vec<u8>> = None;
    let mut form_fields: HashMap<String, String> = HashMap::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let is_file = field.file_name().is_some();
        if is_file && name == IMAGE_FIELD {
            if image_data.is_none() {
                image_data = Some(field.bytes().await?.to_vec());
            }
        } else if !is_file {
            let value = field.bytes().await?;
            form_fields.insert(name, String::from_utf8_lossy(&value).into_owned());
        }
    }

    // Form fields ride along with the upload but do not feed the model.
    tracing::debug!("Received form fields: {:?}", form_fields);

    let image_data = image_data.ok_or(PredictError::MissingImage(IMAGE_FIELD))?;
    let prediction = state.inference_service.predict(image_data).await?;

    Ok(Json(prediction))
}
