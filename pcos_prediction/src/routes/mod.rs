mod health;
mod predict;

use crate::{model_service::ModelService, server::SharedState};
use axum::{
    routing::{get, post},
    Router,
};

use health::healthcheck;
use predict::predict_image;

pub fn api_routes<M: ModelService>() -> Router<SharedState<M>> {
    Router::new()
        .route("/predict", post(predict_image::<M>))
        .route("/health", get(healthcheck))
}
