mod classification;
mod inference_service;
mod model_service;
mod ort_service;
mod preprocessing;
mod routes;
mod server;

pub mod config;

pub use classification::{Label, Prediction};
pub use server::start_server;
