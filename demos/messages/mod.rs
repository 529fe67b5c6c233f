use kornia_classify::Prediction;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyImageRequest {
    #[serde(rename = "imageData")]
    pub image_data: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifyImageResponse {
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
