use serde::{Deserialize, Serialize};

/// Response record for one `/predict` upload. The endpoint always answers
/// HTTP 200 with this shape; `warning` marks a fallback-derived prediction
/// and `error` marks a request that could not be graded at all
/// (`prediction_class` is -1 in that case).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PredictionResponse {
    pub filename: String,
    pub prediction_class: i32,
    pub prediction_label: String,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WelcomeResponse {
    pub message: String,
}
