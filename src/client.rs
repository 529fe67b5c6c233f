use crate::image::EncodedImage;
use serde::{Deserialize, Serialize};

/// Path of the classification function relative to the service base URL.
pub const CLASSIFY_PATH: &str = "/functions/v1/classify-image";

/// Environment variable holding the service base URL.
pub const SERVICE_URL_ENV: &str = "CLASSIFY_SERVICE_URL";

/// Environment variable holding the bearer credential.
pub const SERVICE_KEY_ENV: &str = "CLASSIFY_SERVICE_KEY";

/// Message used when a failed response does not say what went wrong.
pub const GENERIC_FAILURE: &str = "Classification failed";

/// A single label reported by the classification service.
///
/// Entries are taken as the service sends them: a missing label or confidence
/// falls back to its default instead of failing the whole response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub label: String,
    /// Expected within `0.0..=1.0`.
    #[serde(default)]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body of the classification request.
#[derive(Debug, Serialize)]
pub struct ClassificationRequest<'a> {
    #[serde(rename = "imageData")]
    pub image_data: &'a EncodedImage,
}

/// Body of a successful classification response.
#[derive(Debug, Default, Deserialize)]
pub struct ClassificationResponse {
    #[serde(default)]
    pub predictions: Option<Vec<Prediction>>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<String>,
}

/// Ways a classification can fail.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    /// The request could not be sent or the response could not be read.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("{message}")]
    Service { status: u16, message: String },
    /// A success response whose body is not the expected JSON.
    #[error("malformed response: {0}")]
    MalformedResponse(#[source] serde_json::Error),
}

/// Ways the client configuration can be incomplete.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required value is absent or empty.
    #[error("missing configuration value: {0}")]
    Missing(&'static str),
}

/// Where and how to reach the classification service.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub credential: String,
}

impl ClientConfig {
    /// Builds a configuration from a service base URL and a bearer credential.
    pub fn new(base_url: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            credential: credential.into(),
        }
    }

    /// Reads the configuration from [`SERVICE_URL_ENV`] and [`SERVICE_KEY_ENV`].
    ///
    /// Only presence is checked; the values are otherwise opaque.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup(SERVICE_URL_ENV)
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing(SERVICE_URL_ENV))?;
        let credential = lookup(SERVICE_KEY_ENV)
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing(SERVICE_KEY_ENV))?;
        Ok(Self::new(base_url, credential))
    }

    /// Full URL of the classification function.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), CLASSIFY_PATH)
    }
}

/// HTTP client for the remote classification service.
///
/// Holds no per-request state: every [`classify`](Self::classify) call sends
/// exactly one request and can run alongside others. There is no retry and no
/// timeout beyond what the underlying [`reqwest::Client`] is configured with.
#[derive(Clone, Debug)]
pub struct ClassificationClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ClassificationClient {
    /// Creates a client with a default [`reqwest::Client`].
    pub fn new(config: ClientConfig) -> Self {
        Self::with_http(reqwest::Client::new(), config)
    }

    /// Uses a preconfigured HTTP client, e.g. one with a timeout.
    pub fn with_http(http: reqwest::Client, config: ClientConfig) -> Self {
        Self { http, config }
    }

    /// The configuration this client talks to.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends the image to the service and returns its predictions in the order
    /// the service produced them.
    ///
    /// A success response without `predictions` yields an empty list.
    pub async fn classify(&self, image: &EncodedImage) -> Result<Vec<Prediction>, ClassifyError> {
        let endpoint = self.config.endpoint();
        log::debug!("Sending classification request to {}", endpoint);

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.config.credential)
            .json(&ClassificationRequest { image_data: image })
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| GENERIC_FAILURE.to_string());
            log::warn!("Classification failed with {}: {}", status, message);
            return Err(ClassifyError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let parsed = parse_response(&body).map_err(ClassifyError::MalformedResponse)?;
        let predictions = parsed.predictions.unwrap_or_default();

        log::debug!("Received {} predictions", predictions.len());

        Ok(predictions)
    }
}

/// Parses a success body, which has to be a JSON object.
fn parse_response(body: &[u8]) -> Result<ClassificationResponse, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    if !value.is_object() {
        return Err(serde::de::Error::custom("expected a JSON object"));
    }
    serde_json::from_value(value)
}
