use argh::FromArgs;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
    routing::{get, post},
};
use kornia_classify::{CLASSIFY_PATH, DATA_URL_IMAGE_PREFIX, Prediction};
use std::sync::Arc;

mod messages;

// defaults for the server
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_KEY: &str = "local-dev-key";

#[derive(FromArgs)]
/// Local stand-in for the image classification service.
struct MockServiceArgs {
    /// the host to run the server on
    #[argh(option, short = 'h', default = "DEFAULT_HOST.to_string()")]
    host: String,

    /// the port to run the server on
    #[argh(option, short = 'p', default = "DEFAULT_PORT")]
    port: u16,

    /// the bearer credential clients must send
    #[argh(option, short = 'k', default = "DEFAULT_KEY.to_string()")]
    key: String,

    /// answer every request with a 500 carrying this message
    #[argh(option)]
    fail_with: Option<String>,
}

struct ServiceState {
    key: String,
    fail_with: Option<String>,
}

fn error_reply(status: StatusCode, error: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(messages::ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

async fn post_classify(
    State(state): State<Arc<ServiceState>>,
    headers: HeaderMap,
    Json(payload): Json<messages::ClassifyImageRequest>,
) -> impl IntoResponse {
    let expected = format!("Bearer {}", state.key);
    let authorized = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        log::warn!("Rejected request with a bad credential");
        return error_reply(StatusCode::UNAUTHORIZED, "Invalid credential");
    }

    if !payload.image_data.starts_with(DATA_URL_IMAGE_PREFIX) {
        return error_reply(StatusCode::BAD_REQUEST, "imageData must be an image data url");
    }

    if let Some(message) = &state.fail_with {
        return error_reply(StatusCode::INTERNAL_SERVER_ERROR, message.clone());
    }

    log::info!("Classifying {} bytes of image data", payload.image_data.len());

    let predictions = vec![
        Prediction {
            label: "Cat".to_string(),
            confidence: 0.92,
            description: Some("A small domesticated feline".to_string()),
        },
        Prediction {
            label: "Fox".to_string(),
            confidence: 0.05,
            description: None,
        },
        Prediction {
            label: "Dog".to_string(),
            confidence: 0.03,
            description: None,
        },
    ];

    (
        StatusCode::OK,
        Json(messages::ClassifyImageResponse { predictions }),
    )
        .into_response()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: MockServiceArgs = argh::from_env();

    // format the host and port
    let addr = format!("{}:{}", args.host, args.port);

    let state = Arc::new(ServiceState {
        key: args.key,
        fail_with: args.fail_with,
    });

    let app = Router::new()
        .route("/", get(|| async { "Mock classification service" }))
        .route(CLASSIFY_PATH, post(post_classify))
        .with_state(state);

    log::info!("Listening on: {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
