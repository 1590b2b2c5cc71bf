//! A throwaway OpenAI-compatible HTTP server for provider tests.
//!
//! Every POST to `/chat/completions` or `/embeddings` is recorded and
//! answered with the same canned response.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub(crate) enum MockResponse {
    Json(u16, Value),
    Text(u16, String),
}

impl MockResponse {
    pub(crate) fn completion(content: &str) -> Self {
        Self::Json(
            200,
            json!({
                "model": "gpt-test",
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": content },
                    "finish_reason": "stop"
                }],
                "usage": { "prompt_tokens": 12, "completion_tokens": 7, "total_tokens": 19 }
            }),
        )
    }

    /// Embedding vectors returned in reverse `index` order, as some servers do.
    pub(crate) fn embeddings(vectors: Vec<Vec<f32>>) -> Self {
        let data: Vec<Value> = vectors
            .into_iter()
            .enumerate()
            .rev()
            .map(|(i, v)| json!({ "object": "embedding", "index": i, "embedding": v }))
            .collect();
        Self::Json(200, json!({ "model": "embed-test", "data": data }))
    }

    pub(crate) fn status(code: u16, body: &str) -> Self {
        Self::Text(code, body.to_string())
    }
}

#[derive(Clone)]
struct MockState {
    response: MockResponse,
    requests: Arc<Mutex<Vec<Value>>>,
}

pub(crate) struct MockServer {
    pub(crate) base_url: String,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl MockServer {
    /// Request bodies received so far, oldest first.
    pub(crate) async fn requests(&self) -> Vec<Value> {
        self.requests.lock().await.clone()
    }
}

async fn handle(State(state): State<MockState>, body: String) -> Response {
    let parsed = serde_json::from_str(&body).unwrap_or(Value::String(body));
    state.requests.lock().await.push(parsed);

    match state.response {
        MockResponse::Json(code, value) => (status(code), axum::Json(value)).into_response(),
        MockResponse::Text(code, text) => (status(code), text).into_response(),
    }
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

pub(crate) async fn spawn(response: MockResponse) -> MockServer {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        response,
        requests: requests.clone(),
    };

    let app = Router::new()
        .route("/v1/chat/completions", post(handle))
        .route("/v1/embeddings", post(handle))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockServer {
        base_url: format!("http://{addr}/v1"),
        requests,
    }
}
