use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use docent_llm::{Message, Role};

use super::server::AppState;

const INDEX_HTML: &str = include_str!("../assets/index.html");

#[derive(serde::Deserialize)]
pub(crate) struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(serde::Serialize)]
struct ChatResponse {
    reply: String,
}

/// `question` alone, or a `messages` history whose last user turn is the question.
#[derive(serde::Deserialize)]
pub(crate) struct AskRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl AskRequest {
    /// Split into the question and the turns before it. Turns after the last user
    /// message are dropped.
    fn into_turn(self) -> Option<(String, Vec<Message>)> {
        let mut history = self.messages;
        if let Some(question) = self.question {
            return Some((question, history));
        }
        let last_user = history.iter().rposition(|m| m.role == Role::User)?;
        history.truncate(last_user + 1);
        let question = history.pop()?.content;
        Some((question, history))
    }
}

#[derive(serde::Serialize)]
struct AskResponse {
    answer: String,
}

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    documents_loaded: usize,
}

pub(crate) async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> impl IntoResponse {
    tracing::debug!(chars = payload.message.chars().count(), "chat request");
    let reply = state.backend.reply(&payload.message).await;
    Json(ChatResponse { reply })
}

pub(crate) async fn ask_handler(
    State(state): State<AppState>,
    Json(payload): Json<AskRequest>,
) -> Response {
    let Some((question, history)) = payload.into_turn() else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(AskResponse {
                answer: "Error: request needs a question or a user message".into(),
            }),
        )
            .into_response();
    };
    tracing::debug!(
        chars = question.chars().count(),
        turns = history.len(),
        "ask request"
    );
    let answer = state.backend.reply_with_history(&question, &history).await;
    Json(AskResponse { answer }).into_response()
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
        documents_loaded: state.backend.documents_loaded(),
    })
}

pub(crate) async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}
