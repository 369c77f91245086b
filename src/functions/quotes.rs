//! Daily motivational quote

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::AppJson;
use crate::{
    error::{AppError, AppResult},
    middleware::auth::AuthenticatedUser,
    upstream::{ChatMessage, CompletionOptions},
    AppState,
};

const QUOTE_PROMPT: &str = "You share one short, uplifting quote about love, patience or \
staying connected across distance. Reply with the quote and its author only, no preamble.";

const MAX_MOOD_CHARS: usize = 64;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyQuoteRequest {
    #[serde(default)]
    pub mood: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DailyQuoteResponse {
    pub success: bool,
    pub quote: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
}

fn user_prompt(mood: Option<&str>) -> String {
    match mood {
        Some(mood) => format!("Give me today's quote. I am feeling {}.", mood),
        None => "Give me today's quote.".to_string(),
    }
}

/// Strip whitespace and the quotation marks models like to wrap answers in
fn clean_quote(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| matches!(c, '"' | '\u{201c}' | '\u{201d}'))
        .trim()
        .to_string()
}

/// POST /functions/daily-quote
pub async fn daily_quote(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    body: Option<AppJson<DailyQuoteRequest>>,
) -> AppResult<Json<DailyQuoteResponse>> {
    let request = body.map(|AppJson(request)| request).unwrap_or_default();
    let mood = request
        .mood
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string);

    if mood.as_ref().is_some_and(|m| m.chars().count() > MAX_MOOD_CHARS) {
        return Err(AppError::BadRequest(format!(
            "mood must not exceed {} characters",
            MAX_MOOD_CHARS
        )));
    }

    info!(step = "generate", user_id = %user.user_id, mood = ?mood, "Generating daily quote");

    let messages = [
        ChatMessage::system(QUOTE_PROMPT),
        ChatMessage::user(user_prompt(mood.as_deref())),
    ];
    let raw = state
        .perplexity
        .complete(
            &messages,
            CompletionOptions {
                temperature: Some(0.7),
                max_tokens: Some(150),
            },
        )
        .await?;

    let quote = clean_quote(&raw);
    if quote.is_empty() {
        return Err(AppError::UpstreamError("empty quote returned".to_string()));
    }

    Ok(Json(DailyQuoteResponse {
        success: true,
        quote,
        mood,
    }))
}
