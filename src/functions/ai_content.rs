//! AI-generated couple games and conversation summaries

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{caller_profile, AppJson};
use crate::{
    error::{AppError, AppResult},
    middleware::auth::AuthenticatedUser,
    tiers::{feature_gate, has_feature_access},
    upstream::{ChatMessage, CompletionOptions},
    AppState,
};

/// Longest topic or context accepted, in characters
pub const MAX_INPUT_CHARS: usize = 4000;

const GAME_PROMPT: &str = "You design playful, kind games for couples in long-distance \
relationships. Reply with a short title line followed by clear numbered rules. Keep it \
inclusive, safe for work, and playable over a video call.";

const SUMMARY_PROMPT: &str = "You are a warm relationship coach. Summarize the material \
for the couple in at most five sentences, then give one gentle, practical suggestion. \
Do not invent details.";

/// Kind of content to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Game,
    Summary,
}

impl ContentKind {
    /// Feature gating this kind of content
    pub fn feature(self) -> &'static str {
        match self {
            ContentKind::Game => "love_games",
            ContentKind::Summary => "relationship_insights",
        }
    }

    fn system_prompt(self) -> &'static str {
        match self {
            ContentKind::Game => GAME_PROMPT,
            ContentKind::Summary => SUMMARY_PROMPT,
        }
    }

    fn options(self) -> CompletionOptions {
        match self {
            ContentKind::Game => CompletionOptions {
                temperature: Some(0.9),
                max_tokens: Some(800),
            },
            ContentKind::Summary => CompletionOptions {
                temperature: Some(0.4),
                max_tokens: Some(400),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiContentRequest {
    pub kind: ContentKind,
    pub topic: String,
    #[serde(default)]
    pub context: Option<String>,
}

impl AiContentRequest {
    fn validate(&self) -> AppResult<()> {
        if self.topic.trim().is_empty() {
            return Err(AppError::BadRequest("topic is required".to_string()));
        }
        let total = self.topic.chars().count()
            + self.context.as_deref().map(|c| c.chars().count()).unwrap_or(0);
        if total > MAX_INPUT_CHARS {
            return Err(AppError::BadRequest(format!(
                "topic and context must not exceed {} characters",
                MAX_INPUT_CHARS
            )));
        }
        Ok(())
    }

    fn messages(&self) -> Vec<ChatMessage> {
        let mut prompt = self.topic.trim().to_string();
        if let Some(context) = self.context.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            prompt.push_str("\n\nContext:\n");
            prompt.push_str(context);
        }
        vec![
            ChatMessage::system(self.kind.system_prompt()),
            ChatMessage::user(prompt),
        ]
    }
}

#[derive(Debug, Serialize)]
pub struct AiContentResponse {
    pub success: bool,
    pub kind: ContentKind,
    pub content: String,
}

/// POST /functions/ai-content
pub async fn ai_content(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    AppJson(request): AppJson<AiContentRequest>,
) -> AppResult<Json<AiContentResponse>> {
    request.validate()?;

    let feature = request.kind.feature();
    let profile = caller_profile(&state, &user).await?;
    if !has_feature_access(profile.tier(), feature) {
        let required = feature_gate(feature)
            .map(|gate| gate.required_tier)
            .unwrap_or_default();
        return Err(AppError::FeatureLocked {
            feature: feature.to_string(),
            required,
        });
    }

    info!(step = "generate", user_id = %user.user_id, kind = ?request.kind, "Generating AI content");

    let content = state
        .openai
        .complete(&request.messages(), request.kind.options())
        .await?;

    Ok(Json(AiContentResponse {
        success: true,
        kind: request.kind,
        content,
    }))
}
