//! Book metadata lookup with an affiliate link

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::Serialize;
use tracing::info;

use super::AppJson;
use crate::{
    error::{AppError, AppResult},
    middleware::auth::AuthenticatedUser,
    upstream::books::{affiliate_url, BookInfo, BookQuery},
    AppState,
};

#[derive(Debug, Serialize)]
pub struct BookLookupResponse {
    pub success: bool,
    pub book: BookInfo,
    pub affiliate_url: String,
}

/// POST /functions/book-lookup
pub async fn book_lookup(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    AppJson(query): AppJson<BookQuery>,
) -> AppResult<Json<BookLookupResponse>> {
    let search = query.to_search().ok_or_else(|| {
        AppError::BadRequest("Provide a title, author or ISBN".to_string())
    })?;

    info!(step = "search", user_id = %user.user_id, search = %search, "Looking up book");

    let book = state
        .books
        .lookup(&search)
        .await?
        .ok_or_else(|| AppError::NotFound("No matching book found".to_string()))?;

    let affiliate_url = affiliate_url(&book, &state.config.amazon_associate_tag)?;
    info!(step = "done", title = %book.title, "Book found");

    Ok(Json(BookLookupResponse {
        success: true,
        book,
        affiliate_url,
    }))
}
