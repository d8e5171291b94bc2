use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    error::AppError,
    middleware::CurrentUser,
    routes::{auth::model::User, product::model::Product},
    utils::success_to_api_response,
};

use super::model::{ToggleOutcome, ToggleRequest, ToggleResponse, toggle};

#[axum::debug_handler]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Json(req): Json<ToggleRequest>,
) -> Result<impl IntoResponse, AppError> {
    // A stale session may point at a deleted account.
    let user = User::find_by_id(&state.pool, claims.sub)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if !Product::exists(&state.pool, req.product_id).await? {
        return Err(AppError::NotFound("Product not found".into()));
    }

    let outcome = toggle(&state.pool, user.id, req.product_id).await?;
    let message = match outcome {
        ToggleOutcome::Added => "Product added to favorites",
        ToggleOutcome::Removed => "Product removed from favorites",
    };
    tracing::debug!("User {} {:?} favorite for product {}", user.id, outcome, req.product_id);

    Ok((
        StatusCode::OK,
        success_to_api_response(ToggleResponse {
            added: outcome == ToggleOutcome::Added,
            message: message.into(),
        }),
    ))
}

#[axum::debug_handler]
pub async fn list_favorites(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let products = Product::list_favorited_by(&state.pool, claims.sub).await?;
    Ok((StatusCode::OK, success_to_api_response(products)))
}
