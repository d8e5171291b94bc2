use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    AppState, error::AppError, routes::product::model::Product, utils::success_to_api_response,
};

use super::model::{
    CreateReviewRequest, ReviewWithImages, UpdateReviewRequest, recompute_rating_logged,
};

fn validate_review_input(comment: &str, rating: i32) -> Result<(), AppError> {
    if comment.trim().is_empty() {
        return Err(AppError::Validation("Review comment is required".into()));
    }
    if !(1..=5).contains(&rating) {
        return Err(AppError::Validation("Rating must be between 1 and 5".into()));
    }
    Ok(())
}

#[axum::debug_handler]
pub async fn create_review(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_review_input(&req.comment, req.rating)?;

    if !Product::exists(&state.pool, product_id).await? {
        return Err(AppError::NotFound("Product not found".into()));
    }

    let review = ReviewWithImages::create(&state.pool, product_id, &req).await?;

    // The review itself is committed; a recompute failure must not undo that.
    recompute_rating_logged(&state.pool, product_id).await;

    Ok((StatusCode::CREATED, success_to_api_response(review)))
}

#[axum::debug_handler]
pub async fn update_review(
    State(state): State<AppState>,
    Path(_product_id): Path<Uuid>,
    Json(req): Json<UpdateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_review_input(&req.comment, req.rating)?;

    let review = ReviewWithImages::update(&state.pool, &req)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".into()))?;

    recompute_rating_logged(&state.pool, review.review.product_id).await;

    Ok((StatusCode::OK, success_to_api_response(review)))
}

#[axum::debug_handler]
pub async fn delete_review(
    State(state): State<AppState>,
    Path((_product_id, review_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let product_id = ReviewWithImages::delete(&state.pool, review_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".into()))?;

    recompute_rating_logged(&state.pool, product_id).await;

    Ok((
        StatusCode::OK,
        success_to_api_response(serde_json::json!({ "message": "Review deleted" })),
    ))
}
