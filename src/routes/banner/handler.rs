use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{AppState, error::AppError, utils::success_to_api_response};

use super::model::{BannerWithImages, CreateBannerRequest};

#[axum::debug_handler]
pub async fn list_banners(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let banners = BannerWithImages::list(&state.pool).await?;
    Ok((StatusCode::OK, success_to_api_response(banners)))
}

#[axum::debug_handler]
pub async fn create_banner(
    State(state): State<AppState>,
    Json(req): Json<CreateBannerRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.description.trim().is_empty() {
        return Err(AppError::Validation("Banner description is required".into()));
    }
    if req.images.is_empty() {
        return Err(AppError::Validation("A banner image is required".into()));
    }

    let banner = BannerWithImages::create(&state.pool, &req).await?;
    tracing::info!("Created banner {}", banner.banner.id);
    Ok((StatusCode::CREATED, success_to_api_response(banner)))
}

#[axum::debug_handler]
pub async fn delete_banner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !BannerWithImages::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("Banner not found".into()));
    }
    tracing::info!("Deleted banner {}", id);
    Ok((
        StatusCode::OK,
        success_to_api_response(serde_json::json!({ "message": "Banner deleted" })),
    ))
}
