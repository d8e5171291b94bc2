use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{AppState, error::AppError, utils::success_to_api_response};

use super::model::{
    CreateProductRequest, ListProductsQuery, Product, PublishRequest, UpdateProductRequest,
};

#[axum::debug_handler]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let products = Product::list_published(&state.pool, &query).await?;
    Ok((StatusCode::OK, success_to_api_response(products)))
}

#[axum::debug_handler]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let product = Product::find_detail(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".into()))?;
    Ok((StatusCode::OK, success_to_api_response(product)))
}

#[axum::debug_handler]
pub async fn create_product(
    State(state): State<AppState>,
    Json(req): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_product_input(&req.name, &req.description, req.price)?;
    if req.images.is_empty() {
        return Err(AppError::Validation(
            "At least one product image is required".into(),
        ));
    }

    let product = Product::create(&state.pool, &req).await?;
    tracing::info!("Created product {} ({})", product.product.name, product.product.id);
    Ok((StatusCode::CREATED, success_to_api_response(product)))
}

#[axum::debug_handler]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_product_input(&req.name, &req.description, req.price)?;

    let product = Product::update(&state.pool, id, &req)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".into()))?;
    Ok((StatusCode::OK, success_to_api_response(product)))
}

#[axum::debug_handler]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !Product::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("Product not found".into()));
    }
    tracing::info!("Deleted product {}", id);
    Ok((
        StatusCode::OK,
        success_to_api_response(serde_json::json!({ "message": "Product deleted" })),
    ))
}

#[axum::debug_handler]
pub async fn set_publish(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PublishRequest>,
) -> Result<impl IntoResponse, AppError> {
    let product = Product::set_published(&state.pool, id, req.is_published)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".into()))?;
    Ok((StatusCode::OK, success_to_api_response(product)))
}

fn validate_product_input(name: &str, description: &str, price: f64) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Product name is required".into()));
    }
    if description.trim().is_empty() {
        return Err(AppError::Validation("Product description is required".into()));
    }
    if !price.is_finite() || price <= 0.0 {
        return Err(AppError::Validation("Price must be a positive number".into()));
    }
    Ok(())
}
