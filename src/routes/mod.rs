use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use crate::{AppState, middleware::session_middleware};

pub mod auth;
pub mod banner;
pub mod favorite;
pub mod product;
pub mod review;

/// The full application router. Every route sits behind the session
/// middleware; the policy table decides per path whether a session (and
/// which role) is required.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        // Auth (public class)
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        // Catalog reads (public class)
        .route("/api/products", get(product::list_products))
        .route("/api/products/{id}", get(product::get_product))
        .route("/api/banners", get(banner::list_banners))
        // Reviews (public per policy; no ownership check)
        .route(
            "/api/products/{id}/reviews",
            post(review::create_review).put(review::update_review),
        )
        .route(
            "/api/products/{id}/reviews/{review_id}",
            delete(review::delete_review),
        )
        // Favorites (any authenticated role)
        .route("/api/favorites", get(favorite::list_favorites))
        .route("/api/favorites/toggle", post(favorite::toggle_favorite))
        // Admin area (ADMIN role)
        .route("/api/admin/products", post(product::create_product))
        .route(
            "/api/admin/products/{id}",
            put(product::update_product).delete(product::delete_product),
        )
        .route("/api/admin/products/{id}/publish", patch(product::set_publish))
        .route("/api/admin/banners", post(banner::create_banner))
        .route("/api/admin/banners/{id}", delete(banner::delete_banner));

    api.layer(axum::middleware::from_fn_with_state(
        state.clone(),
        session_middleware,
    ))
    .with_state(state)
}
