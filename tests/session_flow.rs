use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use backend::{
    AppState,
    config::Config,
    routes::router,
    utils::{Role, generate_token},
};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

// The pool is lazily connected: the middleware scenarios below never touch
// the database, so no server is needed.
fn test_state() -> AppState {
    let config = Config {
        database_url: "postgres://localhost/unused".into(),
        jwt_secret: "integration-test-secret".into(),
        token_expiration_secs: 7200,
        server_host: "127.0.0.1".into(),
        server_port: 0,
        production: false,
    };
    let pool = PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy(&config.database_url)
        .expect("lazy pool");
    AppState { pool, config }
}

fn token_for(role: Role, state: &AppState) -> String {
    generate_token(Uuid::new_v4(), "someone@shop.test", role, &state.config).expect("token")
}

async fn get_with_cookie(path: &str, cookie: Option<String>) -> axum::response::Response {
    let state = test_state();
    let mut builder = Request::builder().uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    router(state)
        .oneshot(builder.body(Body::empty()).expect("request"))
        .await
        .expect("response")
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn admin_path_without_cookie_redirects_to_login() {
    let response = get_with_cookie("/dashboard", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn admin_path_with_user_token_redirects_home() {
    let state = test_state();
    let token = token_for(Role::User, &state);
    let response = get_with_cookie("/dashboard", Some(format!("token={token}"))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn admin_path_with_admin_token_passes_the_gate() {
    let state = test_state();
    let token = token_for(Role::Admin, &state);
    // No page route is mounted at /dashboard in this test router; reaching
    // the router's 404 means the middleware allowed the request through.
    let response = get_with_cookie("/dashboard", Some(format!("token={token}"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn login_page_bounces_authenticated_callers() {
    let state = test_state();

    let admin = token_for(Role::Admin, &state);
    let response = get_with_cookie("/login", Some(format!("token={admin}"))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");

    let user = token_for(Role::User, &state);
    let response = get_with_cookie("/login", Some(format!("token={user}"))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn invalid_cookie_on_protected_path_is_cleared() {
    let response = get_with_cookie("/favorites", Some("token=not-a-real-token".into())).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("stale cookie must be cleared");
    assert!(set_cookie.starts_with("token="));
    assert!(set_cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn favorites_api_without_session_redirects_to_login() {
    let state = test_state();
    let request = Request::builder()
        .method("POST")
        .uri("/api/favorites/toggle")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"product_id":"00000000-0000-0000-0000-000000000000"}"#))
        .expect("request");

    let response = router(state).oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn public_catalog_paths_pass_without_session() {
    // The middleware must not redirect public reads; the handler will then
    // fail on the lazy pool, which surfaces as a 500, not a redirect.
    let response = get_with_cookie("/api/products", None).await;
    assert_ne!(response.status(), StatusCode::SEE_OTHER);
}
