use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::{
    AppState,
    error::AppError,
    middleware::TOKEN_COOKIE,
    utils::{
        error_codes, error_to_api_response, generate_token, hash_password,
        success_to_api_response, verify_token,
    },
};

use super::model::{LoginRequest, LoginResponse, MeResponse, RegisterRequest, User, UserResponse};

fn session_cookie(token: String, state: &AppState) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .http_only(true)
        .secure(state.config.production)
        .path("/")
        .max_age(time::Duration::seconds(
            state.config.token_expiration().as_secs() as i64,
        ))
        .build()
}

fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((TOKEN_COOKIE, "")).path("/").build())
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.email.is_empty() || !req.email.contains('@') {
        return Err(AppError::Validation("Invalid email address".into()));
    }
    if req.password.len() < 6 {
        return Err(AppError::Validation(
            "Password must be at least 6 characters".into(),
        ));
    }

    if User::find_by_email(&state.pool, &req.email).await?.is_some() {
        return Err(AppError::Conflict("Email is already registered".into()));
    }

    let password_hash = hash_password(&req.password)?;
    let user = User::create(&state.pool, &req.email, req.name.as_deref(), &password_hash).await?;

    tracing::info!("Registered new user: {}", user.email);
    Ok((
        StatusCode::OK,
        success_to_api_response(UserResponse::from(user)),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<Response, AppError> {
    // One undifferentiated message for unknown email and wrong password.
    let invalid = || AppError::Unauthenticated("Invalid email or password".into());

    let user = User::find_by_email(&state.pool, &req.email)
        .await?
        .ok_or_else(invalid)?;

    if !user.verify_login(&req.password).await? {
        return Err(invalid());
    }

    let token = generate_token(user.id, &user.email, user.role, &state.config)
        .map_err(|e| AppError::Internal(format!("Failed to sign session token: {}", e)))?;

    let jar = jar.add(session_cookie(token, &state));
    Ok((
        StatusCode::OK,
        jar,
        success_to_api_response(LoginResponse { user: user.into() }),
    )
        .into_response())
}

#[axum::debug_handler]
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = clear_session_cookie(jar);
    (
        StatusCode::OK,
        jar,
        success_to_api_response(serde_json::json!({ "message": "Logged out" })),
    )
}

/// Who the current cookie belongs to. Anonymous callers get a 200 with
/// `is_authenticated: false`; a stale or orphaned token gets its cookie
/// cleared so the client does not loop on it.
#[axum::debug_handler]
pub async fn me(State(state): State<AppState>, jar: CookieJar) -> Response {
    let Some(cookie) = jar.get(TOKEN_COOKIE) else {
        return (
            StatusCode::OK,
            success_to_api_response(MeResponse {
                user: None,
                is_authenticated: false,
            }),
        )
            .into_response();
    };

    let claims = match verify_token(cookie.value(), &state.config) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::debug!("Token verification failed on /me: {}", err);
            let jar = clear_session_cookie(jar);
            return (
                StatusCode::UNAUTHORIZED,
                jar,
                error_to_api_response::<MeResponse>(
                    error_codes::AUTH_FAILED,
                    "Not authenticated: invalid token".into(),
                ),
            )
                .into_response();
        }
    };

    match User::find_by_id(&state.pool, claims.sub).await {
        Ok(Some(user)) => (
            StatusCode::OK,
            success_to_api_response(MeResponse {
                user: Some(user.into()),
                is_authenticated: true,
            }),
        )
            .into_response(),
        Ok(None) => {
            // Session points at a deleted account.
            let jar = clear_session_cookie(jar);
            (
                StatusCode::NOT_FOUND,
                jar,
                error_to_api_response::<MeResponse>(
                    error_codes::NOT_FOUND,
                    "User not found".into(),
                ),
            )
                .into_response()
        }
        Err(err) => AppError::from(err).into_response(),
    }
}
