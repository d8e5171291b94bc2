use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::{
    AppState,
    error::AppError,
    utils::{Claims, Role, verify_token},
};

pub const TOKEN_COOKIE: &str = "token";

/// What the middleware learned about the caller before routing.
#[derive(Debug)]
pub enum SessionState {
    Anonymous,
    /// A token cookie was present but failed verification.
    Invalid,
    Authenticated(Claims),
}

#[derive(Debug, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(&'static str),
    /// Redirect and erase the stale cookie so the client cannot loop on it.
    RedirectClearCookie(&'static str),
}

fn is_public(path: &str) -> bool {
    matches!(path, "/" | "/login" | "/register" | "/api/products" | "/api/banners")
        || path.starts_with("/detail-product/")
        || path.starts_with("/api/auth/")
        || path.starts_with("/api/products/")
}

fn is_admin(path: &str) -> bool {
    path.starts_with("/dashboard") || path.starts_with("/api/admin")
}

/// The per-request policy table, independent of any framework type. Public
/// paths pass through; the login and register pages bounce already
/// authenticated callers to their landing page; admin-prefixed paths demand
/// the ADMIN role; everything else demands any authenticated session.
pub fn evaluate(path: &str, session: &SessionState) -> RouteDecision {
    if is_public(path) {
        if let ("/login" | "/register", SessionState::Authenticated(claims)) = (path, session) {
            return RouteDecision::Redirect(claims.role.landing_page());
        }
        return RouteDecision::Allow;
    }

    match session {
        SessionState::Anonymous => RouteDecision::Redirect("/login"),
        SessionState::Invalid => RouteDecision::RedirectClearCookie("/login"),
        SessionState::Authenticated(claims) => {
            if is_admin(path) && claims.role != Role::Admin {
                RouteDecision::Redirect("/")
            } else {
                RouteDecision::Allow
            }
        }
    }
}

/// Session middleware over every route. Verification failures never become
/// 500s; they degrade to a redirect. Valid claims are attached as a request
/// extension for handlers.
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let session = match jar.get(TOKEN_COOKIE) {
        None => SessionState::Anonymous,
        Some(cookie) => match verify_token(cookie.value(), &state.config) {
            Ok(claims) => SessionState::Authenticated(claims),
            Err(err) => {
                tracing::debug!("Token verification failed: {}", err);
                SessionState::Invalid
            }
        },
    };

    match evaluate(request.uri().path(), &session) {
        RouteDecision::Allow => {
            if let SessionState::Authenticated(claims) = session {
                request.extensions_mut().insert(claims);
            }
            next.run(request).await
        }
        RouteDecision::Redirect(target) => Redirect::to(target).into_response(),
        RouteDecision::RedirectClearCookie(target) => {
            let jar = jar.remove(Cookie::build((TOKEN_COOKIE, "")).path("/").build());
            (jar, Redirect::to(target)).into_response()
        }
    }
}

/// The verified identity attached by the session middleware. Handlers that
/// need a caller take this; its rejection is the 401 envelope, not a panic.
pub struct CurrentUser(pub Claims);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthenticated("Please log in first".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn claims(role: Role) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: Uuid::new_v4(),
            email: "someone@shop.test".into(),
            role,
            iat: now,
            exp: now + 7200,
        }
    }

    #[test]
    fn public_paths_allow_anonymous() {
        for path in ["/", "/login", "/register", "/detail-product/abc", "/api/auth/login"] {
            assert_eq!(evaluate(path, &SessionState::Anonymous), RouteDecision::Allow);
        }
    }

    #[test]
    fn protected_path_without_token_redirects_to_login() {
        assert_eq!(
            evaluate("/favorites", &SessionState::Anonymous),
            RouteDecision::Redirect("/login")
        );
        assert_eq!(
            evaluate("/dashboard", &SessionState::Anonymous),
            RouteDecision::Redirect("/login")
        );
    }

    #[test]
    fn invalid_token_redirects_and_clears_cookie() {
        assert_eq!(
            evaluate("/dashboard", &SessionState::Invalid),
            RouteDecision::RedirectClearCookie("/login")
        );
        // On public paths a stale cookie is ignored.
        assert_eq!(evaluate("/", &SessionState::Invalid), RouteDecision::Allow);
    }

    #[test]
    fn admin_path_requires_admin_role() {
        let admin = SessionState::Authenticated(claims(Role::Admin));
        let user = SessionState::Authenticated(claims(Role::User));

        assert_eq!(evaluate("/dashboard", &admin), RouteDecision::Allow);
        assert_eq!(evaluate("/api/admin/products", &admin), RouteDecision::Allow);
        assert_eq!(evaluate("/dashboard", &user), RouteDecision::Redirect("/"));
        assert_eq!(evaluate("/api/admin/products", &user), RouteDecision::Redirect("/"));
    }

    #[test]
    fn authenticated_user_passes_non_admin_protected_paths() {
        let user = SessionState::Authenticated(claims(Role::User));
        assert_eq!(evaluate("/favorites", &user), RouteDecision::Allow);
        assert_eq!(evaluate("/api/favorites/toggle", &user), RouteDecision::Allow);
    }

    #[test]
    fn login_page_bounces_authenticated_callers_to_landing_page() {
        let admin = SessionState::Authenticated(claims(Role::Admin));
        let user = SessionState::Authenticated(claims(Role::User));

        assert_eq!(evaluate("/login", &admin), RouteDecision::Redirect("/dashboard"));
        assert_eq!(evaluate("/register", &user), RouteDecision::Redirect("/"));
        // An invalid token on the login page is not an error.
        assert_eq!(evaluate("/login", &SessionState::Invalid), RouteDecision::Allow);
    }
}
