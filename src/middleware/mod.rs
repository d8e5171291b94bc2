mod auth;
mod error_handler;

pub use auth::{
    CurrentUser, RouteDecision, SessionState, TOKEN_COOKIE, evaluate, session_middleware,
};
pub use error_handler::log_errors;
