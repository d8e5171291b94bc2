use axum::{
    body::{Body, to_bytes},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::utils::ApiResponse;

const LOGGED_BODY_LIMIT: usize = 1024;

/// Logs every 5xx leaving the server. Handler errors all carry the JSON
/// envelope, so the interesting fields are its code and msg; anything else
/// (panics, layer failures) is logged raw. The body is rebuilt so the client
/// still receives it.
pub async fn log_errors(req: Request<Body>, next: Next) -> Response {
    let response = next.run(req).await;
    if !response.status().is_server_error() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, LOGGED_BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!("Failed to read 5xx response body: {}", err);
            return Response::from_parts(parts, Body::empty());
        }
    };

    match serde_json::from_slice::<ApiResponse<serde_json::Value>>(&bytes) {
        Ok(envelope) => {
            tracing::error!(
                "Server error - status: {}, code: {}, msg: {}",
                parts.status,
                envelope.code,
                envelope.msg
            );
        }
        Err(_) => {
            tracing::error!(
                "Server error - status: {}, body: {}",
                parts.status,
                String::from_utf8_lossy(&bytes)
            );
        }
    }

    parts.headers.remove(axum::http::header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::utils::error_codes;
    use axum::{Router, http::StatusCode, routing::get};
    use tower::ServiceExt;

    async fn failing() -> AppError {
        AppError::Internal("boom".into())
    }

    async fn healthy() -> &'static str {
        "ok"
    }

    fn app() -> Router {
        Router::new()
            .route("/fail", get(failing))
            .route("/ok", get(healthy))
            .layer(axum::middleware::from_fn(log_errors))
    }

    #[tokio::test]
    async fn error_envelope_survives_the_logging_pass() {
        let response = app()
            .oneshot(Request::builder().uri("/fail").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        // The logged body must reach the client intact.
        let bytes = to_bytes(response.into_body(), LOGGED_BODY_LIMIT).await.unwrap();
        let envelope: ApiResponse<serde_json::Value> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(envelope.code, error_codes::INTERNAL_ERROR);
        assert_eq!(envelope.msg, "Internal server error");
        assert!(envelope.resp_data.is_none());
    }

    #[tokio::test]
    async fn success_responses_pass_untouched() {
        let response = app()
            .oneshot(Request::builder().uri("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), LOGGED_BODY_LIMIT).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }
}
