//! Request outcome logging.

use axum::{body::Body, http::Request, middleware::Next, response::Response};

/// Log failed requests.
///
/// Server errors are logged at ERROR and client errors at WARN, both with
/// method and path. Successful requests are left to the trace layer.
pub async fn log_failures(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;
    let status = response.status();

    if status.is_server_error() {
        tracing::error!(%method, %path, status = status.as_u16(), "Request failed");
    } else if status.is_client_error() {
        tracing::warn!(%method, %path, status = status.as_u16(), "Request rejected");
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, middleware, routing::get, Router};
    use tower::util::ServiceExt;

    async fn teapot() -> StatusCode {
        StatusCode::IM_A_TEAPOT
    }

    #[tokio::test]
    async fn test_response_passes_through() {
        let app = Router::new()
            .route("/", get(teapot))
            .layer(middleware::from_fn(log_failures));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }
}
