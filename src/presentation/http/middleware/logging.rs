use axum::{extract::Request, middleware::Next, response::Response};

pub async fn logging_middleware(request: Request, next: Next) -> Response {
    tracing::info!("Request: {} {}", request.method(), request.uri());
    let response = next.run(request).await;
    tracing::debug!("Response: {}", response.status());
    response
}
