use crate::openapi::openapi_document;
use axum::{response::Html, Json};
use utoipa::openapi::OpenApi;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Multimodal Gemini API</title>
</head>
<body>
    <h1>Multimodal Gemini API</h1>
    <p>API is running successfully!</p>
    <p><a href="/api/docs/">Visit Swagger UI Documentation</a></p>
</body>
</html>
"#;

/// Landing page
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "API is running", content_type = "text/html")),
    tag = "Service"
)]
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// OpenAPI document for this API
#[utoipa::path(
    get,
    path = "/spec",
    responses((status = 200, description = "OpenAPI document", content_type = "application/json")),
    tag = "Service"
)]
pub async fn spec() -> Json<OpenApi> {
    Json(openapi_document())
}
