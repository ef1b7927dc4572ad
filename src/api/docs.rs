//! API description and documentation UI.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};

use super::error::detail;
use super::routes::AppState;

/// API description bundled with the binary.
pub const BUNDLED_OPENAPI: &str = include_str!("../../docs/openapi.yaml");

/// Parse the API description, preferring a file on disk when given.
pub fn load_openapi(path: Option<&Path>) -> anyhow::Result<serde_json::Value> {
    let source = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read API description {}", path.display()))?,
        None => BUNDLED_OPENAPI.to_string(),
    };
    let document: serde_json::Value =
        serde_yaml::from_str(&source).context("Failed to parse API description")?;
    Ok(document)
}

/// GET /openapi.yaml - The API description (served as JSON).
pub async fn openapi_document(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(state.openapi.as_ref().clone())
}

/// GET /openapi.json - Disabled; the YAML document is the only description.
pub async fn openapi_json_disabled() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        detail("JSON OpenAPI specification is not available"),
    )
}

/// GET /docs - Swagger UI pointed at `/openapi.yaml`.
pub async fn swagger_ui() -> Html<&'static str> {
    Html(SWAGGER_UI)
}

const SWAGGER_UI: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>Task Manager API Docs</title>
  <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.ui = SwaggerUIBundle({
      url: "/openapi.yaml",
      dom_id: "#swagger-ui",
    });
  </script>
</body>
</html>
"##;
