// Swagger UI HTML serving

use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
};

use crate::{app::AppState, utils::ApiError};

/// Serve Swagger UI HTML at /v1/docs when enabled by `ENABLE_SWAGGER_UI`
pub async fn serve_swagger_ui(State(state): State<AppState>) -> Response {
    if !state.config.features.enable_swagger_ui {
        return ApiError::NotFound("Page").into_response();
    }
    Html(SWAGGER_UI_HTML).into_response()
}

const SWAGGER_UI_HTML: &str = r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Academy API Documentation</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5.9.0/swagger-ui.css" />
    <style>
        body {
            margin: 0;
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, Arial, sans-serif;
        }
        #swagger-ui {
            max-width: 1460px;
            margin: 0 auto;
            padding: 20px;
        }
        .topbar {
            display: none;
        }
        .header {
            background: #1f2937;
            color: white;
            padding: 1.5rem 2rem;
        }
        .header h1 {
            margin: 0;
            font-size: 1.8rem;
            font-weight: 600;
        }
        .header p {
            margin: 0.4rem 0 0;
            opacity: 0.85;
        }
    </style>
</head>
<body>
    <div class="header">
        <h1>Academy Backend API</h1>
        <p>Staff REST API, version 1</p>
    </div>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5.9.0/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5.9.0/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {
            const base = window.location.pathname.replace(/\/docs\/?$/, '');
            window.ui = SwaggerUIBundle({
                url: base + '/docs/openapi.json',
                dom_id: '#swagger-ui',
                deepLinking: true,
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout",
                docExpansion: "list",
                filter: true,
                persistAuthorization: true,
                tryItOutEnabled: true,
                validatorUrl: null
            });
        }
    </script>
</body>
</html>"#;
