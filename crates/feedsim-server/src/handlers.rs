//! Operator page and fallback handler.

use std::sync::Arc;

use axum::extract::State;
use axum::http::Uri;
use axum::response::{Html, IntoResponse};

use crate::error::ApiError;
use crate::state::AppState;

/// Serve a minimal HTML page with replay progress and control buttons.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = state.status();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Feed Simulator</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
        }}
        h1 {{ color: #58a6ff; }}
        .stat {{ margin: 0.5rem 0; }}
        .label {{ color: #8b949e; }}
        form {{ display: inline-block; margin-right: 0.5rem; }}
        button {{
            background: #21262d;
            color: #c9d1d9;
            border: 1px solid #30363d;
            padding: 0.5rem 1rem;
            font-family: inherit;
            cursor: pointer;
        }}
        a {{ color: #58a6ff; }}
    </style>
</head>
<body>
    <h1>Feed Simulator</h1>
    <div class="stat"><span class="label">Released:</span> {boundary} / {total}</div>
    <div class="stat"><span class="label">Remaining:</span> {remaining}</div>
    <div class="stat"><span class="label">Subscribers:</span> {subscribers}</div>
    <div class="stat"><span class="label">Contest start:</span> {started_at}</div>
    <p>
        <form method="post" action="/api/control/advance"><button>Advance</button></form>
        <form method="post" action="/api/control/next-submission"><button>Next submission</button></form>
        <form method="post" action="/api/control/next-accepted"><button>Next accepted</button></form>
    </p>
    <p>
        <a href="/event-feed">/event-feed</a> &middot;
        <a href="/api/control/status">/api/control/status</a>
    </p>
</body>
</html>"#,
        boundary = status.boundary,
        total = status.total_events,
        remaining = status.remaining_events,
        subscribers = status.subscribers,
        started_at = status.started_at,
    ))
}

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("no route for {}", uri.path()))
}
