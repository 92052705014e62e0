// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::error;

use crate::{
    packets::server as packets,
    server::{context::App, dispatch, login},
    store::sessions,
};

/// The whole HTTP surface: `GET /` answers with the server name, `POST /`
/// carries the bancho traffic.
pub fn router(app: Arc<App>) -> Router {
    Router::new()
        .route("/", get(index).post(bancho))
        .with_state(app)
}

async fn index(State(app): State<Arc<App>>) -> String {
    app.cfg.server.domain.clone()
}

async fn bancho(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let osu_client = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        == Some("osu!");
    if !osu_client {
        return (StatusCode::BAD_REQUEST, "").into_response();
    }

    let token = headers
        .get("osu-token")
        .and_then(|value| value.to_str().ok());

    let Some(token) = token else {
        let geolocation = app.geolocation.from_headers(&headers);
        return match login::handle_login(&app, &body, geolocation).await {
            Ok(response) => {
                ([("cho-token", response.token)], response.body).into_response()
            },
            Err(e) => {
                error!("login failed: {e:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "").into_response()
            },
        };
    };

    let session = match sessions::fetch_by_token(&app, token).await {
        Ok(session) => session,
        Err(e) => {
            error!("session lookup failed: {e:#}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "").into_response();
        },
    };

    let Some(mut session) = session else {
        // the client holds a token from a previous server life; tell it to
        // reconnect from scratch
        return packets::restart_server(0).into_response();
    };

    match dispatch::handle_request(&app, &mut session, &body).await {
        Ok(response) => response.into_response(),
        Err(e) => {
            error!("dispatch failed for {}: {e:#}", session.name());
            (StatusCode::INTERNAL_SERVER_ERROR, "").into_response()
        },
    }
}
