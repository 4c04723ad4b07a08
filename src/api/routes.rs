use crate::api::api_error::APIError;
use crate::api::model::{client_address, ResponsePage};
use crate::api::server::AppState;
use crate::error::Error;
use crate::request::{RequestCode, UpdateRequest};
use axum::extract::{ConnectInfo, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::extract::WithRejection;
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub(crate) const UPDATE_PATH: &str = "/gnudip/cgi-bin/gdipupdt.cgi";

pub(super) fn new(state: AppState) -> Router {
    Router::new()
        .route("/healthcheck", get(health_check))
        .route(UPDATE_PATH, get(gnudip))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(state.config.api_timeout))
        .with_state(state)
}

#[allow(clippy::unused_async)]
async fn health_check() -> impl IntoResponse {
    Json(json!({"ok":"healthy"}))
}

/// A bare GET issues a salt; a GET with query parameters is an update request.
async fn gnudip(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    WithRejection(Query(params), _): WithRejection<Query<HashMap<String, String>>, APIError>,
) -> Result<ResponsePage, APIError> {
    if params.is_empty() {
        return Ok(ResponsePage::salt(&state.issuer.issue()));
    }

    let req = UpdateRequest::decode(&params).map_err(|err| {
        tracing::debug!("rejected malformed update request: {err}");
        err
    })?;
    let peer = connect_info.map(|ConnectInfo(addr)| addr);
    let req = req.with_client_address(client_address(&state.config, peer, &headers));
    let offline = req.is_offline();

    match authenticate_and_dispatch(&state, &req).await {
        Ok(address) => {
            let echoed = matches!(req.request_code(), Ok(RequestCode::EchoRegister));
            Ok(ResponsePage::update_succeeded(
                offline,
                echoed.then_some(address),
            ))
        }
        Err(err) => {
            log_failure(&req, &err);
            Ok(ResponsePage::update_failed(offline, &err.public_message()))
        }
    }
}

async fn authenticate_and_dispatch(state: &AppState, req: &UpdateRequest) -> Result<String, Error> {
    state.authenticator.authenticate(req)?;
    state.updater.dispatch(req).await
}

fn log_failure(req: &UpdateRequest, err: &Error) {
    let client = req.client_address.as_deref().unwrap_or("unknown client");
    let domain = &req.domain;
    match err {
        err if err.is_configuration_defect() => {
            tracing::error!("configuration defect updating \"{domain}\": {err:?}");
        }
        err if err.is_auth() => {
            tracing::info!("rejected update from {client} for \"{domain}\": {err}");
        }
        Error::UnknownDomain(_) | Error::InvalidRequestCode(_) | Error::MissingAddress => {
            tracing::info!("refused update from {client} for \"{domain}\": {err}");
        }
        err => tracing::warn!("backend failed updating \"{domain}\": {err}"),
    }
}
