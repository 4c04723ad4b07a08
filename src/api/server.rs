use crate::api::routes;
use crate::auth::Authenticator;
use crate::challenge::ChallengeIssuer;
use crate::config::Shared;
use crate::updater::Updater;
use std::future::Future;
use std::net::SocketAddr;

#[derive(Clone)]
pub(super) struct AppState {
    pub config: Shared,
    pub issuer: ChallengeIssuer,
    pub authenticator: Authenticator,
    pub updater: Updater,
}

impl AppState {
    pub fn new(config: Shared, updater: Updater) -> Self {
        AppState {
            issuer: ChallengeIssuer::new(config.clone()),
            authenticator: Authenticator::new(config.clone()),
            config,
            updater,
        }
    }
}

pub fn new(config: Shared, updater: Updater) -> impl Future<Output = hyper::Result<()>> {
    axum::Server::bind(&config.listen_addr).serve(
        routes::new(AppState::new(config.clone(), updater))
            .into_make_service_with_connect_info::<SocketAddr>(),
    )
}
