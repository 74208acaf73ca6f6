use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{App, Error, test, web};

use crate::config::Config;
use crate::model::user::User;
use crate::routes;
use crate::state::AppState;
use crate::store::MemoryStore;

pub fn test_state() -> web::Data<AppState> {
    test_state_with(Config::default())
}

pub fn test_state_with(config: Config) -> web::Data<AppState> {
    let state = AppState::new(Arc::new(MemoryStore::new()), &config).expect("test state");
    web::Data::new(state)
}

pub async fn seed_user(state: &AppState, uid: &str, name: &str) -> User {
    state
        .register_user(User {
            uid: uid.to_string(),
            name: name.to_string(),
            email: None,
            role: None,
            department: None,
        })
        .await
        .expect("seed user")
}

/// The rate limiter keys on the peer IP, so scan requests need one.
pub fn peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

pub async fn init_app(
    state: web::Data<AppState>,
) -> impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    let config = Config::default();
    let limiter = routes::scan_limiter(config.rate_scan_per_min).expect("limiter");

    test::init_service(
        App::new()
            .app_data(state)
            .configure(|cfg| routes::configure(cfg, &config.api_prefix, &limiter)),
    )
    .await
}
