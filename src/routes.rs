use crate::{
    api::{attendance, user},
    error::AppError,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use anyhow::anyhow;

pub type ScanLimiter = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP scan budget. Built once so all workers share the same buckets.
pub fn scan_limiter(requests_per_min: u32) -> anyhow::Result<ScanLimiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid scan rate limit: {requests_per_min}/min"))
}

/// Body errors answer in the same `{success, message}` shape as handler errors.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::validation(format!("Invalid request body: {err}")).into())
}

pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str, limiter: &ScanLimiter) {
    cfg.app_data(json_config());

    cfg.service(
        web::scope(api_prefix)
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("")
                            .route(
                                web::post()
                                    .to(attendance::scan)
                                    .wrap(Governor::new(limiter)),
                            )
                            .route(web::get().to(attendance::list_attendance)),
                    )
                    // /attendance/{date}
                    .service(
                        web::resource("/{date}")
                            .route(web::get().to(attendance::attendance_by_date)),
                    ),
            )
            .service(
                web::scope("/users")
                    // /users
                    .service(
                        web::resource("")
                            .route(web::post().to(user::create_user))
                            .route(web::get().to(user::list_users)),
                    )
                    // /users/{uid}
                    .service(
                        web::resource("/{uid}")
                            .route(web::get().to(user::get_user))
                            .route(web::put().to(user::update_user)),
                    ),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_accepts_any_budget() {
        assert!(scan_limiter(0).is_ok());
        assert!(scan_limiter(120).is_ok());
        assert!(scan_limiter(1_000_000).is_ok());
    }
}
