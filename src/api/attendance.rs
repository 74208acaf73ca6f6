use crate::{
    error::{AppError, AppResult},
    model::attendance::{AttendanceDay, Interval, ScanStatus, round_hours},
    notify::ScanEvent,
    state::AppState,
};
use actix_web::{HttpResponse, web};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct ScanRequest {
    /// Badge / tag identifier read by the scanner
    #[schema(example = "04A1B2C3")]
    pub uid: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ScanResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "Attendance recorded")]
    pub message: String,
    #[schema(example = "checked in")]
    pub status: ScanStatus,
    pub attendance: AttendanceDay,
}

/// One user's day with its computed hours
#[derive(Serialize, ToSchema)]
pub struct DailySummary {
    #[schema(example = "04A1B2C3")]
    pub uid: String,
    #[schema(example = "John Doe")]
    pub name: String,
    pub entries: Vec<Interval>,
    #[schema(example = 7.75)]
    pub total_hours: f64,
    /// Still checked in (last interval open)
    #[schema(example = false)]
    pub present: bool,
}

impl From<AttendanceDay> for DailySummary {
    fn from(day: AttendanceDay) -> Self {
        let total_hours = round_hours(day.total_hours());
        let present = day.is_present();
        Self {
            uid: day.uid,
            name: day.name,
            entries: day.entries,
            total_hours,
            present,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct DailyReport {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub logs: Vec<DailySummary>,
}

/// Strict `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> AppResult<NaiveDate> {
    let invalid = || AppError::validation("Invalid date format. Use YYYY-MM-DD");
    let shape_ok = raw.len() == 10
        && raw.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shape_ok {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())
}

/// Applies one scan for `uid` at `now` and fires the notification.
pub async fn record_scan(
    state: &AppState,
    uid: &str,
    now: DateTime<Utc>,
) -> AppResult<(ScanStatus, AttendanceDay)> {
    let user = state.require_user(uid).await?;
    let today = now.with_timezone(&Local).date_naive();

    let (status, day) = state.store.toggle_attendance(&user, today, now).await?;
    info!(uid = %user.uid, date = %today, status = %status, "Scan recorded");

    state.notifier.notify(ScanEvent {
        uid: user.uid.clone(),
        name: user.name.clone(),
        at: now,
        status,
    });

    Ok((status, day))
}

/// Record a scan
///
/// Toggles today's attendance for the badge: the first scan checks in, the
/// next one checks out, and so on.
#[utoipa::path(
    post,
    path = "/attendance",
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Scan recorded", body = ScanResponse),
        (status = 400, description = "UID missing", body = Object, example = json!({
            "success": false,
            "message": "UID required"
        })),
        (status = 404, description = "Unknown UID", body = Object, example = json!({
            "success": false,
            "message": "User not found"
        })),
        (status = 429, description = "Too many scans"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
#[instrument(name = "attendance_scan", skip(state, payload))]
pub async fn scan(
    state: web::Data<AppState>,
    payload: web::Json<ScanRequest>,
) -> AppResult<HttpResponse> {
    let uid = payload
        .uid
        .as_deref()
        .map(str::trim)
        .filter(|uid| !uid.is_empty())
        .ok_or_else(|| AppError::validation("UID required"))?;

    let (status, attendance) = record_scan(&state, uid, Utc::now()).await?;

    Ok(HttpResponse::Ok().json(ScanResponse {
        success: true,
        message: "Attendance recorded".to_string(),
        status,
        attendance,
    }))
}

/// List all attendance records
#[utoipa::path(
    get,
    path = "/attendance",
    responses(
        (status = 200, description = "Every attendance day, newest first", body = Vec<AttendanceDay>),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let days = state.store.list_attendance().await?;
    Ok(HttpResponse::Ok().json(days))
}

/// Daily report
#[utoipa::path(
    get,
    path = "/attendance/{date}",
    params(
        ("date", Path, description = "Calendar date, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Per-user summaries for the date", body = DailyReport),
        (status = 400, description = "Malformed date", body = Object, example = json!({
            "success": false,
            "message": "Invalid date format. Use YYYY-MM-DD"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn attendance_by_date(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let date = parse_date(&path.into_inner())?;
    let days = state.store.attendance_on(date).await?;

    Ok(HttpResponse::Ok().json(DailyReport {
        success: true,
        date,
        logs: days.into_iter().map(DailySummary::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::user::User;
    use crate::config::Config;
    use crate::test_utils::{init_app, peer, seed_user, test_state, test_state_with};
    use actix_web::{http::StatusCode, test};
    use chrono::TimeZone;
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn parse_date_is_strict() {
        assert!(parse_date("2026-02-28").is_ok());
        assert!(parse_date("2026-2-28").is_err());
        assert!(parse_date("2026-02-30").is_err());
        assert!(parse_date("28-02-2026").is_err());
        assert!(parse_date("yesterday").is_err());
        // chrono's %Y alone would take a signed year
        assert!(parse_date("+002-01-01").is_err());
        assert!(parse_date("-002-01-01").is_err());
        assert!(parse_date("2026-01-0a").is_err());
    }

    #[actix_web::test]
    async fn scans_alternate_in_and_out() {
        let state = test_state();
        seed_user(&state, "A1", "Ada").await;
        let app = init_app(state.clone()).await;

        let mut statuses = Vec::new();
        for _ in 0..3 {
            let req = test::TestRequest::post()
                .uri("/attendance")
                .peer_addr(peer())
                .set_json(json!({ "uid": "A1" }))
                .to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["success"], true);
            assert_eq!(body["message"], "Attendance recorded");
            statuses.push(body["status"].as_str().unwrap().to_string());

            let entries = body["attendance"]["entries"].as_array().unwrap();
            let open = entries.iter().filter(|e| e["check_out"].is_null()).count();
            assert!(open <= 1);
        }

        assert_eq!(statuses, ["checked in", "checked out", "checked in"]);
    }

    #[actix_web::test]
    async fn unreachable_webhook_does_not_fail_the_scan() {
        let state = test_state_with(Config {
            webhook_url: Some("http://127.0.0.1:1/webhook".into()),
            webhook_timeout_secs: 1,
            ..Config::default()
        });
        seed_user(&state, "A1", "Ada").await;
        let app = init_app(state).await;

        for expected in ["checked in", "checked out"] {
            let req = test::TestRequest::post()
                .uri("/attendance")
                .peer_addr(peer())
                .set_json(json!({ "uid": "A1" }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);

            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["success"], true);
            assert_eq!(body["status"], expected);
        }
    }

    #[actix_web::test]
    async fn unknown_uid_is_not_found() {
        let app = init_app(test_state()).await;

        let req = test::TestRequest::post()
            .uri("/attendance")
            .peer_addr(peer())
            .set_json(json!({ "uid": "NOBODY" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "User not found");
    }

    #[actix_web::test]
    async fn missing_uid_is_a_bad_request() {
        let app = init_app(test_state()).await;

        for payload in [json!({}), json!({ "uid": "   " })] {
            let req = test::TestRequest::post()
                .uri("/attendance")
                .peer_addr(peer())
                .set_json(payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["message"], "UID required");
        }
    }

    #[actix_web::test]
    async fn malformed_json_gets_a_message() {
        let app = init_app(test_state()).await;

        let req = test::TestRequest::post()
            .uri("/attendance")
            .peer_addr(peer())
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["message"].is_string());
    }

    #[actix_web::test]
    async fn daily_report_sums_closed_intervals() {
        let state = test_state();
        let ada = seed_user(&state, "A1", "Ada").await;
        let bob = seed_user(&state, "B2", "Bob").await;
        let date = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let at = |h, m| Utc.with_ymd_and_hms(2026, 4, 1, h, m, 0).unwrap();

        for t in [at(9, 0), at(12, 0), at(13, 0), at(17, 45)] {
            state.store.toggle_attendance(&ada, date, t).await.unwrap();
        }
        state.store.toggle_attendance(&bob, date, at(10, 0)).await.unwrap();

        let app = init_app(state).await;
        let req = test::TestRequest::get().uri("/attendance/2026-04-01").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["date"], "2026-04-01");
        let logs = body["logs"].as_array().unwrap();
        assert_eq!(logs.len(), 2);

        let hours = |uid: &str| {
            logs.iter()
                .find(|l| l["uid"] == uid)
                .map(|l| l["total_hours"].as_f64().unwrap())
                .unwrap()
        };
        assert_eq!(hours("A1"), 7.75);
        // only interval still open
        assert_eq!(hours("B2"), 0.0);
        let b2 = logs.iter().find(|l| l["uid"] == "B2").unwrap();
        assert_eq!(b2["present"], true);
    }

    #[actix_web::test]
    async fn bad_date_is_rejected() {
        let app = init_app(test_state()).await;

        let req = test::TestRequest::get().uri("/attendance/2026-13-01").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Invalid date format. Use YYYY-MM-DD");
    }

    #[actix_web::test]
    async fn lists_every_record_newest_first() {
        let state = test_state();
        let ada: User = seed_user(&state, "A1", "Ada").await;
        for d in [1, 3, 2] {
            let date = NaiveDate::from_ymd_opt(2026, 5, d).unwrap();
            let now = Utc.with_ymd_and_hms(2026, 5, d, 9, 0, 0).unwrap();
            state.store.toggle_attendance(&ada, date, now).await.unwrap();
        }

        let app = init_app(state).await;
        let req = test::TestRequest::get().uri("/attendance").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        let dates: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["date"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(dates, ["2026-05-03", "2026-05-02", "2026-05-01"]);
    }

    #[actix_web::test]
    async fn record_scan_uses_the_given_instant() {
        let state = test_state();
        seed_user(&state, "A1", "Ada").await;
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 7, 0, 0).unwrap();

        let (status, day) = record_scan(&state, "A1", now).await.unwrap();
        assert_eq!(status, ScanStatus::CheckedIn);
        assert_eq!(day.entries[0].check_in, now);
        assert_eq!(day.date, now.with_timezone(&Local).date_naive());
    }
}
