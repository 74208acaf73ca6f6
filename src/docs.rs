use crate::api::attendance::{DailyReport, DailySummary, ScanRequest, ScanResponse};
use crate::api::user::{CreateUser, DayLog, UserDetail, UserResponse};
use crate::model::attendance::{AttendanceDay, Interval, ScanStatus};
use crate::model::user::{User, UserUpdate};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance API",
        version = "0.1.0",
        description = r#"
## Badge attendance tracking

Registers users by badge UID and records check-in / check-out scans.

### 🔹 Key Features
- **Scans**
  - Each scan toggles the user's day: first scan checks in, the next checks out
  - Every scan is announced on the configured Discord webhook
- **Reports**
  - Per-day summaries with worked hours over closed intervals
  - Per-user history
- **Users**
  - Register, list, view and edit users; UIDs are unique

### 📦 Response Format
- JSON bodies; errors are `{ "success": false, "message": "..." }`
"#,
    ),
    paths(
        crate::api::attendance::scan,
        crate::api::attendance::list_attendance,
        crate::api::attendance::attendance_by_date,

        crate::api::user::create_user,
        crate::api::user::list_users,
        crate::api::user::get_user,
        crate::api::user::update_user
    ),
    components(
        schemas(
            ScanRequest,
            ScanResponse,
            ScanStatus,
            AttendanceDay,
            Interval,
            DailySummary,
            DailyReport,
            User,
            CreateUser,
            UserUpdate,
            UserResponse,
            DayLog,
            UserDetail
        )
    ),
    tags(
        (name = "Attendance", description = "Scan and attendance report APIs"),
        (name = "User", description = "User registration APIs"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();
        for path in ["/attendance", "/attendance/{date}", "/users", "/users/{uid}"] {
            assert!(paths.iter().any(|p| p == path), "missing {path}");
        }
    }
}
