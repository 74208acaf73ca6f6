use crate::{
    error::{AppError, AppResult},
    model::{
        attendance::{Interval, round_hours},
        user::{User, UserUpdate},
    },
    state::AppState,
};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateUser {
    #[schema(example = "04A1B2C3")]
    pub uid: Option<String>,
    #[schema(example = "John Doe")]
    pub name: Option<String>,
    #[schema(example = "john.doe@company.com", format = "email")]
    pub email: Option<String>,
    #[schema(example = "engineer")]
    pub role: Option<String>,
    #[schema(example = "R&D")]
    pub department: Option<String>,
}

impl CreateUser {
    fn into_user(self) -> AppResult<User> {
        let required = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let (Some(uid), Some(name)) = (required(self.uid), required(self.name)) else {
            return Err(AppError::validation("UID and name are required"));
        };

        let user = User {
            uid,
            name,
            email: self.email,
            role: self.role,
            department: self.department,
        };
        user.validate()?;
        Ok(user)
    }
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "User created")]
    pub message: String,
    pub user: User,
}

/// One day in a user's history
#[derive(Serialize, ToSchema)]
pub struct DayLog {
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = 8.25)]
    pub total_hours: f64,
    pub entries: Vec<Interval>,
}

#[derive(Serialize, ToSchema)]
pub struct UserDetail {
    pub user: User,
    pub attendance: Vec<DayLog>,
}

/// Register a user
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "UID or name missing or too long", body = Object, example = json!({
            "success": false,
            "message": "UID and name are required"
        })),
        (status = 409, description = "UID already registered", body = Object, example = json!({
            "success": false,
            "message": "UID already exists"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "User"
)]
pub async fn create_user(
    state: web::Data<AppState>,
    payload: web::Json<CreateUser>,
) -> AppResult<HttpResponse> {
    let user = payload.into_inner().into_user()?;
    let user = state.register_user(user).await?;
    info!(uid = %user.uid, "User registered");

    Ok(HttpResponse::Created().json(UserResponse {
        success: true,
        message: "User created".to_string(),
        user,
    }))
}

/// List users
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All registered users", body = Vec<User>),
        (status = 500, description = "Internal server error")
    ),
    tag = "User"
)]
pub async fn list_users(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let users = state.store.list_users().await?;
    Ok(HttpResponse::Ok().json(users))
}

/// Get a user with their attendance history
#[utoipa::path(
    get,
    path = "/users/{uid}",
    params(
        ("uid", Path, description = "Badge UID")
    ),
    responses(
        (status = 200, description = "User and daily logs, newest first", body = UserDetail),
        (status = 404, description = "User not found", body = Object, example = json!({
            "success": false,
            "message": "User not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "User"
)]
pub async fn get_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let uid = path.into_inner();
    let user = state.require_user(&uid).await?;

    let attendance = state
        .store
        .attendance_for_user(&user.uid)
        .await?
        .into_iter()
        .map(|day| DayLog {
            date: day.date,
            total_hours: round_hours(day.total_hours()),
            entries: day.entries,
        })
        .collect();

    Ok(HttpResponse::Ok().json(UserDetail { user, attendance }))
}

/// Update a user
#[utoipa::path(
    put,
    path = "/users/{uid}",
    params(
        ("uid", Path, description = "Badge UID")
    ),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Nothing to update, empty name or value too long", body = Object, example = json!({
            "success": false,
            "message": "No fields provided for update"
        })),
        (status = 404, description = "User not found", body = Object, example = json!({
            "success": false,
            "message": "User not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "User"
)]
pub async fn update_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UserUpdate>,
) -> AppResult<HttpResponse> {
    let uid = path.into_inner();
    let update = payload.into_inner().sanitize()?;

    let user = state.update_user(&uid, &update).await?;
    info!(uid = %user.uid, "User updated");

    Ok(HttpResponse::Ok().json(UserResponse {
        success: true,
        message: "User updated".to_string(),
        user,
    }))
}
