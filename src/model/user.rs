use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

// Column widths of the `users` table, in characters.
pub const MAX_UID_LEN: usize = 64;
pub const MAX_NAME_LEN: usize = 255;
pub const MAX_EMAIL_LEN: usize = 255;
pub const MAX_LABEL_LEN: usize = 100;

fn check_len(field: &str, value: &str, max: usize) -> AppResult<()> {
    if value.chars().count() > max {
        return Err(AppError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

fn check_optional_len(field: &str, value: Option<&str>, max: usize) -> AppResult<()> {
    value.map_or(Ok(()), |v| check_len(field, v, max))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "uid": "04A1B2C3",
        "name": "John Doe",
        "email": "john.doe@company.com",
        "role": "engineer",
        "department": "R&D"
    })
)]
pub struct User {
    #[schema(example = "04A1B2C3")]
    pub uid: String,

    #[schema(example = "John Doe")]
    pub name: String,

    #[schema(example = "john.doe@company.com", nullable = true)]
    pub email: Option<String>,

    #[schema(example = "engineer", nullable = true)]
    pub role: Option<String>,

    #[schema(example = "R&D", nullable = true)]
    pub department: Option<String>,
}

impl User {
    /// Rejects values the `users` columns cannot hold.
    pub fn validate(&self) -> AppResult<()> {
        check_len("uid", &self.uid, MAX_UID_LEN)?;
        check_len("name", &self.name, MAX_NAME_LEN)?;
        check_optional_len("email", self.email.as_deref(), MAX_EMAIL_LEN)?;
        check_optional_len("role", self.role.as_deref(), MAX_LABEL_LEN)?;
        check_optional_len("department", self.department.as_deref(), MAX_LABEL_LEN)
    }
}

/// Partial edit of a user. The `uid` is not editable.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UserUpdate {
    #[schema(example = "Jane Doe")]
    pub name: Option<String>,
    #[schema(example = "jane.doe@company.com")]
    pub email: Option<String>,
    #[schema(example = "manager")]
    pub role: Option<String>,
    #[schema(example = "Operations")]
    pub department: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.role.is_none() && self.department.is_none()
    }

    /// Column/value pairs of the fields that are set, in a fixed order.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("name", &self.name),
            ("email", &self.email),
            ("role", &self.role),
            ("department", &self.department),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.as_deref().map(|v| (column, v)))
        .collect()
    }

    /// Trims the name and checks the update can be stored.
    pub fn sanitize(mut self) -> AppResult<Self> {
        if self.is_empty() {
            return Err(AppError::validation("No fields provided for update"));
        }
        if let Some(name) = self.name.take() {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::validation("Name must not be empty"));
            }
            check_len("name", &name, MAX_NAME_LEN)?;
            self.name = Some(name);
        }
        check_optional_len("email", self.email.as_deref(), MAX_EMAIL_LEN)?;
        check_optional_len("role", self.role.as_deref(), MAX_LABEL_LEN)?;
        check_optional_len("department", self.department.as_deref(), MAX_LABEL_LEN)?;
        Ok(self)
    }

    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = Some(email.clone());
        }
        if let Some(role) = &self.role {
            user.role = Some(role.clone());
        }
        if let Some(department) = &self.department {
            user.department = Some(department.clone());
        }
    }
}
