//! Persistence for users and attendance days.
//!
//! `MySqlStore` is used whenever a database URL is configured; `MemoryStore`
//! backs local runs and the handler tests.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::AppResult;
use crate::model::attendance::{AttendanceDay, ScanStatus};
use crate::model::user::{User, UserUpdate};

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Fails with `Conflict` when the uid is taken.
    async fn create_user(&self, user: &User) -> AppResult<User>;

    /// `None` when no user has this uid.
    async fn update_user(&self, uid: &str, update: &UserUpdate) -> AppResult<Option<User>>;

    async fn get_user(&self, uid: &str) -> AppResult<Option<User>>;

    async fn list_users(&self) -> AppResult<Vec<User>>;

    /// Applies one scan to `user`'s day at `date` and returns the stored result.
    async fn toggle_attendance(
        &self,
        user: &User,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> AppResult<(ScanStatus, AttendanceDay)>;

    /// Every day on record, newest date first.
    async fn list_attendance(&self) -> AppResult<Vec<AttendanceDay>>;

    async fn attendance_on(&self, date: NaiveDate) -> AppResult<Vec<AttendanceDay>>;

    /// Days of one user, newest date first.
    async fn attendance_for_user(&self, uid: &str) -> AppResult<Vec<AttendanceDay>>;
}
