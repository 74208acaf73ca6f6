use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use super::Store;
use crate::error::{AppError, AppResult};
use crate::model::attendance::{AttendanceDay, ScanStatus};
use crate::model::user::{User, UserUpdate};

#[derive(Default)]
struct Tables {
    users: BTreeMap<String, User>,
    // (date, uid) keeps days of one date together and sorted by uid
    days: BTreeMap<(NaiveDate, String), AttendanceDay>,
}

/// Process-local store. Every operation runs under one lock, so a toggle is atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: &User) -> AppResult<User> {
        let mut tables = self.tables();
        if tables.users.contains_key(&user.uid) {
            return Err(AppError::conflict("UID already exists"));
        }
        tables.users.insert(user.uid.clone(), user.clone());
        Ok(user.clone())
    }

    async fn update_user(&self, uid: &str, update: &UserUpdate) -> AppResult<Option<User>> {
        let mut tables = self.tables();
        Ok(tables.users.get_mut(uid).map(|user| {
            update.apply_to(user);
            user.clone()
        }))
    }

    async fn get_user(&self, uid: &str) -> AppResult<Option<User>> {
        Ok(self.tables().users.get(uid).cloned())
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        Ok(self.tables().users.values().cloned().collect())
    }

    async fn toggle_attendance(
        &self,
        user: &User,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> AppResult<(ScanStatus, AttendanceDay)> {
        let mut tables = self.tables();
        let key = (date, user.uid.clone());

        let (status, day) = match tables.days.get_mut(&key) {
            Some(day) => (day.toggle(now), day.clone()),
            None => {
                let day = AttendanceDay::start(&user.uid, &user.name, date, now);
                tables.days.insert(key, day.clone());
                (ScanStatus::CheckedIn, day)
            }
        };
        Ok((status, day))
    }

    async fn list_attendance(&self) -> AppResult<Vec<AttendanceDay>> {
        let tables = self.tables();
        let mut days: Vec<_> = tables.days.values().cloned().collect();
        days.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.uid.cmp(&b.uid)));
        Ok(days)
    }

    async fn attendance_on(&self, date: NaiveDate) -> AppResult<Vec<AttendanceDay>> {
        Ok(self
            .tables()
            .days
            .values()
            .filter(|d| d.date == date)
            .cloned()
            .collect())
    }

    async fn attendance_for_user(&self, uid: &str) -> AppResult<Vec<AttendanceDay>> {
        let tables = self.tables();
        let mut days: Vec<_> = tables.days.values().filter(|d| d.uid == uid).cloned().collect();
        days.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(days)
    }
}
