use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlPool};
use tracing::{debug, error};

use super::Store;
use crate::error::{AppError, AppResult, is_duplicate_key};
use crate::model::attendance::{AttendanceDay, Interval, ScanStatus};
use crate::model::user::{User, UserUpdate};
use crate::utils::db_utils::{build_update_sql, execute_update};

const USER_COLUMNS: &str = "uid, name, email, role, department";

const DAY_SELECT: &str = r#"
    SELECT a.id, a.uid, a.name, a.date, e.check_in, e.check_out
    FROM attendance a
    LEFT JOIN attendance_entries e ON e.attendance_id = a.id
"#;

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_days(&self, sql: &str, bind: Option<DayFilter<'_>>) -> AppResult<Vec<AttendanceDay>> {
        let mut query = sqlx::query_as::<_, DayEntryRow>(sql);
        query = match bind {
            Some(DayFilter::Date(date)) => query.bind(date),
            Some(DayFilter::Uid(uid)) => query.bind(uid),
            None => query,
        };

        let rows = query.fetch_all(&self.pool).await.map_err(|e| {
            error!(error = %e, "Failed to fetch attendance");
            e
        })?;
        Ok(group_days(rows))
    }
}

enum DayFilter<'a> {
    Date(NaiveDate),
    Uid(&'a str),
}

/// One attendance header joined with one of its entries.
#[derive(FromRow)]
struct DayEntryRow {
    id: u64,
    uid: String,
    name: String,
    date: NaiveDate,
    check_in: Option<DateTime<Utc>>,
    check_out: Option<DateTime<Utc>>,
}

#[derive(FromRow)]
struct EntryRow {
    id: u64,
    check_in: DateTime<Utc>,
    check_out: Option<DateTime<Utc>>,
}

#[derive(FromRow)]
struct DayHeaderRow {
    uid: String,
    name: String,
    date: NaiveDate,
}

/// Folds joined rows (ordered by header, then entry) into days.
fn group_days(rows: Vec<DayEntryRow>) -> Vec<AttendanceDay> {
    let mut days: Vec<AttendanceDay> = Vec::new();
    let mut current_id = None;

    for row in rows {
        if current_id != Some(row.id) {
            current_id = Some(row.id);
            days.push(AttendanceDay {
                uid: row.uid,
                name: row.name,
                date: row.date,
                entries: Vec::new(),
            });
        }
        if let (Some(day), Some(check_in)) = (days.last_mut(), row.check_in) {
            day.entries.push(Interval {
                check_in,
                check_out: row.check_out,
            });
        }
    }

    days
}

#[async_trait]
impl Store for MySqlStore {
    async fn create_user(&self, user: &User) -> AppResult<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (uid, name, email, role, department)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.uid)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.role)
        .bind(&user.department)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user.clone()),
            Err(e) if is_duplicate_key(&e) => Err(AppError::conflict("UID already exists")),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_user(&self, uid: &str, update: &UserUpdate) -> AppResult<Option<User>> {
        let update_sql = build_update_sql("users", &update.fields(), "uid", uid)?;
        debug!(sql = %update_sql.sql, uid, "Updating user");

        // MySQL reports zero affected rows for a no-op update, so existence is read back
        execute_update(&self.pool, update_sql).await?;
        self.get_user(uid).await
    }

    async fn get_user(&self, uid: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE uid = ?"
        ))
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, uid"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn toggle_attendance(
        &self,
        user: &User,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> AppResult<(ScanStatus, AttendanceDay)> {
        let mut tx = self.pool.begin().await?;

        // Creates the day or locks the existing row; either way yields its id.
        let attendance_id = sqlx::query(
            r#"
            INSERT INTO attendance (uid, name, date)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE id = LAST_INSERT_ID(id)
            "#,
        )
        .bind(&user.uid)
        .bind(&user.name)
        .bind(date)
        .execute(&mut *tx)
        .await?
        .last_insert_id();

        let header = sqlx::query_as::<_, DayHeaderRow>(
            "SELECT uid, name, date FROM attendance WHERE id = ? FOR UPDATE",
        )
        .bind(attendance_id)
        .fetch_one(&mut *tx)
        .await?;

        let entries = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT id, check_in, check_out
            FROM attendance_entries
            WHERE attendance_id = ?
            ORDER BY id
            "#,
        )
        .bind(attendance_id)
        .fetch_all(&mut *tx)
        .await?;

        let last_entry_id = entries.last().map(|e| e.id);
        let mut day = AttendanceDay {
            uid: header.uid,
            name: header.name,
            date: header.date,
            entries: entries
                .into_iter()
                .map(|e| Interval {
                    check_in: e.check_in,
                    check_out: e.check_out,
                })
                .collect(),
        };

        let status = day.toggle(now);
        match status {
            ScanStatus::CheckedOut => {
                let entry_id = last_entry_id
                    .ok_or_else(|| AppError::Internal(anyhow!("closed an interval that was never stored")))?;
                sqlx::query("UPDATE attendance_entries SET check_out = ? WHERE id = ?")
                    .bind(now)
                    .bind(entry_id)
                    .execute(&mut *tx)
                    .await?;
            }
            ScanStatus::CheckedIn => {
                sqlx::query("INSERT INTO attendance_entries (attendance_id, check_in) VALUES (?, ?)")
                    .bind(attendance_id)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok((status, day))
    }

    async fn list_attendance(&self) -> AppResult<Vec<AttendanceDay>> {
        let sql = format!("{DAY_SELECT} ORDER BY a.date DESC, a.uid, e.id");
        self.fetch_days(&sql, None).await
    }

    async fn attendance_on(&self, date: NaiveDate) -> AppResult<Vec<AttendanceDay>> {
        let sql = format!("{DAY_SELECT} WHERE a.date = ? ORDER BY a.uid, e.id");
        self.fetch_days(&sql, Some(DayFilter::Date(date))).await
    }

    async fn attendance_for_user(&self, uid: &str) -> AppResult<Vec<AttendanceDay>> {
        let sql = format!("{DAY_SELECT} WHERE a.uid = ? ORDER BY a.date DESC, e.id");
        self.fetch_days(&sql, Some(DayFilter::Uid(uid))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(id: u64, uid: &str, hour: Option<u32>, out: Option<u32>) -> DayEntryRow {
        let t = |h| Utc.with_ymd_and_hms(2026, 2, 2, h, 0, 0).unwrap();
        DayEntryRow {
            id,
            uid: uid.into(),
            name: uid.to_lowercase(),
            date: NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(),
            check_in: hour.map(t),
            check_out: out.map(t),
        }
    }

    #[test]
    fn groups_joined_rows_per_day() {
        let days = group_days(vec![
            row(1, "A1", Some(8), Some(12)),
            row(1, "A1", Some(13), None),
            row(2, "B2", Some(9), Some(10)),
        ]);

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].uid, "A1");
        assert_eq!(days[0].entries.len(), 2);
        assert!(days[0].is_present());
        assert_eq!(days[1].total_hours(), 1.0);
    }

    #[test]
    fn day_without_entries_stays_empty() {
        let days = group_days(vec![row(7, "C3", None, None)]);
        assert_eq!(days.len(), 1);
        assert!(days[0].entries.is_empty());
    }
}
