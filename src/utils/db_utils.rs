use sqlx::MySqlExecutor;

use crate::error::{AppError, AppResult};

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug, PartialEq)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<String>,
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
/// Column names come from typed update structs, never from request keys.
pub fn build_update_sql(
    table: &str,
    fields: &[(&str, &str)],
    id_column: &str,
    id_value: &str,
) -> AppResult<SqlUpdate> {
    if fields.is_empty() {
        return Err(AppError::validation("No fields provided for update"));
    }

    // Build SET clause
    let set_clause = fields
        .iter()
        .map(|(column, _)| format!("{} = ?", column))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values: Vec<String> = fields.iter().map(|(_, v)| v.to_string()).collect();
    // WHERE id = ?
    values.push(id_value.to_string());

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update<'e>(
    executor: impl MySqlExecutor<'e>,
    update: SqlUpdate,
) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);
    for value in update.values {
        query = query.bind(value);
    }

    let result = query.execute(executor).await?;
    Ok(result.rows_affected())
}
