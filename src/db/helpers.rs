use color_eyre::{eyre::OptionExt, Result};
use libsql::params::IntoParams;
use serde::{de::DeserializeOwned, Serialize};

/// Fetch all rows and deserialize each into `T` via `libsql::de::from_row`.
pub async fn query_all<T: DeserializeOwned>(
    conn: &libsql::Connection,
    sql: &str,
    params: impl IntoParams,
) -> Result<Vec<T>> {
    let mut rows = conn.query(sql, params).await?;
    let mut results = Vec::new();
    while let Some(row) = rows.next().await? {
        results.push(libsql::de::from_row::<T>(&row)?);
    }
    Ok(results)
}

/// Fetch the first row and deserialize into `T`, or return `None` if no rows.
pub async fn query_optional<T: DeserializeOwned>(
    conn: &libsql::Connection,
    sql: &str,
    params: impl IntoParams,
) -> Result<Option<T>> {
    match conn.query(sql, params).await?.next().await? {
        Some(row) => Ok(Some(libsql::de::from_row::<T>(&row)?)),
        None => Ok(None),
    }
}

/// Read the first column of the first row as an integer (`COUNT`, `EXISTS`, `RETURNING id`).
pub async fn query_i64(
    conn: &libsql::Connection,
    sql: &str,
    params: impl IntoParams,
) -> Result<i64> {
    let value = conn
        .query(sql, params)
        .await?
        .next()
        .await?
        .ok_or_eyre("expected a row but got none")?
        .get::<i64>(0)?;
    Ok(value)
}

/// Whether an insert failed because it collided with a UNIQUE or PRIMARY KEY constraint.
/// Local and remote connections report this with the same SQLite wording.
pub fn is_unique_violation(err: &libsql::Error) -> bool {
    let message = err.to_string();
    message.contains("UNIQUE constraint failed") || message.contains("SQLITE_CONSTRAINT_UNIQUE")
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

pub fn from_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    Ok(serde_json::from_str(text)?)
}
