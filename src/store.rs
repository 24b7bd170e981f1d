//! Database bootstrap: create the target database when the server points at one that does not exist.

use crate::error::{AppError, ConfigError};
use crate::sql::quoted;
use sqlx::ConnectOptions;
use std::str::FromStr;

/// Connect to the `postgres` maintenance database on the same server and create the database
/// named in `database_url` if missing. No-op when the URL already targets `postgres`.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| ConfigError::Settings(format!("invalid database url: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

/// Split a connection URL into (maintenance URL, database name).
fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
    let path_start = url
        .get(scheme_end..)
        .and_then(|rest| rest.find('/'))
        .map(|i| scheme_end + i + 1)
        .ok_or_else(|| ConfigError::Settings("database url has no database path".into()))?;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let mut parts = path_and_query.splitn(2, '?');
    let db_name = parts.next().unwrap_or("").trim().to_string();
    let query = parts.next().map(|q| format!("?{}", q)).unwrap_or_default();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres{}", base, query), db_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_database_name_and_keeps_query() {
        let (admin, db) = parse_db_name_from_url("postgres://u:p@localhost:5432/failsafe?sslmode=disable").unwrap();
        assert_eq!(db, "failsafe");
        assert_eq!(admin, "postgres://u:p@localhost:5432/postgres?sslmode=disable");
    }

    #[test]
    fn url_without_path_is_rejected() {
        assert!(matches!(
            parse_db_name_from_url("postgres://localhost"),
            Err(AppError::Config(ConfigError::Settings(_)))
        ));
    }
}
