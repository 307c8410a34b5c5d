use festa_common::Money;
use sqlx::{Error as SqlxError, SqliteConnection};

use crate::db_types::Package;

pub async fn fetch_package(id: i64, conn: &mut SqliteConnection) -> Result<Option<Package>, SqlxError> {
    let package = sqlx::query_as("SELECT * FROM packages WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(package)
}

/// The catalog is managed by another service; this insert exists for tests and local seeding.
pub async fn insert_package(name: &str, price: Money, conn: &mut SqliteConnection) -> Result<Package, SqlxError> {
    let package = sqlx::query_as("INSERT INTO packages (name, price) VALUES ($1, $2) RETURNING *")
        .bind(name)
        .bind(price)
        .fetch_one(conn)
        .await?;
    Ok(package)
}
