use std::path::Path;

use festa_common::Money;
use log::*;
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};

use crate::{db_types::Package, sqlite::db::packages, SqliteDatabase};

pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    run_migrations(url).await;
}

pub fn random_db_path() -> String {
    format!("sqlite://../data/test_booking_{}", rand::random::<u64>())
}

pub async fn run_migrations(url: &str) {
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    migrate!("./src/sqlite/migrations").run(db.pool()).await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
}

pub async fn create_database<P: AsRef<Path>>(path: P) {
    let p = path.as_ref().as_os_str().to_str().unwrap();
    if let Err(e) = Sqlite::drop_database(p).await {
        warn!("Error dropping database {p}: {e:?}");
    }
    Sqlite::create_database(p).await.expect("Error creating database");
    info!("Created Sqlite database {p}");
}

/// Orders cannot be taken through the deposit flow without a priced catalog entry, so most tests
/// start by seeding one.
pub async fn seed_package(db: &SqliteDatabase, name: &str, price: Money) -> Package {
    let mut conn = db.pool().acquire().await.expect("Error acquiring a connection");
    packages::insert_package(name, price, &mut conn).await.expect("Error seeding package")
}
