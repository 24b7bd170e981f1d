//! Failsafe server: reference, projects and process collections over PostgreSQL.
//!
//! Run from repo root: `cargo run -p failsafe-server`

use failsafe::{app, builtin_routers, ensure_database_exists, ensure_tables, PgGateway, Settings};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("failsafe=info,failsafe_server=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    ensure_database_exists(&settings.database_url).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await?;

    let routers = builtin_routers()?;
    let descriptors: Vec<_> = routers.iter().flat_map(|r| r.collections().iter().cloned()).collect();
    ensure_tables(&pool, &settings.schema, &descriptors).await?;

    let gateway = Arc::new(PgGateway::new(pool, settings.schema.clone()));
    let app = app(gateway, &routers, settings.body_limit)?;

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("failsafe listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
