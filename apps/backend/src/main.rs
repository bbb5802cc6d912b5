//! Boots the backend stack and logs a dashboard snapshot.
//!
//! Controllers embed [`masseria_backend::AppState`]; this binary is the
//! smoke test operators run after deploying or migrating a database.

use tracing::info;

use masseria_backend::commands::dashboard::dashboard;
use masseria_backend::{init_tracing, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Masseria backend");

    let config = AppConfig::load()?;
    info!(
        db = %config.database_path.display(),
        slot_capacity = config.slot_capacity,
        "Configuration loaded"
    );

    let state = AppState::connect(config).await?;

    let stats = dashboard(&state).await?;
    info!(
        pending_orders = stats.pending_orders,
        orders_today = stats.orders_today,
        sales_today = %stats.sales_today_display,
        reservations_today = stats.reservations_today,
        "Dashboard"
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);

    state.db.close().await;
    Ok(())
}
