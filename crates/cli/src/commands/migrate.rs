//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/census census migrate
//! ```
//!
//! # Migration Files
//!
//! `crates/client/migrations/`, embedded at build time.

use literacy_census_client::{AppError, AppState, Result};

/// Apply pending migrations to the `PostgreSQL` document store.
#[allow(clippy::print_stdout)]
pub async fn run(state: &AppState) -> Result<()> {
    let Some(postgres) = state.postgres() else {
        return Err(AppError::BadRequest(
            "DATABASE_URL is not set; there is nothing to migrate".to_string(),
        ));
    };

    tracing::info!("Running migrations...");
    postgres.migrate().await?;
    tracing::info!("Migrations complete");
    println!("Migrations applied.");
    Ok(())
}
