//! Migrate command - Schema management for the events, tickets and users tables.

use sea_orm::DbErr;

use crate::cli::args::{MigrateAction, MigrateArgs};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::Database;

fn migration_error(e: DbErr) -> AppError {
    AppError::internal(format!("Migration failed: {}", e))
}

/// Execute the migrate command
///
/// # Arguments
/// * `args` - The migration action to perform
/// * `config` - Configuration holding the database URL
///
/// # Errors
/// Returns an internal error if the database is unreachable or a migration
/// fails.
pub async fn execute(args: MigrateArgs, config: Config) -> AppResult<()> {
    tracing::info!("Running migration command...");

    // Connect without auto-running migrations for manual control
    let db = Database::connect_without_migrations(&config)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;

    match args.action {
        MigrateAction::Up => {
            tracing::info!("Running pending migrations...");
            db.run_migrations().await.map_err(migration_error)?;
            tracing::info!("Pending migrations applied");
        }
        MigrateAction::Down => {
            tracing::info!("Rolling back last migration...");
            db.rollback_migration().await.map_err(migration_error)?;
            tracing::info!("Last migration reverted");
        }
        MigrateAction::Status => {
            // Plain stdout so the table can be piped
            for (name, applied) in db.migration_status().await.map_err(migration_error)? {
                println!("{:<48} {}", name, if applied { "applied" } else { "pending" });
            }
        }
        MigrateAction::Fresh => {
            tracing::warn!("Dropping all tables and re-applying migrations");
            db.fresh_migrations().await.map_err(migration_error)?;
            tracing::info!("Schema rebuilt");
        }
    }

    Ok(())
}
