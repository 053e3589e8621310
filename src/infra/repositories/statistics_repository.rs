//! Statistics repository: store-wide counts for the dashboard.

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

use super::entities::{event, ticket};
use crate::domain::Statistics;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait StatisticsRepository: Send + Sync {
    /// Three independent counts; not a consistent snapshot
    async fn counts(&self) -> AppResult<Statistics>;
}

/// SeaORM implementation of StatisticsRepository
pub struct StatisticsStore {
    db: DatabaseConnection,
}

impl StatisticsStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StatisticsRepository for StatisticsStore {
    async fn counts(&self) -> AppResult<Statistics> {
        let event_count = event::Entity::find()
            .count(&self.db)
            .await
            .map_err(AppError::from)?;

        let ticket_count = ticket::Entity::find()
            .count(&self.db)
            .await
            .map_err(AppError::from)?;

        let validation_count = ticket::Entity::find()
            .filter(ticket::Column::Entered.eq(true))
            .count(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(Statistics {
            event_count,
            ticket_count,
            validation_count,
        })
    }
}
