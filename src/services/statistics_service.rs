//! Statistics service - dashboard counts, always read from the store.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::Statistics;
use crate::errors::AppResult;
use crate::infra::UnitOfWork;
use crate::utils::with_timeout;

#[async_trait]
pub trait StatisticsService: Send + Sync {
    async fn get_counts(&self) -> AppResult<Statistics>;
}

pub struct StatisticsReporter<U: UnitOfWork> {
    uow: Arc<U>,
    timeout: Duration,
}

impl<U: UnitOfWork> StatisticsReporter<U> {
    pub fn new(uow: Arc<U>, timeout: Duration) -> Self {
        Self { uow, timeout }
    }
}

#[async_trait]
impl<U: UnitOfWork> StatisticsService for StatisticsReporter<U> {
    async fn get_counts(&self) -> AppResult<Statistics> {
        with_timeout(self.timeout, self.uow.statistics().counts()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{
        MockEventRepository, MockStatisticsRepository, MockTicketRepository, MockUserRepository,
        Persistence,
    };

    #[tokio::test]
    async fn test_counts_come_from_store() {
        let mut statistics = MockStatisticsRepository::new();
        statistics.expect_counts().times(1).returning(|| {
            Ok(Statistics {
                event_count: 3,
                ticket_count: 10,
                validation_count: 4,
            })
        });

        let uow = Persistence::from_parts(
            Arc::new(MockUserRepository::new()),
            Arc::new(MockEventRepository::new()),
            Arc::new(MockTicketRepository::new()),
            Arc::new(statistics),
        );
        let reporter = StatisticsReporter::new(Arc::new(uow), Duration::from_secs(5));

        let counts = reporter.get_counts().await.unwrap();
        assert_eq!(counts.ticket_count, 10);
        assert_eq!(counts.validation_count, 4);
    }
}
