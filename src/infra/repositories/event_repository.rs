//! Event repository.
//!
//! Purchased and entered counters are aggregated from the tickets table on
//! every read, so they are always consistent with the stored tickets.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Set,
};

use super::entities::{event, ticket};
use crate::domain::{CreateEvent, Event, UpdateEvent};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Event repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// All events, most recently updated first
    async fn list(&self) -> AppResult<Vec<Event>>;

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Event>>;

    async fn create(&self, input: CreateEvent) -> AppResult<Event>;

    /// Apply a partial update; fails with NotFound for unknown ids
    async fn update(&self, id: i32, changes: UpdateEvent) -> AppResult<Event>;

    /// Delete an event and, by cascade, its tickets
    async fn delete(&self, id: i32) -> AppResult<()>;
}

#[derive(Debug, FromQueryResult)]
struct TicketCounts {
    event_id: i32,
    purchased: i64,
    entered: i64,
}

/// Purchased/entered counts per event id, optionally restricted to `ids`.
pub(super) async fn ticket_counts<C: ConnectionTrait>(
    db: &C,
    ids: Option<Vec<i32>>,
) -> AppResult<HashMap<i32, (i64, i64)>> {
    let mut query = ticket::Entity::find()
        .select_only()
        .column(ticket::Column::EventId)
        .column_as(Expr::col(ticket::Column::Id).count(), "purchased")
        .column_as(Expr::cust("COUNT(*) FILTER (WHERE entered)"), "entered")
        .group_by(ticket::Column::EventId);

    if let Some(ids) = ids {
        query = query.filter(ticket::Column::EventId.is_in(ids));
    }

    let rows = query
        .into_model::<TicketCounts>()
        .all(db)
        .await
        .map_err(AppError::from)?;

    Ok(rows
        .into_iter()
        .map(|row| (row.event_id, (row.purchased, row.entered)))
        .collect())
}

/// Convert a stored event into its domain form with counters attached.
pub(super) async fn with_counts<C: ConnectionTrait>(
    db: &C,
    model: event::Model,
) -> AppResult<Event> {
    let counts = ticket_counts(db, Some(vec![model.id])).await?;
    let (purchased, entered) = counts.get(&model.id).copied().unwrap_or_default();
    Ok(model.into_domain(purchased, entered))
}

/// SeaORM implementation of EventRepository
pub struct EventStore {
    db: DatabaseConnection,
}

impl EventStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model(&self, id: i32) -> AppResult<event::Model> {
        event::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound("Event".to_string()))
    }
}

#[async_trait]
impl EventRepository for EventStore {
    async fn list(&self) -> AppResult<Vec<Event>> {
        let models = event::Entity::find()
            .order_by_desc(event::Column::UpdatedAt)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        let counts = ticket_counts(&self.db, None).await?;

        Ok(models
            .into_iter()
            .map(|model| {
                let (purchased, entered) = counts.get(&model.id).copied().unwrap_or_default();
                model.into_domain(purchased, entered)
            })
            .collect())
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Event>> {
        let model = event::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        match model {
            Some(model) => Ok(Some(with_counts(&self.db, model).await?)),
            None => Ok(None),
        }
    }

    async fn create(&self, input: CreateEvent) -> AppResult<Event> {
        let now = chrono::Utc::now();
        let active_model = event::ActiveModel {
            name: Set(input.name),
            location: Set(input.location),
            date: Set(input.date),
            end_date: Set(input.end_date),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active_model.insert(&self.db).await.map_err(AppError::from)?;
        Ok(model.into_domain(0, 0))
    }

    async fn update(&self, id: i32, changes: UpdateEvent) -> AppResult<Event> {
        let mut active: event::ActiveModel = self.find_model(id).await?.into();

        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(location) = changes.location {
            active.location = Set(location);
        }
        if let Some(date) = changes.date {
            active.date = Set(date);
        }
        if let Some(end_date) = changes.end_date {
            active.end_date = Set(end_date);
        }
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(&self.db).await.map_err(AppError::from)?;
        with_counts(&self.db, model).await
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = event::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Event".to_string()));
        }

        Ok(())
    }
}
