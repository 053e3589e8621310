//! Ticket repository.
//!
//! Reads preload the parent event (with its counters).

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use super::entities::{event, ticket};
use super::event_repository::{ticket_counts, with_counts};
use crate::domain::Ticket;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Ticket repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Persist a ticket for `user_id` against `event_id`
    async fn create(&self, user_id: i32, event_id: i32) -> AppResult<Ticket>;

    /// Find a ticket only if it belongs to `owner_id`
    async fn find_for_owner(&self, id: i32, owner_id: i32) -> AppResult<Option<Ticket>>;

    /// All tickets of `owner_id`, most recently updated first
    async fn list_for_owner(&self, owner_id: i32) -> AppResult<Vec<Ticket>>;

    /// Set the entered flag; repeated calls are harmless
    async fn mark_entered(&self, id: i32, owner_id: i32) -> AppResult<Ticket>;

    /// `(ticket id, owner id)` of every ticket sold for `event_id`
    async fn holders_for_event(&self, event_id: i32) -> AppResult<Vec<(i32, i32)>>;
}

/// SeaORM implementation of TicketRepository
pub struct TicketStore {
    db: DatabaseConnection,
}

impl TicketStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn load(&self, model: ticket::Model) -> AppResult<Ticket> {
        let event = event::Entity::find_by_id(model.event_id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        let event = match event {
            Some(event) => Some(with_counts(&self.db, event).await?),
            None => None,
        };

        Ok(model.into_domain(event))
    }
}

#[async_trait]
impl TicketRepository for TicketStore {
    async fn create(&self, user_id: i32, event_id: i32) -> AppResult<Ticket> {
        let now = chrono::Utc::now();
        let active_model = ticket::ActiveModel {
            user_id: Set(user_id),
            event_id: Set(event_id),
            entered: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active_model.insert(&self.db).await.map_err(AppError::from)?;
        self.load(model).await
    }

    async fn find_for_owner(&self, id: i32, owner_id: i32) -> AppResult<Option<Ticket>> {
        let model = ticket::Entity::find_by_id(id)
            .filter(ticket::Column::UserId.eq(owner_id))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        match model {
            Some(model) => Ok(Some(self.load(model).await?)),
            None => Ok(None),
        }
    }

    async fn list_for_owner(&self, owner_id: i32) -> AppResult<Vec<Ticket>> {
        let rows = ticket::Entity::find()
            .filter(ticket::Column::UserId.eq(owner_id))
            .order_by_desc(ticket::Column::UpdatedAt)
            .find_also_related(event::Entity)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        let event_ids: Vec<i32> = rows.iter().map(|(ticket, _)| ticket.event_id).collect();
        let counts = ticket_counts(&self.db, Some(event_ids)).await?;

        Ok(rows
            .into_iter()
            .map(|(ticket, event)| {
                let event = event.map(|event| {
                    let (purchased, entered) = counts.get(&event.id).copied().unwrap_or_default();
                    event.into_domain(purchased, entered)
                });
                ticket.into_domain(event)
            })
            .collect())
    }

    async fn mark_entered(&self, id: i32, owner_id: i32) -> AppResult<Ticket> {
        let model = ticket::Entity::find_by_id(id)
            .filter(ticket::Column::UserId.eq(owner_id))
            .one(&self.db)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound("Ticket".to_string()))?;

        let mut active: ticket::ActiveModel = model.into();
        active.entered = Set(true);
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(&self.db).await.map_err(AppError::from)?;
        self.load(model).await
    }

    async fn holders_for_event(&self, event_id: i32) -> AppResult<Vec<(i32, i32)>> {
        ticket::Entity::find()
            .select_only()
            .column(ticket::Column::Id)
            .column(ticket::Column::UserId)
            .filter(ticket::Column::EventId.eq(event_id))
            .into_tuple::<(i32, i32)>()
            .all(&self.db)
            .await
            .map_err(AppError::from)
    }
}
