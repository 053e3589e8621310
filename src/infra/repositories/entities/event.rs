//! Event database entity for SeaORM.
//!
//! Ticket counters are not columns; repositories derive them on read.

use sea_orm::entity::prelude::*;

use crate::domain::Event;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub location: String,
    pub date: DateTimeUtc,
    pub end_date: DateTimeUtc,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ticket::Entity")]
    Ticket,
}

impl Related<super::ticket::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ticket.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Attach ticket counters computed from the tickets table.
    pub fn into_domain(self, purchased: i64, entered: i64) -> Event {
        Event {
            id: self.id,
            name: self.name,
            location: self.location,
            date: self.date,
            end_date: self.end_date,
            total_tickets_purchased: purchased,
            total_tickets_entered: entered,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
