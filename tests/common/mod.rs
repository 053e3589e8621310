//! Shared fixtures for integration tests.
//!
//! An in-memory store implements every repository trait so the full
//! service and HTTP stack runs without Postgres or Redis.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use ticket_booking::config::{Config, JobSettings};
use ticket_booking::domain::{CreateEvent, Event, Statistics, Ticket, UpdateEvent, User, UserRole};
use ticket_booking::errors::{AppError, AppResult};
use ticket_booking::infra::{
    Cache, CacheBackend, EventRepository, Persistence, StatisticsRepository, TicketRepository,
    UserRepository,
};
use ticket_booking::jobs::JobQueue;
use ticket_booking::services::Services;
use ticket_booking::AppState;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-chars";

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    events: Vec<Event>,
    tickets: Vec<Ticket>,
    next_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn event_with_counts(&self, event: &Event) -> Event {
        let tickets = self.tickets.iter().filter(|t| t.event_id == event.id);
        let (purchased, entered) = tickets.fold((0, 0), |(p, e), t| (p + 1, e + t.entered as i64));
        Event {
            total_tickets_purchased: purchased,
            total_tickets_entered: entered,
            ..event.clone()
        }
    }

    fn ticket_with_event(&self, ticket: &Ticket) -> Ticket {
        let event = self
            .events
            .iter()
            .find(|e| e.id == ticket.event_id)
            .map(|e| self.event_with_counts(e));
        Ticket {
            event,
            ..ticket.clone()
        }
    }
}

/// In-memory stand-in for the relational store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn promote(&self, email: &str) {
        let mut tables = self.tables.lock().unwrap();
        if let Some(user) = tables.users.iter_mut().find(|u| u.email == email) {
            user.role = UserRole::Manager;
        }
    }

    pub fn ticket(&self, id: i32) -> Option<Ticket> {
        let tables = self.tables.lock().unwrap();
        tables.tickets.iter().find(|t| t.id == id).cloned()
    }

    pub fn persistence(&self) -> Persistence {
        let store = Arc::new(self.clone());
        Persistence::from_parts(store.clone(), store.clone(), store.clone(), store)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, email: String, password_hash: String) -> AppResult<User> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|u| u.email == email) {
            return Err(AppError::conflict("User"));
        }
        let now = Utc::now();
        let user = User {
            id: tables.next_id(),
            email,
            password_hash,
            role: UserRole::Attendee,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Event>> {
        let tables = self.tables.lock().unwrap();
        let mut events: Vec<Event> = tables
            .events
            .iter()
            .map(|e| tables.event_with_counts(e))
            .collect();
        events.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(events)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Event>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .events
            .iter()
            .find(|e| e.id == id)
            .map(|e| tables.event_with_counts(e)))
    }

    async fn create(&self, input: CreateEvent) -> AppResult<Event> {
        let mut tables = self.tables.lock().unwrap();
        let now = Utc::now();
        let event = Event {
            id: tables.next_id(),
            name: input.name,
            location: input.location,
            date: input.date,
            end_date: input.end_date,
            total_tickets_purchased: 0,
            total_tickets_entered: 0,
            created_at: now,
            updated_at: now,
        };
        tables.events.push(event.clone());
        Ok(event)
    }

    async fn update(&self, id: i32, changes: UpdateEvent) -> AppResult<Event> {
        let mut tables = self.tables.lock().unwrap();
        let event = tables
            .events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| AppError::NotFound("Event".to_string()))?;

        if let Some(name) = changes.name {
            event.name = name;
        }
        if let Some(location) = changes.location {
            event.location = location;
        }
        if let Some(date) = changes.date {
            event.date = date;
        }
        if let Some(end_date) = changes.end_date {
            event.end_date = end_date;
        }
        event.updated_at = Utc::now();

        let event = event.clone();
        Ok(tables.event_with_counts(&event))
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.events.len();
        tables.events.retain(|e| e.id != id);
        if tables.events.len() == before {
            return Err(AppError::NotFound("Event".to_string()));
        }
        tables.tickets.retain(|t| t.event_id != id);
        Ok(())
    }
}

#[async_trait]
impl TicketRepository for MemoryStore {
    async fn create(&self, user_id: i32, event_id: i32) -> AppResult<Ticket> {
        let mut tables = self.tables.lock().unwrap();
        let now = Utc::now();
        let ticket = Ticket {
            id: tables.next_id(),
            user_id,
            event_id,
            event: None,
            entered: false,
            created_at: now,
            updated_at: now,
        };
        tables.tickets.push(ticket.clone());
        Ok(tables.ticket_with_event(&ticket))
    }

    async fn find_for_owner(&self, id: i32, owner_id: i32) -> AppResult<Option<Ticket>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .tickets
            .iter()
            .find(|t| t.id == id && t.user_id == owner_id)
            .map(|t| tables.ticket_with_event(t)))
    }

    async fn list_for_owner(&self, owner_id: i32) -> AppResult<Vec<Ticket>> {
        let tables = self.tables.lock().unwrap();
        let mut tickets: Vec<Ticket> = tables
            .tickets
            .iter()
            .filter(|t| t.user_id == owner_id)
            .map(|t| tables.ticket_with_event(t))
            .collect();
        tickets.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(tickets)
    }

    async fn mark_entered(&self, id: i32, owner_id: i32) -> AppResult<Ticket> {
        let mut tables = self.tables.lock().unwrap();
        let ticket = tables
            .tickets
            .iter_mut()
            .find(|t| t.id == id && t.user_id == owner_id)
            .ok_or_else(|| AppError::NotFound("Ticket".to_string()))?;
        ticket.entered = true;
        ticket.updated_at = Utc::now();

        let ticket = ticket.clone();
        Ok(tables.ticket_with_event(&ticket))
    }

    async fn holders_for_event(&self, event_id: i32) -> AppResult<Vec<(i32, i32)>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .tickets
            .iter()
            .filter(|t| t.event_id == event_id)
            .map(|t| (t.id, t.user_id))
            .collect())
    }
}

#[async_trait]
impl StatisticsRepository for MemoryStore {
    async fn counts(&self) -> AppResult<Statistics> {
        let tables = self.tables.lock().unwrap();
        Ok(Statistics {
            event_count: tables.events.len() as u64,
            ticket_count: tables.tickets.len() as u64,
            validation_count: tables.tickets.iter().filter(|t| t.entered).count() as u64,
        })
    }
}

/// Cache backend whose every call hangs.
pub struct StalledBackend;

#[async_trait]
impl CacheBackend for StalledBackend {
    async fn get(&self, _key: &str) -> AppResult<Option<Vec<u8>>> {
        std::future::pending().await
    }

    async fn set_ex(&self, _key: &str, _value: &[u8], _ttl: Duration) -> AppResult<()> {
        std::future::pending().await
    }

    async fn delete(&self, _key: &str) -> AppResult<()> {
        std::future::pending().await
    }

    async fn keys(&self, _pattern: &str) -> AppResult<Vec<String>> {
        std::future::pending().await
    }

    async fn hash_set(&self, _key: &str, _fields: Vec<(String, String)>) -> AppResult<()> {
        std::future::pending().await
    }

    async fn hash_get_all(&self, _key: &str) -> AppResult<HashMap<String, String>> {
        std::future::pending().await
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> AppResult<()> {
        std::future::pending().await
    }

    async fn ping(&self) -> AppResult<()> {
        std::future::pending().await
    }
}

pub fn test_config() -> Config {
    let mut config = Config::with_secret(TEST_SECRET);
    config.qr.size = 64;
    config.jobs = JobSettings {
        workers: 2,
        capacity: 64,
        job_timeout: Duration::from_secs(5),
    };
    config
}

/// Full application wired over the in-memory store and cache.
pub struct TestApp {
    pub store: MemoryStore,
    pub cache: Cache,
    pub jobs: JobQueue,
    pub services: Services,
    pub state: AppState,
}

impl TestApp {
    pub fn with_cache(cache: Cache) -> Self {
        Self::with_settings(cache, test_config().jobs)
    }

    pub fn with_settings(cache: Cache, jobs: JobSettings) -> Self {
        let mut config = test_config();
        config.jobs = jobs;
        let store = MemoryStore::new();
        let jobs = JobQueue::start(cache.clone(), config.jobs);
        let services = Services::build(
            Arc::new(store.persistence()),
            cache.clone(),
            jobs.clone(),
            &config,
        );
        let state = AppState::from_services(&services, cache.clone(), jobs.clone());

        Self {
            store,
            cache,
            jobs,
            services,
            state,
        }
    }

    pub fn new() -> Self {
        Self::with_cache(Cache::in_memory())
    }
}
