//! In-memory `PersistenceAdapter`, standing in for whatever database schema
//! a real deployment owns. Good enough for local smoke-testing the
//! pipeline.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use vigil_model::{AIAnalysis, ParsedEvent, PersistenceAdapter, StorageError, Transaction};

#[derive(Default)]
struct Store {
    events: Vec<ParsedEvent>,
    analyses: Vec<AIAnalysis>,
}

pub struct InMemoryPersistence {
    store: Arc<Mutex<Store>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self { store: Arc::new(Mutex::new(Store::default())) }
    }

    pub fn event_count(&self) -> usize {
        self.store.lock().events.len()
    }

    pub fn analysis_count(&self) -> usize {
        self.store.lock().analyses.len()
    }
}

impl Default for InMemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

struct InMemoryTransaction {
    store: Arc<Mutex<Store>>,
    pending_events: Vec<ParsedEvent>,
    pending_analyses: Vec<AIAnalysis>,
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn insert_event(&mut self, event: &ParsedEvent) -> Result<(), StorageError> {
        self.pending_events.push(event.clone());
        Ok(())
    }

    async fn insert_analysis(&mut self, analysis: &AIAnalysis) -> Result<(), StorageError> {
        self.pending_analyses.push(analysis.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let mut store = self.store.lock();
        store.events.extend(self.pending_events);
        store.analyses.extend(self.pending_analyses);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        Ok(())
    }
}

#[async_trait]
impl PersistenceAdapter for InMemoryPersistence {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StorageError> {
        Ok(Box::new(InMemoryTransaction {
            store: self.store.clone(),
            pending_events: Vec::new(),
            pending_analyses: Vec::new(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[tokio::test]
    async fn commit_persists_events_and_analyses() {
        let persistence = InMemoryPersistence::new();
        let now = Utc::now();
        let event = ParsedEvent::new(Uuid::new_v4(), Uuid::new_v4(), now, "h", "m", vigil_model::EventCategory::Unknown, now).unwrap();

        let mut tx = persistence.begin().await.unwrap();
        tx.insert_event(&event).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(persistence.event_count(), 1);
    }

    #[tokio::test]
    async fn rollback_discards_pending_writes() {
        let persistence = InMemoryPersistence::new();
        let now = Utc::now();
        let event = ParsedEvent::new(Uuid::new_v4(), Uuid::new_v4(), now, "h", "m", vigil_model::EventCategory::Unknown, now).unwrap();

        let mut tx = persistence.begin().await.unwrap();
        tx.insert_event(&event).await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(persistence.event_count(), 0);
    }
}
