//! Schedule registry
//!
//! Pure storage for [`ScheduleDefinition`]s under the `scheduledExports` key.
//! It never evaluates due times or triggers runs.

use crate::adapters::store::{JsonCollection, KeyValueStore};
use crate::domain::{LavendairError, Result, ScheduleDefinition, ScheduleId};
use std::sync::Arc;

/// Store key holding all schedules
pub const SCHEDULES_KEY: &str = "scheduledExports";

/// CRUD over recurring export definitions
#[derive(Clone)]
pub struct ScheduleRegistry {
    schedules: JsonCollection<ScheduleDefinition>,
}

impl ScheduleRegistry {
    /// Create a registry over a key-value store
    ///
    /// # Arguments
    ///
    /// * `store` - Persistence backend
    /// * `max_attempts` - Optimistic write attempts before a conflict error
    pub fn new(store: Arc<dyn KeyValueStore>, max_attempts: usize) -> Self {
        Self {
            schedules: JsonCollection::new(store, SCHEDULES_KEY).with_max_attempts(max_attempts),
        }
    }

    /// Validate and store a new schedule
    ///
    /// # Errors
    ///
    /// Returns [`LavendairError::Validation`] for an invalid definition or one
    /// whose id is already registered.
    pub async fn create(&self, schedule: ScheduleDefinition) -> Result<ScheduleDefinition> {
        schedule.validate().map_err(LavendairError::Validation)?;

        let id = schedule.id.clone();
        let stored = schedule.clone();
        let inserted = self
            .schedules
            .update(move |items| {
                if items.iter().any(|s| s.id == id) {
                    false
                } else {
                    items.push(stored.clone());
                    true
                }
            })
            .await?;

        if !inserted {
            return Err(LavendairError::Validation(format!(
                "Schedule {} already exists",
                schedule.id
            )));
        }

        tracing::info!(
            schedule_id = %schedule.id,
            name = %schedule.name,
            frequency = %schedule.frequency,
            destination = %schedule.destination,
            "Schedule created"
        );
        Ok(schedule)
    }

    /// All schedules in creation order
    pub async fn list(&self) -> Result<Vec<ScheduleDefinition>> {
        self.schedules.load().await
    }

    /// Look up one schedule
    pub async fn get(&self, id: &ScheduleId) -> Result<Option<ScheduleDefinition>> {
        Ok(self.list().await?.into_iter().find(|s| &s.id == id))
    }

    /// Remove a schedule
    ///
    /// Idempotent: deleting an unknown id is a no-op. Returns whether a
    /// schedule was actually removed. Export history is never touched.
    pub async fn delete(&self, id: &ScheduleId) -> Result<bool> {
        let target = id.clone();
        let removed = self
            .schedules
            .update(move |items| {
                let before = items.len();
                items.retain(|s| s.id != target);
                before != items.len()
            })
            .await?;

        if removed {
            tracing::info!(schedule_id = %id, "Schedule deleted");
        } else {
            tracing::debug!(schedule_id = %id, "Schedule not found, nothing to delete");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::MemoryStore;
    use crate::domain::schedule::parse_time_of_day;
    use crate::domain::{CredentialsRef, Destination, ExportFormat, Frequency, SensorId};
    use chrono::Utc;

    fn registry() -> ScheduleRegistry {
        ScheduleRegistry::new(Arc::new(MemoryStore::new()), 5)
    }

    fn schedule(name: &str) -> ScheduleDefinition {
        ScheduleDefinition::new(
            name,
            Frequency::Daily,
            parse_time_of_day("09:00").unwrap(),
            vec![SensorId::new(131075)],
            ExportFormat::Csv,
            Destination::EagleIo,
            CredentialsRef {
                endpoint: Some("https://api.eagle.io/api".to_string()),
                api_key_env: Some("EAGLEIO_API_KEY".to_string()),
                ..Default::default()
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let registry = registry();
        registry.create(schedule("Morning")).await.unwrap();
        registry.create(schedule("Evening")).await.unwrap();

        let names: Vec<String> = registry
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Morning", "Evening"]);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid() {
        let registry = registry();
        let mut invalid = schedule("No sensors");
        invalid.sensors.clear();

        let err = registry.create(invalid).await.unwrap_err();
        assert!(matches!(err, LavendairError::Validation(_)));
        assert!(registry.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_id() {
        let registry = registry();
        let s = schedule("Once");
        registry.create(s.clone()).await.unwrap();
        assert!(registry.create(s).await.is_err());
        assert_eq!(registry.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let registry = registry();
        let s = registry.create(schedule("Temp")).await.unwrap();

        assert!(registry.delete(&s.id).await.unwrap());
        assert!(!registry.delete(&s.id).await.unwrap());
        assert!(!registry
            .delete(&ScheduleId::new("never-existed").unwrap())
            .await
            .unwrap());
        assert!(registry.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get() {
        let registry = registry();
        let s = registry.create(schedule("Find me")).await.unwrap();

        assert_eq!(registry.get(&s.id).await.unwrap().unwrap().name, "Find me");
        assert!(registry
            .get(&ScheduleId::new("missing").unwrap())
            .await
            .unwrap()
            .is_none());
    }
}
