use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::database::models::{HistoryEvent, HistoryRecord, ReferenceTable};
use crate::database::{DatabaseError, Store};
use crate::services::error::{FieldErrors, Resource, ServiceError, ServiceResult};
use crate::services::fields;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryPayload {
    #[serde(default)]
    pub workers_id: Option<Value>,
    #[serde(default)]
    pub actions_id: Option<Value>,
    #[serde(default)]
    pub sum: Option<Value>,
    #[serde(default)]
    pub date: Option<Value>,
}

impl HistoryPayload {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("workers_id", &self.workers_id),
            ("actions_id", &self.actions_id),
            ("sum", &self.sum),
        ]
        .into_iter()
        .filter(|(_, value)| fields::is_absent(value))
        .map(|(field, _)| field)
        .collect()
    }

    pub fn into_record(self) -> ServiceResult<HistoryRecord> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(ServiceError::MissingFields(missing));
        }

        let mut errors = FieldErrors::new();
        let workers_id = errors.check("workers_id", fields::id(&self.workers_id));
        let actions_id = errors.check("actions_id", fields::id(&self.actions_id));
        let sum = errors.check("sum", fields::amount(&self.sum));
        let date = errors.check("date", fields::date(&self.date));
        errors.into_result("Validation failed")?;

        match (workers_id, actions_id, sum) {
            (Some(workers_id), Some(actions_id), Some(sum)) => Ok(HistoryRecord {
                workers_id,
                actions_id,
                sum,
                date,
            }),
            _ => Err(ServiceError::validation("Validation failed")),
        }
    }
}

/// Payroll events (bonuses, fines and similar) recorded against workers.
pub struct HistoryController {
    store: Arc<dyn Store>,
}

impl HistoryController {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list_all(&self) -> ServiceResult<Vec<HistoryEvent>> {
        let rows = self.store.list_events().await?;
        Ok(rows.into_iter().map(HistoryEvent::from).collect())
    }

    pub async fn get_by_id(&self, id: i64) -> ServiceResult<HistoryEvent> {
        self.store
            .get_event(id)
            .await?
            .map(HistoryEvent::from)
            .ok_or(ServiceError::NotFound(Resource::History))
    }

    pub async fn create(&self, payload: HistoryPayload) -> ServiceResult<HistoryEvent> {
        let record = payload.into_record()?;
        self.ensure_references(&record).await?;

        let id = self
            .store
            .insert_event(&record)
            .await
            .map_err(missing_reference)?;
        info!(worker_id = record.workers_id, "Created history event {}", id);
        self.get_by_id(id).await
    }

    pub async fn update(&self, id: i64, payload: HistoryPayload) -> ServiceResult<HistoryEvent> {
        if !self.store.event_exists(id).await? {
            return Err(ServiceError::NotFound(Resource::History));
        }
        let record = payload.into_record()?;
        self.ensure_references(&record).await?;

        let updated = self
            .store
            .update_event(id, &record)
            .await
            .map_err(missing_reference)?;
        if !updated {
            return Err(ServiceError::NotFound(Resource::History));
        }
        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        if self.store.delete_event(id).await? {
            info!("Deleted history event {}", id);
            Ok(())
        } else {
            Err(ServiceError::NotFound(Resource::History))
        }
    }

    pub async fn count(&self) -> ServiceResult<i64> {
        Ok(self.store.count_events().await?)
    }

    /// Worker first, then action.
    async fn ensure_references(&self, record: &HistoryRecord) -> ServiceResult<()> {
        if !self.store.worker_exists(record.workers_id).await? {
            return Err(ServiceError::NotFound(Resource::Worker));
        }
        if self
            .store
            .get_entry(ReferenceTable::Actions, record.actions_id)
            .await?
            .is_none()
        {
            return Err(ServiceError::NotFound(Resource::Action));
        }
        Ok(())
    }
}

/// A worker or action deleted between the pre-check and the write.
fn missing_reference(err: DatabaseError) -> ServiceError {
    match err {
        DatabaseError::ForeignKeyViolation(constraint) if constraint.contains("actions_id") => {
            ServiceError::NotFound(Resource::Action)
        }
        DatabaseError::ForeignKeyViolation(_) => ServiceError::NotFound(Resource::Worker),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::WorkerRecord;
    use crate::database::{MemoryStore, ReferenceStore, WorkerStore};
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use serde_json::json;

    struct Fixture {
        controller: HistoryController,
        worker_id: i64,
        action_id: i64,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let mut ids = Vec::new();
        for (table, name) in [
            (ReferenceTable::Genders, "Male"),
            (ReferenceTable::Professions, "Driver"),
            (ReferenceTable::Positions, "Driver"),
            (ReferenceTable::Education, "Secondary"),
        ] {
            ids.push(store.insert_entry(table, name).await.unwrap().id);
        }
        let worker_id = store
            .insert_worker(&WorkerRecord {
                name: "Petr".to_string(),
                fam: "Sidorov".to_string(),
                otch: Some("Ivanovich".to_string()),
                gender_id: ids[0],
                prof_id: ids[1],
                position_id: ids[2],
                education_id: ids[3],
                salary: Decimal::new(30000, 0),
                date_r: None,
                date_hired: None,
                date_fired: None,
            })
            .await
            .unwrap();
        let action_id = store.insert_entry(ReferenceTable::Actions, "Bonus").await.unwrap().id;

        Fixture {
            controller: HistoryController::new(store),
            worker_id,
            action_id,
        }
    }

    fn payload(value: serde_json::Value) -> HistoryPayload {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn create_defaults_date_and_derives_full_name() {
        let f = fixture().await;
        let event = f
            .controller
            .create(payload(json!({
                "workers_id": f.worker_id,
                "actions_id": f.action_id,
                "sum": 500
            })))
            .await
            .unwrap();

        assert_eq!(event.row.date, Utc::now().date_naive());
        assert_eq!(event.worker_full_name, "Sidorov Petr Ivanovich");
        assert_eq!(event.row.action_name.as_deref(), Some("Bonus"));
    }

    #[tokio::test]
    async fn worker_is_checked_before_action() {
        let f = fixture().await;
        let err = f
            .controller
            .create(payload(json!({ "workers_id": 99, "actions_id": 99, "sum": 1 })))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Resource::Worker)));

        let err = f
            .controller
            .create(payload(json!({ "workers_id": f.worker_id, "actions_id": 99, "sum": 1 })))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Resource::Action)));
    }

    #[tokio::test]
    async fn required_fields_and_sign() {
        let f = fixture().await;
        match f.controller.create(payload(json!({ "sum": 10 }))).await.unwrap_err() {
            ServiceError::MissingFields(fields) => assert_eq!(fields, vec!["workers_id", "actions_id"]),
            other => panic!("unexpected error: {other:?}"),
        }

        let err = f
            .controller
            .create(payload(json!({
                "workers_id": f.worker_id,
                "actions_id": f.action_id,
                "sum": -5
            })))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));
    }

    #[tokio::test]
    async fn update_keeps_date_when_omitted_and_checks_existence_first() {
        let f = fixture().await;
        let created = f
            .controller
            .create(payload(json!({
                "workers_id": f.worker_id,
                "actions_id": f.action_id,
                "sum": "100.25",
                "date": "2024-05-20"
            })))
            .await
            .unwrap();

        let updated = f
            .controller
            .update(
                created.row.id,
                payload(json!({ "workers_id": f.worker_id, "actions_id": f.action_id, "sum": 300 })),
            )
            .await
            .unwrap();
        assert_eq!(updated.row.date, NaiveDate::from_ymd_opt(2024, 5, 20).unwrap());
        assert_eq!(updated.row.sum, Decimal::new(300, 0));

        // Existence wins over body validation
        let err = f.controller.update(999, payload(json!({}))).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(Resource::History)));
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let f = fixture().await;
        for date in ["2024-01-10", "2024-03-01", "2024-03-01"] {
            f.controller
                .create(payload(json!({
                    "workers_id": f.worker_id,
                    "actions_id": f.action_id,
                    "sum": 1,
                    "date": date
                })))
                .await
                .unwrap();
        }

        let events = f.controller.list_all().await.unwrap();
        let order: Vec<(String, i64)> = events
            .iter()
            .map(|e| (e.row.date.to_string(), e.row.id))
            .collect();
        assert_eq!(
            order,
            vec![
                ("2024-03-01".to_string(), 3),
                ("2024-03-01".to_string(), 2),
                ("2024-01-10".to_string(), 1)
            ]
        );

        f.controller.delete(3).await.unwrap();
        assert_eq!(f.controller.count().await.unwrap(), 2);
        assert!(matches!(
            f.controller.delete(3).await.unwrap_err(),
            ServiceError::NotFound(Resource::History)
        ));
    }
}
