use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    HistoryEventRow, HistoryRecord, NewUser, ReferenceEntry, ReferenceTable, User, WorkerDetails,
    WorkerRecord,
};
use crate::database::store::{HistoryStore, ReferenceStore, Store, UserStore, WorkerStore};

#[derive(Debug, Clone)]
struct StoredEvent {
    workers_id: i64,
    actions_id: i64,
    sum: Decimal,
    date: NaiveDate,
}

/// One id sequence plus its rows, keyed by id.
#[derive(Debug)]
struct Table<T> {
    next_id: i64,
    rows: BTreeMap<i64, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

impl<T> Table<T> {
    fn insert(&mut self, row: T) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.insert(id, row);
        id
    }
}

#[derive(Debug, Default)]
struct MemoryData {
    users: Table<User>,
    references: HashMap<ReferenceTable, Table<String>>,
    workers: Table<WorkerRecord>,
    events: Table<StoredEvent>,
}

impl MemoryData {
    fn reference(&self, table: ReferenceTable, id: i64) -> Option<&String> {
        self.references.get(&table).and_then(|t| t.rows.get(&id))
    }

    fn reference_name(&self, table: ReferenceTable, id: Option<i64>) -> Option<String> {
        id.and_then(|id| self.reference(table, id)).cloned()
    }

    fn name_taken(&self, table: ReferenceTable, name: &str, exclude_id: Option<i64>) -> Option<ReferenceEntry> {
        let lowered = name.to_lowercase();
        self.references.get(&table).and_then(|t| {
            t.rows
                .iter()
                .find(|(id, existing)| Some(**id) != exclude_id && existing.to_lowercase() == lowered)
                .map(|(id, existing)| ReferenceEntry {
                    id: *id,
                    name: existing.clone(),
                })
        })
    }

    fn check_worker_references(&self, worker: &WorkerRecord) -> Result<(), DatabaseError> {
        let links = [
            (ReferenceTable::Genders, worker.gender_id, "workers_gender_id_fkey"),
            (ReferenceTable::Professions, worker.prof_id, "workers_prof_id_fkey"),
            (ReferenceTable::Positions, worker.position_id, "workers_position_id_fkey"),
            (ReferenceTable::Education, worker.education_id, "workers_education_id_fkey"),
        ];
        for (table, id, constraint) in links {
            if self.reference(table, id).is_none() {
                return Err(DatabaseError::ForeignKeyViolation(constraint.to_string()));
            }
        }
        Ok(())
    }

    fn check_event_references(&self, event: &HistoryRecord) -> Result<(), DatabaseError> {
        if !self.workers.rows.contains_key(&event.workers_id) {
            return Err(DatabaseError::ForeignKeyViolation("list_workers_id_fkey".to_string()));
        }
        if self.reference(ReferenceTable::Actions, event.actions_id).is_none() {
            return Err(DatabaseError::ForeignKeyViolation("list_actions_id_fkey".to_string()));
        }
        Ok(())
    }

    /// Whether any worker or event row points at this reference entry.
    fn reference_in_use(&self, table: ReferenceTable, id: i64) -> bool {
        match table {
            ReferenceTable::Actions => self.events.rows.values().any(|e| e.actions_id == id),
            ReferenceTable::Genders => self.workers.rows.values().any(|w| w.gender_id == id),
            ReferenceTable::Professions => self.workers.rows.values().any(|w| w.prof_id == id),
            ReferenceTable::Positions => self.workers.rows.values().any(|w| w.position_id == id),
            ReferenceTable::Education => self.workers.rows.values().any(|w| w.education_id == id),
        }
    }

    fn worker_details(&self, id: i64, worker: &WorkerRecord) -> WorkerDetails {
        WorkerDetails {
            id,
            name: worker.name.clone(),
            fam: worker.fam.clone(),
            otch: worker.otch.clone(),
            gender_id: Some(worker.gender_id),
            prof_id: Some(worker.prof_id),
            position_id: Some(worker.position_id),
            education_id: Some(worker.education_id),
            salary: worker.salary,
            date_r: worker.date_r,
            date_hired: worker.date_hired,
            date_fired: worker.date_fired,
            gender_name: self.reference_name(ReferenceTable::Genders, Some(worker.gender_id)),
            prof_name: self.reference_name(ReferenceTable::Professions, Some(worker.prof_id)),
            position_name: self.reference_name(ReferenceTable::Positions, Some(worker.position_id)),
            education_name: self.reference_name(ReferenceTable::Education, Some(worker.education_id)),
        }
    }

    fn event_row(&self, id: i64, event: &StoredEvent) -> HistoryEventRow {
        let worker = self.workers.rows.get(&event.workers_id);
        HistoryEventRow {
            id,
            workers_id: event.workers_id,
            actions_id: event.actions_id,
            sum: event.sum,
            date: event.date,
            worker_name: worker.map(|w| w.name.clone()),
            worker_fam: worker.map(|w| w.fam.clone()),
            worker_otch: worker.and_then(|w| w.otch.clone()),
            action_name: self.reference_name(ReferenceTable::Actions, Some(event.actions_id)),
        }
    }
}

/// In-process store used by tests and by `DATABASE_URL=memory:`.
///
/// Mirrors the relational constraints of the PostgreSQL schema: unique
/// usernames, case-insensitive unique reference names, and foreign keys from
/// workers and history events.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<MemoryData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let data = self.data.read().await;
        Ok(data.users.rows.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        Ok(self.data.read().await.users.rows.get(&id).cloned())
    }

    async fn insert_user(&self, user: &NewUser) -> Result<User, DatabaseError> {
        let mut data = self.data.write().await;
        if data.users.rows.values().any(|u| u.username == user.username) {
            return Err(DatabaseError::UniqueViolation("users_username_key".to_string()));
        }

        let stored = User {
            id: data.users.next_id,
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role,
        };
        data.users.insert(stored.clone());
        Ok(stored)
    }

    async fn update_password_hash(&self, id: i64, password_hash: &str) -> Result<(), DatabaseError> {
        let mut data = self.data.write().await;
        if let Some(user) = data.users.rows.get_mut(&id) {
            user.password_hash = password_hash.to_string();
        }
        Ok(())
    }
}

#[async_trait]
impl ReferenceStore for MemoryStore {
    async fn list_entries(&self, table: ReferenceTable) -> Result<Vec<ReferenceEntry>, DatabaseError> {
        let data = self.data.read().await;
        Ok(data
            .references
            .get(&table)
            .map(|t| {
                t.rows
                    .iter()
                    .map(|(id, name)| ReferenceEntry {
                        id: *id,
                        name: name.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_entry(&self, table: ReferenceTable, id: i64) -> Result<Option<ReferenceEntry>, DatabaseError> {
        let data = self.data.read().await;
        Ok(data.reference(table, id).map(|name| ReferenceEntry {
            id,
            name: name.clone(),
        }))
    }

    async fn find_entry_by_name(
        &self,
        table: ReferenceTable,
        name: &str,
        exclude_id: Option<i64>,
    ) -> Result<Option<ReferenceEntry>, DatabaseError> {
        Ok(self.data.read().await.name_taken(table, name, exclude_id))
    }

    async fn insert_entry(&self, table: ReferenceTable, name: &str) -> Result<ReferenceEntry, DatabaseError> {
        let mut data = self.data.write().await;
        if data.name_taken(table, name, None).is_some() {
            return Err(DatabaseError::UniqueViolation(format!(
                "{}_name_lower_key",
                table.table_name()
            )));
        }

        let id = data.references.entry(table).or_default().insert(name.to_string());
        Ok(ReferenceEntry {
            id,
            name: name.to_string(),
        })
    }

    async fn update_entry(
        &self,
        table: ReferenceTable,
        id: i64,
        name: &str,
    ) -> Result<Option<ReferenceEntry>, DatabaseError> {
        let mut data = self.data.write().await;
        if data.reference(table, id).is_none() {
            return Ok(None);
        }
        if data.name_taken(table, name, Some(id)).is_some() {
            return Err(DatabaseError::UniqueViolation(format!(
                "{}_name_lower_key",
                table.table_name()
            )));
        }

        if let Some(existing) = data.references.get_mut(&table).and_then(|t| t.rows.get_mut(&id)) {
            *existing = name.to_string();
        }
        Ok(Some(ReferenceEntry {
            id,
            name: name.to_string(),
        }))
    }

    async fn delete_entry(&self, table: ReferenceTable, id: i64) -> Result<bool, DatabaseError> {
        let mut data = self.data.write().await;
        if data.reference(table, id).is_none() {
            return Ok(false);
        }
        if data.reference_in_use(table, id) {
            return Err(DatabaseError::ForeignKeyViolation(format!(
                "{}_id_fkey",
                table.table_name()
            )));
        }

        Ok(data
            .references
            .get_mut(&table)
            .and_then(|t| t.rows.remove(&id))
            .is_some())
    }

    async fn count_entries(&self, table: ReferenceTable) -> Result<i64, DatabaseError> {
        let data = self.data.read().await;
        Ok(data.references.get(&table).map_or(0, |t| t.rows.len() as i64))
    }
}

#[async_trait]
impl WorkerStore for MemoryStore {
    async fn list_workers(&self) -> Result<Vec<WorkerDetails>, DatabaseError> {
        let data = self.data.read().await;
        Ok(data
            .workers
            .rows
            .iter()
            .rev()
            .map(|(id, worker)| data.worker_details(*id, worker))
            .collect())
    }

    async fn get_worker(&self, id: i64) -> Result<Option<WorkerDetails>, DatabaseError> {
        let data = self.data.read().await;
        Ok(data.workers.rows.get(&id).map(|w| data.worker_details(id, w)))
    }

    async fn worker_exists(&self, id: i64) -> Result<bool, DatabaseError> {
        Ok(self.data.read().await.workers.rows.contains_key(&id))
    }

    async fn insert_worker(&self, worker: &WorkerRecord) -> Result<i64, DatabaseError> {
        let mut data = self.data.write().await;
        data.check_worker_references(worker)?;
        Ok(data.workers.insert(worker.clone()))
    }

    async fn update_worker(&self, id: i64, worker: &WorkerRecord) -> Result<bool, DatabaseError> {
        let mut data = self.data.write().await;
        if !data.workers.rows.contains_key(&id) {
            return Ok(false);
        }
        data.check_worker_references(worker)?;
        data.workers.rows.insert(id, worker.clone());
        Ok(true)
    }

    async fn delete_worker(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut data = self.data.write().await;
        if !data.workers.rows.contains_key(&id) {
            return Ok(false);
        }
        if data.events.rows.values().any(|e| e.workers_id == id) {
            return Err(DatabaseError::ForeignKeyViolation("list_workers_id_fkey".to_string()));
        }
        Ok(data.workers.rows.remove(&id).is_some())
    }

    async fn count_workers(&self) -> Result<i64, DatabaseError> {
        Ok(self.data.read().await.workers.rows.len() as i64)
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn list_events(&self) -> Result<Vec<HistoryEventRow>, DatabaseError> {
        let data = self.data.read().await;
        let mut rows: Vec<HistoryEventRow> = data
            .events
            .rows
            .iter()
            .map(|(id, event)| data.event_row(*id, event))
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn get_event(&self, id: i64) -> Result<Option<HistoryEventRow>, DatabaseError> {
        let data = self.data.read().await;
        Ok(data.events.rows.get(&id).map(|e| data.event_row(id, e)))
    }

    async fn event_exists(&self, id: i64) -> Result<bool, DatabaseError> {
        Ok(self.data.read().await.events.rows.contains_key(&id))
    }

    async fn insert_event(&self, event: &HistoryRecord) -> Result<i64, DatabaseError> {
        let mut data = self.data.write().await;
        data.check_event_references(event)?;
        let stored = StoredEvent {
            workers_id: event.workers_id,
            actions_id: event.actions_id,
            sum: event.sum,
            date: event.date.unwrap_or_else(|| Utc::now().date_naive()),
        };
        Ok(data.events.insert(stored))
    }

    async fn update_event(&self, id: i64, event: &HistoryRecord) -> Result<bool, DatabaseError> {
        let mut data = self.data.write().await;
        let Some(current_date) = data.events.rows.get(&id).map(|e| e.date) else {
            return Ok(false);
        };
        data.check_event_references(event)?;
        data.events.rows.insert(
            id,
            StoredEvent {
                workers_id: event.workers_id,
                actions_id: event.actions_id,
                sum: event.sum,
                date: event.date.unwrap_or(current_date),
            },
        );
        Ok(true)
    }

    async fn delete_event(&self, id: i64) -> Result<bool, DatabaseError> {
        Ok(self.data.write().await.events.rows.remove(&id).is_some())
    }

    async fn count_events(&self) -> Result<i64, DatabaseError> {
        Ok(self.data.read().await.events.rows.len() as i64)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn migrate(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn close(&self) {}
}
