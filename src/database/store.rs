use async_trait::async_trait;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    HistoryEventRow, HistoryRecord, NewUser, ReferenceEntry, ReferenceTable, User, WorkerDetails,
    WorkerRecord,
};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError>;

    async fn insert_user(&self, user: &NewUser) -> Result<User, DatabaseError>;

    async fn update_password_hash(&self, id: i64, password_hash: &str) -> Result<(), DatabaseError>;
}

/// Storage for the `(id, name)` lookup tables.
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// Ordered by id ascending.
    async fn list_entries(&self, table: ReferenceTable) -> Result<Vec<ReferenceEntry>, DatabaseError>;

    async fn get_entry(&self, table: ReferenceTable, id: i64) -> Result<Option<ReferenceEntry>, DatabaseError>;

    /// Case-insensitive name lookup, optionally ignoring one row.
    async fn find_entry_by_name(
        &self,
        table: ReferenceTable,
        name: &str,
        exclude_id: Option<i64>,
    ) -> Result<Option<ReferenceEntry>, DatabaseError>;

    async fn insert_entry(&self, table: ReferenceTable, name: &str) -> Result<ReferenceEntry, DatabaseError>;

    async fn update_entry(
        &self,
        table: ReferenceTable,
        id: i64,
        name: &str,
    ) -> Result<Option<ReferenceEntry>, DatabaseError>;

    /// `Ok(false)` when no row had that id.
    async fn delete_entry(&self, table: ReferenceTable, id: i64) -> Result<bool, DatabaseError>;

    async fn count_entries(&self, table: ReferenceTable) -> Result<i64, DatabaseError>;
}

#[async_trait]
pub trait WorkerStore: Send + Sync {
    /// Newest first.
    async fn list_workers(&self) -> Result<Vec<WorkerDetails>, DatabaseError>;

    async fn get_worker(&self, id: i64) -> Result<Option<WorkerDetails>, DatabaseError>;

    async fn worker_exists(&self, id: i64) -> Result<bool, DatabaseError>;

    async fn insert_worker(&self, worker: &WorkerRecord) -> Result<i64, DatabaseError>;

    async fn update_worker(&self, id: i64, worker: &WorkerRecord) -> Result<bool, DatabaseError>;

    async fn delete_worker(&self, id: i64) -> Result<bool, DatabaseError>;

    async fn count_workers(&self) -> Result<i64, DatabaseError>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Ordered by date, then id, both descending.
    async fn list_events(&self) -> Result<Vec<HistoryEventRow>, DatabaseError>;

    async fn get_event(&self, id: i64) -> Result<Option<HistoryEventRow>, DatabaseError>;

    async fn event_exists(&self, id: i64) -> Result<bool, DatabaseError>;

    async fn insert_event(&self, event: &HistoryRecord) -> Result<i64, DatabaseError>;

    async fn update_event(&self, id: i64, event: &HistoryRecord) -> Result<bool, DatabaseError>;

    async fn delete_event(&self, id: i64) -> Result<bool, DatabaseError>;

    async fn count_events(&self) -> Result<i64, DatabaseError>;
}

/// Everything a request handler may touch. Implementations enforce unique and
/// foreign-key constraints and report them as the matching `DatabaseError`.
#[async_trait]
pub trait Store: UserStore + ReferenceStore + WorkerStore + HistoryStore {
    async fn ping(&self) -> Result<(), DatabaseError>;

    /// Idempotent schema setup.
    async fn migrate(&self) -> Result<(), DatabaseError>;

    async fn close(&self);
}
