use std::sync::Arc;
use tracing::info;

use crate::database::models::{ReferenceEntry, ReferenceTable};
use crate::database::{DatabaseError, Store};
use crate::services::error::{ConflictKind, Resource, ServiceError, ServiceResult};

pub const NAME_MAX_LEN: usize = 45;

/// CRUD over one reference table. Every table shares this implementation;
/// only the bound `ReferenceTable` differs.
pub struct ReferenceController {
    table: ReferenceTable,
    store: Arc<dyn Store>,
}

impl ReferenceController {
    pub fn new(table: ReferenceTable, store: Arc<dyn Store>) -> Self {
        Self { table, store }
    }

    pub async fn list_all(&self) -> ServiceResult<Vec<ReferenceEntry>> {
        Ok(self.store.list_entries(self.table).await?)
    }

    pub async fn get_by_id(&self, id: i64) -> ServiceResult<ReferenceEntry> {
        self.store
            .get_entry(self.table, id)
            .await?
            .ok_or(ServiceError::NotFound(Resource::Record))
    }

    pub async fn create(&self, name: Option<&str>) -> ServiceResult<ReferenceEntry> {
        let name = normalize_name(name)?;
        self.ensure_unique(&name, None).await?;

        let entry = self
            .store
            .insert_entry(self.table, &name)
            .await
            .map_err(duplicate_on_unique)?;
        info!(table = self.table.table_name(), "Created reference entry {}", entry.id);
        Ok(entry)
    }

    pub async fn update(&self, id: i64, name: Option<&str>) -> ServiceResult<ReferenceEntry> {
        let name = normalize_name(name)?;
        if self.store.get_entry(self.table, id).await?.is_none() {
            return Err(ServiceError::NotFound(Resource::Record));
        }
        self.ensure_unique(&name, Some(id)).await?;

        self.store
            .update_entry(self.table, id, &name)
            .await
            .map_err(duplicate_on_unique)?
            .ok_or(ServiceError::NotFound(Resource::Record))
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        if self.store.get_entry(self.table, id).await?.is_none() {
            return Err(ServiceError::NotFound(Resource::Record));
        }

        match self.store.delete_entry(self.table, id).await {
            Ok(true) => {
                info!(table = self.table.table_name(), "Deleted reference entry {}", id);
                Ok(())
            }
            Ok(false) => Err(ServiceError::NotFound(Resource::Record)),
            Err(DatabaseError::ForeignKeyViolation(_)) => {
                Err(ServiceError::Conflict(ConflictKind::Referenced))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn count(&self) -> ServiceResult<i64> {
        Ok(self.store.count_entries(self.table).await?)
    }

    async fn ensure_unique(&self, name: &str, exclude_id: Option<i64>) -> ServiceResult<()> {
        match self.store.find_entry_by_name(self.table, name, exclude_id).await? {
            Some(_) => Err(ServiceError::Conflict(ConflictKind::DuplicateName)),
            None => Ok(()),
        }
    }
}

/// Trims and validates a submitted name.
pub fn normalize_name(name: Option<&str>) -> ServiceResult<String> {
    let trimmed = name.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(ServiceError::FieldRequired("name"));
    }
    if trimmed.chars().count() > NAME_MAX_LEN {
        return Err(ServiceError::invalid_field(
            "name",
            format!("Name must be at most {} characters", NAME_MAX_LEN),
        ));
    }
    Ok(trimmed.to_string())
}

fn duplicate_on_unique(err: DatabaseError) -> ServiceError {
    match err {
        DatabaseError::UniqueViolation(_) => ServiceError::Conflict(ConflictKind::DuplicateName),
        other => other.into(),
    }
}
