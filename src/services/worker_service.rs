use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::database::models::{WorkerDetails, WorkerRecord};
use crate::database::{DatabaseError, Store};
use crate::services::error::{ConflictKind, FieldErrors, Resource, ServiceError, ServiceResult};
use crate::services::fields;

const NAME_MIN_LEN: usize = 2;
const NAME_MAX_LEN: usize = 45;

/// Fields in the order they are reported when missing.
const REQUIRED_FIELDS: [&str; 7] = [
    "name",
    "fam",
    "gender_id",
    "prof_id",
    "position_id",
    "salary",
    "education_id",
];

/// Worker body as submitted. Values stay untyped until validation so that
/// numeric strings and blank optional fields are accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkerPayload {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub fam: Option<Value>,
    #[serde(default)]
    pub otch: Option<Value>,
    #[serde(default)]
    pub gender_id: Option<Value>,
    #[serde(default)]
    pub prof_id: Option<Value>,
    #[serde(default)]
    pub position_id: Option<Value>,
    #[serde(default)]
    pub salary: Option<Value>,
    #[serde(default)]
    pub education_id: Option<Value>,
    #[serde(default)]
    pub date_r: Option<Value>,
    #[serde(default)]
    pub date_hired: Option<Value>,
    #[serde(default)]
    pub date_fired: Option<Value>,
}

impl WorkerPayload {
    fn field(&self, name: &str) -> &Option<Value> {
        match name {
            "name" => &self.name,
            "fam" => &self.fam,
            "gender_id" => &self.gender_id,
            "prof_id" => &self.prof_id,
            "position_id" => &self.position_id,
            "salary" => &self.salary,
            "education_id" => &self.education_id,
            _ => &None,
        }
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS
            .into_iter()
            .filter(|field| fields::is_absent(self.field(field)))
            .collect()
    }

    /// Required-field check, then per-field validation.
    pub fn into_record(self) -> ServiceResult<WorkerRecord> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(ServiceError::MissingFields(missing));
        }

        let mut errors = FieldErrors::new();
        let name = person_name(&mut errors, "name", &self.name);
        let fam = person_name(&mut errors, "fam", &self.fam);
        let otch = person_name(&mut errors, "otch", &self.otch);
        let gender_id = errors.check("gender_id", fields::id(&self.gender_id));
        let prof_id = errors.check("prof_id", fields::id(&self.prof_id));
        let position_id = errors.check("position_id", fields::id(&self.position_id));
        let education_id = errors.check("education_id", fields::id(&self.education_id));
        let salary = errors.check("salary", fields::amount(&self.salary));
        let date_r = errors.check("date_r", fields::date(&self.date_r));
        let date_hired = errors.check("date_hired", fields::date(&self.date_hired));
        let date_fired = errors.check("date_fired", fields::date(&self.date_fired));
        errors.into_result("Validation failed")?;

        match (name, fam, gender_id, prof_id, position_id, education_id, salary) {
            (
                Some(name),
                Some(fam),
                Some(gender_id),
                Some(prof_id),
                Some(position_id),
                Some(education_id),
                Some(salary),
            ) => Ok(WorkerRecord {
                name,
                fam,
                otch,
                gender_id,
                prof_id,
                position_id,
                education_id,
                salary,
                date_r,
                date_hired,
                date_fired,
            }),
            _ => Err(ServiceError::validation("Validation failed")),
        }
    }
}

fn person_name(errors: &mut FieldErrors, field: &str, value: &Option<Value>) -> Option<String> {
    let text = errors.check(field, fields::text(value))?;
    match check_person_name(&text) {
        Ok(()) => Some(text),
        Err(message) => {
            errors.add(field, message);
            None
        }
    }
}

/// 2 to 45 letters, spaces or hyphens.
pub fn check_person_name(value: &str) -> Result<(), &'static str> {
    let len = value.chars().count();
    if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
        return Err("Must be between 2 and 45 characters");
    }
    if !value.chars().all(|c| c.is_alphabetic() || c == ' ' || c == '-') {
        return Err("May only contain letters, spaces and hyphens");
    }
    Ok(())
}

/// Maps a foreign-key constraint name back to the request field it guards.
fn referenced_field(constraint: &str) -> &'static str {
    ["gender_id", "prof_id", "position_id", "education_id"]
        .into_iter()
        .find(|field| constraint.contains(field))
        .unwrap_or("reference")
}

pub struct WorkerController {
    store: Arc<dyn Store>,
}

impl WorkerController {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list_all(&self) -> ServiceResult<Vec<WorkerDetails>> {
        Ok(self.store.list_workers().await?)
    }

    pub async fn get_by_id(&self, id: i64) -> ServiceResult<WorkerDetails> {
        self.store
            .get_worker(id)
            .await?
            .ok_or(ServiceError::NotFound(Resource::Worker))
    }

    pub async fn create(&self, payload: WorkerPayload) -> ServiceResult<WorkerDetails> {
        let record = payload.into_record()?;
        let id = self
            .store
            .insert_worker(&record)
            .await
            .map_err(unknown_reference)?;
        info!("Created worker {}", id);
        self.get_by_id(id).await
    }

    pub async fn update(&self, id: i64, payload: WorkerPayload) -> ServiceResult<WorkerDetails> {
        if !self.store.worker_exists(id).await? {
            return Err(ServiceError::NotFound(Resource::Worker));
        }
        let record = payload.into_record()?;

        let updated = self
            .store
            .update_worker(id, &record)
            .await
            .map_err(unknown_reference)?;
        if !updated {
            return Err(ServiceError::NotFound(Resource::Worker));
        }
        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        match self.store.delete_worker(id).await {
            Ok(true) => {
                info!("Deleted worker {}", id);
                Ok(())
            }
            Ok(false) => Err(ServiceError::NotFound(Resource::Worker)),
            Err(DatabaseError::ForeignKeyViolation(_)) => {
                Err(ServiceError::Conflict(ConflictKind::Referenced))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn count(&self) -> ServiceResult<i64> {
        Ok(self.store.count_workers().await?)
    }
}

fn unknown_reference(err: DatabaseError) -> ServiceError {
    match err {
        DatabaseError::ForeignKeyViolation(constraint) => ServiceError::invalid_field(
            referenced_field(&constraint),
            "Referenced record does not exist",
        ),
        other => other.into(),
    }
}
