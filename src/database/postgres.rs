use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    HistoryEventRow, HistoryRecord, NewUser, ReferenceEntry, ReferenceTable, User, UserRow,
    WorkerDetails, WorkerRecord,
};
use crate::database::schema::SCHEMA;
use crate::database::store::{HistoryStore, ReferenceStore, Store, UserStore, WorkerStore};

/// Statement set bound to one reference table.
struct ReferenceSql {
    list: &'static str,
    get: &'static str,
    find_by_name: &'static str,
    insert: &'static str,
    update: &'static str,
    delete: &'static str,
    count: &'static str,
}

macro_rules! reference_sql {
    ($table:literal) => {
        ReferenceSql {
            list: concat!("SELECT id, name FROM ", $table, " ORDER BY id"),
            get: concat!("SELECT id, name FROM ", $table, " WHERE id = $1"),
            find_by_name: concat!(
                "SELECT id, name FROM ",
                $table,
                " WHERE LOWER(name) = LOWER($1) AND ($2::BIGINT IS NULL OR id <> $2) LIMIT 1"
            ),
            insert: concat!("INSERT INTO ", $table, " (name) VALUES ($1) RETURNING id, name"),
            update: concat!("UPDATE ", $table, " SET name = $1 WHERE id = $2 RETURNING id, name"),
            delete: concat!("DELETE FROM ", $table, " WHERE id = $1"),
            count: concat!("SELECT COUNT(*) FROM ", $table),
        }
    };
}

const POSITION_SQL: ReferenceSql = reference_sql!("\"position\"");
const PROF_SQL: ReferenceSql = reference_sql!("prof");
const EDUCATION_SQL: ReferenceSql = reference_sql!("education");
const GENDER_SQL: ReferenceSql = reference_sql!("gender");
const ACTIONS_SQL: ReferenceSql = reference_sql!("actions");

fn reference_sql(table: ReferenceTable) -> &'static ReferenceSql {
    match table {
        ReferenceTable::Positions => &POSITION_SQL,
        ReferenceTable::Professions => &PROF_SQL,
        ReferenceTable::Education => &EDUCATION_SQL,
        ReferenceTable::Genders => &GENDER_SQL,
        ReferenceTable::Actions => &ACTIONS_SQL,
    }
}

const USER_BY_USERNAME: &str =
    "SELECT id, username, password_hash, role FROM users WHERE username = $1";
const USER_BY_ID: &str = "SELECT id, username, password_hash, role FROM users WHERE id = $1";
const INSERT_USER: &str = "INSERT INTO users (username, password_hash, role) VALUES ($1, $2, $3)
     RETURNING id, username, password_hash, role";
const UPDATE_PASSWORD_HASH: &str = "UPDATE users SET password_hash = $1 WHERE id = $2";

const LIST_WORKERS: &str = r#"
    SELECT w.id, w.name, w.fam, w.otch, w.gender_id, w.prof_id, w.position_id, w.education_id,
           w.salary, w.date_r, w.date_hired, w.date_fired,
           g.name AS gender_name, p.name AS prof_name,
           pos.name AS position_name, e.name AS education_name
    FROM workers w
    LEFT JOIN gender g ON w.gender_id = g.id
    LEFT JOIN prof p ON w.prof_id = p.id
    LEFT JOIN "position" pos ON w.position_id = pos.id
    LEFT JOIN education e ON w.education_id = e.id
    ORDER BY w.id DESC
"#;

const WORKER_BY_ID: &str = r#"
    SELECT w.id, w.name, w.fam, w.otch, w.gender_id, w.prof_id, w.position_id, w.education_id,
           w.salary, w.date_r, w.date_hired, w.date_fired,
           g.name AS gender_name, p.name AS prof_name,
           pos.name AS position_name, e.name AS education_name
    FROM workers w
    LEFT JOIN gender g ON w.gender_id = g.id
    LEFT JOIN prof p ON w.prof_id = p.id
    LEFT JOIN "position" pos ON w.position_id = pos.id
    LEFT JOIN education e ON w.education_id = e.id
    WHERE w.id = $1
"#;

const INSERT_WORKER: &str = r#"
    INSERT INTO workers (name, fam, otch, gender_id, prof_id, position_id, salary, education_id,
                         date_r, date_hired, date_fired)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
    RETURNING id
"#;

const UPDATE_WORKER: &str = r#"
    UPDATE workers SET name = $1, fam = $2, otch = $3, gender_id = $4, prof_id = $5,
           position_id = $6, salary = $7, education_id = $8, date_r = $9, date_hired = $10,
           date_fired = $11
    WHERE id = $12
"#;

const LIST_EVENTS: &str = r#"
    SELECT l.id, l.workers_id, l.actions_id, l."sum", l."date",
           w.name AS worker_name, w.fam AS worker_fam, w.otch AS worker_otch,
           a.name AS action_name
    FROM list l
    LEFT JOIN workers w ON l.workers_id = w.id
    LEFT JOIN actions a ON l.actions_id = a.id
    ORDER BY l."date" DESC, l.id DESC
"#;

const EVENT_BY_ID: &str = r#"
    SELECT l.id, l.workers_id, l.actions_id, l."sum", l."date",
           w.name AS worker_name, w.fam AS worker_fam, w.otch AS worker_otch,
           a.name AS action_name
    FROM list l
    LEFT JOIN workers w ON l.workers_id = w.id
    LEFT JOIN actions a ON l.actions_id = a.id
    WHERE l.id = $1
"#;

const INSERT_EVENT: &str = r#"
    INSERT INTO list (workers_id, actions_id, "sum", "date")
    VALUES ($1, $2, $3, COALESCE($4, CURRENT_DATE))
    RETURNING id
"#;

const UPDATE_EVENT: &str = r#"
    UPDATE list SET workers_id = $1, actions_id = $2, "sum" = $3, "date" = COALESCE($4, "date")
    WHERE id = $5
"#;

/// PostgreSQL-backed store. Owns the connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, sql: &'static str, id: i64) -> Result<bool, DatabaseError> {
        let found: Option<i64> = sqlx::query_scalar(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn delete_by_id(&self, sql: &'static str, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query(sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, sql: &'static str) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar(sql).fetch_one(&self.pool).await?;
        Ok(count)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let row = sqlx::query_as::<_, UserRow>(USER_BY_USERNAME)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let row = sqlx::query_as::<_, UserRow>(USER_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn insert_user(&self, user: &NewUser) -> Result<User, DatabaseError> {
        let row = sqlx::query_as::<_, UserRow>(INSERT_USER)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .fetch_one(&self.pool)
            .await?;
        User::try_from(row)
    }

    async fn update_password_hash(&self, id: i64, password_hash: &str) -> Result<(), DatabaseError> {
        sqlx::query(UPDATE_PASSWORD_HASH)
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ReferenceStore for PgStore {
    async fn list_entries(&self, table: ReferenceTable) -> Result<Vec<ReferenceEntry>, DatabaseError> {
        let rows = sqlx::query_as::<_, ReferenceEntry>(reference_sql(table).list)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_entry(&self, table: ReferenceTable, id: i64) -> Result<Option<ReferenceEntry>, DatabaseError> {
        let row = sqlx::query_as::<_, ReferenceEntry>(reference_sql(table).get)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_entry_by_name(
        &self,
        table: ReferenceTable,
        name: &str,
        exclude_id: Option<i64>,
    ) -> Result<Option<ReferenceEntry>, DatabaseError> {
        let row = sqlx::query_as::<_, ReferenceEntry>(reference_sql(table).find_by_name)
            .bind(name)
            .bind(exclude_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_entry(&self, table: ReferenceTable, name: &str) -> Result<ReferenceEntry, DatabaseError> {
        let row = sqlx::query_as::<_, ReferenceEntry>(reference_sql(table).insert)
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_entry(
        &self,
        table: ReferenceTable,
        id: i64,
        name: &str,
    ) -> Result<Option<ReferenceEntry>, DatabaseError> {
        let row = sqlx::query_as::<_, ReferenceEntry>(reference_sql(table).update)
            .bind(name)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete_entry(&self, table: ReferenceTable, id: i64) -> Result<bool, DatabaseError> {
        self.delete_by_id(reference_sql(table).delete, id).await
    }

    async fn count_entries(&self, table: ReferenceTable) -> Result<i64, DatabaseError> {
        self.count(reference_sql(table).count).await
    }
}

#[async_trait]
impl WorkerStore for PgStore {
    async fn list_workers(&self) -> Result<Vec<WorkerDetails>, DatabaseError> {
        let rows = sqlx::query_as::<_, WorkerDetails>(LIST_WORKERS)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_worker(&self, id: i64) -> Result<Option<WorkerDetails>, DatabaseError> {
        let row = sqlx::query_as::<_, WorkerDetails>(WORKER_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn worker_exists(&self, id: i64) -> Result<bool, DatabaseError> {
        self.exists("SELECT id FROM workers WHERE id = $1", id).await
    }

    async fn insert_worker(&self, worker: &WorkerRecord) -> Result<i64, DatabaseError> {
        let id: i64 = sqlx::query_scalar(INSERT_WORKER)
            .bind(&worker.name)
            .bind(&worker.fam)
            .bind(&worker.otch)
            .bind(worker.gender_id)
            .bind(worker.prof_id)
            .bind(worker.position_id)
            .bind(worker.salary)
            .bind(worker.education_id)
            .bind(worker.date_r)
            .bind(worker.date_hired)
            .bind(worker.date_fired)
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }

    async fn update_worker(&self, id: i64, worker: &WorkerRecord) -> Result<bool, DatabaseError> {
        let result = sqlx::query(UPDATE_WORKER)
            .bind(&worker.name)
            .bind(&worker.fam)
            .bind(&worker.otch)
            .bind(worker.gender_id)
            .bind(worker.prof_id)
            .bind(worker.position_id)
            .bind(worker.salary)
            .bind(worker.education_id)
            .bind(worker.date_r)
            .bind(worker.date_hired)
            .bind(worker.date_fired)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_worker(&self, id: i64) -> Result<bool, DatabaseError> {
        self.delete_by_id("DELETE FROM workers WHERE id = $1", id).await
    }

    async fn count_workers(&self) -> Result<i64, DatabaseError> {
        self.count("SELECT COUNT(*) FROM workers").await
    }
}

#[async_trait]
impl HistoryStore for PgStore {
    async fn list_events(&self) -> Result<Vec<HistoryEventRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, HistoryEventRow>(LIST_EVENTS)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_event(&self, id: i64) -> Result<Option<HistoryEventRow>, DatabaseError> {
        let row = sqlx::query_as::<_, HistoryEventRow>(EVENT_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn event_exists(&self, id: i64) -> Result<bool, DatabaseError> {
        self.exists("SELECT id FROM list WHERE id = $1", id).await
    }

    async fn insert_event(&self, event: &HistoryRecord) -> Result<i64, DatabaseError> {
        let id: i64 = sqlx::query_scalar(INSERT_EVENT)
            .bind(event.workers_id)
            .bind(event.actions_id)
            .bind(event.sum)
            .bind(event.date)
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }

    async fn update_event(&self, id: i64, event: &HistoryRecord) -> Result<bool, DatabaseError> {
        let result = sqlx::query(UPDATE_EVENT)
            .bind(event.workers_id)
            .bind(event.actions_id)
            .bind(event.sum)
            .bind(event.date)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_event(&self, id: i64) -> Result<bool, DatabaseError> {
        self.delete_by_id("DELETE FROM list WHERE id = $1", id).await
    }

    async fn count_events(&self) -> Result<i64, DatabaseError> {
        self.count("SELECT COUNT(*) FROM list").await
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn migrate(&self) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        info!("Applied database schema ({} statements)", SCHEMA.len());
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}
