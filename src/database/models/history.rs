use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// `list` row joined with worker and action display columns.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct HistoryEventRow {
    pub id: i64,
    pub workers_id: i64,
    pub actions_id: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub sum: Decimal,
    pub date: NaiveDate,
    pub worker_name: Option<String>,
    pub worker_fam: Option<String>,
    pub worker_otch: Option<String>,
    pub action_name: Option<String>,
}

/// Payroll event as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEvent {
    #[serde(flatten)]
    pub row: HistoryEventRow,
    pub worker_full_name: String,
}

impl From<HistoryEventRow> for HistoryEvent {
    fn from(row: HistoryEventRow) -> Self {
        let worker_full_name = full_name(
            row.worker_fam.as_deref(),
            row.worker_name.as_deref(),
            row.worker_otch.as_deref(),
        );
        Self { row, worker_full_name }
    }
}

/// Fields written on create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub workers_id: i64,
    pub actions_id: i64,
    pub sum: Decimal,
    /// `None` means today on insert and "unchanged" on update.
    pub date: Option<NaiveDate>,
}

/// Surname, name and patronymic joined by single spaces, skipping empty parts.
pub fn full_name(fam: Option<&str>, name: Option<&str>, otch: Option<&str>) -> String {
    [fam, name, otch]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
