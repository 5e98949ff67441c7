use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// Worker joined with the display names of its reference rows.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct WorkerDetails {
    pub id: i64,
    pub name: String,
    pub fam: String,
    pub otch: Option<String>,
    pub gender_id: Option<i64>,
    pub prof_id: Option<i64>,
    pub position_id: Option<i64>,
    pub education_id: Option<i64>,
    #[serde(with = "rust_decimal::serde::float")]
    pub salary: Decimal,
    pub date_r: Option<NaiveDate>,
    pub date_hired: Option<NaiveDate>,
    pub date_fired: Option<NaiveDate>,
    pub gender_name: Option<String>,
    pub prof_name: Option<String>,
    pub position_name: Option<String>,
    pub education_name: Option<String>,
}

/// Validated worker fields written on create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerRecord {
    pub name: String,
    pub fam: String,
    pub otch: Option<String>,
    pub gender_id: i64,
    pub prof_id: i64,
    pub position_id: i64,
    pub education_id: i64,
    pub salary: Decimal,
    pub date_r: Option<NaiveDate>,
    pub date_hired: Option<NaiveDate>,
    pub date_fired: Option<NaiveDate>,
}
