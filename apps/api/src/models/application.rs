use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationRow {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub length: Option<String>,
    pub url: Option<String>,
    pub posting: Option<String>,
    pub status: String,
    pub added: NaiveDate,
    pub applied: Option<NaiveDate>,
    pub coverletter: bool,
}
