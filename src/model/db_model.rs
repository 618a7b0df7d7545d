use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

/// A station as written by the harvester. `station_code` is the only identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StationRecord {
    pub station_code: String,
    pub station_name: Option<String>,
    /// WGS84
    pub latitude: f64,
    /// WGS84
    pub longitude: f64,
    pub address: Option<String>,
    pub station_comment: String,
    #[sqlx(json)]
    pub car_fleet: Vec<FleetEntry>,
    pub photo_urls: Vec<String>,
    #[serde(rename = "disp1MonthReserveLabel")]
    pub disp_1_month_reserve_label: Option<String>,
    #[serde(rename = "disp3MonthReserveLabel")]
    pub disp_3_month_reserve_label: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FleetEntry {
    pub class_name: Option<String>,
    pub car_name: Option<String>,
    pub car_comments: String,
}

/// A stored station as served by the API
#[derive(Clone, Debug, Serialize, FromRow)]
pub struct StationDb {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub record: StationRecord,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}
