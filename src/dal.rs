pub mod stations;

pub use stations::*;

use crate::model::db_model::{StationDb, StationRecord, UpsertOutcome};

#[derive(thiserror::Error, Debug)]
pub enum PersistenceError {
    #[error("error talking to the station store: {0}")]
    Database(#[from] sqlx::Error),
}

/// Where harvested stations are kept, keyed by station code
pub trait StationStore: Clone + Send + Sync + 'static {
    /// Inserts the record or overwrites every tracked field of the stored one
    fn upsert_station(
        &self,
        record: &StationRecord,
    ) -> impl Future<Output = Result<UpsertOutcome, PersistenceError>> + Send;

    fn get_stations(&self) -> impl Future<Output = Result<Vec<StationDb>, PersistenceError>> + Send;

    fn get_station(
        &self,
        station_code: &str,
    ) -> impl Future<Output = Result<Option<StationDb>, PersistenceError>> + Send;
}

#[cfg(test)]
pub use in_memory::InMemoryStationStore;
