use sqlx::{postgres::PgRow, query, query_as, Pool, Postgres, Row};
use tracing::{info_span, Instrument};

use super::{PersistenceError, StationStore};
use crate::model::db_model::{StationDb, StationRecord, UpsertOutcome};

/// Station store backed by the `stations` table
#[derive(Clone, Debug)]
pub struct PgStationStore {
    pool: Pool<Postgres>,
}

impl PgStationStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        PgStationStore { pool }
    }
}

impl StationStore for PgStationStore {
    async fn upsert_station(
        &self,
        record: &StationRecord,
    ) -> Result<UpsertOutcome, PersistenceError> {
        upsert_station(record, &self.pool).await
    }

    async fn get_stations(&self) -> Result<Vec<StationDb>, PersistenceError> {
        get_stations(&self.pool).await
    }

    async fn get_station(&self, station_code: &str) -> Result<Option<StationDb>, PersistenceError> {
        get_station(station_code, &self.pool).await
    }
}

#[tracing::instrument(err, skip(record, pool), fields(station_code = %record.station_code))]
pub async fn upsert_station(
    record: &StationRecord,
    pool: &Pool<Postgres>,
) -> Result<UpsertOutcome, PersistenceError> {
    // xmax is only zero for a row this statement created
    let inserted = query(
        "INSERT INTO stations (
            station_code,
            station_name,
            latitude,
            longitude,
            address,
            station_comment,
            car_fleet,
            photo_urls,
            disp_1_month_reserve_label,
            disp_3_month_reserve_label
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT ( station_code ) DO UPDATE SET
            station_name = excluded.station_name,
            latitude = excluded.latitude,
            longitude = excluded.longitude,
            address = excluded.address,
            station_comment = excluded.station_comment,
            car_fleet = excluded.car_fleet,
            photo_urls = excluded.photo_urls,
            disp_1_month_reserve_label = excluded.disp_1_month_reserve_label,
            disp_3_month_reserve_label = excluded.disp_3_month_reserve_label,
            updated_at = now()
        RETURNING (xmax = 0) AS inserted",
    )
    .bind(&record.station_code)
    .bind(&record.station_name)
    .bind(record.latitude)
    .bind(record.longitude)
    .bind(&record.address)
    .bind(&record.station_comment)
    .bind(sqlx::types::Json(&record.car_fleet))
    .bind(&record.photo_urls)
    .bind(&record.disp_1_month_reserve_label)
    .bind(&record.disp_3_month_reserve_label)
    .map(|row: PgRow| row.try_get::<bool, _>("inserted"))
    .fetch_one(pool)
    .instrument(info_span!("Upserting station"))
    .await??;

    Ok(if inserted {
        UpsertOutcome::Inserted
    } else {
        UpsertOutcome::Updated
    })
}

const SELECT_STATIONS: &str = "SELECT
        station_code,
        station_name,
        latitude,
        longitude,
        address,
        station_comment,
        car_fleet,
        photo_urls,
        disp_1_month_reserve_label,
        disp_3_month_reserve_label,
        updated_at
    FROM stations";

#[tracing::instrument(err, skip(pool))]
pub async fn get_stations(pool: &Pool<Postgres>) -> Result<Vec<StationDb>, PersistenceError> {
    let stations: Vec<StationDb> = query_as(&format!("{SELECT_STATIONS} ORDER BY station_code"))
        .fetch_all(pool)
        .await?;

    Ok(stations)
}

#[tracing::instrument(err, skip(pool))]
pub async fn get_station(
    station_code: &str,
    pool: &Pool<Postgres>,
) -> Result<Option<StationDb>, PersistenceError> {
    let station: Option<StationDb> = query_as(&format!("{SELECT_STATIONS} WHERE station_code = $1"))
        .bind(station_code)
        .fetch_optional(pool)
        .await?;

    Ok(station)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::db_model::FleetEntry;

    fn record(name: &str, car_comments: &str) -> StationRecord {
        StationRecord {
            station_code: "AB12".to_string(),
            station_name: Some(name.to_string()),
            latitude: 35.684438883107454,
            longitude: 139.7638660290314,
            address: Some("東京都千代田区丸の内1-1".to_string()),
            station_comment: "gate\ncode".to_string(),
            car_fleet: vec![FleetEntry {
                class_name: Some("Basic".to_string()),
                car_name: None,
                car_comments: car_comments.to_string(),
            }],
            photo_urls: vec![
                "https://share.timescar.jp/img/a.jpg".to_string(),
                "https://share.timescar.jp/img/a.jpg".to_string(),
            ],
            disp_1_month_reserve_label: Some("1M".to_string()),
            disp_3_month_reserve_label: None,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at a Postgres server"]
    async fn upsert_inserts_then_overwrites_one_row(pool: Pool<Postgres>) {
        let first = upsert_station(&record("old", "ETC"), &pool).await.unwrap();
        let second = upsert_station(&record("new", "navi"), &pool).await.unwrap();

        assert_eq!(first, UpsertOutcome::Inserted);
        assert_eq!(second, UpsertOutcome::Updated);

        let stations = get_stations(&pool).await.unwrap();
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].record, record("new", "navi"));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at a Postgres server"]
    async fn reads_back_one_station_by_code(pool: Pool<Postgres>) {
        upsert_station(&record("Marunouchi", "ETC"), &pool)
            .await
            .unwrap();

        let found = get_station("AB12", &pool).await.unwrap().unwrap();
        let missing = get_station("ZZ99", &pool).await.unwrap();

        assert_eq!(found.record.car_fleet, record("Marunouchi", "ETC").car_fleet);
        assert_eq!(found.record.photo_urls.len(), 2);
        assert!(missing.is_none());

        let json = serde_json::to_value(&found).unwrap();
        assert_eq!(json["station_code"], "AB12");
        assert_eq!(json["car_fleet"][0]["car_name"], serde_json::Value::Null);
        assert_eq!(json["disp1MonthReserveLabel"], "1M");
        assert!(json["updated_at"].is_string());
    }
}
