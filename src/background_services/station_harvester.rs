//! Responsible for fetching every station with its details and saving them to the store
use std::time::Duration;

use reqwest::Client;
use tokio::time::sleep;
use tracing::{error, info, info_span, warn, Instrument};

use crate::{
    config::{station_detail_url, station_list_url},
    dal::{PersistenceError, StationStore},
    model::{
        db_model::{StationRecord, UpsertOutcome},
        timescar_api_model::{TimescarStation, TimescarStationDetail, TimescarStationList},
    },
};

/// Everything one harvest run shares between its stages
pub struct HarvestContext<S> {
    pub client: Client,
    pub store: S,
    /// Origin of both endpoints and the prefix of photo urls
    pub base_url: String,
    pub request_delay: Duration,
    pub summary: HarvestSummary,
}

impl<S: StationStore> HarvestContext<S> {
    pub fn new(store: S, base_url: impl Into<String>, request_delay: Duration) -> Self {
        HarvestContext {
            client: Client::new(),
            store,
            base_url: base_url.into(),
            request_delay,
            summary: HarvestSummary::default(),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Stations in the roster
    pub total: usize,
    /// Stations written to the store
    pub processed: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Stations without a code, without details or whose details couldn't be fetched
    pub skipped: usize,
}

/// Fetches the roster, then each station's details one at a time, and upserts them.
/// A station whose details can't be had is skipped and left untouched in the store.
#[tracing::instrument(skip(ctx))]
pub async fn harvest_stations<S: StationStore>(
    ctx: &mut HarvestContext<S>,
) -> Result<HarvestSummary, HarvestError> {
    info!("Starting to fetch the station list");

    let stations = fetch_station_list(&ctx.client, &station_list_url(&ctx.base_url))
        .await
        .map_err(HarvestError::ListFetch)?;

    ctx.summary.total = stations.len();
    info!("Found a total of {} stations", ctx.summary.total);

    for (i, station) in stations.iter().enumerate() {
        let Some(station_code) = station.code.clone() else {
            ctx.summary.skipped += 1;
            continue;
        };

        info!(
            "[{}/{}] Processing data for {}",
            i + 1,
            ctx.summary.total,
            station_code
        );

        harvest_station(ctx, station_code, station).await?;
    }

    info!(
        "Processing complete. Total stations processed: {}, newly inserted: {}, updated: {}, skipped: {}",
        ctx.summary.total, ctx.summary.inserted, ctx.summary.updated, ctx.summary.skipped
    );

    Ok(ctx.summary)
}

/// Only store errors escape, fetch problems are logged and counted as skipped
async fn harvest_station<S: StationStore>(
    ctx: &mut HarvestContext<S>,
    station_code: String,
    station: &TimescarStation,
) -> Result<(), HarvestError> {
    sleep(ctx.request_delay)
        .instrument(info_span!("Waiting before the detail request"))
        .await;

    let url = station_detail_url(&ctx.base_url, &station_code);
    let detail = match fetch_station_detail(&ctx.client, &url).await {
        Ok(Some(detail)) => detail,
        Ok(None) => {
            warn!("No detail data found for {station_code}, skipping");
            ctx.summary.skipped += 1;
            return Ok(());
        }
        Err(e) => {
            error!("Error fetching data for {station_code}: {e}");
            ctx.summary.skipped += 1;
            return Ok(());
        }
    };

    let record = StationRecord::from_timescar(station_code, station, &detail, &ctx.base_url);

    match ctx.store.upsert_station(&record).await? {
        UpsertOutcome::Inserted => {
            ctx.summary.inserted += 1;
            info!("New station inserted: {}", record.station_code);
        }
        UpsertOutcome::Updated => {
            ctx.summary.updated += 1;
            info!("Station updated: {}", record.station_code);
        }
    }
    ctx.summary.processed += 1;

    Ok(())
}

#[tracing::instrument(skip(client))]
async fn fetch_station_list(client: &Client, url: &str) -> Result<Vec<TimescarStation>, FetchError> {
    let body = fetch_body(client, url)
        .instrument(info_span!("Fetching stations"))
        .await?;

    let list: TimescarStationList =
        serde_json::from_str(&body).map_err(|e| FetchError::ParsingError { source: e, body })?;

    let stations = list.stations;
    info!("got {} stations", stations.len());

    Ok(stations)
}

/// `None` when the endpoint has nothing for the code (an empty or `null` body)
#[tracing::instrument(skip(client))]
async fn fetch_station_detail(
    client: &Client,
    url: &str,
) -> Result<Option<TimescarStationDetail>, FetchError> {
    let body = fetch_body(client, url)
        .instrument(info_span!("Fetching station detail"))
        .await?;

    if body.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(&body).map_err(|e| FetchError::ParsingError { source: e, body })
}

async fn fetch_body(client: &Client, url: &str) -> Result<String, FetchError> {
    let response = client.get(url).send().await?.error_for_status()?;

    let body = response
        .text()
        .instrument(info_span!("Reading body of response"))
        .await?;

    Ok(body)
}

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("error fetching data: {0}")]
    HttpRequestError(#[from] reqwest::Error),

    #[error("error parsing the response: {source} \n{body}")]
    ParsingError {
        source: serde_json::Error,
        body: String,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    #[error("error fetching the station list")]
    ListFetch(#[source] FetchError),

    #[error("error saving a station")]
    Persistence(#[from] PersistenceError),
}
