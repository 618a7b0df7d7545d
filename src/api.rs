//! Read-only HTTP API over the harvested stations, used by the map front-end
use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::{dal::StationStore, stats};

pub fn router<S: StationStore>(store: S) -> Router {
    Router::new()
        .route("/api/stations", get(list_stations::<S>))
        .route("/api/stations/{code}", get(station_by_code::<S>))
        .route("/api/ranking", get(ranking::<S>))
        .route("/api/dashboard", get(dashboard::<S>))
        .with_state(store)
}

/// Serves until Ctrl-C
pub async fn serve<S: StationStore>(store: S, bind_addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("couldn't bind {bind_addr}"))?;
    info!("Serving stations on {}", listener.local_addr()?);

    axum::serve(listener, router(store))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("couldn't listen for ctrl-c {e}");
            }
            info!("Shutting down");
        })
        .await?;

    Ok(())
}

async fn list_stations<S: StationStore>(State(store): State<S>) -> Response {
    match store.get_stations().await {
        Ok(stations) => Json(stations).into_response(),
        Err(e) => {
            error!("Failed to fetch stations: {e}");
            failed_to_fetch()
        }
    }
}

async fn station_by_code<S: StationStore>(
    State(store): State<S>,
    Path(code): Path<String>,
) -> Response {
    match store.get_station(&code).await {
        Ok(Some(station)) => Json(station).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Station not found" })),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to fetch station {code}: {e}");
            failed_to_fetch()
        }
    }
}

async fn ranking<S: StationStore>(State(store): State<S>) -> Response {
    match store.get_stations().await {
        Ok(stations) => Json(stats::ranking(&stations)).into_response(),
        Err(e) => {
            error!("Failed to fetch stations for the ranking: {e}");
            failed_to_fetch()
        }
    }
}

async fn dashboard<S: StationStore>(State(store): State<S>) -> Response {
    match store.get_stations().await {
        Ok(stations) => Json(stats::dashboard(&stations)).into_response(),
        Err(e) => {
            error!("Failed to fetch stations for the dashboard: {e}");
            failed_to_fetch()
        }
    }
}

fn failed_to_fetch() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": "Failed to fetch station data" })),
    )
        .into_response()
}
