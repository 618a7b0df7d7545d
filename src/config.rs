//! Runtime settings, read from the environment (and an optional `.env` file)
use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::Context;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost:5432/timescar";
pub const DEFAULT_BASE_URL: &str = "https://share.timescar.jp";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Bounding box covering every station in Japan: (minlat, maxlat, minlon, maxlon)
pub const STATION_MAP_BOUNDS: (f64, f64, f64, f64) = (23.4043, 47.0306, 123.1350, 149.1116);

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub base_url: String,
    /// Wait inserted before every detail request
    pub request_delay: Duration,
    pub bind_addr: SocketAddr,
    pub log_dir: PathBuf,
    pub otlp_endpoint: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let request_delay_ms: u64 = dotenvy::var("HARVEST_REQUEST_DELAY_MS")
            .unwrap_or("1000".to_string())
            .parse()
            .context("HARVEST_REQUEST_DELAY_MS must be a whole number of milliseconds")?;

        let bind_addr = dotenvy::var("API_BIND_ADDR")
            .unwrap_or(DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("API_BIND_ADDR must be a socket address like 0.0.0.0:3000")?;

        Ok(Config {
            database_url: dotenvy::var("DATABASE_URL")
                .unwrap_or(DEFAULT_DATABASE_URL.to_string()),
            base_url: dotenvy::var("TIMESCAR_BASE_URL")
                .unwrap_or(DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            request_delay: Duration::from_millis(request_delay_ms),
            bind_addr,
            log_dir: dotenvy::var("LOG_DIR")
                .unwrap_or("./logs".to_string())
                .into(),
            otlp_endpoint: dotenvy::var("OTLP_ENDPOINT").ok().filter(|e| !e.is_empty()),
        })
    }
}

pub fn station_list_url(base_url: &str) -> String {
    let (min_lat, max_lat, min_lon, max_lon) = STATION_MAP_BOUNDS;
    format!(
        "{base_url}/view/station/teeda.ajax?component=station_stationMapPage&action=ajaxViewMap&minlat={min_lat:.4}&maxlat={max_lat:.4}&minlon={min_lon:.4}&maxlon={max_lon:.4}"
    )
}

pub fn station_detail_url(base_url: &str, station_code: &str) -> String {
    format!(
        "{base_url}/view/station/teeda.ajax?&component=station_detailPage&action=ajaxStation&scd={station_code}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_url_carries_the_japan_bounding_box() {
        assert_eq!(
            station_list_url(DEFAULT_BASE_URL),
            "https://share.timescar.jp/view/station/teeda.ajax?component=station_stationMapPage&action=ajaxViewMap&minlat=23.4043&maxlat=47.0306&minlon=123.1350&maxlon=149.1116"
        );
    }

    #[test]
    fn detail_url_substitutes_the_code() {
        assert_eq!(
            station_detail_url("http://127.0.0.1:8080", "AB12"),
            "http://127.0.0.1:8080/view/station/teeda.ajax?&component=station_detailPage&action=ajaxStation&scd=AB12"
        );
    }
}
