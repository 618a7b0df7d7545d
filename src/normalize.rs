//! Cleans the free-text and html fields of station details before they are stored
use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;

use crate::model::{
    db_model::{FleetEntry, StationRecord},
    timescar_api_model::{TimescarCar, TimescarPhoto, TimescarStation, TimescarStationDetail},
};

static PHOTO_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"href='([^']*)'").expect("photo href pattern is valid")
});

/// Absolute photo urls, in the order they appear. Duplicates are kept.
pub fn photo_urls(photos: &[TimescarPhoto], base_url: &str) -> Vec<String> {
    photos
        .iter()
        .filter_map(|p| p.photo_child.as_deref())
        .flat_map(|html| PHOTO_HREF.captures_iter(html))
        .map(|c| format!("{base_url}{}", &c[1]))
        .collect_vec()
}

/// The station comment uses `\r<br />` as its line break
pub fn station_comment(comment: &str) -> String {
    comment.replace("\r<br />", "\n")
}

/// Line breaks are dropped, not turned into spaces
pub fn car_comment(comment: &str) -> String {
    comment.chars().filter(|c| !matches!(c, '\r' | '\n')).collect()
}

pub fn fleet(cars: &[TimescarCar]) -> Vec<FleetEntry> {
    cars.iter()
        .map(|car| FleetEntry {
            class_name: car.car_class_name.clone(),
            car_name: car.car_name.clone(),
            car_comments: car_comment(car.car_comments.as_deref().unwrap_or_default()),
        })
        .collect_vec()
}

impl StationRecord {
    /// Combines a roster entry with its detail. `station_code` is the already validated code
    /// of `station`, coordinates are converted to WGS84 here.
    pub fn from_timescar(
        station_code: String,
        station: &TimescarStation,
        detail: &TimescarStationDetail,
        base_url: &str,
    ) -> Self {
        let (latitude, longitude) =
            crate::geodesy::tokyo_to_wgs84(station.longitude, station.latitude);

        StationRecord {
            station_code,
            station_name: station.name.clone(),
            latitude,
            longitude,
            address: detail.address.clone(),
            station_comment: station_comment(detail.comment.as_deref().unwrap_or_default()),
            car_fleet: fleet(&detail.car_info),
            photo_urls: photo_urls(&detail.photo_image, base_url),
            disp_1_month_reserve_label: station.disp_1_month_reserve_label.clone(),
            disp_3_month_reserve_label: station.disp_3_month_reserve_label.clone(),
        }
    }
}
