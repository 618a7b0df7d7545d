//! Rankings and dashboard figures computed over every stored station.
//!
//! Ties keep the order the stations (or names) were first seen in.
use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;
use serde::Serialize;

use crate::model::db_model::StationDb;

const TOP_N: usize = 10;
const HISTOGRAM_BIN_WIDTH: usize = 5;
const HISTOGRAM_BINS: usize = 11;
pub const UNKNOWN_PREFECTURE: &str = "その他";

static PREFECTURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.{2,3}?[都道府県])").expect("prefecture pattern is valid")
});

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedStation {
    pub code: String,
    pub name: Option<String>,
    pub value: usize,
    pub unit: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub top_by_car_count: Vec<RankedStation>,
    /// Stations with the most distinct car models
    pub top_by_variety: Vec<RankedStation>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NamedCount {
    pub name: Option<String>,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub average_cars: f64,
    pub prefecture_chart_data: Vec<NamedCount>,
    /// Stations per car count bin (`0-4`, `5-9` .. `50-54`), empty bins left out
    pub histogram_data: Vec<NamedCount>,
    /// Cars per class, in first seen order
    pub class_pie_data: Vec<NamedCount>,
    pub top10_car_data: Vec<NamedCount>,
    pub total_car_models: usize,
    /// (latitude, longitude, car count) per station
    pub heatmap_data: Vec<(f64, f64, usize)>,
}

pub fn ranking(stations: &[StationDb]) -> Ranking {
    let top_by = |value: fn(&StationDb) -> usize, unit| {
        stations
            .iter()
            .map(|s| RankedStation {
                code: s.record.station_code.clone(),
                name: s.record.station_name.clone(),
                value: value(s),
                unit,
            })
            .sorted_by(|a, b| b.value.cmp(&a.value))
            .take(TOP_N)
            .collect_vec()
    };

    Ranking {
        top_by_car_count: top_by(car_count, "台"),
        top_by_variety: top_by(car_variety, "車種"),
    }
}

pub fn dashboard(stations: &[StationDb]) -> Dashboard {
    let car_counts = stations.iter().map(car_count).collect_vec();
    let total_cars: usize = car_counts.iter().sum();
    let average_cars = if stations.is_empty() {
        0.0
    } else {
        total_cars as f64 / stations.len() as f64
    };

    let prefectures = stations
        .iter()
        .map(|s| Some(prefecture(s.record.address.as_deref().unwrap_or_default()).to_string()))
        .collect_vec();

    let histogram_data = (0..HISTOGRAM_BINS)
        .map(|i| {
            let min = i * HISTOGRAM_BIN_WIDTH;
            let max = min + HISTOGRAM_BIN_WIDTH - 1;
            NamedCount {
                name: Some(format!("{min}-{max}")),
                count: car_counts.iter().filter(|&&c| c >= min && c <= max).count(),
            }
        })
        .filter(|bin| bin.count > 0)
        .collect_vec();

    let cars = stations.iter().flat_map(|s| &s.record.car_fleet).collect_vec();
    let class_names = cars.iter().map(|c| c.class_name.clone()).collect_vec();
    let car_names = cars.iter().map(|c| c.car_name.clone()).collect_vec();
    let car_name_counts = counts_in_first_seen_order(&car_names);

    Dashboard {
        average_cars,
        prefecture_chart_data: sorted_by_count(counts_in_first_seen_order(&prefectures)),
        histogram_data,
        class_pie_data: counts_in_first_seen_order(&class_names),
        total_car_models: car_name_counts.len(),
        top10_car_data: sorted_by_count(car_name_counts)
            .into_iter()
            .take(TOP_N)
            .collect_vec(),
        heatmap_data: stations
            .iter()
            .map(|s| (s.record.latitude, s.record.longitude, car_count(s)))
            .collect_vec(),
    }
}

/// Leading prefecture of a Japanese address, e.g. `東京都` or `神奈川県`
pub fn prefecture(address: &str) -> &str {
    PREFECTURE
        .find(address)
        .map(|m| m.as_str())
        .unwrap_or(UNKNOWN_PREFECTURE)
}

fn car_count(station: &StationDb) -> usize {
    station.record.car_fleet.len()
}

/// Distinct car names at the station
fn car_variety(station: &StationDb) -> usize {
    station
        .record
        .car_fleet
        .iter()
        .map(|c| &c.car_name)
        .unique()
        .count()
}

fn counts_in_first_seen_order(names: &[Option<String>]) -> Vec<NamedCount> {
    let counts = names.iter().counts();

    names
        .iter()
        .unique()
        .map(|name| NamedCount {
            name: name.clone(),
            count: counts[name],
        })
        .collect_vec()
}

/// Highest count first, stable for ties
fn sorted_by_count(counts: Vec<NamedCount>) -> Vec<NamedCount> {
    counts
        .into_iter()
        .sorted_by(|a, b| b.count.cmp(&a.count))
        .collect_vec()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::model::db_model::{FleetEntry, StationRecord};

    fn car(class_name: &str, car_name: &str) -> FleetEntry {
        FleetEntry {
            class_name: Some(class_name.to_string()),
            car_name: Some(car_name.to_string()),
            car_comments: String::new(),
        }
    }

    fn station(code: &str, address: &str, car_fleet: Vec<FleetEntry>) -> StationDb {
        StationDb {
            record: StationRecord {
                station_code: code.to_string(),
                station_name: Some(format!("{code} station")),
                latitude: 35.0,
                longitude: 139.0,
                address: Some(address.to_string()),
                station_comment: String::new(),
                car_fleet,
                photo_urls: vec![],
                disp_1_month_reserve_label: None,
                disp_3_month_reserve_label: None,
            },
            updated_at: Utc::now(),
        }
    }

    fn named(name: &str, count: usize) -> NamedCount {
        NamedCount {
            name: Some(name.to_string()),
            count,
        }
    }

    #[test]
    fn prefecture_is_the_address_prefix() {
        assert_eq!(prefecture("東京都渋谷区道玄坂1-1"), "東京都");
        assert_eq!(prefecture("神奈川県横浜市西区"), "神奈川県");
        assert_eq!(prefecture("北海道札幌市中央区"), "北海道");
        assert_eq!(prefecture("大阪府大阪市北区"), "大阪府");
    }

    #[test]
    fn unmatched_address_falls_back() {
        assert_eq!(prefecture(""), UNKNOWN_PREFECTURE);
        assert_eq!(prefecture("Shibuya 1-1"), UNKNOWN_PREFECTURE);
        assert_eq!(prefecture("都内"), UNKNOWN_PREFECTURE);
    }

    #[test]
    fn ranking_ties_keep_station_order() {
        let stations = vec![
            station("A", "", vec![car("Basic", "Yaris")]),
            station("B", "", vec![car("Basic", "Yaris"), car("Basic", "Yaris")]),
            station("C", "", vec![car("Basic", "Yaris"), car("Middle", "Prius")]),
            station("D", "", vec![]),
        ];

        let ranking = ranking(&stations);

        let by_count = ranking
            .top_by_car_count
            .iter()
            .map(|r| (r.code.as_str(), r.value))
            .collect_vec();
        assert_eq!(by_count, vec![("B", 2), ("C", 2), ("A", 1), ("D", 0)]);
        assert_eq!(ranking.top_by_car_count[0].unit, "台");

        let by_variety = ranking
            .top_by_variety
            .iter()
            .map(|r| (r.code.as_str(), r.value))
            .collect_vec();
        assert_eq!(by_variety, vec![("C", 2), ("A", 1), ("B", 1), ("D", 0)]);
        assert_eq!(ranking.top_by_variety[0].unit, "車種");
    }

    #[test]
    fn ranking_keeps_ten_stations() {
        let stations = (0..15)
            .map(|i| station(&format!("S{i:02}"), "", vec![car("Basic", "Yaris"); i]))
            .collect_vec();

        let ranking = ranking(&stations);

        assert_eq!(ranking.top_by_car_count.len(), 10);
        assert_eq!(ranking.top_by_car_count[0].code, "S14");
        assert_eq!(ranking.top_by_car_count[9].code, "S05");
    }

    #[test]
    fn histogram_uses_five_wide_bins_and_drops_empty_ones() {
        let stations = [0, 4, 5, 12, 54, 55]
            .into_iter()
            .enumerate()
            .map(|(i, cars)| station(&i.to_string(), "", vec![car("Basic", "Yaris"); cars]))
            .collect_vec();

        let dashboard = dashboard(&stations);

        assert_eq!(
            dashboard.histogram_data,
            vec![named("0-4", 2), named("5-9", 1), named("10-14", 1), named("50-54", 1)]
        );
        assert_eq!(dashboard.average_cars, 130.0 / 6.0);
    }

    #[test]
    fn dashboard_counts_prefectures_classes_and_models() {
        let stations = vec![
            station("A", "大阪府大阪市", vec![car("Basic", "Yaris"), car("Middle", "Prius")]),
            station("B", "東京都港区", vec![car("Basic", "Yaris")]),
            station("C", "unknown", vec![car("Basic", "Note")]),
            station("D", "東京都新宿区", vec![]),
        ];

        let dashboard = dashboard(&stations);

        assert_eq!(
            dashboard.prefecture_chart_data,
            vec![named("東京都", 2), named("大阪府", 1), named(UNKNOWN_PREFECTURE, 1)]
        );
        assert_eq!(
            dashboard.class_pie_data,
            vec![named("Basic", 3), named("Middle", 1)]
        );
        assert_eq!(
            dashboard.top10_car_data,
            vec![named("Yaris", 2), named("Prius", 1), named("Note", 1)]
        );
        assert_eq!(dashboard.total_car_models, 3);
        assert_eq!(dashboard.heatmap_data[0], (35.0, 139.0, 2));
        assert_eq!(dashboard.heatmap_data.len(), 4);
    }

    #[test]
    fn empty_dashboard() {
        let dashboard = dashboard(&[]);

        assert_eq!(dashboard.average_cars, 0.0);
        assert!(dashboard.histogram_data.is_empty());
        assert!(dashboard.prefecture_chart_data.is_empty());
        assert_eq!(dashboard.total_car_models, 0);
    }
}
