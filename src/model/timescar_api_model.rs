use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

/// Body of the station map endpoint
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct TimescarStationList {
    #[serde(rename = "s", default)]
    pub stations: Vec<TimescarStation>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TimescarStation {
    #[serde(rename = "cd", default, deserialize_with = "code_from_string_or_number")]
    pub code: Option<String>,
    #[serde(rename = "nm", default)]
    pub name: Option<String>,
    /// Tokyo datum. Missing values come through as 0.0
    #[serde(rename = "la", default, deserialize_with = "coordinate_or_zero")]
    pub latitude: f64,
    /// Tokyo datum. Missing values come through as 0.0
    #[serde(rename = "lo", default, deserialize_with = "coordinate_or_zero")]
    pub longitude: f64,
    #[serde(rename = "disp1MonthReserveLabel", default)]
    pub disp_1_month_reserve_label: Option<String>,
    #[serde(rename = "disp3MonthReserveLabel", default)]
    pub disp_3_month_reserve_label: Option<String>,
}

/// Body of the station detail endpoint. The endpoint answers `null` for unknown codes.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct TimescarStationDetail {
    #[serde(rename = "adr1", default)]
    pub address: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub photo_image: Vec<TimescarPhoto>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub car_info: Vec<TimescarCar>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct TimescarPhoto {
    /// Raw html, the photo links are in `href='...'` attributes
    #[serde(default)]
    pub photo_child: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct TimescarCar {
    #[serde(default)]
    pub car_class_name: Option<String>,
    #[serde(default)]
    pub car_name: Option<String>,
    /// Free text, can contain raw line breaks
    #[serde(default)]
    pub car_comments: Option<String>,
}

struct CoordinateVisitor;

impl<'de> de::Visitor<'de> for CoordinateVisitor {
    type Value = f64;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a coordinate as a number or a numeric string")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
        let v = v.trim();
        if v.is_empty() {
            return Ok(0.0);
        }
        v.parse::<f64>().map_err(de::Error::custom)
    }

    fn visit_unit<E: de::Error>(self) -> Result<f64, E> {
        Ok(0.0)
    }

    fn visit_none<E: de::Error>(self) -> Result<f64, E> {
        Ok(0.0)
    }
}

// The map endpoint sends coordinates as strings for some stations and numbers for others
fn coordinate_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(CoordinateVisitor)
}

struct CodeVisitor;

impl<'de> de::Visitor<'de> for CodeVisitor {
    type Value = Option<String>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a station code as a string or an integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()).filter(|c| !c.is_empty()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }
}

fn code_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(CodeVisitor)
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items: Option<Vec<T>> = Deserialize::deserialize(deserializer)?;

    Ok(items.unwrap_or_default())
}
