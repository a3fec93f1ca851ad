//! Shape of the EXIF metadata returned to clients.

use serde::Serialize;
use serde_json::{Map, Value};

/// Outcome of an EXIF extraction as it appears on the wire.
///
/// `Empty` and `Failed` exist so that callers always receive an object,
/// never an error status, when an image carries no readable metadata.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ExifResult {
    Parsed(ExifFields),
    Failed { error: String },
    Empty {},
}

impl ExifResult {
    pub fn empty() -> Self {
        Self::Empty {}
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty {})
    }
}

/// The curated subset of tags plus the unfiltered extraction.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct ExifFields {
    #[serde(rename = "Make", skip_serializing_if = "Option::is_none")]
    pub make: Option<Value>,
    #[serde(rename = "Model", skip_serializing_if = "Option::is_none")]
    pub model: Option<Value>,
    #[serde(rename = "LensModel", skip_serializing_if = "Option::is_none")]
    pub lens_model: Option<Value>,
    #[serde(rename = "FNumber", skip_serializing_if = "Option::is_none")]
    pub f_number: Option<Value>,
    #[serde(rename = "ExposureTime", skip_serializing_if = "Option::is_none")]
    pub exposure_time: Option<Value>,
    #[serde(rename = "ISO", skip_serializing_if = "Option::is_none")]
    pub iso: Option<Value>,
    #[serde(rename = "FocalLength", skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<Value>,
    #[serde(rename = "CreateDate", skip_serializing_if = "Option::is_none")]
    pub create_date: Option<Value>,
    #[serde(rename = "GPSLatitude", skip_serializing_if = "Option::is_none")]
    pub gps_latitude: Option<Value>,
    #[serde(rename = "GPSLongitude", skip_serializing_if = "Option::is_none")]
    pub gps_longitude: Option<Value>,
    #[serde(rename = "Orientation", skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Value>,
    pub raw: Map<String, Value>,
}

impl ExifFields {
    /// Select the curated fields out of a raw tag map, keeping the map itself.
    pub fn pick(raw: Map<String, Value>) -> Self {
        let field = |names: &[&str]| names.iter().find_map(|name| raw.get(*name).cloned());

        Self {
            make: field(&["Make"]),
            model: field(&["Model"]),
            lens_model: field(&["LensModel"]),
            f_number: field(&["FNumber"]),
            exposure_time: field(&["ExposureTime"]),
            iso: field(&["ISO", "ISOSpeedRatings"]),
            focal_length: field(&["FocalLength"]),
            create_date: field(&["CreateDate", "DateTimeOriginal"]),
            gps_latitude: field(&["GPSLatitude"]),
            gps_longitude: field(&["GPSLongitude"]),
            orientation: field(&["Orientation"]),
            raw,
        }
    }
}
