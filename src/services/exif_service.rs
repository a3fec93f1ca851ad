//! EXIF extraction adapter.
//!
//! Parsing is delegated to `nom-exif` and runs on the blocking pool. Nothing
//! in here returns an error to the caller: unreadable images degrade to an
//! empty result.

use crate::models::exif::{ExifFields, ExifResult};
use bytes::Bytes;
use nom_exif::{EntryValue, ExifIter, LatLng, MediaParser, MediaSource};
use serde_json::{Map, Number, Value};
use std::io::Cursor;
use tracing::{debug, error};

/// Extract EXIF metadata from raw image bytes.
///
/// Parser failures (unsupported container, corrupt data, no EXIF block)
/// yield an empty result. Any other failure also yields an empty result,
/// unless `debug` is set, in which case its message is returned instead.
pub async fn safe_parse_exif(bytes: Bytes, debug: bool) -> ExifResult {
    match tokio::task::spawn_blocking(move || read_raw_tags(&bytes)).await {
        Ok(Some(raw)) => ExifResult::Parsed(ExifFields::pick(raw)),
        Ok(None) => ExifResult::empty(),
        Err(err) => {
            error!("EXIF parse failed: {}", err);
            if debug {
                ExifResult::Failed {
                    error: err.to_string(),
                }
            } else {
                ExifResult::empty()
            }
        }
    }
}

/// `?debug=1` enables error detail in EXIF results.
pub fn debug_requested(flag: Option<&str>) -> bool {
    flag == Some("1")
}

/// Read every tag into a name → value map, or `None` when the parser gives up.
fn read_raw_tags(bytes: &[u8]) -> Option<Map<String, Value>> {
    let ms = match MediaSource::seekable(Cursor::new(bytes)) {
        Ok(ms) => ms,
        Err(err) => {
            debug!("unrecognised media: {}", err);
            return None;
        }
    };

    let mut parser = MediaParser::new();
    let iter: ExifIter = match parser.parse(ms) {
        Ok(iter) => iter,
        Err(err) => {
            debug!("no EXIF data: {}", err);
            return None;
        }
    };

    // Parse GPS info before iterating (iteration consumes the iterator)
    let gps_info = iter.parse_gps_info().ok().flatten();

    let mut raw = Map::new();
    for entry in iter {
        let Some(value) = entry.get_value() else {
            continue;
        };
        let name = match entry.tag() {
            Some(tag) => tag.to_string(),
            None => format!("0x{:04x}", entry.tag_code()),
        };
        raw.entry(name).or_insert_with(|| entry_to_json(value));
    }

    if let Some(gps) = gps_info {
        raw.insert(
            "GPSLatitude".into(),
            float(latlng_to_decimal(&gps.latitude, gps.latitude_ref)),
        );
        raw.insert(
            "GPSLongitude".into(),
            float(latlng_to_decimal(&gps.longitude, gps.longitude_ref)),
        );
    }

    Some(raw)
}

fn entry_to_json(value: &EntryValue) -> Value {
    match value {
        EntryValue::Text(s) => Value::String(s.trim().trim_end_matches('\0').to_string()),
        EntryValue::URational(r) => ratio(r.0 as f64, r.1 as f64),
        EntryValue::IRational(r) => ratio(r.0 as f64, r.1 as f64),
        EntryValue::U8(v) => Value::from(*v),
        EntryValue::U16(v) => Value::from(*v),
        EntryValue::U32(v) => Value::from(*v),
        EntryValue::F32(v) => float(*v as f64),
        EntryValue::F64(v) => float(*v),
        other => Value::String(other.to_string()),
    }
}

fn ratio(numerator: f64, denominator: f64) -> Value {
    if denominator == 0.0 {
        return Value::Null;
    }
    float(numerator / denominator)
}

fn float(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

/// Convert a LatLng (deg, min, sec) to signed decimal degrees.
fn latlng_to_decimal(latlng: &LatLng, reference: char) -> f64 {
    let part = |n: u32, d: u32| if d == 0 { 0.0 } else { n as f64 / d as f64 };
    let degrees = part(latlng.0.0, latlng.0.1);
    let minutes = part(latlng.1.0, latlng.1.1);
    let seconds = part(latlng.2.0, latlng.2.1);

    let coord = degrees + minutes / 60.0 + seconds / 3600.0;
    if reference == 'S' || reference == 'W' {
        -coord
    } else {
        coord
    }
}
