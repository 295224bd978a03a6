//! Decoder adapters. Everything downstream sees [`DecodedTrack`]; raw GPX/FIT records never
//! leave this module.

use std::io::Cursor;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::foundation::core::GeoPoint;
use crate::track::discover::SourceFormat;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed GPX: {0}")]
    Gpx(String),

    #[error("malformed FIT: {0}")]
    Fit(String),

    #[error("unsupported track format")]
    Unsupported,
}

/// A decoded position with its optional sample time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimedPoint {
    pub point: GeoPoint,
    pub time: Option<DateTime<Utc>>,
}

/// Decoder output: points in recording order plus the activity start time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedTrack {
    pub points: Vec<TimedPoint>,
    /// First timestamp found in the stream, which may belong to a sample without a position.
    pub start_time: Option<DateTime<Utc>>,
}

impl DecodedTrack {
    pub fn positions(&self) -> Vec<GeoPoint> {
        self.points.iter().map(|p| p.point).collect()
    }
}

pub trait TrackDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedTrack, DecodeError>;
}

/// Walks track → segment → point.
#[derive(Clone, Copy, Debug, Default)]
pub struct GpxDecoder;

impl TrackDecoder for GpxDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedTrack, DecodeError> {
        let gpx = gpx::read(Cursor::new(bytes)).map_err(|e| DecodeError::Gpx(e.to_string()))?;

        let mut out = DecodedTrack::default();
        for track in gpx.tracks {
            for segment in track.segments {
                for waypoint in segment.points {
                    let time = match waypoint.time {
                        Some(t) => {
                            let iso = t.format().map_err(|e| DecodeError::Gpx(e.to_string()))?;
                            parse_timestamp(&iso)
                        }
                        None => None,
                    };
                    if out.start_time.is_none() {
                        out.start_time = time;
                    }

                    let geo = waypoint.point();
                    if let Some(point) = GeoPoint::new(geo.y(), geo.x()) {
                        out.points.push(TimedPoint { point, time });
                    }
                }
            }
        }
        Ok(out)
    }
}

/// Reads `record` messages, converting semicircle positions to degrees.
#[derive(Clone, Copy, Debug, Default)]
pub struct FitDecoder;

impl TrackDecoder for FitDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedTrack, DecodeError> {
        use fitparser::profile::MesgNum;

        let records =
            fitparser::de::from_bytes(bytes).map_err(|e| DecodeError::Fit(e.to_string()))?;

        let mut out = DecodedTrack::default();
        for record in records {
            if record.kind() != MesgNum::Record {
                continue;
            }

            let mut lat = None;
            let mut lon = None;
            let mut time = None;
            for field in record.fields() {
                match field.name() {
                    "position_lat" => lat = fit_value_to_f64(field.value()),
                    "position_long" => lon = fit_value_to_f64(field.value()),
                    "timestamp" => {
                        if let fitparser::Value::Timestamp(ts) = field.value() {
                            time = Some(ts.with_timezone(&Utc));
                        }
                    }
                    _ => {}
                }
            }

            if out.start_time.is_none() {
                out.start_time = time;
            }

            let (Some(lat), Some(lon)) = (lat, lon) else {
                continue;
            };
            if let Some(point) =
                GeoPoint::new(semicircles_to_degrees(lat), semicircles_to_degrees(lon))
            {
                out.points.push(TimedPoint { point, time });
            }
        }
        Ok(out)
    }
}

/// Decoder for a given source format, if one exists.
pub fn decoder_for(format: SourceFormat) -> Option<&'static dyn TrackDecoder> {
    match format {
        SourceFormat::Fit => Some(&FitDecoder),
        SourceFormat::Gpx => Some(&GpxDecoder),
        SourceFormat::Other => None,
    }
}

/// Decode `bytes` with the adapter matching `format`.
pub fn decode(format: SourceFormat, bytes: &[u8]) -> Result<DecodedTrack, DecodeError> {
    decoder_for(format)
        .ok_or(DecodeError::Unsupported)?
        .decode(bytes)
}

/// FIT stores angles as signed 32-bit fractions of a half turn.
pub fn semicircles_to_degrees(value: f64) -> f64 {
    value * (180.0 / 2f64.powi(31))
}

/// Parse an RFC 3339 timestamp, treating zone-less timestamps as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn fit_value_to_f64(value: &fitparser::Value) -> Option<f64> {
    match value {
        fitparser::Value::Float32(v) => Some(*v as f64),
        fitparser::Value::Float64(v) => Some(*v),
        fitparser::Value::SInt8(v) => Some(*v as f64),
        fitparser::Value::SInt16(v) => Some(*v as f64),
        fitparser::Value::SInt32(v) => Some(*v as f64),
        fitparser::Value::SInt64(v) => Some(*v as f64),
        fitparser::Value::UInt8(v) => Some(*v as f64),
        fitparser::Value::UInt16(v) => Some(*v as f64),
        fitparser::Value::UInt32(v) => Some(*v as f64),
        fitparser::Value::UInt64(v) => Some(*v as f64),
        fitparser::Value::Array(values) => values.iter().find_map(fit_value_to_f64),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/track/decode.rs"]
mod tests;
