use std::fmt;

use crate::records::{Meta, Stop, Trip};

/// A payload that decoded but cannot be rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Index of the offending record, when the payload is a list.
    pub index: Option<usize>,
    pub message: String,
}

impl ValidationError {
    fn at(index: usize, message: impl Into<String>) -> Self {
        Self {
            index: Some(index),
            message: message.into(),
        }
    }

    fn whole(message: impl Into<String>) -> Self {
        Self {
            index: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "record {i}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_trips(trips: &[Trip]) -> Result<(), ValidationError> {
    for (i, trip) in trips.iter().enumerate() {
        let mut last = f64::NEG_INFINITY;
        for (j, seg) in trip.segments.iter().enumerate() {
            if !seg.position.to_lat_lng().is_valid() {
                return Err(ValidationError::at(
                    i,
                    format!("segment {j} has an invalid coordinate {:?}", seg.position.0),
                ));
            }
            if !seg.timestamp.is_finite() {
                return Err(ValidationError::at(
                    i,
                    format!("segment {j} has a non-finite timestamp"),
                ));
            }
            if seg.timestamp < last {
                return Err(ValidationError::at(
                    i,
                    format!(
                        "segment {j} goes back in time ({} after {last})",
                        seg.timestamp
                    ),
                ));
            }
            last = seg.timestamp;
        }
    }
    Ok(())
}

pub fn validate_stops(stops: &[Stop]) -> Result<(), ValidationError> {
    match stops.iter().position(|s| !s.position.is_valid()) {
        Some(i) => Err(ValidationError::at(
            i,
            format!("invalid stop coordinate {:?}", stops[i].position),
        )),
        None => Ok(()),
    }
}

pub fn validate_meta(meta: &Meta) -> Result<(), ValidationError> {
    if !meta.center().is_valid() {
        return Err(ValidationError::whole(format!(
            "invalid center ({}, {})",
            meta.lat, meta.lng
        )));
    }
    if meta.start_time.is_some_and(|t| !t.is_finite()) {
        return Err(ValidationError::whole("start_time is not finite"));
    }
    Ok(())
}
