use serde::{Deserialize, Serialize};

pub const METERS_PER_MILE: f64 = 1609.34;

/// Travel estimate from the base location to a service address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceEstimate {
    /// Miles.
    pub distance: f64,
    /// Minutes.
    pub duration: f64,
    pub distance_text: String,
    pub duration_text: String,
}

impl DistanceEstimate {
    /// Builds an estimate from raw meters and seconds, as distance APIs report them.
    #[must_use]
    pub fn from_meters_and_seconds(
        meters: f64,
        seconds: f64,
        distance_text: impl Into<String>,
        duration_text: impl Into<String>,
    ) -> Self {
        Self {
            distance: meters / METERS_PER_MILE,
            duration: seconds / 60.0,
            distance_text: distance_text.into(),
            duration_text: duration_text.into(),
        }
    }
}

#[must_use]
pub fn format_distance(miles: f64) -> String {
    if miles < 0.1 {
        "Less than 0.1 miles".to_string()
    } else if miles < 1.0 {
        format!("{:.0} feet", miles * 5280.0)
    } else {
        format!("{miles:.1} miles")
    }
}

#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn format_duration(minutes: f64) -> String {
    if minutes < 1.0 {
        "Less than 1 minute".to_string()
    } else if minutes < 60.0 {
        format!("{} minutes", minutes.round() as i64)
    } else {
        let hours = (minutes / 60.0).floor() as i64;
        let rest = (minutes % 60.0).round() as i64;
        format!("{hours}h {rest}m")
    }
}
