/// Shared data types for the climate query service.
///
/// `Station` and `Measurement` mirror the two tables owned by the external
/// data store. The remaining types are the JSON shapes returned by the HTTP
/// endpoints; their field names and order are part of the public contract.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Stored records
// ---------------------------------------------------------------------------

/// A weather-observation site from the `station` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Unique station code, e.g. "USC00519281".
    pub station: String,
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub elevation: Option<f64>,
}

/// One day's observation for a station from the `measurement` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub station: String,
    /// ISO calendar date, `YYYY-MM-DD`. Lexical order is chronological order.
    pub date: String,
    /// Precipitation. Missing observations stay `None`, never 0.
    pub prcp: Option<f64>,
    /// Temperature observation.
    pub tobs: f64,
}

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

/// Element of `/api/v1.0/precipitation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecipitationRecord {
    pub date: String,
    pub prcp: Option<f64>,
}

/// Element of `/api/v1.0/tobs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRecord {
    pub date: String,
    pub tobs: f64,
}

/// Raw min/avg/max over a filtered set of measurements.
/// All three are `None` when no rows matched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TemperatureStats {
    pub min: Option<f64>,
    pub avg: Option<f64>,
    pub max: Option<f64>,
}

/// Body of `/api/v1.0/<start>` and `/api/v1.0/<start>/<end>`.
///
/// `end_date` is omitted from the JSON for the open-ended route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureSummary {
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(rename = "TMIN")]
    pub tmin: Option<f64>,
    #[serde(rename = "TAVG")]
    pub tavg: Option<f64>,
    #[serde(rename = "TMAX")]
    pub tmax: Option<f64>,
}

impl TemperatureSummary {
    pub fn new(start_date: &str, end_date: Option<&str>, stats: TemperatureStats) -> Self {
        Self {
            start_date: start_date.to_string(),
            end_date: end_date.map(str::to_string),
            tmin: stats.min,
            tavg: stats.avg,
            tmax: stats.max,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
