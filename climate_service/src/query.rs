/// Query Service: the read operations behind the `/api/v1.0` routes.
///
/// Each operation runs in a single store snapshot. `precipitation` and
/// `tobs` read the latest measurement date once and reuse it for the row
/// query, so both see the same `latest_date`.
///
/// Empty results are not errors: the array operations return empty vectors
/// and the temperature summaries return null aggregates.

use crate::analysis::window::window_start;
use crate::error::StoreError;
use crate::model::{PrecipitationRecord, TemperatureRecord, TemperatureSummary};
use crate::store::ClimateStore;

/// Stateless query layer over one store connection.
pub struct QueryService<S> {
    store: S,
}

impl<S: ClimateStore> QueryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// `(date, prcp)` for every measurement in the rolling 12-month window.
    pub fn precipitation(&mut self) -> Result<Vec<PrecipitationRecord>, StoreError> {
        self.store.snapshot(|q| {
            let Some(latest) = q.latest_date()? else {
                return Ok(Vec::new());
            };
            let start = window_start(&latest)?;
            q.precipitation_since(&start)
        })
    }

    /// All station codes in the catalog.
    pub fn stations(&mut self) -> Result<Vec<String>, StoreError> {
        self.store.snapshot(|q| q.station_ids())
    }

    /// `(date, tobs)` for the most active station over the rolling window.
    ///
    /// The window ends at the latest date across *all* stations, not the
    /// latest date of the chosen station.
    pub fn tobs(&mut self) -> Result<Vec<TemperatureRecord>, StoreError> {
        self.store.snapshot(|q| {
            let Some(station) = q.most_active_station()? else {
                return Ok(Vec::new());
            };
            let Some(latest) = q.latest_date()? else {
                return Ok(Vec::new());
            };
            let start = window_start(&latest)?;
            q.temperatures_since(&station, &start)
        })
    }

    /// TMIN/TAVG/TMAX for measurements on or after `start` and, when given,
    /// on or before `end`. Dates are compared as strings and not validated.
    pub fn temperature_summary(
        &mut self,
        start: &str,
        end: Option<&str>,
    ) -> Result<TemperatureSummary, StoreError> {
        let stats = self.store.snapshot(|q| q.temperature_stats(start, end))?;
        Ok(TemperatureSummary::new(start, end, stats))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures::{hawaii_sample, memory_store};

    fn hawaii_service() -> QueryService<crate::store::SqliteStore> {
        let (stations, measurements) = hawaii_sample();
        QueryService::new(memory_store(&stations, &measurements))
    }

    fn empty_service() -> QueryService<crate::store::SqliteStore> {
        QueryService::new(memory_store(&[], &[]))
    }

    #[test]
    fn test_precipitation_limited_to_rolling_window() {
        let mut service = hawaii_service();
        let records = service.precipitation().unwrap();

        assert_eq!(records.len(), 8);
        assert!(records.iter().all(|r| r.date.as_str() >= "2016-08-23"));
        assert!(records.iter().any(|r| r.date == "2016-08-23"), "window start is inclusive");
        assert!(!records.iter().any(|r| r.date == "2016-01-01"));
        assert!(!records.iter().any(|r| r.date == "2016-08-22"));
    }

    #[test]
    fn test_precipitation_passes_null_through() {
        let mut service = hawaii_service();
        let records = service.precipitation().unwrap();
        let missing = records
            .iter()
            .find(|r| r.date == "2017-08-21")
            .expect("2017-08-21 should be in the window");
        assert_eq!(missing.prcp, None);
    }

    #[test]
    fn test_two_row_example_includes_latest_only() {
        let mut service = QueryService::new(memory_store(
            &[],
            &[
                ("S1", "2016-01-01", Some(0.1), 70.0),
                ("S1", "2017-08-23", Some(0.0), 75.0),
            ],
        ));

        let records = service.precipitation().unwrap();
        assert_eq!(
            records,
            vec![PrecipitationRecord { date: "2017-08-23".to_string(), prcp: Some(0.0) }]
        );
    }

    #[test]
    fn test_stations_lists_catalog() {
        let mut service = hawaii_service();
        let stations = service.stations().unwrap();
        assert_eq!(stations, vec!["USC00513117", "USC00519281", "USC00519397"]);
    }

    #[test]
    fn test_tobs_only_for_most_active_station() {
        let mut service = hawaii_service();
        let records = service.tobs().unwrap();

        let dates: Vec<&str> = records.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(
            dates,
            vec!["2016-08-23", "2016-11-05", "2017-08-01", "2017-08-17", "2017-08-18"]
        );
    }

    #[test]
    fn test_tobs_window_uses_global_latest_date() {
        // S2 is busiest but its own last reading is well before the global latest.
        let mut service = QueryService::new(memory_store(
            &[],
            &[
                ("S2", "2016-01-01", None, 60.0),
                ("S2", "2016-09-01", None, 65.0),
                ("S2", "2016-12-01", None, 66.0),
                ("S1", "2017-08-23", None, 80.0),
            ],
        ));

        let records = service.tobs().unwrap();
        assert_eq!(
            records,
            vec![
                TemperatureRecord { date: "2016-09-01".to_string(), tobs: 65.0 },
                TemperatureRecord { date: "2016-12-01".to_string(), tobs: 66.0 },
            ]
        );
    }

    #[test]
    fn test_summary_since_start() {
        let mut service = hawaii_service();
        let summary = service.temperature_summary("2017-08-23", None).unwrap();

        assert_eq!(summary.end_date, None);
        assert_eq!(summary.tmin, Some(81.0));
        assert_eq!(summary.tavg, Some(81.0));
        assert_eq!(summary.tmax, Some(81.0));
    }

    #[test]
    fn test_summary_between_dates_is_ordered() {
        let mut service = hawaii_service();
        let summary = service
            .temperature_summary("2016-08-23", Some("2017-08-23"))
            .unwrap();

        assert_eq!(summary.end_date.as_deref(), Some("2017-08-23"));
        assert_eq!(summary.tmin, Some(72.0));
        assert_eq!(summary.tavg, Some(77.375));
        assert_eq!(summary.tmax, Some(81.0));

        let (min, avg, max) = (summary.tmin.unwrap(), summary.tavg.unwrap(), summary.tmax.unwrap());
        assert!(min <= avg && avg <= max);
    }

    #[test]
    fn test_inverted_range_yields_null_aggregates() {
        let mut service = hawaii_service();
        let summary = service
            .temperature_summary("2017-08-23", Some("2016-08-23"))
            .unwrap();
        assert_eq!((summary.tmin, summary.tavg, summary.tmax), (None, None, None));
    }

    #[test]
    fn test_malformed_start_uses_string_comparison() {
        // "abc" sorts after every digit-leading date, so nothing matches.
        let mut service = hawaii_service();
        let summary = service.temperature_summary("abc", None).unwrap();
        assert_eq!(summary.tmin, None);

        // "2017" sorts before "2017-..." so every 2017 row matches.
        let summary = service.temperature_summary("2017", None).unwrap();
        assert_eq!(summary.tmin, Some(76.0));
        assert_eq!(summary.tmax, Some(81.0));
    }

    #[test]
    fn test_empty_store_returns_empty_shapes() {
        let mut service = empty_service();

        assert!(service.precipitation().unwrap().is_empty());
        assert!(service.stations().unwrap().is_empty());
        assert!(service.tobs().unwrap().is_empty());

        let summary = service.temperature_summary("2020-01-01", None).unwrap();
        assert_eq!(
            serde_json::to_string(&summary).unwrap(),
            r#"{"start_date":"2020-01-01","TMIN":null,"TAVG":null,"TMAX":null}"#
        );
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let mut service = hawaii_service();
        let first = serde_json::to_vec(&service.precipitation().unwrap()).unwrap();
        let second = serde_json::to_vec(&service.precipitation().unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
