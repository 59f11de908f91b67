/// SQLite backend.
///
/// Opens the database file read-only. Each snapshot is a deferred
/// transaction, which holds one read view for every query inside it.

use std::path::Path;

use rusqlite::{Connection, OpenFlags, OptionalExtension, Transaction, params};
use tracing::debug;

use super::{
    ClimateStore, MeasurementQueries, SQL_LATEST_DATE, SQL_MOST_ACTIVE_STATION, SQL_PING,
    SQL_PRECIPITATION_SINCE, SQL_STATION_IDS, SQL_TEMPERATURES_SINCE,
    SQL_TEMPERATURE_STATS_BETWEEN, SQL_TEMPERATURE_STATS_SINCE,
};
use crate::error::StoreError;
use crate::model::{PrecipitationRecord, TemperatureRecord, TemperatureStats};

/// A single SQLite connection owned by one worker.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens an existing database file without write access.
    pub fn open(path: &Path) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Ok(Self { conn })
    }

    /// Wraps an already-open connection (in-memory databases in tests).
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

impl ClimateStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    fn ping(&mut self) -> Result<(), StoreError> {
        self.conn.query_row(SQL_PING, [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    fn table_exists(&mut self, table: &str) -> Result<bool, StoreError> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type IN ('table', 'view') AND name = $1
             )",
            [table],
            |row| row.get::<_, bool>(0),
        )?;
        Ok(exists)
    }

    fn snapshot<T, F>(&mut self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut dyn MeasurementQueries) -> Result<T, StoreError>,
    {
        let mut tx = self.conn.transaction()?;
        let result = f(&mut tx)?;
        tx.commit()?;
        Ok(result)
    }
}

impl MeasurementQueries for Transaction<'_> {
    fn latest_date(&mut self) -> Result<Option<String>, StoreError> {
        let latest = self.query_row(SQL_LATEST_DATE, [], |row| row.get::<_, Option<String>>(0))?;
        Ok(latest)
    }

    fn precipitation_since(&mut self, start: &str) -> Result<Vec<PrecipitationRecord>, StoreError> {
        let mut stmt = self.prepare(SQL_PRECIPITATION_SINCE)?;
        let records = stmt
            .query_map([start], |row| {
                Ok(PrecipitationRecord {
                    date: row.get(0)?,
                    prcp: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(start, rows = records.len(), "precipitation query");
        Ok(records)
    }

    fn station_ids(&mut self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.prepare(SQL_STATION_IDS)?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn most_active_station(&mut self) -> Result<Option<String>, StoreError> {
        let station = self
            .query_row(SQL_MOST_ACTIVE_STATION, [], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(station)
    }

    fn temperatures_since(
        &mut self,
        station: &str,
        start: &str,
    ) -> Result<Vec<TemperatureRecord>, StoreError> {
        let mut stmt = self.prepare(SQL_TEMPERATURES_SINCE)?;
        let records = stmt
            .query_map(params![station, start], |row| {
                Ok(TemperatureRecord {
                    date: row.get(0)?,
                    tobs: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(station, start, rows = records.len(), "temperature query");
        Ok(records)
    }

    fn temperature_stats(
        &mut self,
        start: &str,
        end: Option<&str>,
    ) -> Result<TemperatureStats, StoreError> {
        let read = |row: &rusqlite::Row<'_>| -> rusqlite::Result<TemperatureStats> {
            Ok(TemperatureStats {
                min: row.get(0)?,
                avg: row.get(1)?,
                max: row.get(2)?,
            })
        };

        let stats = match end {
            Some(end) => self.query_row(SQL_TEMPERATURE_STATS_BETWEEN, params![start, end], read)?,
            None => self.query_row(SQL_TEMPERATURE_STATS_SINCE, params![start], read)?,
        };
        Ok(stats)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
