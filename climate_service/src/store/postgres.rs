/// PostgreSQL backend.
///
/// Each snapshot is a read-only REPEATABLE READ transaction, so every query
/// in a request sees the same committed data. A client that has been closed
/// underneath us (server restart, idle timeout) is reconnected at the start
/// of the next request rather than retried within the current one.

use postgres::{Client, IsolationLevel, NoTls, Transaction};
use tracing::{debug, warn};

use super::{
    ClimateStore, MeasurementQueries, SQL_LATEST_DATE, SQL_MOST_ACTIVE_STATION, SQL_PING,
    SQL_PRECIPITATION_SINCE, SQL_STATION_IDS, SQL_TEMPERATURES_SINCE,
    SQL_TEMPERATURE_STATS_BETWEEN, SQL_TEMPERATURE_STATS_SINCE,
};
use crate::error::StoreError;
use crate::model::{PrecipitationRecord, TemperatureRecord, TemperatureStats};

/// A single PostgreSQL connection owned by one worker.
pub struct PgStore {
    url: String,
    client: Client,
}

impl PgStore {
    pub fn connect(url: &str) -> Result<Self, postgres::Error> {
        let client = Client::connect(url, NoTls)?;
        Ok(Self { url: url.to_string(), client })
    }

    fn ensure_connected(&mut self) -> Result<(), StoreError> {
        if !self.client.is_closed() {
            return Ok(());
        }

        warn!("PostgreSQL connection closed, reconnecting");
        self.client = Client::connect(&self.url, NoTls)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

impl ClimateStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    fn ping(&mut self) -> Result<(), StoreError> {
        self.ensure_connected()?;
        self.client.simple_query(SQL_PING)?;
        Ok(())
    }

    fn table_exists(&mut self, table: &str) -> Result<bool, StoreError> {
        self.ensure_connected()?;
        let row = self.client.query_one(
            "SELECT EXISTS(
                SELECT 1 FROM information_schema.tables
                WHERE table_name = $1 AND table_schema = ANY(current_schemas(false))
             )",
            &[&table],
        )?;
        Ok(row.try_get(0)?)
    }

    fn snapshot<T, F>(&mut self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut dyn MeasurementQueries) -> Result<T, StoreError>,
    {
        self.ensure_connected()?;

        let mut tx = self
            .client
            .build_transaction()
            .isolation_level(IsolationLevel::RepeatableRead)
            .read_only(true)
            .start()?;

        // Dropping the transaction on error rolls it back.
        let result = f(&mut tx)?;
        tx.commit()?;
        Ok(result)
    }
}

impl MeasurementQueries for Transaction<'_> {
    fn latest_date(&mut self) -> Result<Option<String>, StoreError> {
        let row = self.query_one(SQL_LATEST_DATE, &[])?;
        Ok(row.try_get(0)?)
    }

    fn precipitation_since(&mut self, start: &str) -> Result<Vec<PrecipitationRecord>, StoreError> {
        let rows = self.query(SQL_PRECIPITATION_SINCE, &[&start])?;
        debug!(start, rows = rows.len(), "precipitation query");

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(PrecipitationRecord {
                date: row.try_get(0)?,
                prcp: row.try_get(1)?,
            });
        }
        Ok(records)
    }

    fn station_ids(&mut self) -> Result<Vec<String>, StoreError> {
        let rows = self.query(SQL_STATION_IDS, &[])?;
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            ids.push(row.try_get(0)?);
        }
        Ok(ids)
    }

    fn most_active_station(&mut self) -> Result<Option<String>, StoreError> {
        let row = self.query_opt(SQL_MOST_ACTIVE_STATION, &[])?;
        match row {
            Some(row) => Ok(Some(row.try_get(0)?)),
            None => Ok(None),
        }
    }

    fn temperatures_since(
        &mut self,
        station: &str,
        start: &str,
    ) -> Result<Vec<TemperatureRecord>, StoreError> {
        let rows = self.query(SQL_TEMPERATURES_SINCE, &[&station, &start])?;
        debug!(station, start, rows = rows.len(), "temperature query");

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(TemperatureRecord {
                date: row.try_get(0)?,
                tobs: row.try_get(1)?,
            });
        }
        Ok(records)
    }

    fn temperature_stats(
        &mut self,
        start: &str,
        end: Option<&str>,
    ) -> Result<TemperatureStats, StoreError> {
        let row = match end {
            Some(end) => self.query_one(SQL_TEMPERATURE_STATS_BETWEEN, &[&start, &end])?,
            None => self.query_one(SQL_TEMPERATURE_STATS_SINCE, &[&start])?,
        };

        Ok(TemperatureStats {
            min: row.try_get(0)?,
            avg: row.try_get(1)?,
            max: row.try_get(2)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
