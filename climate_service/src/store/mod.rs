/// Read-only access to the station/measurement data store.
///
/// Two traits split the seam:
/// - `MeasurementQueries` — the primitive reads the endpoints are built from.
///   Implemented on each backend's transaction type.
/// - `ClimateStore` — owns a connection and hands out a consistent snapshot
///   (one transaction) per request, so queries that depend on each other
///   (latest date, then rows since the window start) see the same data.
///
/// Backends:
/// - `postgres` — PostgreSQL via the blocking `postgres` client
/// - `sqlite`   — SQLite file (e.g. Resources/hawaii.sqlite)
///
/// The SQL is shared. Both engines accept `$N` positional placeholders, and
/// dates are always read and compared as text so lexical ordering holds
/// even when the column is a native DATE.

pub mod postgres;
pub mod sqlite;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::error::StoreError;
use crate::model::{PrecipitationRecord, TemperatureRecord, TemperatureStats};

pub use self::postgres::PgStore;
pub use self::sqlite::SqliteStore;

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

pub(crate) const SQL_PING: &str = "SELECT 1";

pub(crate) const SQL_LATEST_DATE: &str = "SELECT MAX(CAST(date AS TEXT)) FROM measurement";

pub(crate) const SQL_PRECIPITATION_SINCE: &str = "SELECT CAST(date AS TEXT), CAST(prcp AS DOUBLE PRECISION)
     FROM measurement
     WHERE CAST(date AS TEXT) >= $1";

pub(crate) const SQL_STATION_IDS: &str = "SELECT DISTINCT CAST(station AS TEXT) AS id
     FROM station
     ORDER BY id";

// Ties on count fall back to the lowest station code.
pub(crate) const SQL_MOST_ACTIVE_STATION: &str = "SELECT CAST(station AS TEXT) AS id
     FROM measurement
     GROUP BY station
     ORDER BY COUNT(*) DESC, id ASC
     LIMIT 1";

pub(crate) const SQL_TEMPERATURES_SINCE: &str = "SELECT CAST(date AS TEXT), CAST(tobs AS DOUBLE PRECISION)
     FROM measurement
     WHERE station = $1 AND CAST(date AS TEXT) >= $2";

pub(crate) const SQL_TEMPERATURE_STATS_SINCE: &str = "SELECT CAST(MIN(tobs) AS DOUBLE PRECISION),
            CAST(AVG(tobs) AS DOUBLE PRECISION),
            CAST(MAX(tobs) AS DOUBLE PRECISION)
     FROM measurement
     WHERE CAST(date AS TEXT) >= $1";

pub(crate) const SQL_TEMPERATURE_STATS_BETWEEN: &str = "SELECT CAST(MIN(tobs) AS DOUBLE PRECISION),
            CAST(AVG(tobs) AS DOUBLE PRECISION),
            CAST(MAX(tobs) AS DOUBLE PRECISION)
     FROM measurement
     WHERE CAST(date AS TEXT) >= $1 AND CAST(date AS TEXT) <= $2";

/// Tables the service reads. Both must exist before serving.
pub const REQUIRED_TABLES: &[&str] = &["station", "measurement"];

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Primitive reads over `station` and `measurement`.
pub trait MeasurementQueries {
    /// `max(date)` over all measurements; `None` when the table is empty.
    fn latest_date(&mut self) -> Result<Option<String>, StoreError>;

    /// All `(date, prcp)` pairs with `date >= start`, in store order.
    fn precipitation_since(&mut self, start: &str) -> Result<Vec<PrecipitationRecord>, StoreError>;

    /// Distinct station codes from the station catalog, ascending.
    fn station_ids(&mut self) -> Result<Vec<String>, StoreError>;

    /// Station with the most measurement rows; `None` when there are none.
    fn most_active_station(&mut self) -> Result<Option<String>, StoreError>;

    /// `(date, tobs)` for one station with `date >= start`, in store order.
    fn temperatures_since(
        &mut self,
        station: &str,
        start: &str,
    ) -> Result<Vec<TemperatureRecord>, StoreError>;

    /// min/avg/max of `tobs` with `date >= start` and, if given, `date <= end`.
    fn temperature_stats(
        &mut self,
        start: &str,
        end: Option<&str>,
    ) -> Result<TemperatureStats, StoreError>;
}

/// A connection to the data store.
pub trait ClimateStore: Send {
    /// Short backend name for logs and the health endpoint.
    fn backend(&self) -> &'static str;

    /// Cheap round trip used by `/health`.
    fn ping(&mut self) -> Result<(), StoreError>;

    /// Whether a table (or view) with this name is visible to the connection.
    fn table_exists(&mut self, table: &str) -> Result<bool, StoreError>;

    /// Runs `f` inside one read-only transaction.
    fn snapshot<T, F>(&mut self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut dyn MeasurementQueries) -> Result<T, StoreError>;
}

// ---------------------------------------------------------------------------
// Runtime-selected backend
// ---------------------------------------------------------------------------

/// Backend chosen from the data-source URL at startup.
pub enum Store {
    Postgres(PgStore),
    Sqlite(SqliteStore),
}

impl ClimateStore for Store {
    fn backend(&self) -> &'static str {
        match self {
            Store::Postgres(store) => store.backend(),
            Store::Sqlite(store) => store.backend(),
        }
    }

    fn ping(&mut self) -> Result<(), StoreError> {
        match self {
            Store::Postgres(store) => store.ping(),
            Store::Sqlite(store) => store.ping(),
        }
    }

    fn table_exists(&mut self, table: &str) -> Result<bool, StoreError> {
        match self {
            Store::Postgres(store) => store.table_exists(table),
            Store::Sqlite(store) => store.table_exists(table),
        }
    }

    fn snapshot<T, F>(&mut self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut dyn MeasurementQueries) -> Result<T, StoreError>,
    {
        match self {
            Store::Postgres(store) => store.snapshot(f),
            Store::Sqlite(store) => store.snapshot(f),
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Store({})", self.backend())
    }
}
