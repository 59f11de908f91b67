/// Test fixtures: a small slice of the Hawaii station/measurement dataset
/// loaded into in-memory SQLite.
///
/// Shape of the sample (latest date 2017-08-23, window start 2016-08-23):
///   USC00519397  3 rows, one before the window (2016-01-01)
///   USC00513117  2 rows, one a day before the window (2016-08-22),
///                one with missing precipitation
///   USC00519281  5 rows, all inside the window, the most active station
///
/// The measurement table deliberately has no constraints: the service
/// enforces none and must cope with whatever the loader wrote.

use rusqlite::{Connection, params};

use super::SqliteStore;
use crate::model::{Measurement, Station};

/// (station, date, prcp, tobs)
pub(crate) type MeasurementRow = (&'static str, &'static str, Option<f64>, f64);

pub(crate) const SCHEMA: &str = "
    CREATE TABLE station (
        id INTEGER PRIMARY KEY,
        station TEXT,
        name TEXT,
        latitude FLOAT,
        longitude FLOAT,
        elevation FLOAT
    );
    CREATE TABLE measurement (
        id INTEGER PRIMARY KEY,
        station TEXT,
        date TEXT,
        prcp FLOAT,
        tobs FLOAT
    );
";

pub(crate) fn sample_station(code: &str) -> Station {
    Station {
        station: code.to_string(),
        name: Some(format!("{code} test station")),
        latitude: Some(21.3),
        longitude: Some(-157.8),
        elevation: Some(3.0),
    }
}

pub(crate) fn measurement((station, date, prcp, tobs): MeasurementRow) -> Measurement {
    Measurement {
        station: station.to_string(),
        date: date.to_string(),
        prcp,
        tobs,
    }
}

/// Creates both tables and inserts the given rows.
pub(crate) fn seed(conn: &Connection, stations: &[Station], measurements: &[MeasurementRow]) {
    conn.execute_batch(SCHEMA).expect("schema should apply");

    for s in stations {
        conn.execute(
            "INSERT INTO station (station, name, latitude, longitude, elevation)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![s.station, s.name, s.latitude, s.longitude, s.elevation],
        )
        .expect("station insert");
    }

    for m in measurements.iter().copied().map(measurement) {
        conn.execute(
            "INSERT INTO measurement (station, date, prcp, tobs) VALUES (?1, ?2, ?3, ?4)",
            params![m.station, m.date, m.prcp, m.tobs],
        )
        .expect("measurement insert");
    }
}

pub(crate) fn memory_store(stations: &[Station], measurements: &[MeasurementRow]) -> SqliteStore {
    let conn = Connection::open_in_memory().expect("in-memory database");
    seed(&conn, stations, measurements);
    SqliteStore::from_connection(conn)
}

pub(crate) fn hawaii_sample() -> (Vec<Station>, Vec<MeasurementRow>) {
    let stations = vec![
        sample_station("USC00519397"),
        sample_station("USC00513117"),
        sample_station("USC00519281"),
    ];

    let measurements = vec![
        ("USC00519397", "2016-01-01", Some(0.1), 70.0),
        ("USC00519397", "2017-08-22", Some(0.0), 81.0),
        ("USC00519397", "2017-08-23", Some(0.0), 81.0),
        ("USC00513117", "2016-08-22", Some(0.4), 74.0),
        ("USC00513117", "2017-08-21", None, 76.0),
        ("USC00519281", "2016-08-23", Some(1.79), 77.0),
        ("USC00519281", "2016-11-05", Some(0.02), 72.0),
        ("USC00519281", "2017-08-01", None, 77.0),
        ("USC00519281", "2017-08-17", Some(0.01), 76.0),
        ("USC00519281", "2017-08-18", Some(0.06), 79.0),
    ];

    (stations, measurements)
}
