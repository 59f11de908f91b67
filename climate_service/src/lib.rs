/// climate_service: read-only HTTP JSON API over historical climate-station
/// measurements (precipitation and temperature observations).
///
/// # Module structure
///
/// ```text
/// climate_service
/// ├── model       — record and response types (Station, Measurement, TemperatureSummary, …)
/// ├── error       — ConfigError and per-request StoreError
/// ├── config      — service configuration loader (climate_service.toml + overrides)
/// ├── db          — data-source URL parsing, connection, table verification
/// ├── store
/// │   ├── postgres — PostgreSQL backend (read-only REPEATABLE READ snapshots)
/// │   ├── sqlite   — SQLite backend (read-only file, e.g. hawaii.sqlite)
/// │   └── fixtures (test only) — in-memory sample dataset
/// ├── query       — the Query Service operations behind /api/v1.0
/// ├── endpoint    — HTTP routing and the request worker pool
/// └── analysis
///     └── window  — rolling 12-month window date arithmetic
/// ```

/// Public modules
pub mod analysis;
pub mod config;
pub mod db;
pub mod endpoint;
pub mod error;
pub mod model;
pub mod query;
pub mod store;
