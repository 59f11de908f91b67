/// Date arithmetic for the climate query service.
///
/// Submodules:
/// - `window` — the rolling 12-month window ending at the latest measurement.

pub mod window;
