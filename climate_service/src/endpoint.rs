/// HTTP endpoint for querying climate station data
///
/// Read-only JSON API over the station/measurement store.
///
/// Endpoints:
/// - GET /                             - Route listing (HTML)
/// - GET /api/v1.0/precipitation       - Precipitation over the last 12 months
/// - GET /api/v1.0/stations            - Station codes
/// - GET /api/v1.0/tobs                - Most active station's temperatures, last 12 months
/// - GET /api/v1.0/{start}             - TMIN/TAVG/TMAX from start onwards
/// - GET /api/v1.0/{start}/{end}       - TMIN/TAVG/TMAX between start and end, inclusive
/// - GET /health                       - Service and data source health check

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use threadpool::ThreadPool;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tracing::{error, info, warn};

use crate::db::DbConfigError;
use crate::query::QueryService;
use crate::store::ClimateStore;

pub const API_PREFIX: &str = "/api/v1.0";

const AVAILABLE_ENDPOINTS: &[&str] = &[
    "/",
    "/health",
    "/api/v1.0/precipitation",
    "/api/v1.0/stations",
    "/api/v1.0/tobs",
    "/api/v1.0/{start}",
    "/api/v1.0/{start}/{end}",
];

const INDEX_HTML: &str = "Available Routes:<br/>\
/api/v1.0/precipitation<br/>\
/api/v1.0/stations<br/>\
/api/v1.0/tobs<br/>\
/api/v1.0/&lt;start&gt;<br/>\
/api/v1.0/&lt;start&gt;/&lt;end&gt;<br/>\
<br/>\
Dates are YYYY-MM-DD, e.g. /api/v1.0/2017-08-23 or /api/v1.0/2016-08-23/2017-08-23";

const CONTENT_TYPE_JSON: &str = "application/json";
const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// A resolved request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Index,
    Health,
    Precipitation,
    Stations,
    Tobs,
    TemperatureFrom { start: String },
    TemperatureRange { start: String, end: String },
    NotFound,
}

/// Maps a request URL onto a route. Query strings are ignored and date
/// segments are percent-decoded but otherwise taken as-is.
pub fn route(url: &str) -> Route {
    let path = url.split(['?', '#']).next().unwrap_or_default();

    match path {
        "/" => return Route::Index,
        "/health" => return Route::Health,
        _ => {}
    }

    let Some(rest) = path
        .strip_prefix(API_PREFIX)
        .and_then(|rest| rest.strip_prefix('/'))
    else {
        return Route::NotFound;
    };

    let segments: Vec<&str> = rest.split('/').collect();
    match segments.as_slice() {
        ["precipitation"] => Route::Precipitation,
        ["stations"] => Route::Stations,
        ["tobs"] => Route::Tobs,
        [start] if !start.is_empty() => Route::TemperatureFrom { start: decode_segment(start) },
        [start, end] if !start.is_empty() && !end.is_empty() => Route::TemperatureRange {
            start: decode_segment(start),
            end: decode_segment(end),
        },
        _ => Route::NotFound,
    }
}

fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Status, content type and body of a response, independent of the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    /// Failure message for the worker log.
    pub error: Option<String>,
}

impl ApiResponse {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self { status, content_type: CONTENT_TYPE_JSON, body, error: None },
            Err(e) => Self::internal_error(format!("Failed to serialize response: {e}")),
        }
    }

    fn html(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: CONTENT_TYPE_HTML,
            body: body.as_bytes().to_vec(),
            error: None,
        }
    }

    fn internal_error(message: String) -> Self {
        let body = serde_json::json!({ "error": message });
        Self {
            status: 500,
            content_type: CONTENT_TYPE_JSON,
            body: body.to_string().into_bytes(),
            error: Some(message),
        }
    }

    pub fn body_str(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap_or_default()
    }
}

/// Handles one request against the service. GET and HEAD are accepted.
pub fn handle<S: ClimateStore>(
    service: &mut QueryService<S>,
    method: &Method,
    url: &str,
) -> ApiResponse {
    let route = route(url);

    if route != Route::NotFound && !matches!(method, Method::Get | Method::Head) {
        return ApiResponse::json(
            405,
            &serde_json::json!({
                "error": "Method not allowed",
                "allowed": ["GET", "HEAD"],
            }),
        );
    }

    match route {
        Route::Index => ApiResponse::html(200, INDEX_HTML),
        Route::Health => handle_health(service),
        Route::Precipitation => respond(service.precipitation()),
        Route::Stations => respond(service.stations()),
        Route::Tobs => respond(service.tobs()),
        Route::TemperatureFrom { start } => respond(service.temperature_summary(&start, None)),
        Route::TemperatureRange { start, end } => {
            respond(service.temperature_summary(&start, Some(&end)))
        }
        Route::NotFound => ApiResponse::json(
            404,
            &serde_json::json!({
                "error": "Not found",
                "available_endpoints": AVAILABLE_ENDPOINTS,
            }),
        ),
    }
}

fn respond<T: Serialize>(result: Result<T, crate::error::StoreError>) -> ApiResponse {
    match result {
        Ok(value) => ApiResponse::json(200, &value),
        Err(e) => ApiResponse::internal_error(e.to_string()),
    }
}

/// Handle /health endpoint
fn handle_health<S: ClimateStore>(service: &mut QueryService<S>) -> ApiResponse {
    let store = service.store_mut();
    let backend = store.backend();

    match store.ping() {
        Ok(()) => ApiResponse::json(
            200,
            &serde_json::json!({
                "status": "ok",
                "service": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "backend": backend,
                "database": "ok",
            }),
        ),
        Err(e) => {
            warn!(error = %e, "health check failed");
            ApiResponse::json(
                503,
                &serde_json::json!({
                    "status": "degraded",
                    "service": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                    "backend": backend,
                    "database": "unavailable",
                }),
            )
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Error starting the HTTP endpoint
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("Failed to start HTTP server on {addr}: {message}")]
    Bind { addr: String, message: String },

    #[error(transparent)]
    DataSource(#[from] DbConfigError),
}

/// Running server: the listener plus the worker pool serving it.
pub struct ServerHandle {
    server: Arc<Server>,
    pool: ThreadPool,
    workers: usize,
}

impl ServerHandle {
    /// Address actually bound (useful when binding port 0).
    pub fn local_addr(&self) -> Option<std::net::SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Blocks until every worker has stopped.
    pub fn join(&self) {
        self.pool.join();
    }

    /// Stops accepting requests and waits for in-flight ones to finish.
    pub fn shutdown(self) {
        for _ in 0..self.workers {
            self.server.unblock();
        }
        self.pool.join();
    }
}

/// Start HTTP endpoint server on `addr` with `workers` request workers.
///
/// `connect` is called once per worker before the listener accepts anything,
/// so a data source that cannot be reached stops startup.
pub fn start_endpoint_server<S, F>(
    addr: &str,
    workers: usize,
    mut connect: F,
) -> Result<ServerHandle, EndpointError>
where
    S: ClimateStore + 'static,
    F: FnMut() -> Result<S, DbConfigError>,
{
    let workers = workers.max(1);

    let mut stores = Vec::with_capacity(workers);
    for _ in 0..workers {
        stores.push(connect()?);
    }

    let server = Server::http(addr).map_err(|e| EndpointError::Bind {
        addr: addr.to_string(),
        message: e.to_string(),
    })?;
    let server = Arc::new(server);

    let pool = ThreadPool::with_name("climate-worker".to_string(), workers);
    for store in stores {
        let server = Arc::clone(&server);
        pool.execute(move || serve_requests(&server, QueryService::new(store)));
    }

    let handle = ServerHandle { server, pool, workers };
    info!(
        addr = %handle.local_addr().map(|a| a.to_string()).unwrap_or_else(|| addr.to_string()),
        workers,
        "📡 HTTP endpoint listening"
    );
    Ok(handle)
}

/// Worker loop: serve requests until the server is unblocked.
fn serve_requests<S: ClimateStore>(server: &Server, mut service: QueryService<S>) {
    for request in server.incoming_requests() {
        let started = Instant::now();
        let method = request.method().clone();
        let url = request.url().to_string();

        let response = handle(&mut service, &method, &url);

        if let Some(message) = &response.error {
            error!(%method, path = %url, status = response.status, error = %message, "request failed");
        }
        info!(
            %method,
            path = %url,
            status = response.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request"
        );

        send(request, response);
    }
}

fn send(request: Request, response: ApiResponse) {
    let status = response.status;
    let mut http = Response::from_data(response.body).with_status_code(StatusCode::from(status));

    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], response.content_type.as_bytes()) {
        http.add_header(header);
    }
    if status == 405 {
        if let Ok(header) = Header::from_bytes(&b"Allow"[..], &b"GET, HEAD"[..]) {
            http.add_header(header);
        }
    }

    if let Err(e) = request.respond(http) {
        warn!(error = %e, "Failed to send response");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
