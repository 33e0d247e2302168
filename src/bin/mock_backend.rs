//! Mock alert backend
//!
//! Simulates the external safety backend for local testing.
//!
//! Endpoints:
//! - POST /api/send_alert/  - logs the alert, responds {"status":"ok"}
//! - POST /api/sos/         - logs the SOS, responds {"status":"ok"}
//! - POST /api/geoevents/   - logs the event, responds {"status":"ok"}
//! - GET  /api/get_alerts/  - returns the alerts received so far
//! - GET  /api/destinations, /api/itineraries - canned JSON
//!
//! Usage:
//!   cargo run --bin mock-backend -- --port 9090

use clap::Parser;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mock-backend")]
#[command(about = "Mock safety backend for local zonewatch testing")]
struct Args {
    /// TCP port to listen on
    #[arg(short, long, default_value = "9090")]
    port: u16,
}

/// Alerts received since startup, newest last
type AlertStore = Arc<Mutex<Vec<serde_json::Value>>>;

async fn handle_request(
    req: Request<Incoming>,
    alerts: AlertStore,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = match (&method, path.as_str()) {
        (&Method::POST, "/api/send_alert/") | (&Method::POST, "/api/sos/") => {
            match read_json_body(req).await {
                Ok(body) => {
                    info!(
                        path = %path,
                        reason = %body.get("reason").and_then(|v| v.as_str()).unwrap_or("?"),
                        message = %body.get("message").and_then(|v| v.as_str()).unwrap_or(""),
                        "alert_received"
                    );
                    alerts.lock().push(body);
                    ok_json(r#"{"status":"ok"}"#)
                }
                Err(response) => response,
            }
        }
        (&Method::POST, "/api/geoevents/") => match read_json_body(req).await {
            Ok(body) => {
                info!(
                    kind = %body.get("kind").and_then(|v| v.as_str()).unwrap_or("?"),
                    fence = %body.get("fence_name").and_then(|v| v.as_str()).unwrap_or(""),
                    "geoevent_received"
                );
                ok_json(r#"{"status":"ok"}"#)
            }
            Err(response) => response,
        },
        (&Method::GET, "/api/get_alerts/") => {
            let snapshot = alerts.lock().clone();
            ok_json(&serde_json::Value::Array(snapshot).to_string())
        }
        (&Method::GET, "/api/destinations") => ok_json(
            r#"[{"id":1,"name":"Marina Beach","safety_score":78},{"id":2,"name":"Fort District","safety_score":64}]"#,
        ),
        (&Method::GET, "/api/itineraries") => ok_json(
            r#"[{"id":1,"destination_id":1,"days":2,"notes":"Stay in patrolled areas after dark"}]"#,
        ),
        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("not found")))
            .expect("static response should not fail"),
    };

    Ok(response)
}

async fn read_json_body(
    req: Request<Incoming>,
) -> Result<serde_json::Value, Response<Full<Bytes>>> {
    let bytes = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(error = %e, "body_read_failed");
            return Err(Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .body(Full::new(Bytes::from("bad body")))
                .expect("static response should not fail"));
        }
    };

    serde_json::from_slice(&bytes).map_err(|e| {
        warn!(error = %e, "body_parse_failed");
        Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .body(Full::new(Bytes::from("invalid json")))
            .expect("static response should not fail")
    })
}

fn ok_json(body: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .expect("static response should not fail")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = TcpListener::bind(addr).await?;
    let alerts: AlertStore = Arc::new(Mutex::new(Vec::new()));

    info!(port = %args.port, "mock_backend_started");

    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let io = TokioIo::new(stream);
                let alerts = alerts.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        let alerts = alerts.clone();
                        async move { handle_request(req, alerts).await }
                    });

                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        error!(error = %e, "http_connection_error");
                    }
                });
            }
            Err(e) => {
                error!(error = %e, "accept_error");
            }
        }
    }
}
