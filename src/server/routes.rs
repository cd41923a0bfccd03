//! HTTP Routes
//!
//! Maps request paths onto [`StatsService`] calls and renders JSON bodies.

use chrono::Utc;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Method, Response, StatusCode};
use serde::Serialize;
use tracing::error;

use crate::domain::ports::StatusCount;
use crate::stats::StatsService;

/// Service name reported by the health endpoint.
pub const SERVICE_NAME: &str = "monitoring-service";

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    service: &'static str,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct StatusBreakdownBody {
    success: bool,
    data: Vec<StatusCount>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

/// Route a request to its handler.
pub async fn handle(service: &StatsService, method: &Method, path: &str) -> Response<Full<Bytes>> {
    let known = matches!(
        path,
        "/health" | "/stats/global" | "/stats/submissions-status" | "/metrics"
    );
    if known && *method != Method::GET {
        return error_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    }

    match path {
        "/health" => health(),
        "/stats/global" => global_stats(service).await,
        "/stats/submissions-status" => status_breakdown(service).await,
        "/metrics" => metrics(service),
        _ => error_response(StatusCode::NOT_FOUND, "Not Found"),
    }
}

fn health() -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &HealthBody {
            status: "healthy",
            service: SERVICE_NAME,
            timestamp: Utc::now().to_rfc3339(),
        },
    )
}

async fn global_stats(service: &StatsService) -> Response<Full<Bytes>> {
    match service.global_stats().await {
        Ok(snapshot) => json_response(StatusCode::OK, &snapshot),
        Err(e) => {
            error!(error = %e, "Global statistics request failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

async fn status_breakdown(service: &StatsService) -> Response<Full<Bytes>> {
    match service.status_breakdown().await {
        Ok(data) => json_response(
            StatusCode::OK,
            &StatusBreakdownBody {
                success: true,
                data,
            },
        ),
        Err(e) => {
            error!(error = %e, "Status breakdown request failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

fn metrics(service: &StatsService) -> Response<Full<Bytes>> {
    match service.metrics().encode() {
        Ok((content_type, body)) => {
            let content_type = HeaderValue::from_str(&content_type)
                .unwrap_or_else(|_| HeaderValue::from_static(PROMETHEUS_CONTENT_TYPE));
            response(StatusCode::OK, content_type, Bytes::from(body))
        }
        Err(e) => {
            error!(error = %e, "Metrics encoding failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(bytes) => response(
            status,
            HeaderValue::from_static("application/json"),
            Bytes::from(bytes),
        ),
        Err(e) => {
            error!(error = %e, "Response serialization failed");
            response(
                StatusCode::INTERNAL_SERVER_ERROR,
                HeaderValue::from_static("application/json"),
                Bytes::from_static(br#"{"detail":"Internal Error"}"#),
            )
        }
    }
}

fn error_response(status: StatusCode, detail: &str) -> Response<Full<Bytes>> {
    json_response(
        status,
        &ErrorBody {
            detail: detail.to_string(),
        },
    )
}

fn response(status: StatusCode, content_type: HeaderValue, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, content_type);
    response
}
