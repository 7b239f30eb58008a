//! Path router for the assessment API.
//!
//! # Responsibility
//! - Strip the configured base path and dispatch the versioned routes.
//! - Render `NotFound`, validation and internal failures as JSON envelopes
//!   of the shape `{"message": …, "details": {…}}`.
//!
//! # Invariants
//! - `NotFound` maps to 404, a non-integer year to 422, assembly failures to
//!   500. No other status codes are produced.
//! - The router never panics on request input.

use crate::config::normalize_base_path;
use crate::service::lookup_service::{LookupError, LookupService};
use log::{debug, error};
use serde_json::{json, Value};
use std::sync::Arc;

pub const API_NAME: &str = "ASCOR API";
pub const API_VERSION: &str = "v3";
const COUNTRY_METRICS_ROUTE: &str = "country-metrics";

/// Status code plus JSON body, ready for any transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn error(status: u16, message: impl Into<String>, details: Value) -> Self {
        Self {
            status,
            body: json!({
                "message": message.into(),
                "details": details,
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Routes request paths against a shared, immutable lookup service.
#[derive(Debug, Clone)]
pub struct ApiRouter {
    service: Arc<LookupService>,
    base_path: String,
}

impl ApiRouter {
    pub fn new(service: Arc<LookupService>, base_path: &str) -> Self {
        Self {
            service,
            base_path: normalize_base_path(base_path),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Handles one GET request path (query string ignored).
    pub fn handle(&self, path: &str) -> ApiResponse {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let response = match self.strip_base_path(path) {
            Some(route) => self.dispatch(route),
            None => not_found_route(),
        };
        debug!(
            "event=api_request module=api status={} path={:?}",
            response.status, path
        );
        response
    }

    fn strip_base_path<'p>(&self, path: &'p str) -> Option<&'p str> {
        if self.base_path == "/" {
            return Some(path);
        }
        let rest = path.strip_prefix(self.base_path.as_str())?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }

    fn dispatch(&self, route: &str) -> ApiResponse {
        let segments: Vec<&str> = route
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();
        match segments.as_slice() {
            [] => ApiResponse::ok(json!({
                "message": API_NAME,
                "versions": [API_VERSION],
            })),
            [version] if *version == API_VERSION => {
                ApiResponse::ok(json!({ "version": API_VERSION }))
            }
            [version, resource, country, year]
                if *version == API_VERSION && *resource == COUNTRY_METRICS_ROUTE =>
            {
                self.country_metrics(country, year)
            }
            _ => not_found_route(),
        }
    }

    fn country_metrics(&self, raw_country: &str, raw_year: &str) -> ApiResponse {
        let country = match urlencoding::decode(raw_country) {
            Ok(country) => country,
            Err(_) => {
                return ApiResponse::error(
                    422,
                    "country must be valid UTF-8 after percent-decoding",
                    json!({ "field": "country", "value": raw_country }),
                );
            }
        };
        let year = match raw_year.parse::<i32>() {
            Ok(year) => year,
            Err(_) => {
                return ApiResponse::error(
                    422,
                    "assessment_year must be an integer",
                    json!({ "field": "assessment_year", "value": raw_year }),
                );
            }
        };

        match self.service.lookup(&country, year) {
            Ok(document) => match serde_json::to_value(&document) {
                Ok(body) => ApiResponse::ok(body),
                Err(err) => internal_error(&country, year, err.to_string()),
            },
            Err(err @ LookupError::NotFound { .. }) => {
                ApiResponse::error(404, err.to_string(), json!({}))
            }
            Err(err @ LookupError::Assemble(_)) => internal_error(&country, year, err.to_string()),
        }
    }
}

fn internal_error(country: &str, year: i32, message: String) -> ApiResponse {
    error!(
        "event=api_request module=api status=error country={:?} year={} error={}",
        country, year, message
    );
    ApiResponse::error(500, message, json!({}))
}

fn not_found_route() -> ApiResponse {
    ApiResponse::error(404, "Not Found", json!({}))
}
