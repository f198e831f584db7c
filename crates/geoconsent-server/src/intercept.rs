//! Request interceptor — decides the consent-banner cookie for HTML responses.
//!
//! Flow per request: static-asset bypass, origin fetch, non-HTML bypass,
//! existing-cookie bypass, then classify and attach `Set-Cookie` (plus
//! diagnostic headers in debug environments). One origin fetch per request.

use axum::body::Body;
use axum::extract::Query;
use axum::http::header::{CONTENT_TYPE, COOKIE, HOST, SET_COOKIE};
use axum::http::uri::Authority;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request, Response, Uri};
use geoconsent_core::geo::{self, GeoContext};
use geoconsent_core::{classify_with_rule, Decision, Result};
use tracing::{debug, trace, warn};

use crate::state::AppState;

/// Decision cookie read by the client-side banner script.
pub const DECISION_COOKIE: &str = "tu-geoip-hide";

/// Query parameter that simulates a visitor location.
pub const DEBUG_PARAM: &str = "termageddon-usercentrics-debug";

pub const LOCATION_HEADER: HeaderName = HeaderName::from_static("x-tu-location");
pub const HIDE_HEADER: HeaderName = HeaderName::from_static("x-tu-hide");
pub const DEBUG_LOCATION_HEADER: HeaderName = HeaderName::from_static("x-tu-debug-location");

const STATIC_EXTENSIONS: &[&str] = &[
    ".css", ".js", ".jpg", ".jpeg", ".png", ".gif", ".svg", ".woff", ".woff2", ".ttf", ".otf",
    ".eot", ".ico", ".webp", ".mp4", ".pdf", ".zip",
];

/// Hostname fragments that mark staging/local deployments.
const DEBUG_HOST_MARKERS: &[&str] = &["staging.", "stg.", ".local", ".localhost"];

/// Whether `path` names a static asset that never needs a decision.
pub fn is_static_asset(path: &str) -> bool {
    let path = path.to_lowercase();
    STATIC_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Substring match, so `text/html; charset=utf-8` counts.
pub fn is_html(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.contains("text/html"))
}

/// Presence check only: any `Cookie` header containing `tu-geoip-hide=`.
///
/// This is a plain substring test, so a cookie such as `other-tu-geoip-hide=1`
/// also counts, and a stale value is never corrected.
pub fn has_decision_cookie(headers: &HeaderMap) -> bool {
    let needle = format!("{}=", DECISION_COOKIE);
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.contains(&needle))
}

pub fn is_debug_host(host: &str) -> bool {
    let host = host.to_lowercase();
    DEBUG_HOST_MARKERS.iter().any(|marker| host.contains(marker))
}

/// First value of the debug query parameter, URL-decoded. `Some("")` when present but empty.
pub fn debug_token(uri: &Uri) -> Option<String> {
    let Query(params) = Query::<Vec<(String, String)>>::try_from_uri(uri).ok()?;
    params
        .into_iter()
        .find(|(name, _)| name == DEBUG_PARAM)
        .map(|(_, value)| value)
}

/// Request hostname without port, from `Host` or the URI authority.
pub fn request_host(request: &Request<Body>) -> String {
    request
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<Authority>().ok())
        .map(|a| a.host().to_string())
        .or_else(|| request.uri().host().map(str::to_string))
        .unwrap_or_default()
}

/// Location attached by the fronting edge network, if the operator trusts it.
/// Untrusted or absent metadata resolves to `US` with no region.
pub fn edge_geo(state: &AppState, headers: &HeaderMap) -> GeoContext {
    if !state.config.trust_geo_headers {
        return GeoContext::from_metadata(None, None);
    }
    GeoContext::from_metadata(
        header_str(headers, &state.config.country_header),
        header_str(headers, &state.config.region_header),
    )
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
}

/// Headers to add to an HTML response once a decision is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMutation {
    pub set_cookie: String,
    pub diagnostics: Vec<(HeaderName, String)>,
}

impl ResponseMutation {
    pub fn new(
        decision: Decision,
        geo: &GeoContext,
        debug_environment: bool,
        debug_token: Option<&str>,
    ) -> Self {
        let mut diagnostics = Vec::new();
        if debug_environment {
            diagnostics.push((LOCATION_HEADER, geo.location_label()));
            diagnostics.push((HIDE_HEADER, decision.as_str().to_string()));
            if let Some(token) = debug_token.filter(|t| !t.is_empty()) {
                diagnostics.push((DEBUG_LOCATION_HEADER, token.to_string()));
            }
        }
        Self {
            set_cookie: decision_cookie(decision),
            diagnostics,
        }
    }

    /// Append the cookie and overwrite any diagnostic headers from the origin.
    pub fn apply(self, headers: &mut HeaderMap) {
        match HeaderValue::from_str(&self.set_cookie) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(e) => warn!("Invalid Set-Cookie value {:?}: {}", self.set_cookie, e),
        }
        for (name, value) in self.diagnostics {
            match HeaderValue::from_str(&value) {
                Ok(value) => {
                    headers.insert(name, value);
                }
                Err(_) => debug!("Skipping {} header with unencodable value", name),
            }
        }
    }
}

/// Session cookie: no `Max-Age`/`Expires`.
pub fn decision_cookie(decision: Decision) -> String {
    format!(
        "{}={}; Path=/; SameSite=Lax; Secure",
        DECISION_COOKIE,
        decision.as_str()
    )
}

/// Run one request through the interceptor. Only origin failures are returned as errors.
pub async fn intercept(state: &AppState, request: Request<Body>) -> Result<Response<Body>> {
    if is_static_asset(request.uri().path()) {
        trace!("Static asset, passing through: {}", request.uri().path());
        return state.origin.fetch(request).await;
    }

    let uri = request.uri().clone();
    let host = request_host(&request);
    let already_decided = has_decision_cookie(request.headers());
    let edge_location = edge_geo(state, request.headers());

    let mut response = state.origin.fetch(request).await?;

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    if !is_html(content_type) {
        trace!("Non-HTML response, passing through: {}", uri.path());
        return Ok(response);
    }

    let token = debug_token(&uri);
    let debug_environment = token.is_some() || is_debug_host(&host);

    if already_decided {
        trace!("Decision cookie already present: {}", uri.path());
        return Ok(response);
    }

    let location = geo::resolve(
        token.as_deref(),
        edge_location,
        &state.tables.debug_locations,
    );
    let (decision, rule) = classify_with_rule(
        &location.country,
        &location.region,
        &state.tables.policy,
        &state.tables.eu_countries,
    );
    debug!(
        location = %location.location_label(),
        rule = %rule,
        hide = decision.hide,
        debug_env = debug_environment,
        "Consent banner decision for {}",
        uri.path()
    );

    ResponseMutation::new(decision, &location, debug_environment, token.as_deref())
        .apply(response.headers_mut());
    Ok(response)
}
