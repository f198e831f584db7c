//! Gateway configuration from the environment.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::tables::ConsentTables;

pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_COUNTRY_HEADER: &str = "cf-ipcountry";
pub const DEFAULT_REGION_HEADER: &str = "cf-region-code";

/// Top-level gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// HTTP listen port.
    pub port: u16,
    /// Base URL requests are forwarded to (e.g. `http://127.0.0.1:8080`).
    pub origin_url: String,
    /// Operator tables file; built-in tables when unset.
    pub tables_file: Option<PathBuf>,
    /// Honour geolocation headers set by the fronting edge network.
    pub trust_geo_headers: bool,
    /// Header carrying the ISO 3166-1 country code.
    pub country_header: String,
    /// Header carrying the ISO 3166-2 subdivision code.
    pub region_header: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            origin_url: String::new(),
            tables_file: None,
            trust_geo_headers: false,
            country_header: DEFAULT_COUNTRY_HEADER.into(),
            region_header: DEFAULT_REGION_HEADER.into(),
        }
    }
}

impl GatewayConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`GatewayConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match var("PORT") {
            Some(p) => p
                .parse()
                .map_err(|_| Error::Config(format!("invalid PORT: {}", p)))?,
            None => DEFAULT_PORT,
        };

        let origin_url = var("GEOCONSENT_ORIGIN")
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::Config("GEOCONSENT_ORIGIN is not set".into()))?;
        if !(origin_url.starts_with("http://") || origin_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "GEOCONSENT_ORIGIN must be an http(s) URL: {}",
                origin_url
            )));
        }

        let trust_geo_headers = match var("GEOCONSENT_TRUST_GEO_HEADERS") {
            Some(v) => parse_bool(&v).ok_or_else(|| {
                Error::Config(format!("invalid GEOCONSENT_TRUST_GEO_HEADERS: {}", v))
            })?,
            None => false,
        };

        Ok(Self {
            port,
            origin_url,
            tables_file: var("GEOCONSENT_TABLES_FILE").map(PathBuf::from),
            trust_geo_headers,
            country_header: var("GEOCONSENT_COUNTRY_HEADER")
                .unwrap_or_else(|| DEFAULT_COUNTRY_HEADER.into())
                .to_lowercase(),
            region_header: var("GEOCONSENT_REGION_HEADER")
                .unwrap_or_else(|| DEFAULT_REGION_HEADER.into())
                .to_lowercase(),
        })
    }

    /// Load the consent tables this configuration points at.
    pub fn load_tables(&self) -> Result<ConsentTables> {
        match &self.tables_file {
            Some(path) => ConsentTables::load(path),
            None => Ok(ConsentTables::default()),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
