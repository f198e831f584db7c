//! geoconsent core — jurisdiction tables, banner classification, geolocation context.

pub mod classify;
pub mod config;
pub mod error;
pub mod geo;
pub mod tables;

pub use classify::{classify, classify_with_rule, Decision, Rule, RULES};
pub use config::GatewayConfig;
pub use error::{Error, Result};
pub use geo::GeoContext;
pub use tables::{ConsentTables, DebugLocationTable, EuCountrySet, JurisdictionPolicy};
