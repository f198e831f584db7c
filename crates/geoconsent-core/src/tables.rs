//! Static jurisdiction configuration: banner policy, EU/EEA membership, debug locations.
//!
//! The tables are built once at start-up (from the built-in defaults or an
//! operator JSON file) and handed to the classifier and interceptor by
//! reference. Nothing here is reloaded while the server runs.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::geo::GeoContext;

/// Policy key shared by every EU/EEA member state.
pub const EU_KEY: &str = "EU";

/// Jurisdictions where the consent banner is shown by default.
const DEFAULT_POLICY: &[(&str, bool)] = &[
    // European Union & European Economic Area (GDPR)
    ("EU", true),
    // United Kingdom (UK DPA)
    ("GB", true),
    // Canada (PIPEDA, Quebec 25)
    ("CA", false),
    // United States
    ("US-CA", true),
    ("US-CO", false),
    ("US-CT", false),
    ("US-DE", false),
    ("US-FL", false),
    ("US-IN", false),
    ("US-MT", false),
    ("US-OR", false),
    ("US-TX", false),
    ("US-UT", false),
    ("US-VA", false),
];

/// EU/EEA country codes treated as GDPR jurisdictions.
const DEFAULT_EU_COUNTRIES: &[&str] = &[
    "AT", "BE", "BG", "HR", "CY", "CZ", "DK", "EE", "FI", "FR", "DE", "GR", "HU", "IE", "IT",
    "LV", "LT", "LU", "MT", "NL", "PL", "PT", "RO", "SK", "SI", "ES", "SE", "IS", "LI", "NO",
];

const DEFAULT_DEBUG_LOCATIONS: &[(&str, &str, &str)] = &[
    ("california", "US", "CA"),
    ("colorado", "US", "CO"),
    ("connecticut", "US", "CT"),
    ("delaware", "US", "DE"),
    ("florida", "US", "FL"),
    ("indiana", "US", "IN"),
    ("montana", "US", "MT"),
    ("oregon", "US", "OR"),
    ("texas", "US", "TX"),
    ("utah", "US", "UT"),
    ("virginia", "US", "VA"),
    ("newyork", "US", "NY"),
    ("eu", "DE", ""),
    ("uk", "GB", ""),
    ("canada", "CA", ""),
];

/// Jurisdiction key → "show the banner here".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JurisdictionPolicy {
    entries: HashMap<String, bool>,
}

impl JurisdictionPolicy {
    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, bool)>,
    {
        Self {
            entries: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Whether the banner is shown for `key`. Absent keys never show it.
    pub fn shows(&self, key: &str) -> bool {
        self.entries.get(key).copied().unwrap_or(false)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Countries whose visitors fall under the shared `EU` policy entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EuCountrySet {
    codes: HashSet<String>,
}

impl EuCountrySet {
    pub fn from_codes<S, I>(codes: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, country: &str) -> bool {
        self.codes.contains(country)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Debug token (lowercase) → simulated location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DebugLocationTable {
    locations: BTreeMap<String, GeoContext>,
}

impl DebugLocationTable {
    /// Build a table; tokens are stored lowercased so lookups are case-insensitive.
    pub fn from_entries<K, I>(entries: I) -> Self
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, GeoContext)>,
    {
        Self {
            locations: entries
                .into_iter()
                .map(|(token, geo)| (token.as_ref().to_lowercase(), geo))
                .collect(),
        }
    }

    pub fn lookup(&self, token: &str) -> Option<&GeoContext> {
        self.locations.get(&token.to_lowercase())
    }

    /// Entries in sorted token order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &GeoContext)> {
        self.locations.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// The three configuration tables, built once and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentTables {
    pub policy: JurisdictionPolicy,
    pub eu_countries: EuCountrySet,
    pub debug_locations: DebugLocationTable,
}

impl Default for ConsentTables {
    fn default() -> Self {
        Self {
            policy: JurisdictionPolicy::from_pairs(DEFAULT_POLICY.iter().copied()),
            eu_countries: EuCountrySet::from_codes(DEFAULT_EU_COUNTRIES.iter().copied()),
            debug_locations: DebugLocationTable::from_entries(
                DEFAULT_DEBUG_LOCATIONS
                    .iter()
                    .map(|(token, country, region)| (*token, GeoContext::new(*country, *region))),
            ),
        }
    }
}

/// On-disk shape of an operator tables file. Omitted sections keep the built-in values.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TablesFile {
    #[serde(default)]
    show_consent_banner_in: Option<JurisdictionPolicy>,
    #[serde(default)]
    eu_countries: Option<EuCountrySet>,
    #[serde(default)]
    debug_locations: Option<HashMap<String, GeoContext>>,
}

impl ConsentTables {
    /// Parse tables from JSON, falling back to the defaults for omitted sections.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: TablesFile = serde_json::from_str(json)?;
        let defaults = Self::default();
        Ok(Self {
            policy: file.show_consent_banner_in.unwrap_or(defaults.policy),
            eu_countries: file.eu_countries.unwrap_or(defaults.eu_countries),
            debug_locations: file
                .debug_locations
                .map(DebugLocationTable::from_entries)
                .unwrap_or(defaults.debug_locations),
        })
    }

    /// Load tables from an operator JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read tables file {}: {}", path.display(), e))
        })?;
        let tables = Self::from_json(&json)?;
        info!(
            "Loaded consent tables from {} ({} policy entries, {} EU countries)",
            path.display(),
            tables.policy.len(),
            tables.eu_countries.len()
        );
        Ok(tables)
    }
}
