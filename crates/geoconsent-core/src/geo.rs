//! Per-request geolocation context.

use serde::{Deserialize, Serialize};

use crate::tables::DebugLocationTable;

/// Country assumed when the edge attaches no geolocation metadata.
pub const FALLBACK_COUNTRY: &str = "US";

/// Resolved visitor location: ISO 3166-1 country and optional ISO 3166-2 subdivision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoContext {
    pub country: String,
    #[serde(default)]
    pub region: String,
}

impl GeoContext {
    pub fn new(country: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            region: region.into(),
        }
    }

    /// Build from edge metadata. Missing country falls back to `US`, missing region to empty.
    pub fn from_metadata(country: Option<&str>, region: Option<&str>) -> Self {
        let country = country
            .filter(|c| !c.is_empty())
            .unwrap_or(FALLBACK_COUNTRY);
        Self::new(country, region.unwrap_or(""))
    }

    /// `COUNTRY` or `COUNTRY-REGION`, as reported in diagnostic headers.
    pub fn location_label(&self) -> String {
        if self.region.is_empty() {
            self.country.clone()
        } else {
            format!("{}-{}", self.country, self.region)
        }
    }
}

/// Pick the location for a request: a recognised debug token overrides the metadata.
pub fn resolve(
    debug_token: Option<&str>,
    metadata: GeoContext,
    debug_locations: &DebugLocationTable,
) -> GeoContext {
    debug_token
        .and_then(|token| debug_locations.lookup(token))
        .cloned()
        .unwrap_or(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::ConsentTables;

    #[test]
    fn test_from_metadata_defaults() {
        assert_eq!(GeoContext::from_metadata(None, None), GeoContext::new("US", ""));
        assert_eq!(GeoContext::from_metadata(Some(""), Some("")), GeoContext::new("US", ""));
        assert_eq!(
            GeoContext::from_metadata(Some("FR"), None),
            GeoContext::new("FR", "")
        );
        assert_eq!(
            GeoContext::from_metadata(Some("US"), Some("CA")),
            GeoContext::new("US", "CA")
        );
    }

    #[test]
    fn test_location_label() {
        assert_eq!(GeoContext::new("DE", "").location_label(), "DE");
        assert_eq!(GeoContext::new("US", "TX").location_label(), "US-TX");
    }

    #[test]
    fn test_resolve_debug_overrides_metadata() {
        let tables = ConsentTables::default();
        let actual = GeoContext::new("FR", "");

        let geo = resolve(Some("Texas"), actual.clone(), &tables.debug_locations);
        assert_eq!(geo, GeoContext::new("US", "TX"));

        let geo = resolve(Some("nowhere"), actual.clone(), &tables.debug_locations);
        assert_eq!(geo, actual);

        let geo = resolve(None, actual.clone(), &tables.debug_locations);
        assert_eq!(geo, actual);
    }
}
