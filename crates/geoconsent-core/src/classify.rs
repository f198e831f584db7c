//! Jurisdiction classifier — (country, region) → "hide the consent banner".
//!
//! Rules are tried in [`RULES`] order and the first whose predicate matches
//! decides. A matched rule whose policy key is absent still decides (hide);
//! it never falls through to a lower-priority rule.

use std::fmt;

use crate::tables::{EuCountrySet, JurisdictionPolicy, EU_KEY};

/// Outcome of classification, serialized into the decision cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decision {
    pub hide: bool,
}

impl Decision {
    pub const HIDE: Decision = Decision { hide: true };
    pub const SHOW: Decision = Decision { hide: false };

    /// Cookie/header representation. Client code compares these strings verbatim.
    pub fn as_str(&self) -> &'static str {
        if self.hide {
            "true"
        } else {
            "false"
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classification rule, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// US visitor with a known state: key `US-<region>`.
    UsState,
    /// EU/EEA member: key `EU`.
    EuMember,
    /// Country with its own policy entry.
    Country,
    /// Nothing matched: hide.
    Default,
}

/// Precedence order: state > EU > country > default.
pub const RULES: [Rule; 4] = [Rule::UsState, Rule::EuMember, Rule::Country, Rule::Default];

impl Rule {
    /// The policy key this rule consults, if its predicate matches.
    /// `Default` matches everything but consults no key.
    pub fn policy_key(
        &self,
        country: &str,
        region: &str,
        policy: &JurisdictionPolicy,
        eu: &EuCountrySet,
    ) -> Option<Option<String>> {
        match self {
            Rule::UsState if country == "US" && !region.is_empty() => {
                Some(Some(format!("US-{}", region)))
            }
            Rule::EuMember if eu.contains(country) => Some(Some(EU_KEY.to_string())),
            Rule::Country if policy.contains(country) => Some(Some(country.to_string())),
            Rule::Default => Some(None),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Rule::UsState => "us-state",
            Rule::EuMember => "eu-member",
            Rule::Country => "country",
            Rule::Default => "default",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify and report which rule decided.
///
/// Codes are compared as given (uppercase ISO codes from the edge metadata or
/// the debug table); no normalization happens here.
pub fn classify_with_rule(
    country: &str,
    region: &str,
    policy: &JurisdictionPolicy,
    eu: &EuCountrySet,
) -> (Decision, Rule) {
    for rule in RULES {
        if let Some(key) = rule.policy_key(country, region, policy, eu) {
            let hide = match key {
                Some(key) => !policy.shows(&key),
                None => true,
            };
            return (Decision { hide }, rule);
        }
    }
    (Decision::HIDE, Rule::Default)
}

/// Decide whether the consent banner should be hidden for a visitor.
pub fn classify(
    country: &str,
    region: &str,
    policy: &JurisdictionPolicy,
    eu: &EuCountrySet,
) -> Decision {
    classify_with_rule(country, region, policy, eu).0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::ConsentTables;

    fn eu() -> EuCountrySet {
        ConsentTables::default().eu_countries
    }

    #[test]
    fn test_decision_strings() {
        assert_eq!(Decision::HIDE.as_str(), "true");
        assert_eq!(Decision::SHOW.as_str(), "false");
        assert_eq!(Decision::SHOW.to_string(), "false");
    }

    #[test]
    fn test_eu_country_shows_when_eu_enabled() {
        let policy = JurisdictionPolicy::from_pairs([("EU", true)]);
        let (decision, rule) = classify_with_rule("FR", "", &policy, &eu());
        assert_eq!(decision.as_str(), "false");
        assert_eq!(rule, Rule::EuMember);
    }

    #[test]
    fn test_us_state_with_entry() {
        let policy = JurisdictionPolicy::from_pairs([("US-CA", true)]);
        assert_eq!(classify("US", "CA", &policy, &eu()).as_str(), "false");
    }

    #[test]
    fn test_us_state_without_entry_hides() {
        let policy = JurisdictionPolicy::from_pairs([("US-CA", true)]);
        let (decision, rule) = classify_with_rule("US", "NY", &policy, &eu());
        assert_eq!(decision.as_str(), "true");
        assert_eq!(rule, Rule::UsState);
    }

    #[test]
    fn test_us_state_ignores_country_level_entry() {
        let policy = JurisdictionPolicy::from_pairs([("US", true)]);
        for region in ["NY", "TX", "WA", "CA"] {
            assert_eq!(classify("US", region, &policy, &eu()), Decision::HIDE);
        }
        // Without a region the country rule applies.
        assert_eq!(classify("US", "", &policy, &eu()), Decision::SHOW);
    }

    #[test]
    fn test_eu_ignores_per_country_entry() {
        let policy = JurisdictionPolicy::from_pairs([("EU", false), ("FR", true), ("DE", true)]);
        for country in ["FR", "DE", "IT", "NO"] {
            assert_eq!(classify(country, "", &policy, &eu()), Decision::HIDE);
        }

        let policy = JurisdictionPolicy::from_pairs([("EU", true), ("FR", false)]);
        assert_eq!(classify("FR", "", &policy, &eu()), Decision::SHOW);
    }

    #[test]
    fn test_eu_without_entry_hides() {
        let policy = JurisdictionPolicy::from_pairs([("FR", true)]);
        let (decision, rule) = classify_with_rule("FR", "", &policy, &eu());
        assert_eq!(decision, Decision::HIDE);
        assert_eq!(rule, Rule::EuMember);
    }

    #[test]
    fn test_country_entry() {
        let tables = ConsentTables::default();
        let (decision, rule) = classify_with_rule("GB", "", &tables.policy, &tables.eu_countries);
        assert_eq!(decision, Decision::SHOW);
        assert_eq!(rule, Rule::Country);

        // Present but false still hides.
        assert_eq!(
            classify("CA", "", &tables.policy, &tables.eu_countries),
            Decision::HIDE
        );
    }

    #[test]
    fn test_unlisted_countries_hide() {
        let tables = ConsentTables::default();
        for country in ["JP", "AU", "BR", "CH", "ZZ", "", "fr"] {
            let (decision, rule) =
                classify_with_rule(country, "", &tables.policy, &tables.eu_countries);
            assert_eq!(decision, Decision::HIDE, "country {:?}", country);
            assert_eq!(rule, Rule::Default);
        }
    }

    #[test]
    fn test_region_ignored_outside_us() {
        let tables = ConsentTables::default();
        // A region outside the US never consults a state key.
        assert_eq!(
            classify("GB", "ENG", &tables.policy, &tables.eu_countries),
            Decision::SHOW
        );
        assert_eq!(
            classify("CA", "QC", &tables.policy, &tables.eu_countries),
            Decision::HIDE
        );
    }

    #[test]
    fn test_default_tables_us_states() {
        let tables = ConsentTables::default();
        assert_eq!(
            classify("US", "CA", &tables.policy, &tables.eu_countries),
            Decision::SHOW
        );
        for state in ["CO", "CT", "DE", "FL", "IN", "MT", "OR", "TX", "UT", "VA", "NY"] {
            assert_eq!(
                classify("US", state, &tables.policy, &tables.eu_countries),
                Decision::HIDE,
                "state {}",
                state
            );
        }
    }

    #[test]
    fn test_rule_order() {
        assert_eq!(RULES[0], Rule::UsState);
        assert_eq!(RULES[RULES.len() - 1], Rule::Default);
    }
}
