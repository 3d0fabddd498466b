//! Carrier service-level tokens.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A provider service-level token such as `usps_ground_advantage`.
///
/// Rates are filtered by comparing this token with each rate's
/// `servicelevel.extended_token`. Comparison is exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceLevelToken(String);

impl ServiceLevelToken {
    /// USPS Ground Advantage, the only tier shipments are booked on.
    pub const USPS_GROUND_ADVANTAGE: &'static str = "usps_ground_advantage";

    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn usps_ground_advantage() -> Self {
        Self::new(Self::USPS_GROUND_ADVANTAGE)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable name, as carriers advertise the service.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self.0.as_str() {
            Self::USPS_GROUND_ADVANTAGE => "USPS Ground Advantage",
            other => other,
        }
    }

    /// Whether a rate's extended token names this service level.
    #[must_use]
    pub fn matches(&self, extended_token: Option<&str>) -> bool {
        extended_token == Some(self.0.as_str())
    }
}

impl Default for ServiceLevelToken {
    fn default() -> Self {
        Self::usps_ground_advantage()
    }
}

impl fmt::Display for ServiceLevelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_ground_advantage() {
        assert_eq!(
            ServiceLevelToken::default().as_str(),
            "usps_ground_advantage"
        );
    }

    #[test]
    fn test_matches_exact_token_only() {
        let token = ServiceLevelToken::usps_ground_advantage();
        assert!(token.matches(Some("usps_ground_advantage")));
        assert!(!token.matches(Some("usps_priority")));
        assert!(!token.matches(Some("USPS_GROUND_ADVANTAGE")));
        assert!(!token.matches(None));
    }

    #[test]
    fn test_display_name() {
        assert_eq!(
            ServiceLevelToken::usps_ground_advantage().display_name(),
            "USPS Ground Advantage"
        );
        assert_eq!(
            ServiceLevelToken::new("ups_ground").display_name(),
            "ups_ground"
        );
    }
}
