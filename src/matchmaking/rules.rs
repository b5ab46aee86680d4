//! Game rule parsing and validation
//!
//! Rules arrive as a JSON document inside the `Rules` message. An omitted
//! `alliance` block defaults to all zeros (the match builder then falls
//! back to two-player matches), but an explicit `null` is rejected.

use crate::error::RulesError;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameRules {
    #[serde(rename = "shipCountMin")]
    pub ship_count_min: u32,

    #[serde(rename = "shipCountMax")]
    pub ship_count_max: u32,

    #[serde(rename = "autoBackfill", alias = "auto_backfill")]
    pub auto_backfill: bool,

    pub alliance: Option<AllianceRule>,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            ship_count_min: 0,
            ship_count_max: 0,
            auto_backfill: false,
            alliance: Some(AllianceRule::default()),
        }
    }
}

/// Team count and per-team player count bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AllianceRule {
    #[serde(rename = "minNumber", alias = "min_number")]
    pub min_number: u32,

    #[serde(rename = "maxNumber", alias = "max_number")]
    pub max_number: u32,

    #[serde(rename = "playerMinNumber", alias = "player_min_number")]
    pub player_min_number: u32,

    #[serde(rename = "playerMaxNumber", alias = "player_max_number")]
    pub player_max_number: u32,
}

impl GameRules {
    /// Parse and validate a rules document. An empty string reads as `{}`,
    /// which yields the defaults.
    pub fn from_json(json: &str) -> Result<Self, RulesError> {
        let raw = if json.trim().is_empty() { "{}" } else { json };
        let rules: GameRules = serde_json::from_str(raw)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), RulesError> {
        let Some(alliance) = self.alliance else {
            return Err(RulesError::Validation(
                "alliance rule is required".to_string(),
            ));
        };
        if alliance.max_number < alliance.min_number {
            return Err(RulesError::Validation(
                "alliance rule MaxNumber is less than MinNumber".to_string(),
            ));
        }
        if alliance.player_max_number < alliance.player_min_number {
            return Err(RulesError::Validation(
                "alliance rule PlayerMaxNumber is less than PlayerMinNumber".to_string(),
            ));
        }
        if self.ship_count_max < self.ship_count_min {
            return Err(RulesError::Validation(
                "ShipCountMax is less than ShipCountMin".to_string(),
            ));
        }
        Ok(())
    }

    /// Player-count bounds for a match derived from the alliance rule.
    ///
    /// An all-zero alliance means the pool runs unconstrained two-player
    /// matches. A non-zero ship count range scales the minimum only; the
    /// maximum stays at the alliance-derived value.
    pub fn player_bounds(&self) -> (usize, usize) {
        let alliance = self.alliance.unwrap_or_default();
        let mut min = alliance.min_number * alliance.player_min_number;
        let mut max = alliance.max_number * alliance.player_max_number;
        if min == 0 && max == 0 {
            min = 2;
            max = 2;
        }
        if self.ship_count_min != 0 {
            min *= self.ship_count_min;
        }
        if self.ship_count_max != 0 {
            min *= self.ship_count_max;
        }
        (min as usize, max as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_yields_defaults() {
        let rules = GameRules::from_json("").unwrap();
        assert_eq!(rules.alliance, Some(AllianceRule::default()));
        assert!(!rules.auto_backfill);
        assert_eq!(rules.player_bounds(), (2, 2));
    }

    #[test]
    fn test_omitted_alliance_defaults_to_zeros() {
        let rules = GameRules::from_json(r#"{"shipCountMin": 0}"#).unwrap();
        assert_eq!(rules.alliance, Some(AllianceRule::default()));
    }

    #[test]
    fn test_explicit_null_alliance_rejected() {
        let err = GameRules::from_json(r#"{"alliance": null}"#).unwrap_err();
        assert!(matches!(err, RulesError::Validation(_)));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = GameRules::from_json("{not json").unwrap_err();
        assert!(matches!(err, RulesError::Parse(_)));
    }

    #[test]
    fn test_inverted_alliance_bounds_rejected() {
        let err = GameRules::from_json(
            r#"{"alliance": {"minNumber": 3, "maxNumber": 2, "playerMinNumber": 1, "playerMaxNumber": 1}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("MaxNumber is less than MinNumber"));

        let err = GameRules::from_json(
            r#"{"alliance": {"minNumber": 1, "maxNumber": 2, "playerMinNumber": 4, "playerMaxNumber": 2}}"#,
        )
        .unwrap_err();
        assert!(
            err.to_string()
                .contains("PlayerMaxNumber is less than PlayerMinNumber")
        );
    }

    #[test]
    fn test_inverted_ship_count_rejected() {
        let err = GameRules::from_json(r#"{"shipCountMin": 5, "shipCountMax": 2}"#).unwrap_err();
        assert!(
            err.to_string()
                .contains("ShipCountMax is less than ShipCountMin")
        );
    }

    #[test]
    fn test_player_bounds_from_alliance() {
        let rules = GameRules::from_json(
            r#"{"alliance": {"minNumber": 2, "maxNumber": 3, "playerMinNumber": 1, "playerMaxNumber": 2}}"#,
        )
        .unwrap();
        assert_eq!(rules.player_bounds(), (2, 6));
    }

    #[test]
    fn test_ship_counts_scale_the_minimum_only() {
        let rules = GameRules::from_json(
            r#"{
                "shipCountMin": 2,
                "shipCountMax": 3,
                "alliance": {"minNumber": 1, "maxNumber": 2, "playerMinNumber": 1, "playerMaxNumber": 4}
            }"#,
        )
        .unwrap();
        // min = 1*1 * 2 * 3 = 6, max stays 2*4 = 8
        assert_eq!(rules.player_bounds(), (6, 8));
    }

    #[test]
    fn test_auto_backfill_parsed() {
        let rules = GameRules::from_json(r#"{"autoBackfill": true}"#).unwrap();
        assert!(rules.auto_backfill);
    }
}
