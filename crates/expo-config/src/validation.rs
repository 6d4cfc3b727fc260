//! Validation tuning.

use expo_core::validation::{DEFAULT_WEIGHT_TOLERANCE, ValidationRules};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

const fn default_weight_tolerance() -> f64 {
    DEFAULT_WEIGHT_TOLERANCE
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidationConfig {
    /// Absolute tolerance when checking that weights sum to 1.0.
    #[serde(default = "default_weight_tolerance")]
    pub weight_tolerance: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            weight_tolerance: default_weight_tolerance(),
        }
    }
}

impl ValidationConfig {
    /// Build the rule set, rejecting negative or non-finite tolerances.
    pub fn rules(&self) -> Result<ValidationRules, ConfigError> {
        if !self.weight_tolerance.is_finite() || self.weight_tolerance < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "validation.weight_tolerance".into(),
                reason: format!("must be a finite value >= 0, got {}", self.weight_tolerance),
            });
        }
        Ok(ValidationRules::new(self.weight_tolerance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tolerance_builds_rules() {
        let rules = ValidationConfig::default().rules().unwrap();
        assert!(rules.sums_to_one([0.6, 0.4]));
    }

    #[test]
    fn negative_tolerance_rejected() {
        let config = ValidationConfig {
            weight_tolerance: -1.0,
        };
        assert!(config.rules().is_err());
    }
}
