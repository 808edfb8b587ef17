use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a variation is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariationStrategy {
    /// Ask the generative backend, falling back to groove_preserve.
    #[default]
    #[serde(alias = "gemini")]
    Generative,
    GroovePreserve,
    Humanize,
    Mutate,
    Densify,
    Simplify,
    Shift,
    /// Light humanize plus a random mix of other transforms.
    Random,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown variation strategy '{0}' (expected one of: {names})", names = VariationStrategy::names().join(", "))]
pub struct UnknownStrategy(pub String);

impl VariationStrategy {
    pub const ALL: [VariationStrategy; 8] = [
        VariationStrategy::Generative,
        VariationStrategy::GroovePreserve,
        VariationStrategy::Humanize,
        VariationStrategy::Mutate,
        VariationStrategy::Densify,
        VariationStrategy::Simplify,
        VariationStrategy::Shift,
        VariationStrategy::Random,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VariationStrategy::Generative => "generative",
            VariationStrategy::GroovePreserve => "groove_preserve",
            VariationStrategy::Humanize => "humanize",
            VariationStrategy::Mutate => "mutate",
            VariationStrategy::Densify => "densify",
            VariationStrategy::Simplify => "simplify",
            VariationStrategy::Shift => "shift",
            VariationStrategy::Random => "random",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|s| s.as_str()).collect()
    }
}

impl fmt::Display for VariationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariationStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase().replace('-', "_");
        if name == "gemini" {
            return Ok(VariationStrategy::Generative);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.as_str() == name)
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}

/// Per-request knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariationParams {
    /// Variation intensity, 0.0-1.0.
    pub spice: f32,
    /// Sampling temperature for the generative backend.
    pub temperature: f32,
}

impl Default for VariationParams {
    fn default() -> Self {
        Self {
            spice: 0.5,
            temperature: 0.7,
        }
    }
}

impl VariationParams {
    /// Multiplier applied to algorithmic defaults; 1.0 at the default spice.
    pub fn spice_factor(&self) -> f64 {
        0.5 + f64::from(self.spice.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        for strategy in VariationStrategy::ALL {
            assert_eq!(strategy.as_str().parse::<VariationStrategy>(), Ok(strategy));
        }
        assert_eq!("gemini".parse(), Ok(VariationStrategy::Generative));
        assert_eq!("Groove-Preserve".parse(), Ok(VariationStrategy::GroovePreserve));
    }

    #[test]
    fn test_unknown_strategy() {
        let err = "wobble".parse::<VariationStrategy>().unwrap_err();
        assert_eq!(err, UnknownStrategy("wobble".to_string()));
        assert!(err.to_string().contains("groove_preserve"));
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&VariationStrategy::GroovePreserve).unwrap();
        assert_eq!(json, "\"groove_preserve\"");
        let back: VariationStrategy = serde_json::from_str("\"shift\"").unwrap();
        assert_eq!(back, VariationStrategy::Shift);
        let alias: VariationStrategy = serde_json::from_str("\"gemini\"").unwrap();
        assert_eq!(alias, VariationStrategy::Generative);
        assert!(serde_json::from_str::<VariationStrategy>("\"wobble\"").is_err());
    }

    #[test]
    fn test_spice_factor() {
        let mut params = VariationParams::default();
        assert_eq!(params.spice_factor(), 1.0);
        params.spice = 0.0;
        assert_eq!(params.spice_factor(), 0.5);
        params.spice = 4.0;
        assert_eq!(params.spice_factor(), 1.5);
    }
}
