//! Experience configuration
//!
//! Immutable tuning handed to the phase controller and evasion engine at
//! construction. Defaults mirror [`crate::consts`]; a JSON document may
//! override any subset of fields.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Size;
use crate::consts::*;

/// Config loading/validation failure
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// When the automatic phase transitions fire, measured from session start
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhaseTimings {
    /// Intro -> Greeting (ms)
    pub greeting_at_ms: f64,
    /// Greeting -> Prompt (ms)
    pub prompt_at_ms: f64,
}

impl Default for PhaseTimings {
    fn default() -> Self {
        Self {
            greeting_at_ms: GREETING_AT_MS,
            prompt_at_ms: PROMPT_AT_MS,
        }
    }
}

/// Evasion search tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EvasionConfig {
    /// Pointer distance that counts as "about to catch it" (px)
    pub danger_radius: f32,
    /// Margin kept from every viewport edge (px)
    pub safe_padding: f32,
    /// Minimum center distance from the anchor element (px)
    pub min_dist_from_anchor: f32,
    /// Minimum center distance from the previous spot (px)
    pub min_dist_from_prev: f32,
    /// Jump radius range (px)
    pub min_jump_distance: f32,
    pub max_jump_distance: f32,
    /// Candidates sampled before falling back to the best score
    pub max_tries: u32,
    /// Honored relocations per second
    pub max_moves_per_second: f64,
    /// Size assumed when the element cannot be measured
    pub fallback_element_size: Size,
}

impl Default for EvasionConfig {
    fn default() -> Self {
        Self {
            danger_radius: DANGER_RADIUS,
            safe_padding: SAFE_PADDING,
            min_dist_from_anchor: MIN_DIST_FROM_ANCHOR,
            min_dist_from_prev: MIN_DIST_FROM_PREV,
            min_jump_distance: MIN_JUMP_DISTANCE,
            max_jump_distance: MAX_JUMP_DISTANCE,
            max_tries: MAX_TRIES,
            max_moves_per_second: MAX_MOVES_PER_SECOND,
            fallback_element_size: Size::new(FALLBACK_ELEMENT_WIDTH, FALLBACK_ELEMENT_HEIGHT),
        }
    }
}

impl EvasionConfig {
    /// Minimum interval between honored relocations (ms)
    pub fn throttle_ms(&self) -> f64 {
        1000.0 / self.max_moves_per_second
    }
}

/// Teasing toast shown next to the runaway button
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TeaseConfig {
    /// Messages cycled in order, one per relocation attempt
    pub messages: Vec<String>,
    /// How long a message stays up (ms)
    pub visible_ms: f64,
    /// Toast offset above the button (px)
    pub offset_y: f32,
    /// Minimum distance from the viewport's top/left edge (px)
    pub edge_margin: f32,
    /// Room reserved on the right for the toast itself (px)
    pub reserved_width: f32,
}

impl Default for TeaseConfig {
    fn default() -> Self {
        Self {
            messages: [
                "Nice try.",
                "Too slow!",
                "Are you sure about that?",
                "That button seems shy.",
                "Maybe try the other one?",
                "Still no? Bold.",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            visible_ms: 1600.0,
            offset_y: 44.0,
            edge_margin: 10.0,
            reserved_width: 240.0,
        }
    }
}

/// Full experience configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub phases: PhaseTimings,
    pub evasion: EvasionConfig,
    pub tease: TeaseConfig,
}

impl Config {
    /// Parse and validate a JSON config; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        log::info!("Loaded config from JSON");
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the controller or engine cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason| Err(ConfigError::Invalid { field, reason });

        let p = &self.phases;
        if !(p.greeting_at_ms >= 0.0) {
            return invalid("phases.greeting_at_ms", "must be non-negative");
        }
        if !(p.prompt_at_ms >= p.greeting_at_ms) {
            return invalid("phases.prompt_at_ms", "must not precede greeting_at_ms");
        }

        let e = &self.evasion;
        if !(e.danger_radius > 0.0) {
            return invalid("evasion.danger_radius", "must be positive");
        }
        if !(e.safe_padding >= 0.0) {
            return invalid("evasion.safe_padding", "must be non-negative");
        }
        if !(e.min_dist_from_anchor >= 0.0) || !(e.min_dist_from_prev >= 0.0) {
            return invalid("evasion.min_dist_*", "must be non-negative");
        }
        if !(e.min_jump_distance >= 0.0) {
            return invalid("evasion.min_jump_distance", "must be non-negative");
        }
        if !(e.max_jump_distance >= e.min_jump_distance) {
            return invalid("evasion.max_jump_distance", "must be >= min_jump_distance");
        }
        if e.max_tries == 0 {
            return invalid("evasion.max_tries", "must be at least 1");
        }
        if !(e.max_moves_per_second > 0.0) {
            return invalid("evasion.max_moves_per_second", "must be positive");
        }
        let fallback = e.fallback_element_size;
        if !(fallback.width > 0.0) || !(fallback.height > 0.0) {
            return invalid("evasion.fallback_element_size", "must be positive");
        }

        if !(self.tease.visible_ms >= 0.0) {
            return invalid("tease.visible_ms", "must be non-negative");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_consts() {
        let config = Config::default();
        assert_eq!(config.phases.greeting_at_ms, 3000.0);
        assert_eq!(config.phases.prompt_at_ms, 5000.0);
        assert_eq!(config.evasion.danger_radius, 72.0);
        assert_eq!(config.evasion.max_tries, 24);
        assert_eq!(config.evasion.throttle_ms(), 500.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{ "evasion": { "safe_padding": 8 } }"#).unwrap();
        assert_eq!(config.evasion.safe_padding, 8.0);
        assert_eq!(config.evasion.min_dist_from_prev, MIN_DIST_FROM_PREV);
        assert_eq!(config.phases, PhaseTimings::default());
        assert_eq!(config.tease, TeaseConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let config = Config::default();
        let json = config.to_json().unwrap();
        assert_eq!(Config::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_json() {
        assert!(matches!(
            Config::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_inverted_jump_range() {
        let err = Config::from_json(
            r#"{ "evasion": { "min_jump_distance": 600, "max_jump_distance": 500 } }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "evasion.max_jump_distance",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_zero_tries_and_rate() {
        let mut config = Config::default();
        config.evasion.max_tries = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.evasion.max_moves_per_second = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_prompt_before_greeting() {
        let mut config = Config::default();
        config.phases.prompt_at_ms = 1000.0;
        assert!(config.validate().is_err());
    }
}
