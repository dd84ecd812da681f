use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BOID_COUNT: usize = 100;
pub const DEFAULT_VISUAL_RANGE: f32 = 75.0;
pub const DEFAULT_SPEED_LIMIT: f32 = 15.0;
pub const DEFAULT_MIN_SEPARATION: f32 = 20.0;
pub const DEFAULT_CENTERING_FACTOR: f32 = 0.005;
pub const DEFAULT_MATCHING_FACTOR: f32 = 0.05;
pub const DEFAULT_CAPTURE_RADIUS: f32 = 5.0;
pub const DEFAULT_CANVAS_SIZE: f32 = 150.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Closest,
    RandomTarget,
    Ambush,
}

impl StrategyKind {
    pub const ROTATION: [StrategyKind; 3] = [Self::Closest, Self::RandomTarget, Self::Ambush];

    pub fn id(self) -> &'static str {
        match self {
            Self::Closest => "closest",
            Self::RandomTarget => "random_target",
            Self::Ambush => "ambush",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum AlignmentMode {
    /// Constant blend of `matching_factor` toward the neighborhood velocity.
    #[default]
    Simple,
    /// Direction-only correction that switches off once a boid's alignment
    /// score reaches `target`.
    Polarization { target: f32 },
}

impl AlignmentMode {
    pub fn target_polarization(self) -> Option<f32> {
        match self {
            Self::Simple => None,
            Self::Polarization { target } => Some(target),
        }
    }
}

/// What an ambush predator does while no boid is inside its range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbushMode {
    /// Keep the current velocity.
    #[default]
    Hold,
    /// Zero both velocity components.
    Halt,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    #[default]
    AllCaptured,
    FirstCapture,
}

impl Termination {
    /// Remaining boid count at or below which a round is finished.
    pub fn threshold(self, boid_count: usize) -> usize {
        match self {
            Self::AllCaptured => 0,
            Self::FirstCapture => boid_count.saturating_sub(1),
        }
    }
}

/// Missing fields deserialize to their defaults, so the settings panel can
/// send partial updates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub boid_count: usize,
    pub visual_range_boid: f32,
    /// Predator visual range; doubles as the ambush range.
    pub visual_range_predator: f32,
    pub speed_limit: f32,
    pub predator_speed_limit: Option<f32>,
    pub min_separation: f32,
    pub centering_factor: f32,
    pub matching_factor: f32,
    pub alignment: AlignmentMode,
    pub strategy: StrategyKind,
    pub ambush_mode: AmbushMode,
    pub predator_count: usize,
    pub capture_radius: f32,
    pub pursuit_delay_ms: f64,
    pub termination: Termination,
    pub max_round_ms: Option<f64>,
    pub canvas_width: f32,
    pub canvas_height: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            boid_count: DEFAULT_BOID_COUNT,
            visual_range_boid: DEFAULT_VISUAL_RANGE,
            visual_range_predator: DEFAULT_VISUAL_RANGE,
            speed_limit: DEFAULT_SPEED_LIMIT,
            predator_speed_limit: None,
            min_separation: DEFAULT_MIN_SEPARATION,
            centering_factor: DEFAULT_CENTERING_FACTOR,
            matching_factor: DEFAULT_MATCHING_FACTOR,
            alignment: AlignmentMode::Simple,
            strategy: StrategyKind::Closest,
            ambush_mode: AmbushMode::Hold,
            predator_count: 1,
            capture_radius: DEFAULT_CAPTURE_RADIUS,
            pursuit_delay_ms: 0.0,
            termination: Termination::AllCaptured,
            max_round_ms: None,
            canvas_width: DEFAULT_CANVAS_SIZE,
            canvas_height: DEFAULT_CANVAS_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f64 },
    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must lie in [0, 1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f64 },
    #[error("at least one predator is required")]
    NoPredators,
}

impl SimulationConfig {
    pub fn predator_speed_limit(&self) -> f32 {
        self.predator_speed_limit.unwrap_or(self.speed_limit)
    }

    pub fn termination_threshold(&self) -> usize {
        self.termination.threshold(self.boid_count)
    }

    /// Rejects out-of-range values instead of clamping them, so a
    /// misconfigured experiment is noticed before it produces records.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("visual_range_boid", self.visual_range_boid as f64)?;
        non_negative("visual_range_predator", self.visual_range_predator as f64)?;
        positive("speed_limit", self.speed_limit as f64)?;
        if let Some(limit) = self.predator_speed_limit {
            positive("predator_speed_limit", limit as f64)?;
        }
        non_negative("min_separation", self.min_separation as f64)?;
        unit_range("centering_factor", self.centering_factor as f64)?;
        unit_range("matching_factor", self.matching_factor as f64)?;
        if let AlignmentMode::Polarization { target } = self.alignment {
            unit_range("target_polarization", target as f64)?;
        }
        if self.predator_count == 0 {
            return Err(ConfigError::NoPredators);
        }
        positive("capture_radius", self.capture_radius as f64)?;
        non_negative("pursuit_delay_ms", self.pursuit_delay_ms)?;
        if let Some(limit) = self.max_round_ms {
            positive("max_round_ms", limit)?;
        }
        positive("canvas_width", self.canvas_width as f64)?;
        positive("canvas_height", self.canvas_height as f64)?;
        Ok(())
    }

    /// Copies the tuning factors that take effect mid-round, leaving
    /// count-affecting options and the strategy untouched.
    pub fn retune_from(&mut self, other: &SimulationConfig) {
        self.visual_range_boid = other.visual_range_boid;
        self.visual_range_predator = other.visual_range_predator;
        self.speed_limit = other.speed_limit;
        self.predator_speed_limit = other.predator_speed_limit;
        self.min_separation = other.min_separation;
        self.centering_factor = other.centering_factor;
        self.matching_factor = other.matching_factor;
        self.alignment = other.alignment;
        self.ambush_mode = other.ambush_mode;
        self.capture_radius = other.capture_radius;
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(())
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value <= 0.0 {
        return Err(ConfigError::NotPositive { field, value });
    }
    Ok(())
}

fn unit_range(field: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::OutOfUnitRange { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SimulationConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_instead_of_clamping() {
        let config = SimulationConfig {
            visual_range_boid: -1.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Negative {
                field: "visual_range_boid",
                ..
            })
        ));

        let config = SimulationConfig {
            speed_limit: 0.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "speed_limit",
                ..
            })
        ));

        let config = SimulationConfig {
            alignment: AlignmentMode::Polarization { target: 1.5 },
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfUnitRange { .. })
        ));

        let config = SimulationConfig {
            predator_count: 0,
            ..SimulationConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoPredators));

        let config = SimulationConfig {
            centering_factor: f32::NAN,
            ..SimulationConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NotFinite { .. })));
    }

    #[test]
    fn termination_thresholds() {
        assert_eq!(Termination::AllCaptured.threshold(10), 0);
        assert_eq!(Termination::FirstCapture.threshold(10), 9);
        assert_eq!(Termination::FirstCapture.threshold(0), 0);
    }

    #[test]
    fn retune_keeps_counts_and_strategy() {
        let mut live = SimulationConfig::default();
        let incoming = SimulationConfig {
            boid_count: 7,
            strategy: StrategyKind::Ambush,
            matching_factor: 0.2,
            min_separation: 5.0,
            ..SimulationConfig::default()
        };
        live.retune_from(&incoming);
        assert_eq!(live.boid_count, DEFAULT_BOID_COUNT);
        assert_eq!(live.strategy, StrategyKind::Closest);
        assert_eq!(live.matching_factor, 0.2);
        assert_eq!(live.min_separation, 5.0);
    }

    #[test]
    fn partial_settings_fill_in_defaults() {
        let json = r#"{"matching_factor":0.2,"alignment":{"mode":"polarization","target":0.9}}"#;
        let config: SimulationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.matching_factor, 0.2);
        assert_eq!(config.alignment, AlignmentMode::Polarization { target: 0.9 });
        assert_eq!(config.boid_count, DEFAULT_BOID_COUNT);
        assert_eq!(config.canvas_width, DEFAULT_CANVAS_SIZE);
        assert_eq!(config.predator_speed_limit, None);

        let empty: SimulationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, SimulationConfig::default());
    }
}
