use serde::{Deserialize, Serialize};

use crate::capture::CaptureEvent;
use crate::config::SimulationConfig;
use crate::error::Result;

pub const EXPORT_HEADERS: [&str; 12] = [
    "Number of Boids",
    "Visual Range (Boid)",
    "Visual Range (Predator)",
    "Speed Limit",
    "Min Distance",
    "Centering Factor",
    "Matching Factor",
    "Target Polarization",
    "Predator Strategy",
    "Total Time (ms)",
    "Captures",
    "Traveled Distance",
];

/// Outcome of one finished round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub round: usize,
    pub config: SimulationConfig,
    pub captures: Vec<CaptureEvent>,
    pub total_elapsed_ms: u64,
    pub traveled_distance: f64,
    pub remaining_boids: usize,
    pub timed_out: bool,
}

/// One export row, columns in `EXPORT_HEADERS` order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExportRow {
    pub boid_count: usize,
    pub visual_range_boid: f32,
    pub visual_range_predator: f32,
    pub speed_limit: f32,
    pub min_separation: f32,
    pub centering_factor: f32,
    pub matching_factor: f32,
    pub target_polarization: Option<f32>,
    pub strategy: &'static str,
    pub total_elapsed_ms: u64,
    pub captures: usize,
    pub traveled_distance: f64,
}

impl RunRecord {
    pub fn capture_count(&self) -> usize {
        self.captures.len()
    }

    pub fn row(&self) -> ExportRow {
        ExportRow {
            boid_count: self.config.boid_count,
            visual_range_boid: self.config.visual_range_boid,
            visual_range_predator: self.config.visual_range_predator,
            speed_limit: self.config.speed_limit,
            min_separation: self.config.min_separation,
            centering_factor: self.config.centering_factor,
            matching_factor: self.config.matching_factor,
            target_polarization: self.config.alignment.target_polarization(),
            strategy: self.config.strategy.id(),
            total_elapsed_ms: self.total_elapsed_ms,
            captures: self.capture_count(),
            traveled_distance: round_to_cents(self.traveled_distance),
        }
    }
}

/// Serializes the export rows of `records` as a JSON array.
pub fn to_json(records: &[RunRecord]) -> Result<String> {
    let rows: Vec<ExportRow> = records.iter().map(RunRecord::row).collect();
    Ok(serde_json::to_string(&rows)?)
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AlignmentMode, StrategyKind};

    fn record() -> RunRecord {
        RunRecord {
            round: 4,
            config: SimulationConfig {
                boid_count: 30,
                strategy: StrategyKind::Ambush,
                ..SimulationConfig::default()
            },
            captures: vec![CaptureEvent { elapsed_ms: 10 }, CaptureEvent { elapsed_ms: 95 }],
            total_elapsed_ms: 120,
            traveled_distance: 1234.5678,
            remaining_boids: 28,
            timed_out: false,
        }
    }

    #[test]
    fn row_carries_export_columns() {
        let row = record().row();
        assert_eq!(row.boid_count, 30);
        assert_eq!(row.strategy, "ambush");
        assert_eq!(row.captures, 2);
        assert_eq!(row.total_elapsed_ms, 120);
        assert_eq!(row.traveled_distance, 1234.57);
        assert_eq!(row.target_polarization, None);
    }

    #[test]
    fn polarization_target_is_exported_when_set() {
        let mut record = record();
        record.config.alignment = AlignmentMode::Polarization { target: 0.96 };
        assert_eq!(record.row().target_polarization, Some(0.96));
    }

    #[test]
    fn json_export_lists_rows_in_order() {
        let mut second = record();
        second.round = 5;
        second.config.strategy = StrategyKind::Closest;
        let json = to_json(&[record(), second]).unwrap();
        let rows: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["strategy"], "ambush");
        assert_eq!(rows[1]["strategy"], "closest");
        assert_eq!(rows[0]["traveled_distance"], 1234.57);
    }
}
