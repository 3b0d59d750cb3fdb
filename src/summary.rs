use std::collections::BTreeMap;

use serde::Serialize;

use crate::results::{Direction, Sample};
use crate::transcript::ServerTotals;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BandwidthStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub std: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DirectionSummary {
    pub num_samples: usize,
    pub bandwidth_mbps: BandwidthStats,
    pub avg_jitter_ms: f64,
    pub avg_loss_pct: f64,
}

/// Groups the merged sample list by direction and computes each group's
/// descriptive statistics, then overwrites the three averages for every
/// direction that has authoritative totals. Min/max/std and the sample count
/// stay interval-derived; the map always contains all directions.
pub fn build_summary(
    samples: &[Sample],
    totals: &BTreeMap<Direction, ServerTotals>,
) -> BTreeMap<Direction, DirectionSummary> {
    let mut summary = BTreeMap::new();
    for direction in Direction::ALL {
        let mut entry = direction_summary(samples, direction);
        if let Some(t) = totals.get(&direction) {
            entry.bandwidth_mbps.avg = t.bandwidth_mbps;
            entry.avg_jitter_ms = t.jitter_ms;
            entry.avg_loss_pct = t.loss_pct;
        }
        summary.insert(direction, entry);
    }
    summary
}

fn direction_summary(samples: &[Sample], direction: Direction) -> DirectionSummary {
    let group: Vec<&Sample> = samples.iter().filter(|s| s.direction == direction).collect();
    let mbps: Vec<f64> = group.iter().map(|s| s.bandwidth_bps / 1e6).collect();
    let jitter_ms: Vec<f64> = group.iter().map(|s| s.jitter_ms).collect();
    let loss_pct: Vec<f64> = group.iter().map(|s| s.loss_pct).collect();

    DirectionSummary {
        num_samples: group.len(),
        bandwidth_mbps: BandwidthStats {
            avg: mean(&mbps),
            min: minimum(&mbps),
            max: maximum(&mbps),
            std: pstdev(&mbps),
        },
        avg_jitter_ms: mean(&jitter_ms),
        avg_loss_pct: mean(&loss_pct),
    }
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

fn minimum(xs: &[f64]) -> f64 {
    xs.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

fn maximum(xs: &[f64]) -> f64 {
    xs.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

// Population form: these are descriptive statistics over the measured
// intervals, not an estimate of a hidden distribution.
fn pstdev(xs: &[f64]) -> f64 {
    if xs.len() <= 1 {
        return 0.0;
    }
    let m = mean(xs);
    let variance = xs
        .iter()
        .map(|value| {
            let diff = m - value;
            diff * diff
        })
        .sum::<f64>()
        / xs.len() as f64;
    variance.sqrt()
}
