use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::summary::DirectionSummary;

/// Tag for one flow of traffic. The uplink test contributes two series: the
/// sender-side view and the receiver-side view recovered from the server
/// transcript.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Uplink,
    UplinkServer,
    Downlink,
}

impl Direction {
    pub const ALL: [Direction; 3] = [
        Direction::Uplink,
        Direction::UplinkServer,
        Direction::Downlink,
    ];
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Direction::Uplink => "uplink",
            Direction::UplinkServer => "uplink_server",
            Direction::Downlink => "downlink",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFormat {
    Relative,
    Epoch,
    Both,
}

/// One measured time slice, immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t_rel_s: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t_epoch: Option<f64>,
    pub direction: Direction,
    pub bandwidth_bps: f64,
    pub jitter_ms: f64,
    pub loss_pct: f64,
}

impl Sample {
    pub fn new(
        direction: Direction,
        end_rel_s: f64,
        t0_epoch: f64,
        time_format: TimeFormat,
        bandwidth_bps: f64,
        jitter_ms: f64,
        loss_pct: f64,
    ) -> Self {
        let (t_rel_s, t_epoch) = match time_format {
            TimeFormat::Relative => (Some(end_rel_s), None),
            TimeFormat::Epoch => (None, Some(t0_epoch + end_rel_s)),
            TimeFormat::Both => (Some(end_rel_s), Some(t0_epoch + end_rel_s)),
        };
        Sample {
            t_rel_s,
            t_epoch,
            direction,
            bandwidth_bps,
            jitter_ms,
            loss_pct,
        }
    }
}

/// Per-invocation details reported by the measurement tool.
#[derive(Debug, Clone, Serialize)]
pub struct TestMeta {
    pub iperf3_version: Option<String>,
    pub t0_epoch: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    pub server: String,
    pub port: u16,
    pub protocol: &'static str,
    pub duration_s: u64,
    pub bandwidth_target_mbps: f64,
    pub omit_s: u64,
    pub blksize: Option<u64>,
    pub time_format: TimeFormat,
    pub tests: BTreeMap<Direction, TestMeta>,
}

#[derive(Debug, Serialize)]
pub struct RunResult {
    pub metadata: RunMetadata,
    pub samples: Vec<Sample>,
    pub summary: BTreeMap<Direction, DirectionSummary>,
}
