use serde_json::Value;

use crate::prelude::*;

/// One normalized structured interval. Units are the report's native ones:
/// bits per second, milliseconds, percent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntervalStats {
    pub end: f64,
    pub bandwidth_bps: f64,
    pub jitter_ms: f64,
    pub loss_pct: f64,
}

/// Extracts one interval from a raw report, trying the known shapes in
/// priority order: aggregate sub-record, then per-stream aggregation, then a
/// zero tuple. Missing data never fails; degenerate tests are allowed to
/// omit fields.
pub fn extract_interval(interval: &Value, prefer_receiver: bool) -> IntervalStats {
    let probes: [fn(&Value, bool) -> Option<IntervalStats>; 2] = [probe_aggregate, probe_streams];
    probes
        .iter()
        .find_map(|probe| probe(interval, prefer_receiver))
        .unwrap_or_else(|| {
            debug!("Interval report matched no known shape, zero-filling");
            IntervalStats::default()
        })
}

fn field(v: &Value, key: &str) -> Option<f64> {
    v.get(key).and_then(Value::as_f64)
}

fn bits_per_second(v: &Value) -> Option<f64> {
    field(v, "bits_per_second").or_else(|| field(v, "bps"))
}

fn aggregate_keys(prefer_receiver: bool) -> [&'static str; 3] {
    if prefer_receiver {
        ["sum_received", "sum", "sum_sent"]
    } else {
        ["sum_sent", "sum", "sum_received"]
    }
}

fn probe_aggregate(interval: &Value, prefer_receiver: bool) -> Option<IntervalStats> {
    let agg = aggregate_keys(prefer_receiver)
        .into_iter()
        .find_map(|key| interval.get(key).filter(|v| v.is_object()))?;
    Some(IntervalStats {
        end: field(agg, "end").unwrap_or(0.0),
        bandwidth_bps: bits_per_second(agg).unwrap_or(0.0),
        jitter_ms: field(agg, "jitter_ms").unwrap_or(0.0),
        loss_pct: field(agg, "lost_percent").unwrap_or(0.0),
    })
}

// End is the max over streams and bandwidth the sum; jitter and loss are not
// additive, so the first stream that defines them wins.
fn probe_streams(interval: &Value, prefer_receiver: bool) -> Option<IntervalStats> {
    let streams = interval.get("streams").and_then(Value::as_array)?;
    if streams.is_empty() {
        return None;
    }
    let mut end = 0.0f64;
    let mut bandwidth_bps = 0.0;
    let mut jitter_ms = None;
    let mut loss_pct = None;
    for stream in streams {
        let view = stream_view(stream, prefer_receiver);
        end = end.max(field(view, "end").unwrap_or(0.0));
        bandwidth_bps += bits_per_second(view).unwrap_or(0.0);
        if jitter_ms.is_none() {
            jitter_ms = field(view, "jitter_ms");
        }
        if loss_pct.is_none() {
            loss_pct = field(view, "lost_percent");
        }
    }
    Some(IntervalStats {
        end,
        bandwidth_bps,
        jitter_ms: jitter_ms.unwrap_or(0.0),
        loss_pct: loss_pct.unwrap_or(0.0),
    })
}

// Per-stream records may nest the two endpoint views; the stream object
// itself is the fallback when neither is present.
fn stream_view<'a>(stream: &'a Value, prefer_receiver: bool) -> &'a Value {
    let (first, second) = if prefer_receiver {
        ("receiver", "sender")
    } else {
        ("sender", "receiver")
    };
    stream
        .get(first)
        .filter(|v| v.is_object())
        .or_else(|| stream.get(second).filter(|v| v.is_object()))
        .unwrap_or(stream)
}
