use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::iperf::{TestParams, UdpTestRunner};
use crate::prelude::*;
use crate::report::extract_interval;
use crate::results::{Direction, Sample, TestMeta, TimeFormat};
use crate::transcript::{self, ServerTotals};

// The receiving side may report one trailing line describing time after the
// nominal test window; anything ending this far past the requested duration
// is discarded.
const SERVER_INTERVAL_SLACK_S: f64 = 0.5;

/// Everything one downlink run produces.
#[derive(Debug)]
pub struct DownlinkCapture {
    pub meta: TestMeta,
    pub samples: Vec<Sample>,
}

/// Everything one uplink run produces: the sender-side interval series, the
/// receiver-side view recovered from the transcript, and the receiver's
/// end-of-run accounting when the transcript contains one.
#[derive(Debug)]
pub struct UplinkCapture {
    pub meta: TestMeta,
    pub samples: Vec<Sample>,
    pub server_samples: Vec<Sample>,
    pub totals: Option<ServerTotals>,
}

pub async fn collect_uplink(
    runner: &dyn UdpTestRunner,
    params: &TestParams,
    time_format: TimeFormat,
) -> Result<UplinkCapture> {
    let t0_epoch = epoch_now();
    let report = runner
        .run_udp(params, false, true)
        .await
        .map_err(|e| Error::collection(Direction::Uplink, e))?;

    let samples = interval_samples(&report, Direction::Uplink, false, t0_epoch, time_format);

    let transcript_text = report
        .get("server_output_text")
        .and_then(Value::as_str)
        .unwrap_or("");
    let cutoff = params.duration_s as f64 + SERVER_INTERVAL_SLACK_S;
    let server_samples: Vec<Sample> = transcript::parse_intervals(transcript_text)
        .into_iter()
        .filter(|it| it.end <= cutoff)
        .map(|it| {
            Sample::new(
                Direction::UplinkServer,
                it.end,
                t0_epoch,
                time_format,
                it.bandwidth_mbps * 1e6,
                it.jitter_ms,
                it.loss_pct,
            )
        })
        .collect();
    if server_samples.is_empty() {
        warn!("Uplink server transcript produced no interval lines");
    }

    let totals = transcript::parse_totals(transcript_text);

    Ok(UplinkCapture {
        meta: test_meta(&report, t0_epoch),
        samples,
        server_samples,
        totals,
    })
}

pub async fn collect_downlink(
    runner: &dyn UdpTestRunner,
    params: &TestParams,
    time_format: TimeFormat,
) -> Result<DownlinkCapture> {
    let t0_epoch = epoch_now();
    let report = runner
        .run_udp(params, true, false)
        .await
        .map_err(|e| Error::collection(Direction::Downlink, e))?;

    let samples = interval_samples(&report, Direction::Downlink, true, t0_epoch, time_format);

    Ok(DownlinkCapture {
        meta: test_meta(&report, t0_epoch),
        samples,
    })
}

fn interval_samples(
    report: &Value,
    direction: Direction,
    prefer_receiver: bool,
    t0_epoch: f64,
    time_format: TimeFormat,
) -> Vec<Sample> {
    report
        .get("intervals")
        .and_then(Value::as_array)
        .map(|intervals| {
            intervals
                .iter()
                .map(|it| {
                    let stats = extract_interval(it, prefer_receiver);
                    Sample::new(
                        direction,
                        stats.end,
                        t0_epoch,
                        time_format,
                        stats.bandwidth_bps,
                        stats.jitter_ms,
                        stats.loss_pct,
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

fn test_meta(report: &Value, t0_epoch: f64) -> TestMeta {
    TestMeta {
        iperf3_version: report
            .pointer("/start/version")
            .and_then(Value::as_str)
            .map(str::to_string),
        t0_epoch,
    }
}

fn epoch_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;
    use crate::summary::build_summary;

    struct FakeRunner {
        report: Value,
    }

    #[async_trait::async_trait]
    impl UdpTestRunner for FakeRunner {
        async fn run_udp(
            &self,
            _params: &TestParams,
            _reverse: bool,
            _server_output: bool,
        ) -> Result<Value> {
            Ok(self.report.clone())
        }
    }

    struct FailingRunner;

    #[async_trait::async_trait]
    impl UdpTestRunner for FailingRunner {
        async fn run_udp(
            &self,
            _params: &TestParams,
            _reverse: bool,
            _server_output: bool,
        ) -> Result<Value> {
            Err(Error::ToolError("unable to connect to server".to_string()))
        }
    }

    fn params() -> TestParams {
        TestParams {
            server: "192.0.2.1".to_string(),
            port: 5201,
            duration_s: 10,
            bandwidth_mbps: 10.0,
            omit_s: 0,
            blksize: 0,
        }
    }

    fn uplink_transcript() -> String {
        let mut lines = vec!["[ ID] Interval           Transfer     Bitrate         Jitter    Lost/Total Datagrams".to_string()];
        for i in 0..9 {
            lines.push(format!(
                "[  5]   {}.00-{}.00   sec  1.14 MBytes  9.60 Mbits/sec  1.500 ms  4/500 (0.8%)",
                i,
                i + 1
            ));
        }
        // Trailing line past the nominal window, must be discarded.
        lines.push(
            "[  5]   9.00-11.00  sec  2.28 MBytes  9.60 Mbits/sec  1.500 ms  8/1000 (0.8%)"
                .to_string(),
        );
        lines.push(
            "[  5]   0.00-10.04  sec  11.4 MBytes  9.55 Mbits/sec  1.400 ms  81/9000 (0.9%)  receiver"
                .to_string(),
        );
        lines.join("\n")
    }

    fn uplink_report() -> Value {
        let intervals: Vec<Value> = (0..10)
            .map(|i| {
                json!({
                    "sum": {
                        "start": i as f64,
                        "end": (i + 1) as f64,
                        "bits_per_second": 9.8e6,
                    }
                })
            })
            .collect();
        json!({
            "start": { "version": "iperf 3.12" },
            "intervals": intervals,
            "server_output_text": uplink_transcript(),
        })
    }

    #[tokio::test]
    async fn uplink_dual_view_reconciliation() {
        let runner = FakeRunner {
            report: uplink_report(),
        };
        let capture = collect_uplink(&runner, &params(), TimeFormat::Relative)
            .await
            .unwrap();

        assert_eq!(capture.samples.len(), 10);
        assert_eq!(capture.server_samples.len(), 9);
        assert!(
            capture
                .server_samples
                .iter()
                .all(|s| s.direction == Direction::UplinkServer)
        );
        assert_eq!(capture.meta.iperf3_version.as_deref(), Some("iperf 3.12"));

        let totals = capture.totals.expect("cumulative line present");
        let mut totals_map = BTreeMap::new();
        totals_map.insert(Direction::Uplink, totals);

        let mut samples = capture.samples.clone();
        samples.extend(capture.server_samples.clone());
        let summary = build_summary(&samples, &totals_map);

        let uplink = &summary[&Direction::Uplink];
        assert_eq!(uplink.num_samples, 10);
        assert!((uplink.bandwidth_mbps.avg - 9.55).abs() < 1e-9);
        assert!((uplink.bandwidth_mbps.min - 9.8).abs() < 1e-9);
        assert!((uplink.bandwidth_mbps.max - 9.8).abs() < 1e-9);
        assert!(uplink.bandwidth_mbps.std < 1e-9);
        assert!((uplink.avg_jitter_ms - 1.4).abs() < 1e-9);
        assert!((uplink.avg_loss_pct - 0.9).abs() < 1e-9);

        let server_view = &summary[&Direction::UplinkServer];
        assert_eq!(server_view.num_samples, 9);
        assert!((server_view.bandwidth_mbps.avg - 9.6).abs() < 1e-9);
        assert!((server_view.avg_jitter_ms - 1.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn downlink_prefers_receiver_view() {
        let runner = FakeRunner {
            report: json!({
                "start": { "version": "iperf 3.12" },
                "intervals": [
                    {
                        "sum_sent": { "end": 1.0, "bits_per_second": 12e6 },
                        "sum_received": {
                            "end": 1.0,
                            "bits_per_second": 11e6,
                            "jitter_ms": 0.8,
                            "lost_percent": 1.2,
                        },
                    }
                ],
            }),
        };
        let capture = collect_downlink(&runner, &params(), TimeFormat::Both)
            .await
            .unwrap();

        assert_eq!(capture.samples.len(), 1);
        let sample = &capture.samples[0];
        assert_eq!(sample.direction, Direction::Downlink);
        assert_eq!(sample.bandwidth_bps, 11e6);
        assert_eq!(sample.jitter_ms, 0.8);
        assert_eq!(sample.loss_pct, 1.2);
        assert_eq!(sample.t_rel_s, Some(1.0));
        assert_eq!(sample.t_epoch, Some(capture.meta.t0_epoch + 1.0));
    }

    #[tokio::test]
    async fn failed_invocation_surfaces_direction() {
        let err = collect_downlink(&FailingRunner, &params(), TimeFormat::Both)
            .await
            .unwrap_err();
        match err {
            Error::Collection { direction, .. } => assert_eq!(direction, Direction::Downlink),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_transcript_yields_no_server_series() {
        let runner = FakeRunner {
            report: json!({
                "start": { "version": "iperf 3.12" },
                "intervals": [],
            }),
        };
        let capture = collect_uplink(&runner, &params(), TimeFormat::Relative)
            .await
            .unwrap();
        assert!(capture.samples.is_empty());
        assert!(capture.server_samples.is_empty());
        assert!(capture.totals.is_none());
    }
}
