mod cli;
mod collector;
mod error;
mod exec_utils;
mod iperf;
mod report;
mod results;
mod summary;
mod transcript;

pub mod prelude {
    pub use crate::error::*;
    pub use crate::exec_utils::*;
    pub use tracing::{debug, error, info, span, trace, warn};
}

use std::collections::BTreeMap;

use clap::Parser;
use dotenvy::dotenv;
use prelude::*;

use crate::collector::{collect_downlink, collect_uplink};
use crate::iperf::{Iperf3Cli, TestParams};
use crate::results::{Direction, RunMetadata, RunResult};
use crate::summary::build_summary;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();
    info!(
        "{} v{}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION")
    );

    let cli = cli::Cli::parse();
    let params = TestParams {
        server: cli.server.clone(),
        port: cli.port,
        duration_s: cli.duration,
        bandwidth_mbps: cli.bandwidth_mbps,
        omit_s: cli.omit,
        blksize: cli.blksize,
    };
    let runner = Iperf3Cli::new(&cli.iperf3);

    // The two directions share the link under test; running them
    // sequentially keeps each test's attribution clean.
    info!("Running uplink test against {}:{}", params.server, params.port);
    let uplink = collect_uplink(&runner, &params, cli.time_format).await?;
    info!(
        "Running downlink test against {}:{}",
        params.server, params.port
    );
    let downlink = collect_downlink(&runner, &params, cli.time_format).await?;

    let mut samples = uplink.samples;
    samples.extend(uplink.server_samples);
    samples.extend(downlink.samples);

    let mut totals = BTreeMap::new();
    if let Some(t) = uplink.totals {
        totals.insert(Direction::Uplink, t);
    }
    let summary = build_summary(&samples, &totals);

    let metadata = RunMetadata {
        server: params.server.clone(),
        port: params.port,
        protocol: "udp",
        duration_s: params.duration_s,
        bandwidth_target_mbps: params.bandwidth_mbps,
        omit_s: params.omit_s,
        blksize: (params.blksize > 0).then_some(params.blksize),
        time_format: cli.time_format,
        tests: BTreeMap::from([
            (Direction::Uplink, uplink.meta),
            (Direction::Downlink, downlink.meta),
        ]),
    };

    let result = RunResult {
        metadata,
        samples,
        summary,
    };

    if let Some(parent) = cli.output.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&cli.output, serde_json::to_vec_pretty(&result)?).await?;
    info!(
        "Wrote {} with {} samples",
        cli.output.display(),
        result.samples.len()
    );

    print_summary(&result);
    Ok(())
}

fn print_summary(result: &RunResult) {
    println!("=== SUMMARY ===");
    for (direction, entry) in &result.summary {
        println!("{} samples: {}", direction, entry.num_samples);
        let bw = &entry.bandwidth_mbps;
        println!(
            "  BW Mbps: {:.2} avg | {:.2} min | {:.2} max | {:.2} std",
            bw.avg, bw.min, bw.max, bw.std
        );
        println!("  Jitter ms (avg): {:.3}", entry.avg_jitter_ms);
        println!("  Loss % (avg):    {:.3}", entry.avg_loss_pct);
    }
}
