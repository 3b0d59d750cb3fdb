use std::path::PathBuf;

use clap::Parser;

use crate::results::TimeFormat;

#[derive(Debug, Parser)]
#[command(name = "udpmeter")]
#[command(version)]
#[command(about = "Run a UDP test in both directions and export interval metrics to JSON", long_about = None)]
pub struct Cli {
    /// iperf3 server hostname or IP
    #[arg(long)]
    pub server: String,

    /// iperf3 server port
    #[arg(long, default_value_t = 5201)]
    pub port: u16,

    /// Test duration in seconds
    #[arg(long, default_value_t = 10)]
    pub duration: u64,

    /// Target UDP bandwidth in Mbps
    #[arg(long, default_value_t = 10.0)]
    pub bandwidth_mbps: f64,

    /// Seconds to omit at start (warm-up)
    #[arg(long, default_value_t = 0)]
    pub omit: u64,

    /// Datagram size in bytes; 0 lets the tool choose
    #[arg(long, default_value_t = 0)]
    pub blksize: u64,

    /// Timestamp format for samples
    #[arg(long, value_enum, default_value = "both")]
    pub time_format: TimeFormat,

    /// iperf3 binary to invoke
    #[arg(long, default_value = "iperf3")]
    pub iperf3: String,

    /// Output JSON file path
    #[arg(long)]
    pub output: PathBuf,
}
