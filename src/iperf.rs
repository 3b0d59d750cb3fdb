use serde_json::Value;
use tokio::process::Command;

use crate::prelude::*;

/// Validated parameters shared by both directional test runs.
#[derive(Debug, Clone)]
pub struct TestParams {
    pub server: String,
    pub port: u16,
    pub duration_s: u64,
    pub bandwidth_mbps: f64,
    pub omit_s: u64,
    pub blksize: u64,
}

#[async_trait::async_trait]
pub trait UdpTestRunner: Send + Sync {
    /// Runs one UDP test to completion and returns the tool's structured
    /// report. `reverse` selects the downlink direction; `server_output`
    /// asks the tool to embed the receiver-side transcript in the report.
    async fn run_udp(
        &self,
        params: &TestParams,
        reverse: bool,
        server_output: bool,
    ) -> Result<Value>;
}

pub struct Iperf3Cli {
    binary: String,
}

impl Iperf3Cli {
    pub fn new(binary: impl Into<String>) -> Self {
        Iperf3Cli {
            binary: binary.into(),
        }
    }
}

#[async_trait::async_trait]
impl UdpTestRunner for Iperf3Cli {
    async fn run_udp(
        &self,
        params: &TestParams,
        reverse: bool,
        server_output: bool,
    ) -> Result<Value> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--client")
            .arg(&params.server)
            .arg("--port")
            .arg(params.port.to_string())
            .arg("--udp")
            .arg("--json")
            .arg("--time")
            .arg(params.duration_s.to_string())
            .arg("--bandwidth")
            .arg(((params.bandwidth_mbps * 1e6) as u64).to_string());
        if params.omit_s > 0 {
            cmd.arg("--omit").arg(params.omit_s.to_string());
        }
        if params.blksize > 0 {
            cmd.arg("--length").arg(params.blksize.to_string());
        }
        if reverse {
            cmd.arg("--reverse");
        }
        if server_output {
            cmd.arg("--get-server-output");
        }

        let stdout = exec(&mut cmd).await?;
        let report: Value = serde_json::from_str(&stdout)?;
        if let Some(err) = report.get("error").and_then(Value::as_str) {
            return Err(Error::ToolError(err.to_string()));
        }
        Ok(report)
    }
}
