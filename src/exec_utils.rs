use tokio::process::Command;

use crate::prelude::*;

pub async fn exec(cmd: &mut Command) -> Result<String> {
    let cmd_str = format!("{:?}", cmd);
    debug!("Executing command: {}", cmd_str);

    let output = cmd.output().await?;
    let status = output.status;
    debug!("Command completed with status: {}", status);
    if !status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        for line in stderr.split('\n') {
            error!("{}", line);
        }
        return Err(Error::ExecError {
            cmd: cmd_str,
            status,
            stderr,
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
