use std::io;
use std::process::ExitStatus;

use thiserror::Error;

use crate::results::Direction;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Command execution error: '{cmd}' exited with status {status}: {stderr}")]
    ExecError {
        cmd: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("Collection failed for {direction}: {source}")]
    Collection {
        direction: Direction,
        #[source]
        source: Box<Error>,
    },
    #[error("Measurement tool error: {0}")]
    ToolError(String),
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl Error {
    pub fn collection(direction: Direction, source: Error) -> Self {
        Error::Collection {
            direction,
            source: Box::new(source),
        }
    }
}
