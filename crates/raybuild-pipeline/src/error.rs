// SPDX-License-Identifier: CEPL-1.0
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("unsupported host platform `{os}`: no known executable name")]
    UnsupportedPlatform { os: String },

    #[error("invalid config {}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("shader output `{}` is declared more than once", .path.display())]
    DuplicateShaderOutput { path: PathBuf },

    #[error("failed to spawn `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting on `{program}`")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` timed out after {}s and was killed", .after.as_secs_f32())]
    Timeout { program: String, after: Duration },

    #[error("shader `{}` failed to compile ({})", .source_path.display(), describe_code(.code))]
    ShaderFailed {
        source_path: PathBuf,
        code: Option<i32>,
    },

    #[error("program build failed ({})", describe_code(.code))]
    ProgramFailed { code: Option<i32> },
}

impl BuildError {
    /// Process exit status the tool reports for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            BuildError::UnsupportedPlatform { .. }
            | BuildError::Config { .. }
            | BuildError::DuplicateShaderOutput { .. } => 2,
            BuildError::ShaderFailed { .. } => 3,
            BuildError::ProgramFailed { .. } => 4,
            BuildError::Spawn { .. } | BuildError::Wait { .. } | BuildError::Timeout { .. } => 5,
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit status {c}"),
        None => "terminated by signal".to_owned(),
    }
}
