// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
//! Two-stage build pipeline: shader units to SPIR-V, then the program itself,
//! with an optional run of the produced executable.

pub mod command;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod platform;
pub mod program;
pub mod report;
pub mod runner;
pub mod shader;

pub use command::{CommandLine, CommandResult, Executor, SystemExecutor};
pub use config::{BuildConfig, BuildMode, Toolchain};
pub use error::BuildError;
pub use pipeline::{BuildReport, Invocation, Pipeline, Stage};
pub use platform::{HostOs, PlatformProfile};
pub use report::Reporter;
pub use shader::ShaderUnit;
