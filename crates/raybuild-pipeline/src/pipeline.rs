// SPDX-License-Identifier: CEPL-1.0
use std::path::PathBuf;

use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::command::{CommandLine, CommandResult, Executor};
use crate::config::{BuildConfig, Toolchain};
use crate::error::BuildError;
use crate::platform::PlatformProfile;
use crate::report::Reporter;
use crate::shader::{validate_units, ShaderUnit};
use crate::{program, runner};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Shader,
    Program,
    Run,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub stage: Stage,
    pub command: CommandLine,
    pub result: CommandResult,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub invocations: Vec<Invocation>,
    /// Set when the artifact was run: its exit code (`None` on signal).
    pub run_exit: Option<Option<i32>>,
}

/// Fully resolved, immutable description of one build.
#[derive(Clone, Debug)]
pub struct Pipeline {
    config: BuildConfig,
    platform: PlatformProfile,
    toolchain: Toolchain,
    units: Vec<ShaderUnit>,
    jobs: usize,
    workdir: PathBuf,
}

impl Pipeline {
    pub fn new(
        config: BuildConfig,
        platform: PlatformProfile,
        toolchain: Toolchain,
        units: Vec<ShaderUnit>,
    ) -> Result<Self, BuildError> {
        validate_units(&units)?;
        Ok(Pipeline {
            config,
            platform,
            toolchain,
            units,
            jobs: 1,
            workdir: PathBuf::from("."),
        })
    }

    /// Worker count for the shader stage; `<= 1` compiles sequentially.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Directory the artifact is run from.
    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = dir.into();
        self
    }

    pub fn platform(&self) -> &PlatformProfile {
        &self.platform
    }

    /// Every command `run` would issue, in order, without spawning anything.
    pub fn plan(&self) -> Vec<(Stage, CommandLine)> {
        let mut plan: Vec<_> = self
            .units
            .iter()
            .map(|u| (Stage::Shader, u.command(&self.toolchain)))
            .collect();
        plan.push((Stage::Program, self.program_command()));
        if self.config.run_after_build {
            plan.push((Stage::Run, runner::command(&self.workdir, &self.platform)));
        }
        plan
    }

    pub fn run<E: Executor>(
        &self,
        exec: &E,
        reporter: &Reporter,
    ) -> Result<BuildReport, BuildError> {
        info!(
            "building {} ({}) for {:?}",
            self.platform.executable, self.config.mode, self.platform.os
        );
        let mut report = BuildReport::default();

        self.shader_stage(exec, reporter, &mut report)?;
        self.program_stage(exec, reporter, &mut report)?;

        // Only reached when both stages exited 0.
        if self.config.run_after_build {
            let cmd = runner::command(&self.workdir, &self.platform);
            info!("running {cmd}");
            let code = exec.attach(&cmd)?;
            match code {
                Some(0) => info!("{} exited cleanly", self.platform.executable),
                Some(c) => warn!("{} exited with status {c}", self.platform.executable),
                None => warn!("{} terminated by signal", self.platform.executable),
            }
            report.run_exit = Some(code);
        }

        Ok(report)
    }

    /// Never more workers than units.
    fn pool_size(&self) -> usize {
        self.jobs.clamp(1, self.units.len().max(1))
    }

    fn program_command(&self) -> CommandLine {
        program::command(&self.toolchain, &self.platform, self.config.mode)
    }

    fn shader_stage<E: Executor>(
        &self,
        exec: &E,
        reporter: &Reporter,
        report: &mut BuildReport,
    ) -> Result<(), BuildError> {
        let total = self.units.len();
        info!("compiling {total} shader units");

        if self.jobs > 1 && total > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.pool_size())
                .build()
            {
                Ok(pool) => {
                    let results: Vec<_> = pool.install(|| {
                        self.units
                            .par_iter()
                            .map(|u| exec.capture(&u.command(&self.toolchain)))
                            .collect()
                    });
                    // Results come back in declaration order; judge them in that order.
                    for (i, (unit, result)) in self.units.iter().zip(results).enumerate() {
                        self.finish_shader(i, unit, result?, reporter, report)?;
                    }
                    return Ok(());
                }
                Err(e) => warn!("shader worker pool unavailable ({e}), compiling sequentially"),
            }
        }

        for (i, unit) in self.units.iter().enumerate() {
            let result = exec.capture(&unit.command(&self.toolchain))?;
            self.finish_shader(i, unit, result, reporter, report)?;
        }
        Ok(())
    }

    fn finish_shader(
        &self,
        index: usize,
        unit: &ShaderUnit,
        result: CommandResult,
        reporter: &Reporter,
        report: &mut BuildReport,
    ) -> Result<(), BuildError> {
        info!(
            "[{}/{}] {} -> {}",
            index + 1,
            self.units.len(),
            unit.source.display(),
            unit.output.display()
        );
        let command = unit.command(&self.toolchain);
        let ok = judge(&command, &result, reporter);
        let code = result.code;
        report.invocations.push(Invocation {
            stage: Stage::Shader,
            command,
            result,
        });
        if ok {
            Ok(())
        } else {
            Err(BuildError::ShaderFailed {
                source_path: unit.source.clone(),
                code,
            })
        }
    }

    fn program_stage<E: Executor>(
        &self,
        exec: &E,
        reporter: &Reporter,
        report: &mut BuildReport,
    ) -> Result<(), BuildError> {
        let command = self.program_command();
        info!("compiling {}", self.toolchain.source_root.display());
        let result = exec.capture(&command)?;
        let ok = judge(&command, &result, reporter);
        let code = result.code;
        report.invocations.push(Invocation {
            stage: Stage::Program,
            command,
            result,
        });
        if ok {
            Ok(())
        } else {
            Err(BuildError::ProgramFailed { code })
        }
    }
}

/// Prints the captured streams; the exit status alone decides success.
fn judge(command: &CommandLine, result: &CommandResult, reporter: &Reporter) -> bool {
    debug!("{command} -> {:?}", result.code);
    reporter.report(command, result);
    let ok = result.success();
    if !ok {
        error!("`{}` failed with {:?}", command.program(), result.code);
    } else if !result.stderr.is_empty() {
        warn!("`{}` succeeded with diagnostics", command.program());
    }
    ok
}
