// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
mod cfg;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use raybuild_core::{color_wanted, init_tracing};
use raybuild_pipeline::{
    BuildConfig, BuildError, Pipeline, PlatformProfile, Reporter, SystemExecutor,
};
use tracing::{error, info};

use crate::cfg::{load_cfg, DEFAULT_CFG};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Build in release or debug mode (anything but "debug" builds release)
    #[arg(short, long, default_value = "release")]
    build_mode: String,

    /// Run program when finished building
    #[arg(short, long)]
    run: bool,

    /// Config file [default: raybuild.toml]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Shader units compiled in parallel
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Kill any compiler invocation running longer than this many seconds;
    /// the program started by --run is never timed out
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Print the command lines without running them
    #[arg(long)]
    dry_run: bool,

    #[arg(long)]
    no_color: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn build(args: Args) -> Result<()> {
    let cfg_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CFG));
    let cfg = load_cfg(&cfg_path, args.config.is_some())?;

    let toolchain = cfg.toolchain();
    // Fails before anything is spawned on an unknown host.
    let platform = PlatformProfile::host(&toolchain.program_name)?;
    let config = BuildConfig::new(&args.build_mode, args.run);
    let jobs = args.jobs.or(cfg.jobs()).unwrap_or(1);
    let timeout = args
        .timeout
        .map(std::time::Duration::from_secs)
        .or(cfg.timeout())
        .filter(|t| !t.is_zero());

    let pipeline = Pipeline::new(config, platform, toolchain, cfg.shader_units())?.jobs(jobs);

    if args.dry_run {
        for (_, cmd) in pipeline.plan() {
            println!("{cmd}");
        }
        return Ok(());
    }

    let report = pipeline.run(&SystemExecutor::new(timeout), &Reporter)?;
    info!(
        "build ok: {} ({} invocations)",
        pipeline.platform().executable,
        report.invocations.len()
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose, color_wanted(args.no_color));

    match build(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

fn exit_code(e: &anyhow::Error) -> u8 {
    e.downcast_ref::<BuildError>().map_or(1, BuildError::exit_code)
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["raybuild"]).unwrap();
        assert_eq!(args.build_mode, "release");
        assert!(!args.run);
        assert!(args.config.is_none());
        assert!(args.jobs.is_none());
        assert!(!args.dry_run);
    }

    #[test]
    fn short_flags() {
        let args = Args::try_parse_from(["raybuild", "-b", "debug", "-r", "-j", "3"]).unwrap();
        assert_eq!(args.build_mode, "debug");
        assert!(args.run);
        assert_eq!(args.jobs, Some(3));
    }

    #[test]
    fn free_form_mode_is_accepted() {
        let args = Args::try_parse_from(["raybuild", "--build-mode", "fast"]).unwrap();
        assert_eq!(BuildConfig::new(&args.build_mode, args.run).mode.as_str(), "release");
    }

    #[test]
    fn dry_run_spawns_nothing() {
        let args = Args::try_parse_from([
            "raybuild",
            "--dry-run",
            "--config",
            concat!(env!("CARGO_MANIFEST_DIR"), "/tests/dry-run.toml"),
        ])
        .unwrap();
        build(args).unwrap();
    }

    fn exit_code_for(config: &str) -> u8 {
        let args = Args::try_parse_from(["raybuild", "--dry-run", "--config", config]).unwrap();
        exit_code(&build(args).unwrap_err())
    }

    #[test]
    fn malformed_config_exits_2() {
        let bad = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/bad-config.toml");
        assert_eq!(exit_code_for(bad), 2);
    }

    #[test]
    fn missing_named_config_exits_2() {
        assert_eq!(exit_code_for("definitely/not/here/raybuild.toml"), 2);
    }

    #[test]
    fn untyped_errors_exit_1() {
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
    }
}
