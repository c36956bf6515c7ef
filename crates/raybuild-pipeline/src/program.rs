// SPDX-License-Identifier: CEPL-1.0
use crate::command::CommandLine;
use crate::config::{BuildMode, Toolchain};
use crate::platform::PlatformProfile;

/// Quality gate applied in every mode: vet checks (including casts and
/// `using` parameters), strict style, no `do` shorthand, warnings as errors.
pub const STATIC_FLAGS: [&str; 6] = [
    "-vet",
    "-strict-style",
    "-vet-cast",
    "-vet-using-param",
    "-disallow-do",
    "-warnings-as-errors",
];

pub const DEBUG_FLAG: &str = "-debug";
pub const SPEED_FLAG: &str = "-o:speed";

pub fn mode_flags(mode: BuildMode) -> &'static [&'static str] {
    match mode {
        BuildMode::Debug => &[DEBUG_FLAG],
        BuildMode::Release => &[SPEED_FLAG],
    }
}

/// `<compiler> build <root> <static> -collection:.. -out:<exe> -show-timings <mode>`
pub fn command(toolchain: &Toolchain, platform: &PlatformProfile, mode: BuildMode) -> CommandLine {
    let collections = toolchain
        .collections
        .iter()
        .map(|(name, path)| format!("-collection:{name}={}", path.display()));

    CommandLine::new(toolchain.program_compiler.as_str())
        .arg("build")
        .path_arg(&toolchain.source_root)
        .args(STATIC_FLAGS)
        .args(collections)
        .arg(format!("-out:{}", platform.executable))
        .arg("-show-timings")
        .args(mode_flags(mode).iter().copied())
}
