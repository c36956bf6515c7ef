// SPDX-License-Identifier: CEPL-1.0
use std::fmt;
use std::path::PathBuf;

use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildMode {
    Debug,
    Release,
}

impl BuildMode {
    /// Tolerant resolution: only "debug" selects debug flags, anything else
    /// builds as release.
    pub fn resolve(selector: &str) -> Self {
        let s = selector.trim();
        if s.eq_ignore_ascii_case("debug") {
            BuildMode::Debug
        } else {
            if !s.eq_ignore_ascii_case("release") {
                warn!("unknown build mode `{selector}`, building as release");
            }
            BuildMode::Release
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuildMode::Debug => "debug",
            BuildMode::Release => "release",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildConfig {
    pub mode: BuildMode,
    pub run_after_build: bool,
}

impl BuildConfig {
    pub fn new(selector: &str, run_after_build: bool) -> Self {
        BuildConfig {
            mode: BuildMode::resolve(selector),
            run_after_build,
        }
    }
}

/// External compilers and the fixed inputs handed to them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toolchain {
    pub shader_compiler: String,
    pub target_env: String,
    pub program_compiler: String,
    pub source_root: PathBuf,
    pub program_name: String,
    /// `-collection:<name>=<path>` pairs, emitted in vector order. The
    /// config file supplies them sorted by name.
    pub collections: Vec<(String, PathBuf)>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Toolchain {
            shader_compiler: "glslc".to_owned(),
            // ray tracing stages need SPIR-V 1.4, which vulkan1.2 implies
            target_env: "vulkan1.2".to_owned(),
            program_compiler: "odin".to_owned(),
            source_root: PathBuf::from("src"),
            program_name: "raytracer".to_owned(),
            collections: vec![("external".to_owned(), PathBuf::from("external"))],
        }
    }
}
