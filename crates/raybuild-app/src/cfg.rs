// SPDX-License-Identifier: CEPL-1.0
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use raybuild_pipeline::shader::default_units;
use raybuild_pipeline::{BuildError, ShaderUnit, Toolchain};
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_CFG: &str = "raybuild.toml";

#[derive(Debug, Deserialize, Default)]
pub struct FileCfg {
    #[serde(default)]
    timeout_secs: Option<u64>,
    #[serde(default)]
    jobs: Option<usize>,
    #[serde(default)]
    toolchain: ToolchainCfg,
    #[serde(default, rename = "shader")]
    shaders: Vec<ShaderCfg>,
}

#[derive(Debug, Deserialize, Default)]
struct ToolchainCfg {
    shader_compiler: Option<String>,
    target_env: Option<String>,
    program_compiler: Option<String>,
    source_root: Option<PathBuf>,
    program_name: Option<String>,
    collections: Option<BTreeMap<String, PathBuf>>,
}

#[derive(Debug, Deserialize)]
struct ShaderCfg {
    source: PathBuf,
    output: PathBuf,
}

impl FileCfg {
    /// Unset fields keep the built-in toolchain.
    pub fn toolchain(&self) -> Toolchain {
        let d = Toolchain::default();
        let t = &self.toolchain;
        Toolchain {
            shader_compiler: t.shader_compiler.clone().unwrap_or(d.shader_compiler),
            target_env: t.target_env.clone().unwrap_or(d.target_env),
            program_compiler: t.program_compiler.clone().unwrap_or(d.program_compiler),
            source_root: t.source_root.clone().unwrap_or(d.source_root),
            program_name: t.program_name.clone().unwrap_or(d.program_name),
            collections: match &t.collections {
                Some(c) => c.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                None => d.collections,
            },
        }
    }

    /// An empty `[[shader]]` list means the built-in ray tracer stages.
    pub fn shader_units(&self) -> Vec<ShaderUnit> {
        if self.shaders.is_empty() {
            return default_units();
        }
        self.shaders
            .iter()
            .map(|s| ShaderUnit::new(&s.source, &s.output))
            .collect()
    }

    pub fn jobs(&self) -> Option<usize> {
        self.jobs
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// A missing default file falls back to built-ins; a missing file that was
/// named on the command line, or one that fails to parse, is an error.
pub fn load_cfg(path: &Path, explicit: bool) -> Result<FileCfg, BuildError> {
    let invalid = |source: Box<dyn std::error::Error + Send + Sync>| BuildError::Config {
        path: path.to_owned(),
        source,
    };
    match fs::read_to_string(path) {
        Ok(s) => toml::from_str::<FileCfg>(&s).map_err(|e| invalid(e.into())),
        Err(e) if e.kind() == ErrorKind::NotFound && !explicit => {
            debug!("no {}, using built-in defaults", path.display());
            Ok(FileCfg::default())
        }
        Err(e) => Err(invalid(e.into())),
    }
}
