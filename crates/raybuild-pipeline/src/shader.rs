// SPDX-License-Identifier: CEPL-1.0
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::command::CommandLine;
use crate::config::Toolchain;
use crate::error::BuildError;

/// One shader source and the SPIR-V file it compiles to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderUnit {
    pub source: PathBuf,
    pub output: PathBuf,
}

impl ShaderUnit {
    pub fn new(source: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        ShaderUnit {
            source: source.into(),
            output: output.into(),
        }
    }

    /// `<compiler> --target-env=<env> <source> -o <output>`
    pub fn command(&self, toolchain: &Toolchain) -> CommandLine {
        CommandLine::new(toolchain.shader_compiler.as_str())
            .arg(format!("--target-env={}", toolchain.target_env))
            .path_arg(&self.source)
            .arg("-o")
            .path_arg(&self.output)
    }
}

/// The ray tracer's stages, in compile order.
pub fn default_units() -> Vec<ShaderUnit> {
    const UNITS: [(&str, &str); 6] = [
        ("shader.vert", "vert.spv"),
        ("shader.frag", "frag.spv"),
        ("raygen.rgen", "raygen.spv"),
        ("miss.rmiss", "miss.spv"),
        ("closesthit.rchit", "closesthit.spv"),
        ("shadow.rmiss", "shadow.spv"),
    ];
    let dir = Path::new("shaders");
    UNITS
        .iter()
        .map(|(src, out)| ShaderUnit::new(dir.join(src), dir.join(out)))
        .collect()
}

/// Rejects a list where two units would write the same file.
pub fn validate_units(units: &[ShaderUnit]) -> Result<(), BuildError> {
    let mut seen = HashSet::with_capacity(units.len());
    for u in units {
        if !seen.insert(u.output.as_path()) {
            return Err(BuildError::DuplicateShaderOutput {
                path: u.output.clone(),
            });
        }
    }
    Ok(())
}
