// SPDX-License-Identifier: CEPL-1.0
use std::path::Path;

use crate::command::CommandLine;
use crate::platform::PlatformProfile;

/// The freshly built artifact, addressed relative to `dir` so a bare name
/// is never resolved through `PATH`.
pub fn command(dir: &Path, platform: &PlatformProfile) -> CommandLine {
    CommandLine::new(dir.join(&platform.executable).to_string_lossy().into_owned())
}
