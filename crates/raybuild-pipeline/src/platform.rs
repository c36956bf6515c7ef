// SPDX-License-Identifier: CEPL-1.0
use crate::error::BuildError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostOs {
    Linux,
    MacOs,
    FreeBsd,
    OpenBsd,
    Windows,
}

impl HostOs {
    /// Maps a `std::env::consts::OS` identifier.
    pub fn from_identifier(os: &str) -> Option<Self> {
        match os {
            "linux" => Some(HostOs::Linux),
            "macos" => Some(HostOs::MacOs),
            "freebsd" => Some(HostOs::FreeBsd),
            "openbsd" => Some(HostOs::OpenBsd),
            "windows" => Some(HostOs::Windows),
            _ => None,
        }
    }

    pub fn executable_suffix(self) -> &'static str {
        match self {
            HostOs::Windows => ".exe",
            HostOs::Linux | HostOs::MacOs | HostOs::FreeBsd | HostOs::OpenBsd => "",
        }
    }
}

/// Host OS plus the artifact name the program compiler is expected to emit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformProfile {
    pub os: HostOs,
    pub executable: String,
}

impl PlatformProfile {
    pub fn resolve(os: &str, program_name: &str) -> Result<Self, BuildError> {
        let host = HostOs::from_identifier(os).ok_or_else(|| BuildError::UnsupportedPlatform {
            os: os.to_owned(),
        })?;
        Ok(PlatformProfile {
            os: host,
            executable: format!("{program_name}{}", host.executable_suffix()),
        })
    }

    pub fn host(program_name: &str) -> Result<Self, BuildError> {
        Self::resolve(std::env::consts::OS, program_name)
    }
}
