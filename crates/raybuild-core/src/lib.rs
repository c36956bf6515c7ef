// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
use std::io::IsTerminal;

/// Default filter directive when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// ANSI colour unless stderr is redirected or `NO_COLOR` is set.
pub fn color_wanted(no_color_flag: bool) -> bool {
    !no_color_flag && std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Installs the compact stderr subscriber. Stdout stays reserved for
/// compiler output so build logs can be piped separately.
pub fn init_tracing(verbose: bool, color: bool) {
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(color)
        .with_target(false)
        .compact()
        .try_init();
}
