//! pliegue CLI - group-aware k-fold splitting from the command line.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::process::ExitCode;

fn main() -> ExitCode {
    pliegue::cli::run()
}
