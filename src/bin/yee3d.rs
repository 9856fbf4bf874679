//! Render a JSON simulation request to an animated GIF.
//!
//! Usage: `yee3d [--log-level <LEVEL>] <REQUEST> [OUTPUT]`
//!
//! `RUST_LOG`, when set, refines the `--log-level` filter.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, LevelFilter};

/// Yee-lattice FDTD simulation rendered to an animated GIF
#[derive(Parser)]
#[command(name = "yee3d")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Simulate a 3D FDTD request and render a field slice as a GIF", long_about = None)]
struct Cli {
    /// Log level (off, error, warn, info, debug, trace)
    #[arg(short, long, default_value = "info")]
    log_level: LevelFilter,

    /// JSON request file with a `gridConfig` object
    request: PathBuf,

    /// Output GIF; defaults to the request path with a `.gif` extension
    output: Option<PathBuf>,
}

fn run(request: &Path, output: &Path) -> yee3d::Result<()> {
    let json = fs::read_to_string(request)?;
    let workdir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let bytes = yee3d::config::render_request(&json, workdir)?;
    fs::write(output, &bytes)?;
    info!("Wrote {} bytes to {}", bytes.len(), output.display());
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level)
        .parse_default_env()
        .init();

    let output = cli
        .output
        .unwrap_or_else(|| cli.request.with_extension("gif"));

    match run(&cli.request, &output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
