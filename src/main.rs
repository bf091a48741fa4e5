//! `fusedmm-time`: check and time the fused kernel against the reference
//! kernels on one Matrix Market graph.
//!
//! ```bash
//! fusedmm-time -input graph.mtx -t s -K 128 -T 1
//! RUST_LOG=info fusedmm-time -input graph.mtx -t f -timer steady -prec d
//! ```

use std::process::ExitCode;

use fusedmm_kernels::cli::{Cli, USAGE};
use fusedmm_kernels::{driver, HarnessError};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = match Cli::parse_normalized(std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };
    if cli.help {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    }

    let cfg = match cli.into_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            if matches!(e, HarnessError::MissingInput) {
                eprintln!("{USAGE}");
            }
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = driver::configure_threads(cfg.threads) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    match driver::run(&cfg) {
        Ok(outcome) => {
            for line in outcome.render(cfg.skip_header) {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(HarnessError::CorrectnessMismatch { count }) => {
            println!("FAILED TEST, {count} ELEMENTS");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
