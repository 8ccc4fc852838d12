//! smake - resolves build projects into resource dependency graphs

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = smake::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
