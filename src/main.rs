//! Planner - personal planner with repeating tasks

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = planner::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
