//! ferz UCI chess engine entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    ferz::init();

    match ferz::uci::run_uci_loop() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("fatal: {}", e);
            ExitCode::FAILURE
        }
    }
}
