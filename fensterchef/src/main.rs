//! Process entry point (SPEC_FULL.md §1 "Process interface").
//!
//! Grounded in `pgwm/src/main.rs`: parse arguments, initialize logging,
//! hand off to the connection/event-loop module, translate the result
//! into a process exit code. fensterchef has no `--check-cfg` shortcut
//! and no restart-vs-fatal distinction (its `run` loop itself terminates
//! only on `quit` or an unrecoverable connection error), so this is
//! shorter than the teacher's `main`.

mod cli;
mod config_path;
mod error;
mod shell;
mod wm;
mod x11_display;

use cli::Outcome;

fn main() {
    let args = std::env::args().skip(1);
    let options = match cli::parse(args) {
        Outcome::Run(options) => options,
        Outcome::Exit(code) => std::process::exit(code),
    };

    env_logger::Builder::new().filter_level(options.verbosity.filter()).init();

    log::info!("starting fensterchef");
    match wm::run(&options) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            log::error!("{err}");
            std::process::exit(1);
        }
    }
}
