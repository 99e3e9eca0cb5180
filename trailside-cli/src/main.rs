//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = trailside_cli::run() {
        eprintln!("trailside: {err}");
        std::process::exit(1);
    }
}
