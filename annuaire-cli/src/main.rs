//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = annuaire_cli::run() {
        eprintln!("annuaire: {err}");
        std::process::exit(1);
    }
}
