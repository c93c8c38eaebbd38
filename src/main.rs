// src/main.rs

use runpipe::{cli, logging};

fn main() {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("runpipe error: {err:?}");
        std::process::exit(1);
    }
    match runpipe::run(args) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("runpipe error: {err:?}");
            std::process::exit(1);
        }
    }
}
