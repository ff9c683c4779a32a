use std::path::PathBuf;

use hmbench_trainer::run_training;

fn main() {
    tracing_subscriber::fmt::init();

    let Some(config) = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("CONFIG").ok())
        .map(PathBuf::from)
    else {
        eprintln!("Usage: train <config.json> (or set CONFIG)");
        std::process::exit(2);
    };

    if let Err(e) = run_training(&config) {
        eprintln!("Training failed: {:#}", e);
        std::process::exit(1);
    }
}
