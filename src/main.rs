use std::{env, io, process};

use tracing_subscriber::EnvFilter;

use freight::{cli, config::Config, storage::Storage};

fn main() {
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    });

    init_logging(&config);

    let Some(path) = config.database_path() else {
        eprintln!("Could not determine home directory.");
        process::exit(1);
    };

    let storage = match Storage::new(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to initialize storage: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = cli::run(&config, &storage) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// `FREIGHT_LOG`, then the config's `log`, then `warn`. Logs go to stderr.
fn init_logging(config: &Config) {
    let directive = env::var("FREIGHT_LOG")
        .ok()
        .or_else(|| config.log.clone())
        .unwrap_or_else(|| "warn".to_string());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("Ignoring log filter '{directive}': {e}");
        EnvFilter::new("warn")
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
