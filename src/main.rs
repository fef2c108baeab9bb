use std::fs;
use std::path::Path;
use std::process;
use tinypas::config::{self, RunConfig};
use tinypas::{runner, start_repl};
use tracing::debug;

// Exit code when the program file cannot be read.
const EXIT_NO_INPUT: i32 = 66;

fn main() {
    let matches = config::command().get_matches();
    let config = RunConfig::from_matches(&matches);

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_max_level(config.log_level())
        .init();
    debug!(?config, "configuration loaded");

    if let Some(expr) = matches.get_one::<String>("expr") {
        process::exit(runner::run_expression(expr, &config).exit_code());
    }

    match matches.get_one::<String>("file") {
        Some(file_path) if !matches.get_flag("interactive") => run_file(file_path, &config),
        _ => start_repl(&config),
    }
}

fn run_file(path: &str, config: &RunConfig) {
    let path = Path::new(path);

    if !path.exists() {
        eprintln!("Error: File '{}' not found", path.display());
        process::exit(EXIT_NO_INPUT);
    }

    match fs::read_to_string(path) {
        Ok(source) => {
            let filename = path.display().to_string();
            let status = runner::run(&source, Some(&filename), config);
            process::exit(status.exit_code());
        }
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            process::exit(EXIT_NO_INPUT);
        }
    }
}
