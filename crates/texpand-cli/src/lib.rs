pub mod cli;
pub mod commands;
pub mod output;

use clap::Parser;
use cli::Texpand;
use commands::handle_command;
use env_logger::Env;
use std::process;
use texpand_core::config::load_config;

/// Run the texpand CLI application
pub fn run_main() {
    let args = Texpand::parse();

    // RUST_LOG wins over the configured level
    let level = load_config()
        .map(|config| config.log_level)
        .unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    if let Err(e) = handle_command(args.command) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
