use crate::cli::Commands;
use crate::output::{format_entries, format_hits, format_stats};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use texpand_core::config::ensure_config_dir;
use texpand_core::{is_daemon_running, EngineStatus, Result, SnippetStore, TexpandError};
use texpand_daemon::{daemon_status, daemon_worker_entry, start_daemon, stop_daemon};
use texpand_server::api::ToggleResult;
use texpand_server::server::client;
use texpand_server::server::utils::get_api_server_port;

pub fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Add { keyword, content } => {
            open_store()?.add(&keyword, &content)?;
            println!("Snippet '{}' added successfully", keyword.trim());
            Ok(())
        }
        Commands::Update { keyword, content } => {
            open_store()?.update(&keyword, &content)?;
            println!("Snippet '{}' updated successfully", keyword.trim());
            Ok(())
        }
        Commands::Delete { keyword } => {
            open_store()?.delete(&keyword)?;
            println!("Snippet '{}' deleted successfully", keyword.trim());
            Ok(())
        }
        Commands::List { top, recent } => {
            let store = open_store()?;
            let entries = match (top, recent) {
                (Some(n), _) => store.most_used(n),
                (None, Some(n)) => store.recent(n),
                (None, None) => store.list(),
            };
            println!("{}", format_entries(&entries).trim_end());
            Ok(())
        }
        Commands::Search { text } => {
            println!("{}", format_hits(&open_store()?.search(&text)));
            Ok(())
        }
        Commands::Stats => {
            println!("{}", format_stats(&open_store()?.stats()));
            Ok(())
        }
        Commands::Import { file } => handle_import(&file),
        Commands::Export { file } => handle_export(&file),
        Commands::Backup { path } => {
            open_store()?.backup(&path)?;
            println!("Snippets backed up to {}", path.display());
            Ok(())
        }
        Commands::Start { port } => start_daemon(port),
        Commands::Stop => stop_daemon(),
        Commands::Status => handle_status(),
        Commands::Toggle => handle_toggle(),
        Commands::DaemonWorker { port } => daemon_worker_entry(port),
    }
}

fn open_store() -> Result<SnippetStore> {
    ensure_config_dir()?;
    SnippetStore::open_default()
}

fn handle_import(file: &Path) -> Result<()> {
    let raw = fs::read_to_string(file)?;
    let snippets: BTreeMap<String, String> = serde_json::from_str(&raw)
        .map_err(|e| TexpandError::Other(format!("{} is not a keyword map: {}", file.display(), e)))?;

    let (added, failed) = open_store()?.import_map(&snippets)?;
    println!("Imported {} snippets ({} skipped)", added, failed);
    Ok(())
}

fn handle_export(file: &Path) -> Result<()> {
    let snippets = open_store()?.export_map();
    fs::write(file, serde_json::to_string_pretty(&snippets)?)?;
    println!("Exported {} snippets to {}", snippets.len(), file.display());
    Ok(())
}

fn handle_status() -> Result<()> {
    let info = daemon_status()?;
    match (info.pid, info.alive) {
        (None, _) => {
            println!("texpand daemon is not running");
            return Ok(());
        }
        (Some(pid), false) => {
            println!("PID file exists but process {} is not running", pid);
            println!("Recommend running 'texpand stop' followed by 'texpand start'");
            return Ok(());
        }
        (Some(pid), true) => println!("texpand daemon is running with PID {}", pid),
    }

    let port = match info.port {
        Some(port) => port,
        None => get_api_server_port()?,
    };
    println!("Control server is listening on port {}", port);

    let status: EngineStatus = client::get_json(port, "/api/engine/status")?;
    println!(
        "Expansion is {}{}",
        if status.enabled { "enabled" } else { "disabled" },
        if status.expanding { " (expanding now)" } else { "" }
    );
    Ok(())
}

fn handle_toggle() -> Result<()> {
    if is_daemon_running()?.is_none() {
        return Err(TexpandError::DaemonNotRunning);
    }

    let port = get_api_server_port()?;
    let result: ToggleResult = client::post_json(port, "/api/engine/toggle")?;
    println!(
        "Text expansion {}",
        if result.enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}
