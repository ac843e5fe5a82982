use crate::keyboard_listener::start_keyboard_listener;
use crate::process::verify_process_running;
use log::{error, info, warn};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};
use texpand_core::config::{ensure_config_dir, get_log_file_path, get_pid_file_path, load_config};
use texpand_core::{is_daemon_running, EngineHandle, Result, SnippetStore, TexpandError};
use texpand_server::server::utils::{find_available_port, get_api_server_port, remove_api_port};
use texpand_server::{start_control_server, ControlState};

const PORT_ATTEMPTS: u16 = 10;
const WATCH_INTERVAL: Duration = Duration::from_secs(1);

/// What `texpand status` reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonInfo {
    pub pid: Option<u32>,
    /// False when a PID file exists but its process is gone.
    pub alive: bool,
    pub port: Option<u16>,
}

/// Start the daemon process. `port` overrides the configured control port.
pub fn start_daemon(port: Option<u16>) -> Result<()> {
    if let Some(pid) = is_daemon_running()? {
        if verify_process_running(pid) {
            return Err(TexpandError::DaemonAlreadyRunning(pid));
        }
        println!("Found stale PID file. Cleaning up and starting new daemon...");
        let _ = fs::remove_file(get_pid_file_path());
    }

    ensure_config_dir()?;
    // Fail in the foreground on a bad config rather than inside the daemon
    load_config()?;

    // Fork to background on Unix systems
    #[cfg(unix)]
    {
        use daemonize::Daemonize;
        println!("Starting texpand daemon in the background");

        let log_path = get_log_file_path();
        let stdout = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;
        let stderr = stdout.try_clone()?;

        let daemonize = Daemonize::new()
            .pid_file(get_pid_file_path())
            .chown_pid_file(true)
            .working_directory("/tmp")
            .stdout(stdout)
            .stderr(stderr);

        match daemonize.start() {
            Ok(_) => {
                let result = run_daemon_worker(port);
                let _ = fs::remove_file(get_pid_file_path());
                result
            }
            Err(e) => Err(TexpandError::Other(format!("Error starting daemon: {}", e))),
        }
    }

    #[cfg(not(unix))]
    {
        println!("Starting texpand daemon in the foreground (background not supported on this OS)");
        daemon_worker_entry(port)
    }
}

/// Run the worker in the current process, managing the PID file around it.
pub fn daemon_worker_entry(port: Option<u16>) -> Result<()> {
    let pid_file = get_pid_file_path();
    let mut file = File::create(&pid_file)?;
    write!(file, "{}", process::id())?;

    let result = run_daemon_worker(port);

    let _ = fs::remove_file(&pid_file);
    result
}

/// The actual daemon worker: control server, keyboard hook and store watch.
///
/// Returns when the keyboard hook gives up.
pub fn run_daemon_worker(port: Option<u16>) -> Result<()> {
    let config = load_config()?;
    let store = Arc::new(SnippetStore::open_default()?);
    let handle = EngineHandle::new(&config);
    info!(
        "Daemon worker {} starting with {} snippets",
        process::id(),
        store.len()
    );

    let wanted = port.unwrap_or(config.api_port);
    let port = find_available_port(wanted, PORT_ATTEMPTS).ok_or_else(|| {
        TexpandError::Api(format!(
            "No free control port in {}..{}",
            wanted,
            wanted.saturating_add(PORT_ATTEMPTS)
        ))
    })?;
    if port != wanted {
        warn!("Port {} is busy, using {} instead", wanted, port);
    }

    let control_state = ControlState::new(handle.clone(), Arc::clone(&store));
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("Failed to build control server runtime: {}", e);
                return;
            }
        };
        if let Err(e) = runtime.block_on(start_control_server(control_state, port)) {
            error!("Control server stopped: {}", e);
        }
    });

    let keyboard_thread = start_keyboard_listener(handle, config, Arc::clone(&store));

    // Pick up edits made through the CLI while the hook is running
    let mut last_modified = modified_time(store.path());
    while !keyboard_thread.is_finished() {
        thread::sleep(WATCH_INTERVAL);
        if store_changed(store.path(), &mut last_modified) {
            match store.reload() {
                Ok(count) => info!("Snippet file changed, reloaded {} snippets", count),
                Err(e) => warn!("Failed to reload snippets: {}", e),
            }
        }
    }

    remove_api_port();
    match keyboard_thread.join() {
        Ok(result) => result,
        Err(_) => Err(TexpandError::Keyboard(
            "keyboard listener thread panicked".to_string(),
        )),
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// True when `path` has a newer mtime than `last_modified`, which is updated.
fn store_changed(path: &Path, last_modified: &mut Option<SystemTime>) -> bool {
    let current = modified_time(path);
    let changed = match (*last_modified, current) {
        (Some(last), Some(now)) => now > last,
        (None, Some(_)) => true,
        _ => false,
    };
    if changed {
        *last_modified = current;
    }
    changed
}

/// Stop the daemon if it's running
pub fn stop_daemon() -> Result<()> {
    let pid_file = get_pid_file_path();

    if !pid_file.exists() {
        return Err(TexpandError::DaemonNotRunning);
    }

    let pid = match fs::read_to_string(&pid_file)
        .ok()
        .and_then(|s| s.trim().parse::<u32>().ok())
    {
        Some(pid) => pid,
        None => {
            let _ = fs::remove_file(&pid_file);
            return Err(TexpandError::InvalidPid);
        }
    };

    if !verify_process_running(pid) {
        println!("Process with PID {} is not running.", pid);
        cleanup_runtime_files();
        return Ok(());
    }

    println!("Attempting to stop daemon with PID {}...", pid);
    if terminate(pid) {
        println!("Daemon stopped successfully.");
    } else {
        println!("WARNING: Failed to stop daemon process. PID file will be removed anyway.");
    }

    cleanup_runtime_files();
    Ok(())
}

fn cleanup_runtime_files() {
    let _ = fs::remove_file(get_pid_file_path());
    remove_api_port();
}

/// Ask nicely, then force. Returns whether the process is gone.
fn terminate(pid: u32) -> bool {
    #[cfg(unix)]
    let (graceful, forced): (Vec<String>, Vec<String>) = (
        vec!["kill".into(), pid.to_string()],
        vec!["kill".into(), "-9".into(), pid.to_string()],
    );

    #[cfg(windows)]
    let (graceful, forced): (Vec<String>, Vec<String>) = (
        vec!["taskkill".into(), "/PID".into(), pid.to_string()],
        vec![
            "taskkill".into(),
            "/F".into(),
            "/T".into(),
            "/PID".into(),
            pid.to_string(),
        ],
    );

    #[cfg(not(any(unix, windows)))]
    let (graceful, forced): (Vec<String>, Vec<String>) = (Vec::new(), Vec::new());

    for (round, attempt) in [graceful, forced].iter().enumerate() {
        let Some((program, args)) = attempt.split_first() else {
            continue;
        };
        if round > 0 {
            println!("Daemon didn't terminate gracefully, using force kill...");
        }
        if let Err(e) = process::Command::new(program).args(args).status() {
            warn!("Failed to run {}: {}", program, e);
        }
        thread::sleep(Duration::from_millis(500));
        if !verify_process_running(pid) {
            return true;
        }
    }

    false
}

/// Check daemon status
pub fn daemon_status() -> Result<DaemonInfo> {
    let Some(pid) = is_daemon_running()? else {
        return Ok(DaemonInfo {
            pid: None,
            alive: false,
            port: None,
        });
    };

    let alive = verify_process_running(pid);
    Ok(DaemonInfo {
        pid: Some(pid),
        alive,
        port: if alive { get_api_server_port().ok() } else { None },
    })
}
