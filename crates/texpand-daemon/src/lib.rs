mod daemon_manager;
mod keyboard_listener;
mod process;

pub use daemon_manager::{
    daemon_status, daemon_worker_entry, run_daemon_worker, start_daemon, stop_daemon, DaemonInfo,
};
pub use keyboard_listener::start_keyboard_listener;
pub use process::verify_process_running;
