//! Utilities for managing the control server port.

use log::debug;
use std::fs;
use std::net::TcpListener;
use texpand_core::config::get_port_file_path;
use texpand_core::{get_config_dir, Result, TexpandError};

/// Try to get the control server port from stored configuration
pub fn get_api_server_port() -> Result<u16> {
    let port_file_path = get_port_file_path();

    if !port_file_path.exists() {
        return Err(TexpandError::Api(
            "Control server port information not found".to_string(),
        ));
    }

    fs::read_to_string(port_file_path)?
        .trim()
        .parse::<u16>()
        .map_err(|_| TexpandError::Api("Invalid port stored in configuration".to_string()))
}

/// Check if a port is available by trying to bind to it
pub fn port_is_available(port: u16) -> bool {
    TcpListener::bind(("127.0.0.1", port)).is_ok()
}

/// First free port among `attempts` consecutive ports starting at `start`.
pub fn find_available_port(start: u16, attempts: u16) -> Option<u16> {
    (0..attempts)
        .filter_map(|offset| start.checked_add(offset))
        .find(|&port| {
            let free = port_is_available(port);
            if !free {
                debug!("Port {} is busy", port);
            }
            free
        })
}

/// Save the control port to a configuration file
pub fn save_api_port(port: u16) -> Result<()> {
    let config_dir = get_config_dir();
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    fs::write(get_port_file_path(), port.to_string())?;
    Ok(())
}

pub fn remove_api_port() {
    let _ = fs::remove_file(get_port_file_path());
}
