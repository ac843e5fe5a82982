use crate::error::{Result, TexpandError};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const HOME_ENV: &str = "TEXPAND_HOME";
pub const PID_FILENAME: &str = "texpand-daemon.pid";
pub const DB_FILENAME: &str = "snippets.json";
pub const CONFIG_FILENAME: &str = "config.json";
pub const PORT_FILENAME: &str = "api_port.txt";
pub const LOG_FILENAME: &str = "daemon.log";

/// Tunables for the keystroke engine and the daemon around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Longest keyword the buffer keeps; older characters are evicted first.
    pub max_buffer_len: usize,
    /// Idle time after which a pending keyword is discarded.
    pub idle_timeout_ms: u64,
    /// Minimum gap between accepted characters.
    pub debounce_ms: u64,
    /// Delay between successive injected key events.
    pub key_delay_ms: u64,
    /// Pause between erasing the keyword and typing the replacement.
    pub pre_type_delay_ms: u64,
    /// How long after a replacement its injected keys may still come back
    /// through the hook and be ignored.
    pub echo_window_ms: u64,
    /// Fall back to a ranked substring search when no direct lookup hits.
    pub search_fallback: bool,
    /// Letter that toggles the engine when pressed with ctrl+alt.
    pub toggle_hotkey: char,
    pub api_port: u16,
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_buffer_len: 50,
            idle_timeout_ms: 5000,
            debounce_ms: 50,
            key_delay_ms: 2,
            pre_type_delay_ms: 10,
            echo_window_ms: 500,
            search_fallback: true,
            toggle_hotkey: 'x',
            api_port: 3000,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn key_delay(&self) -> Duration {
        Duration::from_millis(self.key_delay_ms)
    }

    pub fn pre_type_delay(&self) -> Duration {
        Duration::from_millis(self.pre_type_delay_ms)
    }

    pub fn echo_window(&self) -> Duration {
        Duration::from_millis(self.echo_window_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_buffer_len == 0 {
            return Err(TexpandError::InvalidConfig(
                "max_buffer_len must be at least 1".to_string(),
            ));
        }
        if !self.toggle_hotkey.is_alphanumeric() {
            return Err(TexpandError::InvalidConfig(format!(
                "toggle_hotkey must be a letter or digit, got '{}'",
                self.toggle_hotkey
            )));
        }
        Ok(())
    }
}

/// Load engine settings from `path`. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        return Ok(EngineConfig::default());
    }

    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(EngineConfig::default());
    }

    let config: EngineConfig = serde_json::from_str(&content)
        .map_err(|e| TexpandError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}

/// Load engine settings from the default location.
pub fn load_config() -> Result<EngineConfig> {
    load_config_from(&get_config_file_path())
}

/// Get the texpand configuration directory
pub fn get_config_dir() -> PathBuf {
    if let Ok(dir) = env::var(HOME_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    env::var("HOME")
        .map(|home| PathBuf::from(home).join(".texpand"))
        .unwrap_or_else(|_| PathBuf::from(".texpand"))
}

/// Ensure the configuration directory and an empty database exist
pub fn ensure_config_dir() -> Result<PathBuf> {
    let config_dir = get_config_dir();
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    let db_path = get_db_file_path();
    if !db_path.exists() {
        log::info!("Creating database file at: {}", db_path.display());
        fs::write(&db_path, "[]")?;
    }

    Ok(config_dir)
}

pub fn get_pid_file_path() -> PathBuf {
    get_config_dir().join(PID_FILENAME)
}

pub fn get_db_file_path() -> PathBuf {
    get_config_dir().join(DB_FILENAME)
}

pub fn get_config_file_path() -> PathBuf {
    get_config_dir().join(CONFIG_FILENAME)
}

pub fn get_port_file_path() -> PathBuf {
    get_config_dir().join(PORT_FILENAME)
}

pub fn get_log_file_path() -> PathBuf {
    get_config_dir().join(LOG_FILENAME)
}

pub fn db_file_exists() -> bool {
    get_db_file_path().exists()
}

/// Read the daemon PID file. Unreadable or garbled files are removed and
/// treated as "not running".
pub fn is_daemon_running() -> Result<Option<u32>> {
    let pid_file = get_pid_file_path();

    if !pid_file.exists() {
        return Ok(None);
    }

    match fs::read_to_string(&pid_file) {
        Ok(contents) => match contents.trim().parse::<u32>() {
            Ok(pid) => Ok(Some(pid)),
            Err(_) => {
                log::warn!("Removing PID file with invalid contents");
                let _ = fs::remove_file(&pid_file);
                Ok(None)
            }
        },
        Err(_) => {
            let _ = fs::remove_file(&pid_file);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.max_buffer_len, 50);
        assert_eq!(config.idle_timeout(), Duration::from_secs(5));
        assert_eq!(config.debounce(), Duration::from_millis(50));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "max_buffer_len": 10, "search_fallback": false, "echo_window_ms": 250 }"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.max_buffer_len, 10);
        assert!(!config.search_fallback);
        assert_eq!(config.echo_window(), Duration::from_millis(250));
        assert_eq!(config.toggle_hotkey, 'x');
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "max_bufer_len": 10 }"#).unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, TexpandError::InvalidConfig(_)));
    }

    #[test]
    fn zero_capacity_is_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "max_buffer_len": 0 }"#).unwrap();

        assert!(matches!(
            load_config_from(&path),
            Err(TexpandError::InvalidConfig(_))
        ));
    }
}
