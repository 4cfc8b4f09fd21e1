use std::path::PathBuf;

use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

/// Capacity given to freshly placed barrels unless configured otherwise.
pub const DEFAULT_MAX_CAPACITY: u32 = 2048;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub barrels: BarrelConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8081, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_file_name")]
    pub file_name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: default_data_dir(), file_name: default_file_name() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BarrelConfig {
    #[serde(default = "default_max_capacity")]
    pub default_max_capacity: u32,
    #[serde(default = "default_placement_window")]
    pub placement_window_ms: u64,
}

impl Default for BarrelConfig {
    fn default() -> Self {
        Self {
            default_max_capacity: default_max_capacity(),
            placement_window_ms: default_placement_window(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `compact` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { format: default_log_format() }
    }
}

fn default_data_dir() -> PathBuf { PathBuf::from("data") }
fn default_file_name() -> String { "barrels.json".to_string() }
fn default_max_capacity() -> u32 { DEFAULT_MAX_CAPACITY }
fn default_placement_window() -> u64 { 5000 }
fn default_log_format() -> String { "compact".to_string() }

fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_default() -> Result<AppConfig> {
    load_from_file(&config_path())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

/// `Ok(None)` only when the file does not exist; unreadable or malformed
/// files are errors.
pub fn load_from_file_if_exists(path: &str) -> Result<Option<AppConfig>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(anyhow!("cannot read config {path}: {e}")),
    };
    load_from_str(&content)
        .map(Some)
        .map_err(|e| anyhow!("invalid config {path}: {e}"))
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Like [`AppConfig::load_and_validate`], but a missing config file falls
    /// back to defaults plus environment overrides.
    pub fn load_or_default() -> Result<Self> {
        let mut cfg = load_from_file_if_exists(&config_path())?.unwrap_or_default();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize_from_env();
        self.server.normalize()?;
        self.storage.normalize_from_env();
        self.storage.validate()?;
        self.barrels.validate()?;
        Ok(())
    }

    /// Full path of the barrel data file.
    pub fn data_file(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.file_name)
    }
}

impl ServerConfig {
    fn normalize_from_env(&mut self) {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            if !host.trim().is_empty() {
                self.host = host;
            }
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
    }

    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl StorageConfig {
    fn normalize_from_env(&mut self) {
        if let Ok(dir) = std::env::var("BARREL_DATA_DIR") {
            if !dir.trim().is_empty() {
                self.data_dir = PathBuf::from(dir);
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.file_name.trim().is_empty() {
            return Err(anyhow!("storage.file_name must not be empty"));
        }
        if self.file_name.contains('/') || self.file_name.contains('\\') {
            return Err(anyhow!("storage.file_name must be a bare file name"));
        }
        Ok(())
    }
}

impl BarrelConfig {
    fn validate(&self) -> Result<()> {
        if self.default_max_capacity == 0 {
            return Err(anyhow!("barrels.default_max_capacity must be >= 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = load_from_str("").unwrap();
        assert_eq!(cfg.server.port, 8081);
        assert_eq!(cfg.storage.file_name, "barrels.json");
        assert_eq!(cfg.barrels.default_max_capacity, DEFAULT_MAX_CAPACITY);
        assert_eq!(cfg.barrels.placement_window_ms, 5000);
        assert_eq!(cfg.data_file(), PathBuf::from("data").join("barrels.json"));
    }

    #[test]
    fn sections_override_defaults() {
        let cfg = load_from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [storage]
            data_dir = "/var/lib/barrels"

            [barrels]
            default_max_capacity = 64
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.storage.data_dir, PathBuf::from("/var/lib/barrels"));
        assert_eq!(cfg.storage.file_name, "barrels.json");
        assert_eq!(cfg.barrels.default_max_capacity, 64);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut cfg = load_from_str("[barrels]\ndefault_max_capacity = 0\n").unwrap();
        assert!(cfg.barrels.validate().is_err());
        cfg.barrels.default_max_capacity = 1;
        assert!(cfg.barrels.validate().is_ok());
    }

    #[test]
    fn file_name_must_not_contain_separators() {
        let storage = StorageConfig { data_dir: default_data_dir(), file_name: "a/b.json".into() };
        assert!(storage.validate().is_err());
    }

    #[test]
    fn zero_worker_threads_fall_back() {
        let mut server = ServerConfig { worker_threads: Some(0), ..ServerConfig::default() };
        server.normalize().unwrap();
        assert_eq!(server.worker_threads, Some(4));
    }

    fn temp_config(label: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("barrels_cfg_{label}_{}.toml", std::process::id()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn missing_file_is_none() {
        let path = std::env::temp_dir().join(format!("barrels_cfg_absent_{}.toml", std::process::id()));
        assert!(load_from_file_if_exists(path.to_str().unwrap()).unwrap().is_none());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = temp_config("syntax", "[storage\ndata_dir = \"/srv/barrels\"\n");
        let err = load_from_file_if_exists(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("invalid config"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn wrong_field_type_is_an_error() {
        let path = temp_config("types", "[server]\nhost = \"0.0.0.0\"\nport = \"eighty\"\n");
        assert!(load_from_file_if_exists(path.to_str().unwrap()).is_err());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn existing_file_is_loaded() {
        let path = temp_config("ok", "[storage]\ndata_dir = \"/srv/barrels\"\n");
        let cfg = load_from_file_if_exists(path.to_str().unwrap()).unwrap().unwrap();
        assert_eq!(cfg.storage.data_dir, PathBuf::from("/srv/barrels"));
        let _ = std::fs::remove_file(path);
    }
}
