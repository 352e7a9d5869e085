use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::{Path, PathBuf};

const XDG_CONFIG_ENV_VAR: &str = "XDG_CONFIG_DIR";
const APP_DIR: &str = "teamster";
const CONFIG_FILE_NAME: &str = "config.toml";
const ENV_PREFIX: &str = "TEAMSTER";
const ENV_SEPARATOR: &str = "__";

/// Directory holding per-application config directories.
///
/// `XDG_CONFIG_DIR` wins when set, then the platform config dir, then `~/.config`.
pub fn config_base_dir() -> PathBuf {
    if let Some(dir) = env::var_os(XDG_CONFIG_ENV_VAR).filter(|dir| !dir.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"))
}

/// Default location of the config file.
pub fn default_config_path() -> PathBuf {
    config_base_dir().join(APP_DIR).join(CONFIG_FILE_NAME)
}

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. Config file, TOML or JSON by extension (if it exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load(config_path: &Path) -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    load_from_sources(config_path)
}

/// Load configuration from a specific path and environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: &Path) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        builder = builder.add_source(File::from(config_path).required(false));
    }

    // TEAMSTER__PORT -> port
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

/// Reports which file the configuration came from.
///
/// Loading happens before the subscriber exists (the config decides the log
/// level), so this is called once tracing is up.
pub fn log_config_source(config_path: &Path) -> bool {
    let found = config_path.exists();
    if found {
        tracing::info!("Loaded configuration from: {}", config_path.display());
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::TeamsVersion;
    use crate::thumbnail::ThumbnailSize;
    use std::fs;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn captured_logs(f: impl FnOnce()) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(&config_path).unwrap();
        assert_eq!(config.port, 6789);
        assert_eq!(config.teams_version, TeamsVersion::V2);
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let toml_content = r#"
image_dir = "backgrounds"
thumbnail_size = [96, 54]
listen_address = "127.0.0.1"
port = 9000
teams_version = 1
update_teams_config = true
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(&config_path).unwrap();
        assert_eq!(config.image_dir, PathBuf::from("backgrounds"));
        assert_eq!(config.thumbnail_size, ThumbnailSize::new(96, 54));
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:9000");
        assert_eq!(config.teams_version, TeamsVersion::V1);
        assert!(config.update_teams_config);
    }

    #[test]
    fn test_load_from_json() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        fs::write(
            &config_path,
            r#"{"port": 6800, "fetch_interval": 30, "ignore_teams_images": false}"#,
        )
        .unwrap();

        let config = load_from_sources(&config_path).unwrap();
        assert_eq!(config.port, 6800);
        assert_eq!(config.fetch_interval, 30);
        assert!(!config.ignore_teams_images);
    }

    #[test]
    fn test_unknown_teams_version_fails_to_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "teams_version = 3\n").unwrap();

        assert!(load_from_sources(&config_path).is_err());
    }

    #[test]
    fn test_default_path_is_under_app_dir() {
        let path = default_config_path();
        assert!(path.ends_with("teamster/config.toml"));
    }

    #[test]
    fn test_log_config_source_reports_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("absent.toml");

        let mut found = true;
        let logs = captured_logs(|| found = log_config_source(&config_path));

        assert!(!found);
        assert!(logs.contains("WARN"));
        assert!(logs.contains("absent.toml"));
    }

    #[test]
    fn test_log_config_source_reports_loaded_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "port = 7000\n").unwrap();

        let mut found = false;
        let logs = captured_logs(|| found = log_config_source(&config_path));

        assert!(found);
        assert!(logs.contains("INFO"));
        assert!(logs.contains("Loaded configuration from"));
    }
}
