//! Configuration loading and management

use super::schema::Config;
use super::validate::validate_config;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Environment variable prefix for path overrides, e.g.
/// `ADVENTURE_FORGE__PROVIDERS__MODEL=gpt-4o`
pub const ENV_PREFIX: &str = "ADVENTURE_FORGE__";

/// Configuration loader
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Create a new config loader with the default config directory
    pub fn new() -> Self {
        let config_dir = dirs::home_dir()
            .map(|h| h.join(".adventure-forge"))
            .unwrap_or_else(|| PathBuf::from(".adventure-forge"));

        Self { config_dir }
    }

    /// Create a new config loader with a custom config directory
    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            config_dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Load and validate configuration from file and environment
    pub fn load(&self) -> crate::Result<Config> {
        let config = self.load_unvalidated()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration without validating it.
    ///
    /// Callers that adjust the result (command line flags) must run
    /// [`validate_config`] themselves before using it.
    pub fn load_unvalidated(&self) -> crate::Result<Config> {
        let config_path = self.config_path();
        let mut merged = serde_json::to_value(Config::default())?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let file_value: Value = serde_json::from_str(&content)?;
            merge_values(&mut merged, file_value);
        }

        apply_alias_overrides(&mut merged);
        apply_path_overrides(&mut merged);

        Ok(serde_json::from_value(merged)?)
    }

    /// Save configuration to file
    pub fn save(&self, config: &Config) -> crate::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(self.config_path(), content)?;
        Ok(())
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get the config file path
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                if let Some(existing) = base_map.get_mut(&key) {
                    merge_values(existing, value);
                } else {
                    base_map.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

fn parse_env_value(raw: &str) -> Value {
    if let Ok(v) = serde_json::from_str::<Value>(raw) {
        return v;
    }
    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::String(raw.to_string())
}

fn set_path_value(root: &mut Value, path: &[String], value: Value) {
    if path.is_empty() {
        *root = value;
        return;
    }

    let mut current = root;
    for segment in &path[..path.len() - 1] {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Some(map) = current.as_object_mut() else {
            return;
        };
        current = map
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    if let Some(map) = current.as_object_mut() {
        map.insert(path[path.len() - 1].clone(), value);
    }
}

fn apply_alias_overrides(config: &mut Value) {
    // Later entries win when several aliases target the same path.
    let aliases = [
        ("OPENAI_API_KEY", "providers.api_key"),
        ("OPENAI_API_BASE", "providers.api_base"),
        ("MONGODB_URI", "storage.uri"),
        ("SESSION_STORE_URI", "storage.uri"),
        ("DB_NAME", "storage.database"),
        ("COLLECTION_NAME", "storage.collection"),
    ];

    for (env_key, target_path) in aliases {
        if let Ok(value) = std::env::var(env_key) {
            let path: Vec<String> = target_path.split('.').map(ToString::to_string).collect();
            set_path_value(config, &path, Value::String(value));
        }
    }
}

fn apply_path_overrides(config: &mut Value) {
    for (key, value) in std::env::vars() {
        let Some(suffix) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let segments: Vec<String> = suffix
            .split("__")
            .filter(|s| !s.is_empty())
            .map(|s| s.to_ascii_lowercase())
            .collect();
        if segments.is_empty() {
            continue;
        }
        set_path_value(config, &segments, parse_env_value(&value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageBackend;
    use once_cell::sync::Lazy;
    use std::sync::{Mutex, MutexGuard};
    use tempfile::TempDir;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const MANAGED_VARS: [&str; 6] = [
        "OPENAI_API_KEY",
        "OPENAI_API_BASE",
        "MONGODB_URI",
        "SESSION_STORE_URI",
        "DB_NAME",
        "COLLECTION_NAME",
    ];

    struct EnvVarGuard {
        key: String,
        original: Option<String>,
    }

    impl EnvVarGuard {
        fn set(key: &str, value: &str) -> Self {
            let original = std::env::var(key).ok();
            // SAFETY: tests serialize env mutations with ENV_LOCK.
            unsafe { std::env::set_var(key, value) };
            Self {
                key: key.to_string(),
                original,
            }
        }

        fn unset(key: &str) -> Self {
            let original = std::env::var(key).ok();
            // SAFETY: tests serialize env mutations with ENV_LOCK.
            unsafe { std::env::remove_var(key) };
            Self {
                key: key.to_string(),
                original,
            }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.original {
                // SAFETY: tests serialize env mutations with ENV_LOCK.
                unsafe { std::env::set_var(&self.key, value) };
            } else {
                // SAFETY: tests serialize env mutations with ENV_LOCK.
                unsafe { std::env::remove_var(&self.key) };
            }
        }
    }

    fn lock_env() -> MutexGuard<'static, ()> {
        ENV_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn clear_aliases() -> Vec<EnvVarGuard> {
        MANAGED_VARS.iter().map(|key| EnvVarGuard::unset(key)).collect()
    }

    #[test]
    fn test_load_default_config_fails_without_credential() {
        let _lock = lock_env();
        let _cleared = clear_aliases();
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());

        let err = loader.load().unwrap_err();
        assert!(err.to_string().contains("providers.api_key"));

        let config = loader.load_unvalidated().unwrap();
        assert_eq!(config.providers.model, "gpt-4");
        assert_eq!(config.providers.max_tokens, 1000);
    }

    #[test]
    fn test_save_and_load_config() {
        let _lock = lock_env();
        let _cleared = clear_aliases();
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());

        let mut config = Config::default();
        config.providers.api_key = "sk-test".to_string();
        config.providers.model = "gpt-4o-mini".to_string();
        config.storage.uri = "/tmp/forge".to_string();
        config.storage.database = "forge".to_string();
        config.storage.collection = "sessions".to_string();

        loader.save(&config).unwrap();
        let loaded = loader.load().unwrap();

        assert_eq!(loaded.providers.model, "gpt-4o-mini");
        assert_eq!(loaded.storage.collection, "sessions");
    }

    #[test]
    fn test_load_applies_alias_env_overrides() {
        let _lock = lock_env();
        let _cleared = clear_aliases();
        let _key = EnvVarGuard::set("OPENAI_API_KEY", "sk-from-env");
        let _uri = EnvVarGuard::set("MONGODB_URI", "/var/lib/forge");
        let _db = EnvVarGuard::set("DB_NAME", "adventures");
        let _coll = EnvVarGuard::set("COLLECTION_NAME", "sessions");

        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());
        let config = loader.load().unwrap();

        assert_eq!(config.providers.api_key, "sk-from-env");
        assert_eq!(config.storage.uri, "/var/lib/forge");
        assert_eq!(config.storage.database, "adventures");
        assert_eq!(config.storage.collection, "sessions");
    }

    #[test]
    fn test_session_store_uri_wins_over_mongodb_uri() {
        let _lock = lock_env();
        let _cleared = clear_aliases();
        let _legacy = EnvVarGuard::set("MONGODB_URI", "/legacy");
        let _uri = EnvVarGuard::set("SESSION_STORE_URI", "/preferred");

        let temp_dir = TempDir::new().unwrap();
        let config = ConfigLoader::with_dir(temp_dir.path())
            .load_unvalidated()
            .unwrap();
        assert_eq!(config.storage.uri, "/preferred");
    }

    #[test]
    fn test_load_applies_path_env_overrides() {
        let _lock = lock_env();
        let _cleared = clear_aliases();
        let _model = EnvVarGuard::set("ADVENTURE_FORGE__PROVIDERS__MODEL", "gpt-4o");
        let _temp = EnvVarGuard::set("ADVENTURE_FORGE__PROVIDERS__TEMPERATURE", "0.9");
        let _backend = EnvVarGuard::set("ADVENTURE_FORGE__STORAGE__BACKEND", "memory");
        let _window = EnvVarGuard::set("ADVENTURE_FORGE__ENGINE__HISTORY_WINDOW", "40");
        let _lock_flag = EnvVarGuard::set("ADVENTURE_FORGE__ENGINE__SERIALIZE_SESSIONS", "true");

        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());
        let config = loader.load_unvalidated().unwrap();

        assert_eq!(config.providers.model, "gpt-4o");
        assert!((config.providers.temperature - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.engine.history_window, Some(40));
        assert!(config.engine.serialize_sessions);
    }

    #[test]
    fn test_path_env_overrides_alias_and_file() {
        let _lock = lock_env();
        let _cleared = clear_aliases();
        let _alias = EnvVarGuard::set("OPENAI_API_KEY", "sk-alias");
        let _path = EnvVarGuard::set("ADVENTURE_FORGE__PROVIDERS__API_KEY", "sk-path-override");

        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());
        std::fs::write(
            loader.config_path(),
            r#"{"providers":{"api_key":"sk-file"}}"#,
        )
        .unwrap();

        let config = loader.load_unvalidated().unwrap();
        assert_eq!(config.providers.api_key, "sk-path-override");
    }

    #[test]
    fn test_validation_rejects_invalid_temperature() {
        let _lock = lock_env();
        let _cleared = clear_aliases();
        let _key = EnvVarGuard::set("OPENAI_API_KEY", "sk-test");
        let _backend = EnvVarGuard::set("ADVENTURE_FORGE__STORAGE__BACKEND", "memory");
        let _temp = EnvVarGuard::set("ADVENTURE_FORGE__PROVIDERS__TEMPERATURE", "2.5");

        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());
        let err = loader.load().unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }
}
