//! Configuration validation rules.

use super::schema::{Config, StorageBackend};

/// Validate configuration and return aggregated validation errors.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    if config.providers.api_key.trim().is_empty() {
        errors.push("providers.api_key is required (set OPENAI_API_KEY)".to_string());
    }
    if config.providers.api_base.trim().is_empty() {
        errors.push("providers.api_base must not be empty".to_string());
    }
    if config.providers.model.trim().is_empty() {
        errors.push("providers.model must not be empty".to_string());
    }
    if !(0.0..=2.0).contains(&config.providers.temperature) {
        errors.push("providers.temperature must be in [0.0, 2.0]".to_string());
    }
    if config.providers.max_tokens == 0 {
        errors.push("providers.max_tokens must be > 0".to_string());
    }
    if config.providers.request_timeout_secs == Some(0) {
        errors.push("providers.request_timeout_secs must be > 0 when set".to_string());
    }

    if config.storage.backend != StorageBackend::Memory {
        if config.storage.uri.trim().is_empty() {
            errors.push(format!(
                "storage.uri is required for the {} backend (set SESSION_STORE_URI)",
                config.storage.backend
            ));
        }
        if config.storage.database.trim().is_empty() {
            errors.push(format!(
                "storage.database is required for the {} backend (set DB_NAME)",
                config.storage.backend
            ));
        }
        if config.storage.collection.trim().is_empty() {
            errors.push(format!(
                "storage.collection is required for the {} backend (set COLLECTION_NAME)",
                config.storage.backend
            ));
        }
    }

    if config.engine.history_window == Some(0) {
        errors.push("engine.history_window must be > 0 when set".to_string());
    }

    if config.server.host.trim().is_empty() {
        errors.push("server.host must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.providers.api_key = "sk-test".to_string();
        config.storage.uri = "~/.adventure-forge/data".to_string();
        config.storage.database = "forge".to_string();
        config.storage.collection = "sessions".to_string();
        config
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        validate_config(&valid_config()).unwrap();
    }

    #[test]
    fn test_validate_requires_credential() {
        let mut config = valid_config();
        config.providers.api_key = "   ".to_string();

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("providers.api_key"));
    }

    #[test]
    fn test_validate_requires_storage_identifiers() {
        let mut config = valid_config();
        config.storage.uri.clear();
        config.storage.database.clear();
        config.storage.collection.clear();

        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("storage.uri"));
        assert!(err.contains("storage.database"));
        assert!(err.contains("storage.collection"));
    }

    #[test]
    fn test_memory_backend_needs_no_storage_identifiers() {
        let mut config = valid_config();
        config.storage = Default::default();
        config.storage.backend = StorageBackend::Memory;

        validate_config(&config).unwrap();
    }

    #[test]
    fn test_validate_rejects_zero_history_window() {
        let mut config = valid_config();
        config.engine.history_window = Some(0);

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("engine.history_window"));
    }
}
