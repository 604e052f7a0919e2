//! Integration tests for configuration management
//!
//! These tests verify that the configuration system works correctly
//! across module boundaries.

use std::error::Error;
use tempfile::tempdir;
use timeplayer::config::{ConfigError, Settings};

#[cfg(test)]
mod config_integration_tests {
    use super::*;

    /// Test complete configuration workflow
    #[test]
    fn test_config_lifecycle() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let config_path = dir.path().join("config.json");

        let mut settings = Settings::default();
        settings.alsa_device = "test-audio-device".to_string();
        settings.refresh_interval_ms = 500;

        settings.validate()?;
        settings.save(&config_path)?;

        let loaded_settings = Settings::load(&config_path)?;
        assert_eq!(loaded_settings.alsa_device, "test-audio-device");
        assert_eq!(loaded_settings.refresh_interval_ms, 500);

        // Test overriding settings
        let mut updated_settings = loaded_settings;
        updated_settings.alsa_device = "hw:2,0".to_string();
        updated_settings.save(&config_path)?;

        let reloaded_settings = Settings::load(&config_path)?;
        assert_eq!(reloaded_settings.alsa_device, "hw:2,0");
        assert_eq!(reloaded_settings.command_buffer_size, 32);

        Ok(())
    }

    #[test]
    fn test_invalid_file_settings_are_rejected() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, r#"{ "alsa_device": "", "refresh_interval_ms": 1000 }"#)?;

        let settings = Settings::load(&config_path)?;
        match settings.validate() {
            Err(ConfigError::ValidationError(message)) => assert!(message.contains("ALSA device")),
            other => panic!("expected validation error, got {:?}", other),
        }
        Ok(())
    }
}
