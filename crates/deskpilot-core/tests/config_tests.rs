//! Configuration management tests
//!
//! Tests for ConfigManager and Config structures.

use deskpilot_core::config::{Config, ConfigManager};
use deskpilot_core::Error;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temp directory for config tests
fn setup_config_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

mod config_structure_tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.general.log_root, PathBuf::from("logs"));
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.max_step, 50);

        assert_eq!(config.host_agent.name, "HostAgent");
        assert!(config.host_agent.visual_mode);

        assert!(config.app_agent.visual_mode);
        assert!(!config.app_agent.follower_mode);
        assert_eq!(config.app_agent.experience_top_k, 0);

        assert_eq!(config.experience.saved_path, PathBuf::from("vectordb/experience"));
        assert!(!config.experience.auto_save);
    }
}

mod config_serialization_tests {
    use super::*;

    #[test]
    fn test_deserialize_full_config() {
        let toml_content = r#"
[general]
log_root = "/var/log/deskpilot"
log_level = "debug"
max_step = 20

[host_agent]
name = "Host"
visual_mode = false

[app_agent]
visual_mode = false
follower_mode = true
terminal_actions = ["finish", "done"]
experience_top_k = 3

[experience]
saved_path = "/tmp/experience"
auto_save = true
"#;

        let config: Result<Config, _> = toml::from_str(toml_content);
        assert!(config.is_ok(), "Deserialization failed: {:?}", config.err());

        let config = config.unwrap();
        assert_eq!(config.general.max_step, 20);
        assert_eq!(config.host_agent.name, "Host");
        assert!(config.app_agent.follower_mode);
        assert_eq!(config.app_agent.terminal_actions, vec!["finish", "done"]);
        assert_eq!(config.app_agent.experience_top_k, 3);
        assert!(config.experience.auto_save);
        assert_eq!(
            config.task_log_dir("notepad"),
            PathBuf::from("/var/log/deskpilot/notepad")
        );
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: Config = toml::from_str("[general]\nmax_step = 5\n").unwrap();

        assert_eq!(config.general.max_step, 5);
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.app_agent.terminal_actions, vec!["finish"]);
    }
}

mod config_manager_tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = setup_config_dir();
        let manager = ConfigManager::with_path(dir.path().join("config.toml")).unwrap();

        assert_eq!(manager.config().general.max_step, 50);
        assert!(!manager.config_path().exists());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = setup_config_dir();
        let path = dir.path().join("nested").join("config.toml");

        let mut manager = ConfigManager::with_path(path.clone()).unwrap();
        manager.config_mut().general.max_step = 12;
        manager.config_mut().app_agent.follower_mode = true;
        manager.save().unwrap();
        assert!(path.exists());

        let reloaded = ConfigManager::with_path(path).unwrap().into_config();
        assert_eq!(reloaded.general.max_step, 12);
        assert!(reloaded.app_agent.follower_mode);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = setup_config_dir();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[general\nmax_step = ").unwrap();

        let err = ConfigManager::with_path(path).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_zero_max_step_rejected() {
        let dir = setup_config_dir();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[general]\nmax_step = 0\n").unwrap();

        let err = ConfigManager::with_path(path).err().unwrap();
        assert!(err.to_string().contains("max_step"));
    }
}
