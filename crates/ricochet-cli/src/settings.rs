use ricochet_core::{ConfigError, HintConfig};
use std::path::{Path, PathBuf};

/// Default config location, e.g. `~/.config/ricochet-hints/config.json`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ricochet-hints").join("config.json"))
}

/// Load the hint configuration.
///
/// An explicit path must exist. Without one the default location is used
/// when present, otherwise built-in defaults. Environment overrides apply
/// last.
pub fn load(explicit: Option<&Path>) -> Result<HintConfig, ConfigError> {
    let config = match explicit {
        Some(path) => HintConfig::from_path(path)?,
        None => match default_config_path() {
            Some(path) if path.exists() => HintConfig::from_path(path)?,
            _ => HintConfig::default(),
        },
    };
    Ok(config.with_env_overrides())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_missing_file_fails() {
        let path = std::env::temp_dir().join("ricochet-hints-missing-config.json");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(load(Some(&path)), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_explicit_file_loaded() {
        let name = format!("ricochet-hints-config-{}.json", std::process::id());
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, r#"{"max_real_hints_low_tier": 6, "hint_history_len": 3}"#).unwrap();
        let config = load(Some(&path)).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(config.max_real_hints_low_tier, 6);
        assert_eq!(config.hint_history_len, 3);
        assert_eq!(config.min_pre_hints, 2);
    }

    #[test]
    fn test_default_path_under_app_dir() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("ricochet-hints/config.json"));
        }
    }
}
