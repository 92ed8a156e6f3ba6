use serde::Deserialize;
use std::fs;
use std::path::Path;

const ENV_CONFIG_PATH: &str = "CRISIS_INTEL_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

const ENV_STALENESS_SECONDS: &str = "CRISIS_INTEL_STALENESS_SECONDS";
const ENV_FETCH_TIMEOUT_SECONDS: &str = "CRISIS_INTEL_FETCH_TIMEOUT_SECONDS";

/// Default staleness threshold for cached predictions (10 minutes)
const DEFAULT_STALENESS_SECONDS: u64 = 600;

/// Default per-call timeout for upstream fetches
const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 15;

/// Signal-source endpoint overrides. Any endpoint left unset falls back to
/// the source's built-in default; a source may also be disabled outright.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignalConfig {
    #[serde(default)]
    pub weather_url: Option<String>,
    #[serde(default)]
    pub news_url: Option<String>,
    #[serde(default)]
    pub alerts_url: Option<String>,
    #[serde(default)]
    pub satellite_url: Option<String>,
    /// Signal labels to skip entirely (e.g. ["satelliteData"])
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl SignalConfig {
    pub fn is_disabled(&self, label: &str) -> bool {
        self.disabled.iter().any(|d| d == label)
    }
}

/// YAML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub signals: SignalConfig,
}

/// Application configuration for the prediction core
#[derive(Debug, Clone)]
pub struct Config {
    pub signals: SignalConfig,
    /// Seconds after which a cached prediction is considered outdated
    pub staleness_seconds: u64,
    /// Per-call timeout applied to every upstream fetch
    pub fetch_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            signals: SignalConfig::default(),
            staleness_seconds: DEFAULT_STALENESS_SECONDS,
            fetch_timeout_seconds: DEFAULT_FETCH_TIMEOUT_SECONDS,
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn from_env() -> Self {
        // Load .env file if present (ignore if missing)
        let _ = dotenvy::dotenv();

        let staleness_seconds = std::env::var(ENV_STALENESS_SECONDS)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_STALENESS_SECONDS);

        let fetch_timeout_seconds = std::env::var(ENV_FETCH_TIMEOUT_SECONDS)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECONDS);

        let config_path =
            std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let signals = Self::load_config_file(&config_path)
            .map(|cf| cf.signals)
            .unwrap_or_default();

        Self {
            signals,
            staleness_seconds,
            fetch_timeout_seconds,
        }
    }

    /// Read the optional YAML config file; any problem falls back to defaults.
    fn load_config_file(path: &str) -> Option<ConfigFile> {
        let path = Path::new(path);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, defaults apply");
            return None;
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Config file unreadable, defaults apply");
                return None;
            }
        };

        // An empty file is a valid (all-default) config
        if contents.trim().is_empty() {
            return Some(ConfigFile::default());
        }

        match serde_yaml::from_str(contents.trim()) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "Applied signal config file");
                Some(config)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Config file did not parse, defaults apply");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.staleness_seconds, 600);
        assert_eq!(config.fetch_timeout_seconds, 15);
        assert!(config.signals.weather_url.is_none());
    }

    #[test]
    fn test_signal_config_disabled() {
        let signals = SignalConfig {
            disabled: vec!["satelliteData".to_string()],
            ..Default::default()
        };
        assert!(signals.is_disabled("satelliteData"));
        assert!(!signals.is_disabled("weather"));
    }

    #[test]
    fn test_load_config_file_missing_and_empty() {
        assert!(Config::load_config_file("/nonexistent/crisis-intel.yaml").is_none());

        // An empty file still counts as a loaded (all-default) config
        let path = std::env::temp_dir().join("crisis-intel-empty-config.yaml");
        fs::write(&path, "   \n").unwrap();
        let loaded = Config::load_config_file(path.to_str().unwrap()).unwrap();
        assert!(loaded.signals.weather_url.is_none());
        assert!(loaded.signals.disabled.is_empty());
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_parse_config_file_yaml() {
        let yaml = r#"
signals:
  weather_url: "https://weather.internal/v1"
  disabled:
    - news
"#;
        let parsed: ConfigFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            parsed.signals.weather_url.as_deref(),
            Some("https://weather.internal/v1")
        );
        assert!(parsed.signals.is_disabled("news"));
    }
}
