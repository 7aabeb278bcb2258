use std::{fs, path::Path, time::Duration};

use anyhow::{anyhow, Context};
use client_core::{ApiConfig, StockDeltaMode, DEFAULT_API_BASE};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "scoop-admin.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_base: String,
    pub stock_delta_mode: String,
    pub request_timeout_secs: Option<u64>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            stock_delta_mode: "body".into(),
            request_timeout_secs: None,
            log_filter: "warn".into(),
        }
    }
}

impl Settings {
    pub fn api_config(&self) -> anyhow::Result<ApiConfig> {
        let mode = StockDeltaMode::parse(&self.stock_delta_mode).ok_or_else(|| {
            anyhow!(
                "unknown stock_delta_mode '{}' (expected body or query)",
                self.stock_delta_mode
            )
        })?;
        let config = ApiConfig::new(&self.api_base)
            .with_context(|| format!("invalid api_base '{}'", self.api_base))?;
        Ok(config
            .with_stock_delta_mode(mode)
            .with_request_timeout(self.request_timeout_secs.map(Duration::from_secs)))
    }
}

/// Defaults, then `scoop-admin.toml` (or the explicit `--config` file, which
/// must exist), then environment overrides.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    load_settings_with(config_path, |key| std::env::var(key).ok())
}

fn load_settings_with(
    config_path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = match config_path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config '{}'", path.display()))?;
            parse_settings(&raw, path)?
        }
        None => match fs::read_to_string(DEFAULT_CONFIG_FILE) {
            Ok(raw) => parse_settings(&raw, Path::new(DEFAULT_CONFIG_FILE))?,
            Err(_) => Settings::default(),
        },
    };

    if let Some(v) = env("SCOOP_API_BASE") {
        settings.api_base = v;
    }
    if let Some(v) = env("APP__API_BASE") {
        settings.api_base = v;
    }

    if let Some(v) = env("APP__STOCK_DELTA_MODE") {
        settings.stock_delta_mode = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout_secs = Some(parsed);
        }
    }

    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    Ok(settings)
}

fn parse_settings(raw: &str, path: &Path) -> anyhow::Result<Settings> {
    toml::from_str(raw).with_context(|| format!("failed to parse config '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        env,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    fn temp_config(contents: &str) -> std::path::PathBuf {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = env::temp_dir().join(format!("scoop_admin_config_{suffix}.toml"));
        fs::write(&path, contents).expect("write config");
        path
    }

    #[test]
    fn file_values_apply_and_env_wins() {
        let path = temp_config(
            "api_base = \"http://file.local:9000/\"\nstock_delta_mode = \"query\"\nrequest_timeout_secs = 12\n",
        );

        let settings = load_settings_with(Some(path.as_path()), env_from(&[])).expect("settings");
        assert_eq!(settings.api_base, "http://file.local:9000/");
        assert_eq!(settings.stock_delta_mode, "query");
        assert_eq!(settings.request_timeout_secs, Some(12));
        assert_eq!(settings.log_filter, "warn");

        let settings = load_settings_with(
            Some(path.as_path()),
            env_from(&[
                ("SCOOP_API_BASE", "http://scoop.local"),
                ("APP__API_BASE", "http://app.local"),
                ("APP__REQUEST_TIMEOUT_SECS", "not-a-number"),
                ("APP__LOG_FILTER", "client_core=debug"),
            ]),
        )
        .expect("settings");
        assert_eq!(settings.api_base, "http://app.local");
        assert_eq!(settings.request_timeout_secs, Some(12));
        assert_eq!(settings.log_filter, "client_core=debug");

        fs::remove_file(path).expect("cleanup");
    }

    #[test]
    fn explicit_config_must_exist() {
        let missing = env::temp_dir().join("scoop_admin_missing_config.toml");
        let err = load_settings_with(Some(missing.as_path()), env_from(&[])).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }

    #[test]
    fn settings_build_api_config() {
        let settings = Settings {
            api_base: "http://127.0.0.1:8080/".into(),
            stock_delta_mode: "quantity".into(),
            request_timeout_secs: Some(5),
            ..Settings::default()
        };
        let config = settings.api_config().expect("config");
        assert_eq!(config.base_url(), "http://127.0.0.1:8080");
        assert_eq!(config.stock_delta_mode(), StockDeltaMode::Query);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn rejects_unknown_delta_mode_and_bad_base() {
        let settings = Settings {
            stock_delta_mode: "header".into(),
            ..Settings::default()
        };
        assert!(settings.api_config().is_err());

        let settings = Settings {
            api_base: "ftp://example.com".into(),
            ..Settings::default()
        };
        let err = settings.api_config().unwrap_err();
        assert!(err.to_string().contains("invalid api_base"));
    }

    #[test]
    fn defaults_point_at_production_api() {
        let config = Settings::default().api_config().expect("config");
        assert_eq!(config.base_url(), DEFAULT_API_BASE);
        assert_eq!(config.stock_delta_mode(), StockDeltaMode::Body);
        assert_eq!(config.request_timeout(), None);
    }
}
