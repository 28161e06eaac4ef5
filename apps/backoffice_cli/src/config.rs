use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use client_core::ClientOptions;
use serde::Deserialize;
use shared::domain::Role;
use tracing::warn;

pub const SETTINGS_FILE: &str = "backoffice.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub role: Role,
    pub request_timeout_secs: u64,
    pub cancel_stale_reads: bool,
    pub toast_auto_close_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:3000/api".into(),
            api_token: None,
            role: Role::Trainer,
            request_timeout_secs: 30,
            cancel_stale_reads: false,
            toast_auto_close_ms: 5000,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    api_token: Option<String>,
    role: Option<String>,
    request_timeout_secs: Option<u64>,
    cancel_stale_reads: Option<bool>,
    toast_auto_close_ms: Option<u64>,
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let mut settings = Settings::default();
    let path = Path::new(SETTINGS_FILE);
    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        settings
            .apply_file(&raw)
            .with_context(|| format!("invalid settings file '{}'", path.display()))?;
    }
    settings.apply_env(|key| std::env::var(key).ok());
    Ok(settings)
}

impl Settings {
    pub fn apply_file(&mut self, raw: &str) -> anyhow::Result<()> {
        let file: FileSettings = toml::from_str(raw)?;
        if let Some(v) = file.api_base_url {
            self.api_base_url = v;
        }
        if let Some(v) = file.api_token {
            self.api_token = Some(v);
        }
        if let Some(v) = file.role {
            self.role = v.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(v) = file.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(v) = file.cancel_stale_reads {
            self.cancel_stale_reads = v;
        }
        if let Some(v) = file.toast_auto_close_ms {
            self.toast_auto_close_ms = v;
        }
        Ok(())
    }

    /// `APP__*` names win over the short ones. Unparsable values are skipped.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("API_BASE_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = lookup("APP__API_BASE_URL") {
            self.api_base_url = v;
        }

        if let Some(v) = lookup("API_TOKEN") {
            self.api_token = Some(v);
        }
        if let Some(v) = lookup("APP__API_TOKEN") {
            self.api_token = Some(v);
        }

        if let Some(v) = lookup("APP__ROLE") {
            match v.parse() {
                Ok(role) => self.role = role,
                Err(err) => warn!(value = %v, error = %err, "config: ignoring APP__ROLE"),
            }
        }

        if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
            if let Ok(parsed) = v.parse::<u64>() {
                self.request_timeout_secs = parsed;
            }
        }
        if let Some(v) = lookup("APP__CANCEL_STALE_READS") {
            if let Ok(parsed) = v.parse::<bool>() {
                self.cancel_stale_reads = parsed;
            }
        }
        if let Some(v) = lookup("APP__TOAST_AUTO_CLOSE_MS") {
            if let Ok(parsed) = v.parse::<u64>() {
                self.toast_auto_close_ms = parsed;
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            cancel_stale_reads: self.cancel_stale_reads,
            toast_auto_close: Duration::from_millis(self.toast_auto_close_ms),
            ..ClientOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn file_values_override_defaults() {
        let mut settings = Settings::default();
        settings
            .apply_file(
                r#"
                api_base_url = "https://school.example.test/api"
                role = "manager"
                cancel_stale_reads = true
                "#,
            )
            .expect("valid file");

        assert_eq!(settings.api_base_url, "https://school.example.test/api");
        assert_eq!(settings.role, Role::Manager);
        assert!(settings.cancel_stale_reads);
        assert_eq!(settings.request_timeout_secs, 30);
    }

    #[test]
    fn unknown_role_in_file_is_an_error() {
        let mut settings = Settings::default();

        assert!(settings.apply_file("role = \"janitor\"").is_err());
    }

    #[test]
    fn prefixed_env_wins_over_short_name() {
        let mut settings = Settings::default();
        settings.apply_env(env(&[
            ("API_BASE_URL", "http://short.test"),
            ("APP__API_BASE_URL", "http://prefixed.test"),
            ("API_TOKEN", "t0k3n"),
            ("APP__ROLE", "admin"),
        ]));

        assert_eq!(settings.api_base_url, "http://prefixed.test");
        assert_eq!(settings.api_token.as_deref(), Some("t0k3n"));
        assert_eq!(settings.role, Role::Admin);
    }

    #[test]
    fn unparsable_env_values_are_skipped() {
        let mut settings = Settings::default();
        settings.apply_env(env(&[
            ("APP__ROLE", "janitor"),
            ("APP__REQUEST_TIMEOUT_SECS", "soon"),
            ("APP__TOAST_AUTO_CLOSE_MS", "1500"),
        ]));

        assert_eq!(settings.role, Role::Trainer);
        assert_eq!(settings.request_timeout_secs, 30);
        assert_eq!(settings.toast_auto_close_ms, 1500);
    }

    #[test]
    fn client_options_follow_settings() {
        let settings = Settings {
            cancel_stale_reads: true,
            toast_auto_close_ms: 2000,
            request_timeout_secs: 5,
            ..Settings::default()
        };

        let options = settings.client_options();

        assert!(options.cancel_stale_reads);
        assert_eq!(options.toast_auto_close, Duration::from_millis(2000));
        assert_eq!(options.alert_handoff_delay, Duration::ZERO);
        assert_eq!(settings.request_timeout(), Duration::from_secs(5));
    }
}
