use std::{collections::HashMap, fs, path::Path};

use anyhow::Context;
use url::Url;

pub const SETTINGS_FILE: &str = "register.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base_url: Option<String>,
    /// Sent as `X-Register-Secret`; empty when unset.
    pub api_secret_key: String,
}

impl ClientSettings {
    pub fn base_url(&self) -> anyhow::Result<Url> {
        let raw = self
            .api_base_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .context("profile service base url is not configured; set REGISTER_API_BASE_URL")?;
        Url::parse(raw).with_context(|| format!("invalid profile service base url '{raw}'"))
    }
}

/// Defaults, then `register.toml` in the working directory, then environment.
pub fn load_settings() -> ClientSettings {
    let file = fs::read_to_string(SETTINGS_FILE).ok();
    settings_from_sources(file.as_deref(), |key| std::env::var(key).ok())
}

/// Like [`load_settings`] but with an explicit file that must exist.
pub fn load_settings_from(path: &Path) -> anyhow::Result<ClientSettings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
    toml::from_str::<HashMap<String, String>>(&raw)
        .with_context(|| format!("settings file '{}' is not a table of strings", path.display()))?;
    Ok(settings_from_sources(Some(&raw), |key| std::env::var(key).ok()))
}

fn settings_from_sources(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Some(raw) = file {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) {
            if let Some(v) = file_cfg.get("api_base_url") {
                settings.api_base_url = Some(v.clone());
            }
            if let Some(v) = file_cfg.get("api_secret_key") {
                settings.api_secret_key = v.clone();
            }
        }
    }

    if let Some(v) = env("REGISTER_API_BASE_URL") {
        settings.api_base_url = Some(v);
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = Some(v);
    }

    if let Some(v) = env("REGISTER_API_SECRET_KEY") {
        settings.api_secret_key = v;
    }
    if let Some(v) = env("APP__API_SECRET_KEY") {
        settings.api_secret_key = v;
    }

    settings
}
