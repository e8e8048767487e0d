//! Configuration schema definitions.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use vista::analysis::AnalysisSettings;
use vista::llms::OpenAIConfig;
use vista::render::Theme;

use super::{ConfigError, ConfigResult};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Completion service settings.
    #[serde(default)]
    pub provider: ProviderSection,

    /// Web server settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Presentation settings.
    #[serde(default)]
    pub ui: UiSection,
}

impl AppConfig {
    /// Check values that would only fail later at request time.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for the first bad value found.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.provider.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue("provider.base_url is empty".into()));
        }
        if self.provider.model.trim().is_empty() {
            return Err(ConfigError::InvalidValue("provider.model is empty".into()));
        }
        if self.provider.max_tokens == 0 {
            return Err(ConfigError::InvalidValue(
                "provider.max_tokens must be greater than zero".into(),
            ));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue(
                "server.max_upload_bytes must be greater than zero".into(),
            ));
        }
        if self.server.session_idle_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "server.session_idle_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// OpenAI-compatible endpoint. The API key is never stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSection {
    /// API base URL.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Output token cap.
    pub max_tokens: u32,
    /// HTTP client timeout in seconds.
    pub timeout_secs: u64,
    /// Optional organization ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self {
            base_url: OpenAIConfig::DEFAULT_BASE_URL.to_string(),
            model: OpenAIConfig::DEFAULT_MODEL.to_string(),
            max_tokens: AnalysisSettings::DEFAULT_MAX_TOKENS,
            timeout_secs: OpenAIConfig::DEFAULT_TIMEOUT_SECS,
            organization: None,
        }
    }
}

impl ProviderSection {
    /// Client configuration for this section.
    #[must_use]
    pub fn openai_config(&self) -> OpenAIConfig {
        let config = OpenAIConfig::new()
            .with_base_url(&self.base_url)
            .with_model(&self.model)
            .with_timeout(self.timeout_secs);
        match &self.organization {
            Some(org) => config.with_organization(org),
            None => config,
        }
    }

    /// Request settings for this section.
    #[must_use]
    pub fn analysis_settings(&self) -> AnalysisSettings {
        AnalysisSettings::default()
            .with_model(&self.model)
            .with_max_tokens(self.max_tokens)
    }
}

/// Web server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Largest accepted upload.
    pub max_upload_bytes: usize,
    /// Seconds a session may go unused before it and its upload are dropped.
    pub session_idle_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7860,
            max_upload_bytes: 20 * 1024 * 1024,
            session_idle_secs: 30 * 60,
        }
    }
}

impl ServerSection {
    /// `host:port` string for binding.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// How long an unused session is kept.
    #[must_use]
    pub const fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}

/// Presentation settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSection {
    /// Theme new sessions start with.
    pub theme: Theme,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.provider.model, "gpt-4o");
        assert_eq!(config.provider.max_tokens, 1200);
        assert_eq!(config.server.bind_addr(), "127.0.0.1:7860");
        assert_eq!(config.server.session_idle(), Duration::from_secs(1800));
        assert_eq!(config.ui.theme, Theme::Light);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file() {
        let config: AppConfig = toml::from_str(
            r#"
            [provider]
            model = "gpt-4o-mini"

            [ui]
            theme = "dark"
            "#,
        )
        .unwrap();

        assert_eq!(config.provider.model, "gpt-4o-mini");
        assert_eq!(config.provider.max_tokens, 1200);
        assert_eq!(config.server.port, 7860);
        assert_eq!(config.ui.theme, Theme::Dark);
    }

    #[test]
    fn test_rejects_unknown_section() {
        let result: Result<AppConfig, _> = toml::from_str("[secrets]\napi_key = \"sk\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = AppConfig::default();
        config.provider.max_tokens = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(_))
        ));

        let mut config = AppConfig::default();
        config.server.session_idle_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(msg)) if msg.contains("session_idle_secs")
        ));
    }

    #[test]
    fn test_sections_flow_into_library_types() {
        let mut config = AppConfig::default();
        config.provider.base_url = "http://localhost:8000/v1".into();
        config.provider.organization = Some("org-1".into());
        config.provider.max_tokens = 500;

        let client = config.provider.openai_config();
        assert_eq!(client.base_url, "http://localhost:8000/v1");
        assert_eq!(client.organization.as_deref(), Some("org-1"));
        assert_eq!(client.timeout_secs, Some(120));

        let settings = config.provider.analysis_settings();
        assert_eq!(settings.model, "gpt-4o");
        assert_eq!(settings.max_tokens, 500);
    }

    #[test]
    fn test_round_trip_omits_missing_org() {
        let text = toml::to_string_pretty(&AppConfig::default()).unwrap();
        assert!(!text.contains("organization"));
        let back: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, AppConfig::default());
    }
}
