//! OpenAI client configuration.

/// Configuration for the OpenAI client.
///
/// There is no API key here: the key belongs to the user's session and is
/// passed with each request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAIConfig {
    /// Base URL for the API (defaults to OpenAI's API).
    pub base_url: String,
    /// Default model to use.
    pub model: String,
    /// Optional organization ID.
    pub organization: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl OpenAIConfig {
    /// Default OpenAI API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "gpt-4o";
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Creates a configuration with the default endpoint and model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the default model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the organization ID.
    #[must_use]
    pub fn with_organization(mut self, org: impl Into<String>) -> Self {
        self.organization = Some(org.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            model: Self::DEFAULT_MODEL.to_owned(),
            organization: None,
            timeout_secs: Some(Self::DEFAULT_TIMEOUT_SECS),
        }
    }
}
