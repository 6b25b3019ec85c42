//! Shape of `config.toml`, its validation and environment overrides.
//!
//! Every section has serde defaults, so a partial file (or none at all) still
//! produces a usable configuration.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use storyland::prelude::{
    ElevenLabsConfig, LlmError, NarrationCap, OpenAIConfig, Persona, TokenRatio,
};

/// Everything `config.toml` can hold.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorylandConfig {
    /// Story generation settings.
    #[serde(default)]
    pub story: StoryConfig,

    /// Provider credentials.
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Narration settings.
    #[serde(default)]
    pub narration: NarrationConfig,
}

/// Story generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryConfig {
    /// Chat model.
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Storyteller persona version.
    #[serde(default)]
    pub persona: Persona,
    /// Words represented by one token.
    #[serde(default = "default_words_per_token")]
    pub words_per_token: f64,
    /// Optional narration ceiling on the token budget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap: Option<CapConfig>,
}

fn default_model() -> String {
    OpenAIConfig::DEFAULT_MODEL.to_owned()
}

const fn default_temperature() -> f32 {
    storyland::storyteller::Storyteller::DEFAULT_TEMPERATURE
}

const fn default_words_per_token() -> f64 {
    TokenRatio::DEFAULT_WORDS_PER_TOKEN
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            persona: Persona::default(),
            words_per_token: default_words_per_token(),
            cap: None,
        }
    }
}

impl StoryConfig {
    /// The configured words-per-token ratio.
    ///
    /// # Errors
    ///
    /// Returns an invalid input error if the ratio is not positive.
    pub fn ratio(&self) -> storyland::Result<TokenRatio> {
        TokenRatio::new(self.words_per_token)
    }

    /// The configured narration cap, if any.
    #[must_use]
    pub fn narration_cap(&self) -> Option<NarrationCap> {
        self.cap
            .map(|c| NarrationCap::new(c.max_minutes, c.tokens_per_minute))
    }
}

/// Narration ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapConfig {
    /// Longest narration allowed, in minutes.
    #[serde(default = "default_max_minutes")]
    pub max_minutes: u32,
    /// Spoken tokens per minute.
    #[serde(default = "default_tokens_per_minute")]
    pub tokens_per_minute: u32,
}

const fn default_max_minutes() -> u32 {
    NarrationCap::DEFAULT_MAX_MINUTES
}

const fn default_tokens_per_minute() -> u32 {
    NarrationCap::DEFAULT_TOKENS_PER_MINUTE
}

impl Default for CapConfig {
    fn default() -> Self {
        Self {
            max_minutes: default_max_minutes(),
            tokens_per_minute: default_tokens_per_minute(),
        }
    }
}

/// Provider credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// OpenAI configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<OpenAIProviderConfig>,

    /// ElevenLabs configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevenlabs: Option<ElevenLabsProviderConfig>,
}

/// `[providers.openai]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIProviderConfig {
    /// API key.
    pub api_key: String,
    /// Base URL override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// ElevenLabs provider config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElevenLabsProviderConfig {
    /// API key.
    pub api_key: String,
    /// Default voice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    /// Speech model override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
}

impl ProvidersConfig {
    /// Client configuration for OpenAI.
    ///
    /// # Errors
    ///
    /// Returns an auth error when no API key is configured.
    pub fn openai(&self, model: &str) -> storyland::Result<OpenAIConfig> {
        let provider = self.openai.as_ref().ok_or_else(|| {
            LlmError::auth(
                "openai",
                "OPENAI_API_KEY environment variable not set and no [providers.openai] api_key",
            )
        })?;

        let mut config = OpenAIConfig::new(&provider.api_key).with_model(model);
        if let Some(base_url) = &provider.base_url {
            config = config.with_base_url(base_url);
        }
        Ok(config)
    }

    /// Client configuration for ElevenLabs.
    ///
    /// # Errors
    ///
    /// Returns an auth error when no API key is configured.
    pub fn elevenlabs(&self) -> storyland::Result<ElevenLabsConfig> {
        let provider = self.elevenlabs.as_ref().ok_or_else(|| {
            LlmError::auth(
                "elevenlabs",
                "ELEVENLABS_API_KEY environment variable not set and no [providers.elevenlabs] api_key",
            )
        })?;

        let mut config = ElevenLabsConfig::new(&provider.api_key);
        if let Some(voice_id) = &provider.voice_id {
            config = config.with_voice_id(voice_id);
        }
        if let Some(model_id) = &provider.model_id {
            config = config.with_model_id(model_id);
        }
        Ok(config)
    }
}

/// Narration back end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NarrationProvider {
    /// OpenAI speech.
    #[default]
    #[value(name = "openai")]
    OpenAI,
    /// ElevenLabs voice cloning.
    #[value(name = "elevenlabs")]
    ElevenLabs,
    /// Google Translate speech.
    Google,
}

impl NarrationProvider {
    /// Name as written in configuration files.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::ElevenLabs => "elevenlabs",
            Self::Google => "google",
        }
    }
}

impl std::fmt::Display for NarrationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Narration settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NarrationConfig {
    /// Back end used by `generate --narrate` and `narrate`.
    #[serde(default)]
    pub provider: NarrationProvider,
    /// Voice id, or language code for Google.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    /// Speech model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Speaking rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    /// Voice stability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability: Option<f32>,
    /// Similarity boost.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_boost: Option<f32>,
}

impl StorylandConfig {
    /// Checks ranges and provider prerequisites.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if !(0.0..=2.0).contains(&self.story.temperature) {
            issues.push(ConfigIssue::error(
                "story.temperature",
                "Temperature must be between 0.0 and 2.0",
            ));
        }

        if !(self.story.words_per_token.is_finite() && self.story.words_per_token > 0.0) {
            issues.push(ConfigIssue::error(
                "story.words_per_token",
                "Words per token must be a positive number",
            ));
        }

        if let Some(cap) = self.story.cap
            && (cap.max_minutes == 0 || cap.tokens_per_minute == 0)
        {
            issues.push(ConfigIssue::error(
                "story.cap",
                "A zero cap leaves no room for a story",
            ));
        }

        for (path, value) in [
            ("narration.stability", self.narration.stability),
            ("narration.similarity_boost", self.narration.similarity_boost),
        ] {
            if value.is_some_and(|v| !(0.0..=1.0).contains(&v)) {
                issues.push(ConfigIssue::error(path, "Value must be between 0.0 and 1.0"));
            }
        }

        if self.narration.speed.is_some_and(|s| s <= 0.0) {
            issues.push(ConfigIssue::error(
                "narration.speed",
                "Speed must be positive",
            ));
        }

        match self.narration.provider {
            NarrationProvider::OpenAI if self.providers.openai.is_none() => {
                issues.push(ConfigIssue::warning(
                    "narration.provider",
                    "OpenAI narration selected but no API key is set. Set OPENAI_API_KEY env var.",
                ));
            }
            NarrationProvider::ElevenLabs => match &self.providers.elevenlabs {
                None => issues.push(ConfigIssue::warning(
                    "narration.provider",
                    "ElevenLabs narration selected but no API key is set. Set ELEVENLABS_API_KEY env var.",
                )),
                Some(el) if el.voice_id.is_none() && self.narration.voice.is_none() => {
                    issues.push(ConfigIssue::warning(
                        "providers.elevenlabs.voice_id",
                        "No ElevenLabs voice configured. Set ELEVENLABS_VOICE_ID or pass --voice.",
                    ));
                }
                Some(_) => {}
            },
            _ => {}
        }

        issues
    }

    /// No [`IssueLevel::Error`] issues.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate()
            .iter()
            .all(|issue| issue.level != IssueLevel::Error)
    }

    /// Applies environment overrides from the process environment.
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_env_from(|name| std::env::var(name).ok())
    }

    /// Merge variables from `lookup` into the configuration.
    ///
    /// API keys fill in missing provider sections; the base URL, model and
    /// voice variables override the file.
    #[must_use]
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if self.providers.openai.is_none()
            && let Some(key) = lookup("OPENAI_API_KEY")
        {
            self.providers.openai = Some(OpenAIProviderConfig {
                api_key: key,
                base_url: None,
            });
        }

        if let Some(openai) = self.providers.openai.as_mut()
            && let Some(base_url) = lookup("OPENAI_BASE_URL")
        {
            openai.base_url = Some(base_url);
        }

        if let Some(model) = lookup("OPENAI_MODEL") {
            self.story.model = model;
        }

        if self.providers.elevenlabs.is_none()
            && let Some(key) = lookup("ELEVENLABS_API_KEY")
        {
            self.providers.elevenlabs = Some(ElevenLabsProviderConfig {
                api_key: key,
                voice_id: None,
                model_id: None,
            });
        }

        if let Some(elevenlabs) = self.providers.elevenlabs.as_mut()
            && let Some(voice_id) = lookup("ELEVENLABS_VOICE_ID")
        {
            elevenlabs.voice_id = Some(voice_id);
        }

        self
    }
}

/// One finding from [`StorylandConfig::validate`].
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    /// Severity.
    pub level: IssueLevel,
    /// Dotted key, e.g. `story.temperature`.
    pub path: String,
    /// What is wrong.
    pub message: String,
}

impl ConfigIssue {
    fn at(level: IssueLevel, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            path: path.into(),
            message: message.into(),
        }
    }

    /// A setting that would make story generation fail.
    #[must_use]
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::at(IssueLevel::Error, path, message)
    }

    /// A setting that only matters for some commands.
    #[must_use]
    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::at(IssueLevel::Warning, path, message)
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.level {
            IssueLevel::Error => "error",
            IssueLevel::Warning => "warning",
        };
        write!(f, "{level}: {} ({})", self.message, self.path)
    }
}

/// How serious a [`ConfigIssue`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueLevel {
    /// Error that prevents stories from being generated correctly.
    Error,
    /// Worth fixing before the affected command is used.
    Warning,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn with_openai() -> StorylandConfig {
        let mut config = StorylandConfig::default();
        config.providers.openai = Some(OpenAIProviderConfig {
            api_key: "sk-test".into(),
            base_url: None,
        });
        config
    }

    #[test]
    fn defaults_are_valid() {
        let config = StorylandConfig::default();
        assert_eq!(config.story.model, "gpt-4o");
        assert!((config.story.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.story.persona, Persona::V2);
        assert!(config.story.cap.is_none());
        assert_eq!(config.narration.provider, NarrationProvider::OpenAI);
    }

    #[test]
    fn defaults_survive_toml() {
        let mut config = with_openai();
        config.story.cap = Some(CapConfig::default());
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: StorylandConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.story.model, config.story.model);
        assert_eq!(parsed.story.cap, Some(CapConfig::default()));
        assert_eq!(parsed.providers.openai.unwrap().api_key, "sk-test");
    }

    #[test]
    fn parses_documented_sample() {
        let toml_str = r#"
[story]
model = "gpt-4"
persona = "v1"

[story.cap]
max_minutes = 10

[providers.elevenlabs]
api_key = "xi-123"
voice_id = "21m00Tcm4TlvDq8ikWAM"

[narration]
provider = "elevenlabs"
stability = 0.5
"#;

        let config: StorylandConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.story.model, "gpt-4");
        assert_eq!(config.story.persona, Persona::V1);
        assert_eq!(config.narration.provider, NarrationProvider::ElevenLabs);

        let cap = config.story.narration_cap().unwrap();
        assert_eq!(cap.max_tokens(), 1500);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn rejects_unknown_sections() {
        assert!(toml::from_str::<StorylandConfig>("[agents]\nmodel = \"x\"\n").is_err());
    }

    mod validate {
        use super::*;

        #[test]
        fn default_with_key_has_no_issues() {
            let config = with_openai();
            assert!(config.validate().is_empty());
            assert!(config.is_valid());
        }

        #[test]
        fn missing_openai_key_is_a_warning() {
            let issues = StorylandConfig::default().validate();
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].level, IssueLevel::Warning);
            assert_eq!(issues[0].path, "narration.provider");
        }

        #[test]
        fn temperature_out_of_range() {
            let mut config = with_openai();
            config.story.temperature = 2.5;
            assert!(!config.is_valid());
        }

        #[test]
        fn non_positive_ratio() {
            let mut config = with_openai();
            config.story.words_per_token = 0.0;
            assert!(!config.is_valid());
            assert!(config.story.ratio().is_err());
        }

        #[test]
        fn zero_cap() {
            let mut config = with_openai();
            config.story.cap = Some(CapConfig {
                max_minutes: 0,
                tokens_per_minute: 150,
            });
            let issues = config.validate();
            assert!(issues.iter().any(|i| i.path == "story.cap" && i.level == IssueLevel::Error));
        }

        #[test]
        fn voice_settings_out_of_range() {
            let mut config = with_openai();
            config.narration.stability = Some(1.5);
            config.narration.speed = Some(0.0);
            assert_eq!(config.validate().len(), 2);
        }

        #[test]
        fn elevenlabs_without_voice() {
            let mut config = StorylandConfig::default();
            config.narration.provider = NarrationProvider::ElevenLabs;
            config.providers.elevenlabs = Some(ElevenLabsProviderConfig {
                api_key: "xi".into(),
                voice_id: None,
                model_id: None,
            });
            let issues = config.validate();
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].path, "providers.elevenlabs.voice_id");
        }

        #[test]
        fn google_needs_no_credentials() {
            let mut config = StorylandConfig::default();
            config.narration.provider = NarrationProvider::Google;
            assert!(config.validate().is_empty());
        }
    }

    mod env {
        use super::*;

        fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
            let vars: HashMap<String, String> = vars
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect();
            move |name| vars.get(name).cloned()
        }

        #[test]
        fn fills_missing_keys() {
            let config = StorylandConfig::default().with_env_from(lookup(&[
                ("OPENAI_API_KEY", "sk-env"),
                ("OPENAI_BASE_URL", "http://localhost:8080/v1"),
                ("ELEVENLABS_API_KEY", "xi-env"),
                ("ELEVENLABS_VOICE_ID", "voice-env"),
            ]));

            let openai = config.providers.openai.unwrap();
            assert_eq!(openai.api_key, "sk-env");
            assert_eq!(openai.base_url.as_deref(), Some("http://localhost:8080/v1"));
            let elevenlabs = config.providers.elevenlabs.unwrap();
            assert_eq!(elevenlabs.api_key, "xi-env");
            assert_eq!(elevenlabs.voice_id.as_deref(), Some("voice-env"));
        }

        #[test]
        fn file_keys_win_over_env_keys() {
            let config = with_openai().with_env_from(lookup(&[("OPENAI_API_KEY", "sk-env")]));
            assert_eq!(config.providers.openai.unwrap().api_key, "sk-test");
        }

        #[test]
        fn model_variable_overrides_file() {
            let config =
                StorylandConfig::default().with_env_from(lookup(&[("OPENAI_MODEL", "gpt-4")]));
            assert_eq!(config.story.model, "gpt-4");
        }

        #[test]
        fn empty_environment_changes_nothing() {
            let config = StorylandConfig::default().with_env_from(lookup(&[]));
            assert!(config.providers.openai.is_none());
            assert!(config.providers.elevenlabs.is_none());
        }
    }

    mod providers {
        use super::*;

        #[test]
        fn openai_requires_key() {
            let err = ProvidersConfig::default().openai("gpt-4o").unwrap_err();
            assert!(err.to_string().contains("OPENAI_API_KEY"));
        }

        #[test]
        fn openai_carries_model_and_base_url() {
            let mut config = with_openai();
            if let Some(openai) = config.providers.openai.as_mut() {
                openai.base_url = Some("http://localhost:8080/v1".into());
            }
            let client = config.providers.openai("gpt-4").unwrap();
            assert_eq!(client.model, "gpt-4");
            assert_eq!(client.base_url, "http://localhost:8080/v1");
        }

        #[test]
        fn elevenlabs_carries_voice() {
            let providers = ProvidersConfig {
                openai: None,
                elevenlabs: Some(ElevenLabsProviderConfig {
                    api_key: "xi".into(),
                    voice_id: Some("v".into()),
                    model_id: Some("eleven_turbo_v2".into()),
                }),
            };
            let config = providers.elevenlabs().unwrap();
            assert_eq!(config.voice_id.as_deref(), Some("v"));
            assert_eq!(config.model_id, "eleven_turbo_v2");
        }
    }
}
