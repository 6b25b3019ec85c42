//! Command-line flags, the last layer over the resolved configuration.

use std::path::Path;

use clap::Args;
use storyland::prelude::{
    AudioFormat, NARRATION_INSTRUCTIONS, NarrationCap, NarrationSettings, Persona,
};

use super::{ConfigError, ConfigResult, NarrationProvider, StorylandConfig};

/// Flags that override `[story]`.
#[derive(Debug, Clone, Default, Args)]
pub struct StoryOverrides {
    /// Longest narration allowed, in minutes (overrides [story.cap])
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_minutes: Option<u32>,

    /// Chat model (overrides config)
    #[arg(long, env = "STORYLAND_MODEL")]
    pub model: Option<String>,

    /// Persona version (v1, v2)
    #[arg(long)]
    pub persona: Option<Persona>,
}

impl StoryOverrides {
    /// Narration ceiling for this run.
    ///
    /// `--max-minutes` replaces the file's minutes but keeps its speaking
    /// rate.
    #[must_use]
    pub fn cap(&self, config: &StorylandConfig) -> Option<NarrationCap> {
        let Some(minutes) = self.max_minutes else {
            return config.story.narration_cap();
        };
        let tokens_per_minute = config
            .story
            .cap
            .map_or(NarrationCap::DEFAULT_TOKENS_PER_MINUTE, |c| c.tokens_per_minute);
        Some(NarrationCap::new(minutes, tokens_per_minute))
    }

    /// Chat model for this run.
    #[must_use]
    pub fn model(&self, config: &StorylandConfig) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| config.story.model.clone())
    }

    /// Persona for this run.
    #[must_use]
    pub fn persona(&self, config: &StorylandConfig) -> Persona {
        self.persona.unwrap_or(config.story.persona)
    }
}

/// Flags that override `[narration]`.
#[derive(Debug, Clone, Default, Args)]
pub struct VoiceOverrides {
    /// Narration provider (overrides config)
    #[arg(short, long, value_enum)]
    pub provider: Option<NarrationProvider>,

    /// Voice id, or language code for google
    #[arg(long)]
    pub voice: Option<String>,

    /// Speech model
    #[arg(long)]
    pub speech_model: Option<String>,

    /// Speaking rate (0.5 = slower, 2.0 = faster)
    #[arg(long, value_parser = parse_speed)]
    pub speed: Option<f32>,

    /// Voice stability (0.0 - 1.0)
    #[arg(long, value_parser = parse_unit)]
    pub stability: Option<f32>,

    /// Similarity boost (0.0 - 1.0)
    #[arg(long, value_parser = parse_unit)]
    pub similarity: Option<f32>,
}

impl VoiceOverrides {
    /// Narration back end for this run.
    #[must_use]
    pub fn provider(&self, config: &StorylandConfig) -> NarrationProvider {
        self.provider.unwrap_or(config.narration.provider)
    }

    /// Settings for narrating into `out`.
    ///
    /// Voice and model from the file only apply when the file selects the
    /// same provider; ids are not portable between providers. Tone
    /// instructions are only sent to OpenAI.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingField`] when ElevenLabs would be called without
    /// any voice id.
    pub fn settings(
        &self,
        config: &StorylandConfig,
        out: &Path,
    ) -> ConfigResult<NarrationSettings> {
        let provider = self.provider(config);
        let narration = &config.narration;
        let from_file = |value: &Option<String>| {
            value.clone().filter(|_| provider == narration.provider)
        };

        let settings = NarrationSettings {
            model: self
                .speech_model
                .clone()
                .or_else(|| from_file(&narration.model))
                .unwrap_or_default(),
            voice: self
                .voice
                .clone()
                .or_else(|| from_file(&narration.voice))
                .unwrap_or_default(),
            speed: self.speed.or(narration.speed),
            stability: self.stability.or(narration.stability),
            similarity_boost: self.similarity.or(narration.similarity_boost),
            instructions: (provider == NarrationProvider::OpenAI)
                .then(|| NARRATION_INSTRUCTIONS.to_owned()),
            format: AudioFormat::from_path(out),
        };

        let configured_voice = config
            .providers
            .elevenlabs
            .as_ref()
            .is_some_and(|el| el.voice_id.is_some());
        if provider == NarrationProvider::ElevenLabs
            && settings.voice.is_empty()
            && !configured_voice
        {
            return Err(ConfigError::MissingField(
                "providers.elevenlabs.voice_id (set ELEVENLABS_VOICE_ID or pass --voice)".into(),
            ));
        }

        Ok(settings)
    }
}

fn parse_ranged(s: &str, min: f32, max: f32) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(format!("must be between {min} and {max}"))
    }
}

fn parse_speed(s: &str) -> Result<f32, String> {
    parse_ranged(s, 0.5, 2.0)
}

fn parse_unit(s: &str) -> Result<f32, String> {
    parse_ranged(s, 0.0, 1.0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::{CapConfig, ElevenLabsProviderConfig, NarrationConfig};

    fn out() -> PathBuf {
        PathBuf::from("story.mp3")
    }

    fn elevenlabs_file(voice: Option<&str>) -> StorylandConfig {
        let mut config = StorylandConfig::default();
        config.narration = NarrationConfig {
            provider: NarrationProvider::ElevenLabs,
            voice: voice.map(str::to_owned),
            model: Some("eleven_turbo_v2".into()),
            ..NarrationConfig::default()
        };
        config
    }

    mod story {
        use super::*;

        #[test]
        fn max_minutes_keeps_file_rate() {
            let mut config = StorylandConfig::default();
            config.story.cap = Some(CapConfig {
                max_minutes: 15,
                tokens_per_minute: 120,
            });
            let flags = StoryOverrides {
                max_minutes: Some(2),
                ..StoryOverrides::default()
            };

            assert_eq!(flags.cap(&config), Some(NarrationCap::new(2, 120)));
        }

        #[test]
        fn max_minutes_without_file_cap_uses_default_rate() {
            let flags = StoryOverrides {
                max_minutes: Some(3),
                ..StoryOverrides::default()
            };
            let cap = flags.cap(&StorylandConfig::default()).unwrap();
            assert_eq!(cap, NarrationCap::new(3, NarrationCap::DEFAULT_TOKENS_PER_MINUTE));
        }

        #[test]
        fn file_cap_applies_without_flag() {
            let mut config = StorylandConfig::default();
            assert_eq!(StoryOverrides::default().cap(&config), None);

            config.story.cap = Some(CapConfig::default());
            assert_eq!(
                StoryOverrides::default().cap(&config),
                Some(NarrationCap::default())
            );
        }

        #[test]
        fn persona_and_model_flags_win() {
            let mut config = StorylandConfig::default();
            config.story.persona = Persona::V1;
            config.story.model = "gpt-4o-mini".into();

            assert_eq!(StoryOverrides::default().persona(&config), Persona::V1);
            assert_eq!(StoryOverrides::default().model(&config), "gpt-4o-mini");

            let flags = StoryOverrides {
                persona: Some(Persona::V2),
                model: Some("gpt-4".into()),
                ..StoryOverrides::default()
            };
            assert_eq!(flags.persona(&config), Persona::V2);
            assert_eq!(flags.model(&config), "gpt-4");
        }
    }

    mod voice {
        use super::*;

        #[test]
        fn file_voice_follows_its_provider() {
            let config = elevenlabs_file(Some("rachel"));

            let settings = VoiceOverrides::default().settings(&config, &out()).unwrap();
            assert_eq!(settings.voice, "rachel");
            assert_eq!(settings.model, "eleven_turbo_v2");

            let switched = VoiceOverrides {
                provider: Some(NarrationProvider::OpenAI),
                ..VoiceOverrides::default()
            };
            let settings = switched.settings(&config, &out()).unwrap();
            assert!(settings.voice.is_empty());
            assert!(settings.model.is_empty());
        }

        #[test]
        fn flags_beat_file_values() {
            let mut config = elevenlabs_file(Some("rachel"));
            config.narration.speed = Some(1.0);
            config.narration.stability = Some(0.75);
            let flags = VoiceOverrides {
                voice: Some("bella".into()),
                speed: Some(0.8),
                ..VoiceOverrides::default()
            };

            let settings = flags.settings(&config, &out()).unwrap();
            assert_eq!(settings.voice, "bella");
            assert_eq!(settings.speed, Some(0.8));
            assert_eq!(settings.stability, Some(0.75));
        }

        #[test]
        fn instructions_only_for_openai() {
            let config = StorylandConfig::default();
            let openai = VoiceOverrides::default().settings(&config, &out()).unwrap();
            assert_eq!(openai.instructions.as_deref(), Some(NARRATION_INSTRUCTIONS));

            let google = VoiceOverrides {
                provider: Some(NarrationProvider::Google),
                ..VoiceOverrides::default()
            };
            assert!(google.settings(&config, &out()).unwrap().instructions.is_none());
        }

        #[test]
        fn elevenlabs_without_voice_is_missing_field() {
            let config = elevenlabs_file(None);
            let err = VoiceOverrides::default()
                .settings(&config, &out())
                .unwrap_err();
            assert!(matches!(err, ConfigError::MissingField(ref f) if f.contains("voice_id")));
        }

        #[test]
        fn elevenlabs_falls_back_to_provider_voice() {
            let mut config = elevenlabs_file(None);
            config.providers.elevenlabs = Some(ElevenLabsProviderConfig {
                api_key: "xi-key".into(),
                voice_id: Some("voice-123".into()),
                model_id: None,
            });

            let settings = VoiceOverrides::default().settings(&config, &out()).unwrap();
            assert!(settings.voice.is_empty());
        }

        #[test]
        fn format_follows_output_extension() {
            let config = StorylandConfig::default();
            let settings = VoiceOverrides::default()
                .settings(&config, Path::new("story.wav"))
                .unwrap();
            assert_eq!(settings.format, AudioFormat::Wav);
        }
    }

    mod parsing {
        use clap::Parser;

        use super::*;

        #[derive(Parser)]
        struct Flags {
            #[command(flatten)]
            voice: VoiceOverrides,
        }

        #[test]
        fn speed_and_unit_ranges() {
            assert!(Flags::try_parse_from(["storyland", "--speed", "3"]).is_err());
            assert!(Flags::try_parse_from(["storyland", "--stability", "1.5"]).is_err());

            let flags =
                Flags::try_parse_from(["storyland", "--speed", "0.5", "--similarity", "1"])
                    .unwrap();
            assert_eq!(flags.voice.speed, Some(0.5));
            assert_eq!(flags.voice.similarity, Some(1.0));
        }

        #[test]
        fn provider_names() {
            let flags = Flags::try_parse_from(["storyland", "-p", "elevenlabs"]).unwrap();
            assert_eq!(flags.voice.provider, Some(NarrationProvider::ElevenLabs));
        }
    }
}
