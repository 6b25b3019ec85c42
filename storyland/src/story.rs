//! Story inputs, prompt composition and token budgeting.
//!
//! Everything in this module is pure: the same [`StoryRequest`] always
//! produces the same prompt text and the same [`TokenBudget`].
//!
//! # Example
//!
//! ```rust,ignore
//! use storyland::prelude::*;
//!
//! let request = StoryRequest::new("a robot", Theme::Kindness)
//!     .setting("on a spaceship")
//!     .extra_elements("cookies and rain")
//!     .words(300);
//!
//! let composed = request.compose(TokenRatio::default(), Some(NarrationCap::default()));
//! println!("{}", composed.prompt);
//! assert_eq!(composed.budget.max_tokens, 400);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Smallest accepted target word count.
pub const MIN_WORDS: u32 = 50;
/// Largest accepted target word count.
pub const MAX_WORDS: u32 = 1000;
/// Smallest accepted reading duration in minutes.
pub const MIN_MINUTES: u32 = 1;
/// Largest accepted reading duration in minutes.
pub const MAX_MINUTES: u32 = 30;

/// The moral theme a story teaches.
///
/// Serialized in lower case; any casing is accepted when reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Theme {
    /// Friendship.
    #[default]
    Friendship,
    /// Courage.
    Courage,
    /// Kindness.
    Kindness,
    /// Adventure.
    Adventure,
    /// Inspiration.
    Inspiration,
}

impl Theme {
    /// All themes in display order.
    pub const ALL: [Self; 5] = [
        Self::Friendship,
        Self::Courage,
        Self::Kindness,
        Self::Adventure,
        Self::Inspiration,
    ];

    /// Title-case name, as shown in the details list of the prompt.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Friendship => "Friendship",
            Self::Courage => "Courage",
            Self::Kindness => "Kindness",
            Self::Adventure => "Adventure",
            Self::Inspiration => "Inspiration",
        }
    }

    /// Lower-case name used in the lesson clause.
    #[must_use]
    pub const fn lesson(&self) -> &'static str {
        match self {
            Self::Friendship => "friendship",
            Self::Courage => "courage",
            Self::Kindness => "kindness",
            Self::Adventure => "adventure",
            Self::Inspiration => "inspiration",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|theme| theme.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| {
                Error::invalid_input(format!(
                    "unknown theme '{needle}', expected one of: friendship, courage, kindness, adventure, inspiration"
                ))
            })
    }
}

impl TryFrom<String> for Theme {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Conversion between words and model tokens.
///
/// Holds the number of words one token is worth. The budget is always
/// derived by division (`tokens = words / ratio`), and the inverse is used
/// when a capped token budget has to be turned back into a word target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenRatio {
    words_per_token: f64,
}

impl TokenRatio {
    /// Default ratio: roughly three words for every four tokens.
    pub const DEFAULT_WORDS_PER_TOKEN: f64 = 0.75;

    /// Create a ratio, rejecting non-positive or non-finite values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `words_per_token` is not a positive
    /// finite number.
    pub fn new(words_per_token: f64) -> Result<Self> {
        if words_per_token.is_finite() && words_per_token > 0.0 {
            Ok(Self { words_per_token })
        } else {
            Err(Error::invalid_input(format!(
                "words per token must be positive, got {words_per_token}"
            )))
        }
    }

    /// Words represented by a single token.
    #[must_use]
    pub const fn words_per_token(&self) -> f64 {
        self.words_per_token
    }

    /// Token budget for a word count, rounded down.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn tokens_for_words(&self, words: u32) -> u32 {
        (f64::from(words) / self.words_per_token).floor() as u32
    }

    /// Word count that fits in a token budget, rounded down.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn words_for_tokens(&self, tokens: u32) -> u32 {
        (f64::from(tokens) * self.words_per_token).floor() as u32
    }
}

impl Default for TokenRatio {
    fn default() -> Self {
        Self {
            words_per_token: Self::DEFAULT_WORDS_PER_TOKEN,
        }
    }
}

/// Ceiling on generation length derived from the longest narration allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrationCap {
    /// Longest narration, in minutes.
    pub max_minutes: u32,
    /// Approximate tokens spoken per minute.
    pub tokens_per_minute: u32,
}

impl NarrationCap {
    /// Default narration ceiling in minutes.
    pub const DEFAULT_MAX_MINUTES: u32 = 15;
    /// Default speaking rate in tokens per minute.
    pub const DEFAULT_TOKENS_PER_MINUTE: u32 = 150;

    /// Create a cap.
    #[must_use]
    pub const fn new(max_minutes: u32, tokens_per_minute: u32) -> Self {
        Self {
            max_minutes,
            tokens_per_minute,
        }
    }

    /// The hard token ceiling.
    #[must_use]
    pub const fn max_tokens(&self) -> u32 {
        self.max_minutes.saturating_mul(self.tokens_per_minute)
    }
}

impl Default for NarrationCap {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_MINUTES, Self::DEFAULT_TOKENS_PER_MINUTE)
    }
}

/// Token budget for one generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBudget {
    /// Maximum tokens the completion may produce.
    pub max_tokens: u32,
    /// Word target stated in the prompt.
    pub word_target: u32,
    /// Whether the narration cap lowered the budget.
    pub capped: bool,
}

/// Compute the token budget for a target word count.
///
/// With a cap, the budget is `min(words / ratio, cap)`. When the cap binds
/// the word target is re-derived from the capped budget so the prompt never
/// asks for more words than the request allows.
#[must_use]
pub fn compute_token_budget(
    target_word_count: u32,
    ratio: TokenRatio,
    cap: Option<NarrationCap>,
) -> TokenBudget {
    let computed = ratio.tokens_for_words(target_word_count);

    match cap.map(|c| c.max_tokens()) {
        Some(ceiling) if computed > ceiling => TokenBudget {
            max_tokens: ceiling,
            word_target: ratio.words_for_tokens(ceiling),
            capped: true,
        },
        _ => TokenBudget {
            max_tokens: computed,
            word_target: target_word_count,
            capped: false,
        },
    }
}

/// Render the story prompt.
///
/// All inputs are embedded verbatim; empty fields render as empty text.
#[must_use]
pub fn build_prompt(
    subject: &str,
    theme: Theme,
    setting: &str,
    extra_elements: &str,
    target_word_count: u32,
) -> String {
    render_prompt(
        subject,
        theme,
        setting,
        extra_elements,
        target_word_count,
        None,
    )
}

fn render_prompt(
    subject: &str,
    theme: Theme,
    setting: &str,
    extra_elements: &str,
    words: u32,
    minutes: Option<u32>,
) -> String {
    let reading_time = minutes
        .map(|m| format!(", which should take about {m} minutes to read"))
        .unwrap_or_default();

    format!(
        "Write a creative and engaging children's story with the following details:\n\
         - Main Subject: {subject}\n\
         - Theme: {theme}\n\
         - Setting/Activity: {setting}\n\
         - Additional Elements: {extra_elements}\n\
         \n\
         The story should be approximately {words} words long{reading_time}.\n\
         Ensure it has a clear beginning, middle, and end, with a lesson related to {lesson}.\n",
        lesson = theme.lesson(),
    )
}

/// The inputs for one story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryRequest {
    /// Protagonist of the story.
    pub subject: String,
    /// Moral theme.
    pub theme: Theme,
    /// Setting or activity.
    pub setting: String,
    /// Extra story elements, may be empty.
    #[serde(default)]
    pub extra_elements: String,
    /// Approximate length in words.
    pub target_word_count: u32,
    /// Approximate reading duration in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_minutes: Option<u32>,
}

impl StoryRequest {
    /// Default target word count.
    pub const DEFAULT_WORDS: u32 = 300;

    /// Create a request with the given subject and theme.
    #[must_use]
    pub fn new(subject: impl Into<String>, theme: Theme) -> Self {
        Self {
            subject: subject.into(),
            theme,
            setting: String::new(),
            extra_elements: String::new(),
            target_word_count: Self::DEFAULT_WORDS,
            target_minutes: None,
        }
    }

    /// Set the setting or activity.
    #[must_use]
    pub fn setting(mut self, setting: impl Into<String>) -> Self {
        self.setting = setting.into();
        self
    }

    /// Set the extra story elements.
    #[must_use]
    pub fn extra_elements(mut self, extra: impl Into<String>) -> Self {
        self.extra_elements = extra.into();
        self
    }

    /// Set the target word count.
    #[must_use]
    pub const fn words(mut self, words: u32) -> Self {
        self.target_word_count = words;
        self
    }

    /// Set the target reading duration.
    #[must_use]
    pub const fn minutes(mut self, minutes: u32) -> Self {
        self.target_minutes = Some(minutes);
        self
    }

    /// Check that every field is inside its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] describing the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.subject.trim().is_empty() {
            return Err(Error::invalid_input("subject must not be empty"));
        }
        if !(MIN_WORDS..=MAX_WORDS).contains(&self.target_word_count) {
            return Err(Error::invalid_input(format!(
                "word count must be between {MIN_WORDS} and {MAX_WORDS}, got {}",
                self.target_word_count
            )));
        }
        if let Some(minutes) = self.target_minutes
            && !(MIN_MINUTES..=MAX_MINUTES).contains(&minutes)
        {
            return Err(Error::invalid_input(format!(
                "reading time must be between {MIN_MINUTES} and {MAX_MINUTES} minutes, got {minutes}"
            )));
        }
        Ok(())
    }

    /// Render the prompt for a given word target.
    #[must_use]
    pub fn prompt(&self, word_target: u32) -> String {
        render_prompt(
            &self.subject,
            self.theme,
            &self.setting,
            &self.extra_elements,
            word_target,
            self.target_minutes,
        )
    }

    /// Compute the budget, then render the prompt with the budget's word target.
    #[must_use]
    pub fn compose(&self, ratio: TokenRatio, cap: Option<NarrationCap>) -> ComposedPrompt {
        let budget = compute_token_budget(self.target_word_count, ratio, cap);
        ComposedPrompt {
            prompt: self.prompt(budget.word_target),
            budget,
        }
    }
}

impl Default for StoryRequest {
    fn default() -> Self {
        Self::new("monkey", Theme::Friendship)
            .setting("in a magical forest")
            .extra_elements("cookies, rain, and a mysterious treasure")
    }
}

/// Prompt text and token budget for one generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedPrompt {
    /// The user prompt.
    pub prompt: String,
    /// The budget the prompt was rendered with.
    pub budget: TokenBudget,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod theme {
        use super::*;

        #[test]
        fn parses_case_insensitively() {
            assert_eq!("courage".parse::<Theme>().unwrap(), Theme::Courage);
            assert_eq!("COURAGE".parse::<Theme>().unwrap(), Theme::Courage);
            assert_eq!(" Kindness ".parse::<Theme>().unwrap(), Theme::Kindness);
        }

        #[test]
        fn rejects_unknown_theme() {
            let err = "bravery".parse::<Theme>().unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
        }

        #[test]
        fn serde_accepts_any_casing() {
            let theme: Theme = serde_json::from_str("\"courage\"").unwrap();
            assert_eq!(theme, Theme::Courage);
            let theme: Theme = serde_json::from_str("\"Inspiration\"").unwrap();
            assert_eq!(theme, Theme::Inspiration);
            assert!(serde_json::from_str::<Theme>("\"bravery\"").is_err());

            assert_eq!(serde_json::to_string(&Theme::Kindness).unwrap(), "\"kindness\"");
        }

        #[test]
        fn lesson_is_lowercase() {
            for theme in Theme::ALL {
                assert_eq!(theme.lesson(), theme.as_str().to_lowercase());
            }
        }
    }

    mod budget {
        use super::*;

        #[test]
        fn divides_by_ratio() {
            let ratio = TokenRatio::default();
            assert_eq!(compute_token_budget(300, ratio, None).max_tokens, 400);
            assert_eq!(compute_token_budget(1000, ratio, None).max_tokens, 1333);
            assert_eq!(compute_token_budget(50, ratio, None).max_tokens, 66);
        }

        #[test]
        fn monotonic_over_word_range() {
            let ratio = TokenRatio::default();
            for cap in [None, Some(NarrationCap::default()), Some(NarrationCap::new(2, 150))] {
                let mut previous = 0;
                for words in MIN_WORDS..=MAX_WORDS {
                    let tokens = compute_token_budget(words, ratio, cap).max_tokens;
                    assert!(tokens >= previous, "budget fell at {words} words");
                    previous = tokens;
                }
            }
        }

        #[test]
        fn default_cap_is_fifteen_minutes_of_speech() {
            assert_eq!(NarrationCap::default().max_tokens(), 2250);
        }

        #[test]
        fn cap_above_budget_does_not_bind() {
            let budget =
                compute_token_budget(1000, TokenRatio::default(), Some(NarrationCap::default()));
            assert_eq!(budget.max_tokens, 1333);
            assert_eq!(budget.word_target, 1000);
            assert!(!budget.capped);
        }

        #[test]
        fn binding_cap_rederives_word_target() {
            let cap = NarrationCap::new(4, 150);
            let budget = compute_token_budget(1000, TokenRatio::default(), Some(cap));
            assert_eq!(budget.max_tokens, 600);
            assert_eq!(budget.word_target, 450);
            assert!(budget.capped);
        }

        #[test]
        fn budget_equals_cap_when_ratio_exceeds_it() {
            let ratio = TokenRatio::new(0.4).unwrap();
            let budget = compute_token_budget(1000, ratio, Some(NarrationCap::default()));
            assert_eq!(budget.max_tokens, 2250);
            assert_eq!(budget.word_target, 900);
        }

        #[test]
        fn round_trip_within_one_word() {
            let ratio = TokenRatio::default();
            for words in MIN_WORDS..=MAX_WORDS {
                let back = ratio.words_for_tokens(ratio.tokens_for_words(words));
                assert!(back <= words && words - back <= 1, "{words} -> {back}");
            }
        }

        #[test]
        fn ratio_rejects_non_positive() {
            assert!(TokenRatio::new(0.0).is_err());
            assert!(TokenRatio::new(-0.75).is_err());
            assert!(TokenRatio::new(f64::NAN).is_err());
        }
    }

    mod prompt {
        use super::*;

        #[test]
        fn embeds_every_input() {
            let prompt = build_prompt(
                "a robot",
                Theme::Kindness,
                "on a spaceship",
                "cookies and rain",
                300,
            );
            for needle in ["a robot", "on a spaceship", "cookies and rain", "300", "kindness"] {
                assert!(prompt.contains(needle), "missing {needle:?}");
            }
        }

        #[test]
        fn lesson_clause_is_lowercase() {
            let theme: Theme = "COURAGE".parse().unwrap();
            let prompt = build_prompt("a lion", theme, "in the savanna", "", 200);
            assert!(prompt.contains("lesson related to courage"));
            assert!(prompt.contains("- Theme: Courage"));
        }

        #[test]
        fn requires_structure() {
            let prompt = build_prompt("a fox", Theme::Adventure, "", "", 100);
            assert!(prompt.contains("beginning, middle, and end"));
        }

        #[test]
        fn is_deterministic() {
            let a = build_prompt("a monkey", Theme::Friendship, "in a forest", "rain", 300);
            let b = build_prompt("a monkey", Theme::Friendship, "in a forest", "rain", 300);
            assert_eq!(a, b);
        }

        #[test]
        fn empty_fields_render_empty() {
            let prompt = build_prompt("", Theme::Inspiration, "", "", 50);
            assert!(prompt.contains("- Main Subject: \n"));
            assert!(prompt.contains("- Additional Elements: \n"));
        }

        #[test]
        fn mentions_reading_time_when_set() {
            let prompt = StoryRequest::default().minutes(5).prompt(300);
            assert!(prompt.contains("300 words long, which should take about 5 minutes to read."));

            let prompt = StoryRequest::default().prompt(300);
            assert!(prompt.contains("300 words long.\n"));
        }
    }

    mod request {
        use super::*;

        #[test]
        fn compose_uses_capped_word_target() {
            let request = StoryRequest::new("a dragon", Theme::Courage).words(1000);
            let composed = request.compose(TokenRatio::default(), Some(NarrationCap::new(4, 150)));
            assert_eq!(composed.budget.max_tokens, 600);
            assert!(composed.prompt.contains("approximately 450 words"));
            assert!(!composed.prompt.contains("1000"));
        }

        #[test]
        fn compose_without_cap_keeps_word_target() {
            let composed = StoryRequest::default().compose(TokenRatio::default(), None);
            assert_eq!(composed.budget.max_tokens, 400);
            assert!(composed.prompt.contains("approximately 300 words"));
        }

        #[test]
        fn validate_accepts_defaults() {
            assert!(StoryRequest::default().validate().is_ok());
            assert!(StoryRequest::default().minutes(30).words(1000).validate().is_ok());
        }

        #[test]
        fn validate_rejects_out_of_range() {
            assert!(StoryRequest::default().words(49).validate().is_err());
            assert!(StoryRequest::default().words(1001).validate().is_err());
            assert!(StoryRequest::default().minutes(0).validate().is_err());
            assert!(StoryRequest::default().minutes(31).validate().is_err());
            assert!(StoryRequest::new("  ", Theme::Courage).validate().is_err());
        }
    }
}
