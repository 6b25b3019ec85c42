//! Token usage reported by completion providers.
//!
//! Field aliases accept OpenAI's `prompt_tokens` / `completion_tokens`
//! naming directly from the response body.

use serde::{Deserialize, Serialize};

/// Tokens billed for one story.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Persona plus prompt.
    #[serde(default, alias = "prompt_tokens")]
    pub input_tokens: u32,

    /// Story text.
    #[serde(default, alias = "completion_tokens")]
    pub output_tokens: u32,

    /// Sum reported by the provider.
    #[serde(default)]
    pub total_tokens: u32,
}

impl Usage {
    /// Usage with a computed total.
    #[must_use]
    pub const fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens.saturating_add(output_tokens),
        }
    }

    /// Nothing was billed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_tokens == 0
    }

    /// Share of a token budget used by the output, in percent.
    #[must_use]
    pub fn budget_used_percent(&self, max_tokens: u32) -> f64 {
        if max_tokens == 0 {
            return 0.0;
        }
        f64::from(self.output_tokens) * 100.0 / f64::from(max_tokens)
    }
}

impl std::fmt::Display for Usage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} input + {} output = {} tokens",
            self.input_tokens, self.output_tokens, self.total_tokens
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_openai_field_names() {
        let json = r#"{"prompt_tokens": 812, "completion_tokens": 390, "total_tokens": 1202}"#;
        let usage: Usage = serde_json::from_str(json).unwrap();
        assert_eq!(usage, Usage::new(812, 390));
    }

    #[test]
    fn budget_share() {
        let usage = Usage::new(10, 200);
        assert!((usage.budget_used_percent(400) - 50.0).abs() < f64::EPSILON);
        assert!(usage.budget_used_percent(0).abs() < f64::EPSILON);
    }

    #[test]
    fn display_lists_all_counts() {
        assert_eq!(Usage::new(1, 2).to_string(), "1 input + 2 output = 3 tokens");
    }
}
