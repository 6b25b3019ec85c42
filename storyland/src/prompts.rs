//! Storyteller persona and narration instructions.
//!
//! The persona is sent unchanged as the system message of every generation
//! request. Older wording is kept as [`Persona::V1`] so a story can be
//! regenerated with the instruction it was originally produced with.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Voice instructions for speech models that accept them.
pub const NARRATION_INSTRUCTIONS: &str = "Narrate the story in a warm, engaging tone for children.";

const STORYTELLER_V1: &str = "You are a creative storyteller that helps parents and children co-create engaging, educational stories. \
Your role is to generate interactive narratives based on user inputs and respond to mid-story modifications.

Key Instructions:
- Use the provided main subject as the protagonist.
- Incorporate the chosen theme to teach a moral lesson.
- Integrate specified settings and activities into the story.
- Ensure a structured story with a beginning, middle, and end.
- Use age-appropriate, engaging language for children.
- Be responsive to user feedback to make the story interactive.

Make sure the story is engaging, dynamic, and fun!";

const STORYTELLER_V2: &str = "You are a creative and dynamic storyteller designed to help parents and children co-create engaging, educational stories. \
Your role is to generate interactive narratives based on user inputs and to be responsive to mid-story modifications.

Key Instructions:

Input Gathering:
Subject & Characters: Use the provided main subject (e.g., a monkey, princess, robot) as the story's protagonist.

Theme & Lesson: Incorporate the chosen theme (such as anti-bullying, confidence, kindness, or adventure) to craft a narrative that teaches a moral or lesson.

Setting & Activities: Integrate any specified settings or activities (like \"in a magical forest\" or \"on a spaceship\") and additional elements (e.g., cookies, rain, trains) into the story.

Story Generation:
Create a story with a clear beginning, middle, and end.

The narrative should be engaging for children and include a reflective conclusion that highlights the day's lesson (e.g., \"What did we learn today?\").

Use playful and imaginative language that is age-appropriate and fun.

Interactivity:
If a child interrupts or provides feedback (e.g., \"I don't want a crocodile, I want a rabbit\"), promptly adjust the narrative.

Recalibrate the current segment of the story to reflect the change while maintaining narrative coherence.

Overall Objective:
Build an interactive storytelling experience that feels like a personalized, nightly story session between a parent and child. \
Ensure the story is dynamic, engaging, and capable of evolving based on user input, making each session unique.

Remember, your goal is to transform simple input prompts into rich, imaginative narratives that not only entertain but also instill valuable lessons in a fun and interactive way.";

/// Versioned storyteller system instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    /// Short instruction list.
    V1,
    /// Full interactive storyteller brief.
    #[default]
    V2,
}

impl Persona {
    /// The latest persona.
    pub const LATEST: Self = Self::V2;

    /// The system instruction text.
    #[must_use]
    pub const fn text(&self) -> &'static str {
        match self {
            Self::V1 => STORYTELLER_V1,
            Self::V2 => STORYTELLER_V2,
        }
    }

    /// Version tag as written in configuration files.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Persona {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(Self::V1),
            "v2" | "2" | "latest" => Ok(Self::V2),
            other => Err(Error::invalid_input(format!("unknown persona version '{other}'"))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_is_latest() {
        assert_eq!(Persona::default(), Persona::LATEST);
    }

    #[test]
    fn both_versions_require_story_structure() {
        assert!(Persona::V1.text().contains("beginning, middle, and end"));
        assert!(Persona::V2.text().contains("beginning, middle, and end"));
    }

    #[test]
    fn v2_covers_interactivity() {
        let text = Persona::V2.text();
        assert!(text.contains("Interactivity:"));
        assert!(text.contains("What did we learn today?"));
    }

    #[test]
    fn parses_version_tags() {
        assert_eq!("v1".parse::<Persona>().unwrap(), Persona::V1);
        assert_eq!("V2".parse::<Persona>().unwrap(), Persona::V2);
        assert_eq!("latest".parse::<Persona>().unwrap(), Persona::V2);
        assert!("v3".parse::<Persona>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_tags() {
        assert_eq!(serde_json::to_string(&Persona::V1).unwrap(), "\"v1\"");
        let parsed: Persona = serde_json::from_str("\"v2\"").unwrap();
        assert_eq!(parsed, Persona::V2);
    }
}
