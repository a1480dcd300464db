use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Per-room configuration: lives, bonus quotas, and turn-pressure floors.
///
/// Mirrors the shape of `Rules` in the data model: `bonusTemplate` is a
/// 26-slot quota vector indexed `a..z`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rules {
    pub max_lives: u32,
    pub starting_lives: u32,
    pub bonus_template: [u32; 26],
    pub min_turn_duration: u32,
    pub min_words_per_prompt: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            max_lives: 3,
            starting_lives: 2,
            bonus_template: [1; 26],
            min_turn_duration: 5,
            min_words_per_prompt: 1,
        }
    }
}

impl Rules {
    /// Validates against the schema in the data model. Called on
    /// `update-room-rules` before the new rules replace the room's current
    /// ones; the room is left untouched if this fails.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.max_lives < 1 {
            return Err(EngineError::InvalidPayload(
                "maxLives must be at least 1".into(),
            ));
        }
        if self.starting_lives < 1 || self.starting_lives > self.max_lives {
            return Err(EngineError::InvalidPayload(
                "startingLives must be between 1 and maxLives".into(),
            ));
        }
        if self.min_turn_duration < 1 {
            return Err(EngineError::InvalidPayload(
                "minTurnDuration must be at least 1 second".into(),
            ));
        }
        if self.min_words_per_prompt < 1 {
            return Err(EngineError::InvalidPayload(
                "minWordsPerPrompt must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_are_valid() {
        assert!(Rules::default().validate().is_ok());
    }

    #[test]
    fn starting_lives_above_max_is_rejected() {
        let mut rules = Rules::default();
        rules.starting_lives = rules.max_lives + 1;
        assert!(rules.validate().is_err());
    }

    #[test]
    fn zero_max_lives_is_rejected() {
        let mut rules = Rules::default();
        rules.max_lives = 0;
        assert!(rules.validate().is_err());
    }
}
