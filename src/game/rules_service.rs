use crate::dictionary::Dictionary;
use crate::game::Game;

/// Pure validation and mutation for word submissions. Holds no state of
/// its own beyond a dictionary reference, so it can be constructed fresh
/// per call the way the lobby layer builds short-lived repository structs
/// around a connection.
pub struct GameRulesService<'a> {
    dictionary: &'a Dictionary,
}

impl<'a> GameRulesService<'a> {
    pub fn new(dictionary: &'a Dictionary) -> Self {
        Self { dictionary }
    }

    /// Returns `Err(reason)` for the first failing check, `Ok(())` to
    /// accept. Reasons are the literal strings the ack carries back to the
    /// client, in the order the spec's validation pipeline runs them.
    pub fn validate_submission(
        &self,
        game: &Game,
        player_id: &str,
        raw_word: &str,
    ) -> Result<(), String> {
        let current = game
            .current_player()
            .ok_or_else(|| "Not your turn.".to_string())?;
        if current.id != player_id {
            return Err("Not your turn.".to_string());
        }

        let word = raw_word.trim();
        if word.chars().count() < 2 {
            return Err("Invalid word (too short).".to_string());
        }

        let lower = word.to_lowercase();
        if !lower.contains(&game.fragment) {
            return Err("Word doesn't contain the fragment.".to_string());
        }

        if game.used_words.contains(&lower) {
            return Err("Word already used this game.".to_string());
        }

        if !self.dictionary.is_valid(&lower) {
            return Err("Not a valid word.".to_string());
        }

        Ok(())
    }

    /// Applies the effects of an accepted word: marks it used, runs each
    /// character through the submitting player's bonus progress left to
    /// right (only the first award per submission is possible, since the
    /// counters reset on award), and shortens the next bomb duration.
    ///
    /// Returns whether a bonus life was awarded.
    pub fn apply_accepted_word(
        &self,
        game: &mut Game,
        player_id: &str,
        word: &str,
        decay_factor: f64,
    ) -> bool {
        let lower = word.trim().to_lowercase();
        game.used_words.insert(lower.clone());

        let rules = game.rules.clone();
        let mut awarded = false;
        if let Some(player) = game.player_mut(player_id) {
            for ch in lower.chars() {
                if player.try_bonus_letter(ch, &rules) {
                    awarded = true;
                }
            }
        }

        self.adjust_bomb_timer(game, decay_factor);
        awarded
    }

    /// `bombDurationMs := max(minTurnDuration*1000, round(bombDurationMs *
    /// decayFactor))`, floored so pressure never drops below the rules'
    /// configured minimum.
    pub fn adjust_bomb_timer(&self, game: &mut Game, decay_factor: f64) {
        let floor = game.rules.min_turn_duration as u64 * 1000;
        let decayed = (game.bomb_duration_ms as f64 * decay_factor).round() as u64;
        game.bomb_duration_ms = decayed.max(floor);
    }
}
