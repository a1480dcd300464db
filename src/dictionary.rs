use std::collections::{HashMap, HashSet};
use std::path::Path;

use rand::Rng;
use tracing::warn;

use crate::config::{DictionaryMode, EngineConfig};
use crate::error::EngineError;

const FALLBACK_WORDS: &[&str] = &["aardvark", "abacus", "baker", "cabana", "cedar", "dagger"];

/// Process-wide, read-only word corpus and fragment frequency index.
///
/// Loaded once at startup and shared by reference across every room; see
/// the ownership note in the data model (Dictionary is process-wide,
/// read-only after load).
pub struct Dictionary {
    words: HashSet<String>,
    fragment_index: HashMap<String, u32>,
    using_fallback: bool,
    test_mode: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct DictionaryStats {
    pub word_count: usize,
    pub fragment_count: usize,
}

impl Dictionary {
    /// Loads a newline-delimited word list from `path`. Falls back to the
    /// built-in corpus (and logs it) if the file is missing or unreadable,
    /// matching the production behavior described in the error design;
    /// only a non-test environment additionally reports `readyz=503`,
    /// which is the transport layer's concern and out of scope here.
    pub fn load(path: &Path, test_mode: bool) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_words(contents.lines(), test_mode),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "dictionary file unreadable, using fallback corpus");
                Self::fallback(test_mode)
            }
        }
    }

    pub fn fallback(test_mode: bool) -> Self {
        let mut dict = Self::from_words(FALLBACK_WORDS.iter().copied(), test_mode);
        dict.using_fallback = true;
        dict
    }

    /// The intended construction path for an embedding application: builds
    /// a dictionary from `config.dictionary_mode`/`dictionary_test_mode`
    /// rather than calling `load`/`fallback` directly, so the two knobs
    /// spec.md §9 asks for (where to load words from, and whether the
    /// empty-corpus fallback seed applies) stay in one place.
    pub fn from_config(config: &EngineConfig) -> Self {
        match &config.dictionary_mode {
            DictionaryMode::File(path) => Self::load(path, config.dictionary_test_mode),
            DictionaryMode::Fallback => Self::fallback(config.dictionary_test_mode),
        }
    }

    /// Builds a dictionary directly from an iterator of raw lines/words.
    /// Each entry is lowercased, trimmed, and kept only if it is 2-30
    /// lowercase ASCII letters; every 2- and 3-character substring of a
    /// kept word is indexed, with the fragment's count being the number of
    /// *distinct* words containing it, not the occurrence count.
    pub fn from_words<'a>(entries: impl Iterator<Item = &'a str>, test_mode: bool) -> Self {
        let mut words = HashSet::new();
        let mut fragment_sets: HashMap<String, HashSet<String>> = HashMap::new();

        for raw in entries {
            let word = raw.trim().to_lowercase();
            if word.len() < 2 || word.len() > 30 {
                continue;
            }
            if !word.chars().all(|c| c.is_ascii_lowercase()) {
                continue;
            }
            if !words.insert(word.clone()) {
                continue;
            }
            for frag in fragments_of(&word) {
                fragment_sets.entry(frag).or_default().insert(word.clone());
            }
        }

        let fragment_index = fragment_sets
            .into_iter()
            .map(|(frag, set)| (frag, set.len() as u32))
            .collect();

        Self {
            words,
            fragment_index,
            using_fallback: false,
            test_mode,
        }
    }

    pub fn is_valid(&self, word: &str) -> bool {
        word.len() <= 30 && self.words.contains(&word.to_lowercase())
    }

    pub fn stats(&self) -> DictionaryStats {
        DictionaryStats {
            word_count: self.words.len(),
            fragment_count: self.fragment_index.len(),
        }
    }

    pub fn using_fallback(&self) -> bool {
        self.using_fallback
    }

    /// Picks a fragment to require for the next prompt.
    ///
    /// 1. Among fragments with `count >= min_count`, chooses uniformly at
    ///    random.
    /// 2. If none qualify, deterministically picks the highest-count
    ///    fragment (ties broken lexicographically).
    /// 3. If the corpus has no fragments at all, fails with
    ///    `DictionaryEmpty` unless `test_mode` is set, in which case the
    ///    literal `"aa"` is returned as a deterministic seed.
    pub fn sample_fragment<R: Rng + ?Sized>(
        &self,
        min_count: u32,
        rng: &mut R,
    ) -> Result<String, EngineError> {
        if self.fragment_index.is_empty() {
            return if self.test_mode {
                Ok("aa".to_string())
            } else {
                Err(EngineError::DictionaryEmpty)
            };
        }

        let mut eligible: Vec<&String> = self
            .fragment_index
            .iter()
            .filter(|(_, &count)| count >= min_count)
            .map(|(frag, _)| frag)
            .collect();

        if !eligible.is_empty() {
            eligible.sort();
            let idx = rng.random_range(0..eligible.len());
            return Ok(eligible[idx].clone());
        }

        let mut best: Option<(&String, u32)> = None;
        for (frag, &count) in &self.fragment_index {
            best = match best {
                None => Some((frag, count)),
                Some((best_frag, best_count)) => {
                    if count > best_count || (count == best_count && frag < best_frag) {
                        Some((frag, count))
                    } else {
                        Some((best_frag, best_count))
                    }
                }
            };
        }
        match best {
            Some((frag, _)) => Ok(frag.clone()),
            None => {
                warn!("fragment_index non-empty but best-fragment scan found nothing");
                Err(EngineError::DictionaryEmpty)
            }
        }
    }
}

fn fragments_of(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let mut fragments = Vec::new();
    for len in [2usize, 3usize] {
        if chars.len() < len {
            continue;
        }
        for window in chars.windows(len) {
            fragments.push(window.iter().collect());
        }
    }
    fragments
}
