//! Post-processing that makes generated answers read more naturally.
//!
//! Three steps, in order:
//! 1. answers admitting missing information are swapped for a courteous apology
//! 2. literal replacements soften the wording, applied in sequence
//! 3. with some probability a courteous opening phrase is prepended

use docchat_core::{AppError, AppResult};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A literal substitution applied to every occurrence in the answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub from: String,
    pub to: String,
}

impl Replacement {
    fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// Phrase lists and probabilities driving [`HumanizerPolicy::humanize`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HumanizerPolicy {
    /// Case-sensitive substrings marking an answer as "no information"
    #[serde(rename = "noAnswerMarkers")]
    pub no_answer_markers: Vec<String>,

    /// Replies substituted for no-answer responses
    pub apologies: Vec<String>,

    /// Ordered literal replacements
    pub replacements: Vec<Replacement>,

    /// Courteous opening clauses
    #[serde(rename = "openingPhrases")]
    pub opening_phrases: Vec<String>,

    /// Chance of prepending an opening phrase
    #[serde(rename = "openingProbability")]
    pub opening_probability: f64,
}

impl Default for HumanizerPolicy {
    fn default() -> Self {
        Self {
            no_answer_markers: [
                "tidak memiliki informasi",
                "tidak ditemukan",
                "tidak mengerti",
                "tidak paham",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            apologies: [
                "Mohon maaf, saat ini saya belum memiliki informasi terkait hal tersebut.",
                "Maaf, saya belum menemukan jawaban yang sesuai. Silakan hubungi pihak terkait untuk informasi lebih lanjut.",
                "Mohon maaf, pengetahuan saya mengenai hal ini masih terbatas.",
                "Maaf, saya tidak mengerti pertanyaan Anda. Bisakah Anda menjelaskannya lebih detail?",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            replacements: vec![
                Replacement::new("berdasarkan", "berdasarkan informasi yang tersedia"),
                Replacement::new("tersebut", "yang dimaksud"),
                Replacement::new("adalah", "merupakan"),
                Replacement::new("apabila", "jika"),
                Replacement::new("oleh karena itu", "oleh sebab itu"),
            ],
            opening_phrases: [
                "Berdasarkan informasi yang tersedia,",
                "Izinkan saya menjelaskan,",
                "Berikut penjelasan yang dapat saya sampaikan,",
                "Merujuk pada data yang ada,",
                "Berikut informasi yang dapat saya berikan,",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            opening_probability: 0.5,
        }
    }
}

impl HumanizerPolicy {
    /// Load a policy from YAML; omitted fields keep their defaults.
    pub fn load(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read humanizer policy {:?}: {}", path, e))
        })?;
        let policy: Self = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse humanizer policy {:?}: {}", path, e))
        })?;
        policy.validate()?;
        tracing::info!("Loaded humanizer policy from {:?}", path);
        Ok(policy)
    }

    pub fn with_opening_probability(mut self, probability: f64) -> Self {
        self.opening_probability = probability;
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        if !(0.0..=1.0).contains(&self.opening_probability) {
            return Err(AppError::Config(format!(
                "openingProbability must be within [0, 1], got {}",
                self.opening_probability
            )));
        }
        if !self.no_answer_markers.is_empty() && self.apologies.is_empty() {
            return Err(AppError::Config(
                "Humanizer policy with no-answer markers needs at least one apology".to_string(),
            ));
        }
        if self.replacements.iter().any(|r| r.from.is_empty()) {
            return Err(AppError::Config(
                "Humanizer replacements must not have an empty 'from'".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether the answer admits the documents did not contain the information.
    pub fn is_no_answer(&self, raw: &str) -> bool {
        self.no_answer_markers
            .iter()
            .any(|marker| raw.contains(marker.as_str()))
    }

    /// Humanize a raw model answer.
    pub fn humanize<R: Rng + ?Sized>(&self, raw: &str, rng: &mut R) -> String {
        if self.is_no_answer(raw) {
            if let Some(apology) = self.apologies.choose(rng) {
                return apology.clone();
            }
        }

        let mut answer = raw.to_string();
        for replacement in &self.replacements {
            answer = answer.replace(&replacement.from, &replacement.to);
        }

        if answer.is_empty() || self.opening_phrases.is_empty() {
            return answer;
        }

        if rng.gen_bool(self.clamped_probability()) && !self.starts_with_opening(&answer) {
            if let Some(phrase) = self.opening_phrases.choose(rng) {
                return format!("{} {}", phrase, lowercase_first(&answer));
            }
        }

        answer
    }

    /// Opening probability limited to [0, 1]; NaN counts as 0.
    fn clamped_probability(&self) -> f64 {
        if self.opening_probability.is_nan() {
            0.0
        } else {
            self.opening_probability.clamp(0.0, 1.0)
        }
    }

    fn starts_with_opening(&self, answer: &str) -> bool {
        let normalized = answer.trim().to_lowercase();
        self.opening_phrases
            .iter()
            .any(|phrase| normalized.starts_with(&phrase.to_lowercase()))
    }
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
