//! Practice domain: study themes, the offline problem bank and the
//! fallback grader used when the model is unavailable.

pub mod bank;
pub mod difficulty;
pub mod grader;
pub mod recent;

pub use bank::{BankProblem, ProblemBank};
pub use difficulty::Difficulty;
pub use grader::grade_offline;
pub use recent::RecentProblems;

use serde::{Deserialize, Deserializer, Serialize};

/// Where a problem or evaluation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Claude,
    Bank,
    Fallback,
}

/// A practice sentence handed to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub japanese_sentence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_answer: Option<String>,
    #[serde(default)]
    pub hints: Vec<String>,
}

/// A graded answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub correct_translation: String,
    pub feedback: String,
    #[serde(deserialize_with = "deserialize_rating")]
    pub rating: u8,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub similar_phrases: Vec<String>,
}

impl Evaluation {
    /// Clamp the rating into the 1..=5 star range
    pub fn normalized(mut self) -> Self {
        self.rating = self.rating.clamp(1, 5);
        self
    }
}

/// Accept any JSON number for a rating, rounded and clamped to 1..=5
fn deserialize_rating<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() {
        return Err(serde::de::Error::custom("rating must be a finite number"));
    }
    Ok(raw.round().clamp(1.0, 5.0) as u8)
}

/// Input to an evaluation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    pub user_answer: String,
    pub japanese_sentence: String,
    #[serde(default)]
    pub model_answer: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}
