//! Prompt text for the model

use crate::practice::{Difficulty, EvaluationRequest};

pub const PROBLEM_SYSTEM: &str = "You write Japanese sentences for Japanese learners of English \
to translate into English. Reply with a single JSON object and nothing else.";

pub const EVALUATION_SYSTEM: &str = "You are a kind but precise English teacher grading \
Japanese learners' English translations. Write feedback in Japanese. Reply with a single JSON \
object and nothing else.";

/// Request one new practice sentence
pub fn problem_prompt(difficulty: Difficulty, recent: &[String]) -> String {
    let mut prompt = format!(
        "Create one Japanese sentence for the \"{}\" course: {}.\n\
         Respond as JSON: {{\"japaneseSentence\": string, \"modelAnswer\": string, \"hints\": [string]}}.\n\
         The hints are short Japanese or English keywords (at most 3).",
        difficulty.label_ja(),
        difficulty.prompt_description(),
    );

    if !recent.is_empty() {
        prompt.push_str("\nDo not reuse any of these sentences:\n");
        for sentence in recent {
            prompt.push_str("- ");
            prompt.push_str(sentence);
            prompt.push('\n');
        }
    }

    prompt
}

/// Request a grade for a learner's answer
pub fn evaluation_prompt(req: &EvaluationRequest) -> String {
    let level = req
        .difficulty
        .map(|d| d.prompt_description())
        .unwrap_or("general English");

    let mut prompt = format!(
        "Japanese sentence: {}\nLearner's answer: {}\nLevel: {}\n",
        req.japanese_sentence.trim(),
        req.user_answer.trim(),
        level,
    );

    if let Some(model) = req.model_answer.as_deref().filter(|m| !m.trim().is_empty()) {
        prompt.push_str(&format!("Reference answer: {}\n", model.trim()));
    }

    prompt.push_str(
        "Grade the answer from 1 to 5 stars. Respond as JSON: \
         {\"correctTranslation\": string, \"feedback\": string, \"rating\": integer, \
         \"improvements\": [string], \"explanation\": string, \"similarPhrases\": [string]}.",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn problem_prompt_lists_recent_sentences() {
        let prompt = problem_prompt(Difficulty::Toeic, &["前の文".to_string()]);
        assert!(prompt.contains("TOEIC"));
        assert!(prompt.contains("- 前の文"));
    }

    #[test]
    fn evaluation_prompt_omits_blank_reference() {
        let req = EvaluationRequest {
            user_answer: "I get up at seven.".to_string(),
            japanese_sentence: "私は七時に起きます。".to_string(),
            model_answer: Some("  ".to_string()),
            difficulty: Some(Difficulty::MiddleSchool),
        };
        let prompt = evaluation_prompt(&req);
        assert!(!prompt.contains("Reference answer"));
        assert!(prompt.contains("junior-high-school"));
    }
}
