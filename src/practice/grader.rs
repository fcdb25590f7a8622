//! Heuristic grading used when the model cannot be reached.
//!
//! Compares the learner's answer with the model answer by word overlap. It
//! is deliberately simple and always says that it is an automatic grade.

use std::collections::BTreeSet;

use super::{Evaluation, EvaluationRequest};

const OFFLINE_NOTICE: &str = "AI評価が利用できないため、自動採点の結果を表示しています。";

/// Lowercase, strip punctuation and collapse whitespace
pub fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '\'' {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn words(normalized: &str) -> BTreeSet<&str> {
    normalized.split_whitespace().collect()
}

/// F1 score of the word sets of two normalized strings
pub fn overlap_score(answer: &str, reference: &str) -> f64 {
    let answer = words(answer);
    let reference = words(reference);
    if answer.is_empty() || reference.is_empty() {
        return 0.0;
    }

    let common = answer.intersection(&reference).count() as f64;
    if common == 0.0 {
        return 0.0;
    }
    let precision = common / answer.len() as f64;
    let recall = common / reference.len() as f64;
    2.0 * precision * recall / (precision + recall)
}

fn rating_for(score: f64) -> u8 {
    match score {
        s if s >= 0.8 => 4,
        s if s >= 0.6 => 3,
        s if s >= 0.35 => 2,
        _ => 1,
    }
}

/// Grade an answer without the model
pub fn grade_offline(req: &EvaluationRequest) -> Evaluation {
    let reference = req
        .model_answer
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let Some(reference) = reference else {
        return Evaluation {
            correct_translation: String::new(),
            feedback: format!("{OFFLINE_NOTICE}模範解答がないため、評価は暫定的なものです。"),
            rating: 3,
            improvements: Vec::new(),
            explanation: "模範解答が提供されなかったため、内容の正確さは判定していません。"
                .to_string(),
            similar_phrases: Vec::new(),
        };
    };

    let answer_norm = normalize(&req.user_answer);
    let reference_norm = normalize(reference);

    if answer_norm == reference_norm {
        return Evaluation {
            correct_translation: reference.to_string(),
            feedback: format!("{OFFLINE_NOTICE}模範解答と一致しています。素晴らしい！"),
            rating: 5,
            improvements: Vec::new(),
            explanation: "模範解答と同じ表現です。".to_string(),
            similar_phrases: Vec::new(),
        };
    }

    let score = overlap_score(&answer_norm, &reference_norm);
    let answer_words = words(&answer_norm);
    let improvements: Vec<String> = words(&reference_norm)
        .difference(&answer_words)
        .take(5)
        .map(|w| format!("「{w}」を使った表現を検討してみましょう。"))
        .collect();

    Evaluation {
        correct_translation: reference.to_string(),
        feedback: format!("{OFFLINE_NOTICE}模範解答と比較してください。"),
        rating: rating_for(score),
        improvements,
        explanation: format!("模範解答との語彙の一致率: {:.0}%", score * 100.0),
        similar_phrases: Vec::new(),
    }
}
