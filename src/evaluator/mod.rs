//! Problem generation and answer evaluation.
//!
//! The model is the primary source. When no API key is configured, or the
//! upstream call fails, problems come from the offline bank and answers are
//! graded heuristically.

pub mod claude;
pub mod prompt;
pub mod reply;

pub use claude::ClaudeClient;

use tracing::{info, warn};

use crate::config::Config;
use crate::practice::{
    grade_offline, Difficulty, Evaluation, EvaluationRequest, Problem, ProblemBank,
    RecentProblems, Source,
};

/// Evaluator errors
#[derive(Debug, thiserror::Error)]
pub enum EvaluatorError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Model API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Model reply did not contain the expected JSON")]
    MalformedReply,
}

/// Front door for everything model-backed
#[derive(Clone)]
pub struct Evaluator {
    claude: Option<ClaudeClient>,
    bank: ProblemBank,
    recent: RecentProblems,
}

impl Evaluator {
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        let claude = config.anthropic_api_key.clone().map(|key| {
            ClaudeClient::new(
                http,
                &config.anthropic_base_url,
                key,
                config.anthropic_model.clone(),
            )
        });

        match &claude {
            Some(c) => info!(model = %c.model(), "Model evaluator enabled"),
            None => warn!("ANTHROPIC_API_KEY not set, using offline problems and grading"),
        }

        Self {
            claude,
            bank: ProblemBank,
            recent: RecentProblems::new(),
        }
    }

    /// "claude" or "fallback", as reported by /health and /api/config
    pub fn mode(&self) -> &'static str {
        if self.claude.is_some() {
            "claude"
        } else {
            "fallback"
        }
    }

    /// Produce the next practice sentence for a theme
    pub async fn next_problem(&self, difficulty: Difficulty) -> (Problem, Source) {
        let recent = self.recent.snapshot(difficulty);

        let generated = match &self.claude {
            Some(claude) => match generate_problem(claude, difficulty, &recent).await {
                Ok(problem) => Some(problem),
                Err(e) => {
                    warn!(error = %e, difficulty = %difficulty, "Problem generation failed, serving from bank");
                    None
                }
            },
            None => None,
        };

        let (problem, source) = match generated {
            Some(problem) => (problem, Source::Claude),
            None => {
                let picked = self.bank.pick(difficulty, &recent, &mut rand::thread_rng());
                (picked.to_problem(), Source::Bank)
            }
        };

        self.recent.record(difficulty, &problem.japanese_sentence);
        (problem, source)
    }

    /// Grade a learner's answer
    pub async fn evaluate(&self, req: &EvaluationRequest) -> (Evaluation, Source) {
        if let Some(claude) = &self.claude {
            match evaluate_with_model(claude, req).await {
                Ok(evaluation) => return (evaluation, Source::Claude),
                Err(e) => warn!(error = %e, "Model evaluation failed, grading offline"),
            }
        }

        (grade_offline(req), Source::Fallback)
    }
}

async fn generate_problem(
    claude: &ClaudeClient,
    difficulty: Difficulty,
    recent: &[String],
) -> Result<Problem, EvaluatorError> {
    let text = claude
        .complete(prompt::PROBLEM_SYSTEM, &prompt::problem_prompt(difficulty, recent))
        .await?;

    let mut problem: Problem = reply::parse_reply(&text)?;
    problem.japanese_sentence = problem.japanese_sentence.trim().to_string();
    if problem.japanese_sentence.is_empty() {
        return Err(EvaluatorError::MalformedReply);
    }
    problem.hints.retain(|h| !h.trim().is_empty());

    Ok(problem)
}

async fn evaluate_with_model(
    claude: &ClaudeClient,
    req: &EvaluationRequest,
) -> Result<Evaluation, EvaluatorError> {
    let text = claude
        .complete(prompt::EVALUATION_SYSTEM, &prompt::evaluation_prompt(req))
        .await?;

    let evaluation: Evaluation = reply::parse_reply(&text)?;
    Ok(evaluation.normalized())
}
