//! Study themes offered by the client

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// A study theme / difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Toeic,
    MiddleSchool,
    HighSchool,
    BasicVerbs,
    BusinessEmail,
    Simulation,
}

impl Difficulty {
    pub const ALL: [Difficulty; 6] = [
        Difficulty::Toeic,
        Difficulty::MiddleSchool,
        Difficulty::HighSchool,
        Difficulty::BasicVerbs,
        Difficulty::BusinessEmail,
        Difficulty::Simulation,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Toeic => "toeic",
            Difficulty::MiddleSchool => "middle_school",
            Difficulty::HighSchool => "high_school",
            Difficulty::BasicVerbs => "basic_verbs",
            Difficulty::BusinessEmail => "business_email",
            Difficulty::Simulation => "simulation",
        }
    }

    /// Label shown in the theme picker
    pub fn label_ja(&self) -> &'static str {
        match self {
            Difficulty::Toeic => "TOEIC",
            Difficulty::MiddleSchool => "中学英語",
            Difficulty::HighSchool => "高校英語",
            Difficulty::BasicVerbs => "基本動詞",
            Difficulty::BusinessEmail => "ビジネスメール",
            Difficulty::Simulation => "シミュレーション練習",
        }
    }

    /// Level description fed into model prompts
    pub fn prompt_description(&self) -> &'static str {
        match self {
            Difficulty::Toeic => {
                "TOEIC-style business and daily-life sentences around the 600-800 score range"
            }
            Difficulty::MiddleSchool => {
                "short sentences using junior-high-school grammar (present, past, future, basic comparatives)"
            }
            Difficulty::HighSchool => {
                "high-school level sentences with relative clauses, perfect tenses and the subjunctive"
            }
            Difficulty::BasicVerbs => {
                "everyday sentences built around basic verbs such as get, take, make, have, go and come"
            }
            Difficulty::BusinessEmail => {
                "polite sentences a professional would write in a business email"
            }
            Difficulty::Simulation => {
                "natural spoken lines from realistic situations such as travel, shopping or meetings"
            }
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown difficulty level: {0}")]
pub struct UnknownDifficulty(pub String);

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str() == normalized)
            .ok_or_else(|| UnknownDifficulty(s.to_string()))
    }
}

// Accepts both `middle_school` and `middle-school`
impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
