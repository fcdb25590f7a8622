//! Built-in practice sentences served when the model is unavailable

use rand::seq::SliceRandom;
use rand::Rng;

use super::{Difficulty, Problem};

/// One entry of the offline bank
#[derive(Debug, Clone, Copy)]
pub struct BankProblem {
    pub japanese: &'static str,
    pub model_answer: &'static str,
    pub hints: &'static [&'static str],
}

impl BankProblem {
    pub fn to_problem(&self) -> Problem {
        Problem {
            japanese_sentence: self.japanese.to_string(),
            model_answer: Some(self.model_answer.to_string()),
            hints: self.hints.iter().map(|h| h.to_string()).collect(),
        }
    }
}

const fn entry(
    japanese: &'static str,
    model_answer: &'static str,
    hints: &'static [&'static str],
) -> BankProblem {
    BankProblem {
        japanese,
        model_answer,
        hints,
    }
}

const TOEIC: &[BankProblem] = &[
    entry(
        "会議は来週の火曜日に延期されました。",
        "The meeting has been postponed until next Tuesday.",
        &["postpone", "受動態の現在完了"],
    ),
    entry(
        "新しい製品の発売日を確認していただけますか。",
        "Could you confirm the release date of the new product?",
        &["confirm", "release date"],
    ),
    entry(
        "経費の報告書は月末までに提出してください。",
        "Please submit your expense report by the end of the month.",
        &["submit", "by the end of"],
    ),
    entry(
        "配送の遅れについてお詫び申し上げます。",
        "We apologize for the delay in delivery.",
        &["apologize for", "delay"],
    ),
];

const MIDDLE_SCHOOL: &[BankProblem] = &[
    entry(
        "私は毎朝七時に起きます。",
        "I get up at seven every morning.",
        &["get up", "every morning"],
    ),
    entry(
        "彼は昨日図書館で本を読みました。",
        "He read a book at the library yesterday.",
        &["read の過去形", "at the library"],
    ),
    entry(
        "この夏、私たちは京都を訪れるつもりです。",
        "We are going to visit Kyoto this summer.",
        &["be going to", "visit"],
    ),
    entry(
        "この箱はあの箱より重いです。",
        "This box is heavier than that one.",
        &["比較級", "heavy"],
    ),
];

const HIGH_SCHOOL: &[BankProblem] = &[
    entry(
        "もっと時間があれば、世界中を旅行するのに。",
        "If I had more time, I would travel around the world.",
        &["仮定法過去", "travel around"],
    ),
    entry(
        "私が昨日会った女性は有名な作家です。",
        "The woman I met yesterday is a famous writer.",
        &["関係代名詞の省略"],
    ),
    entry(
        "彼女は三年間ずっとピアノを練習している。",
        "She has been practicing the piano for three years.",
        &["現在完了進行形"],
    ),
    entry(
        "環境問題について考えることは重要だ。",
        "It is important to think about environmental issues.",
        &["It is ... to", "environmental issues"],
    ),
];

const BASIC_VERBS: &[BankProblem] = &[
    entry(
        "駅までタクシーで十分かかります。",
        "It takes ten minutes to get to the station by taxi.",
        &["take", "get to"],
    ),
    entry(
        "彼女はすぐに新しい仕事に慣れた。",
        "She soon got used to her new job.",
        &["get used to"],
    ),
    entry(
        "その決定をするのは簡単ではなかった。",
        "It was not easy to make that decision.",
        &["make a decision"],
    ),
    entry(
        "週末に友達とパーティーを開きます。",
        "I will have a party with my friends on the weekend.",
        &["have a party"],
    ),
];

const BUSINESS_EMAIL: &[BankProblem] = &[
    entry(
        "添付の資料をご確認ください。",
        "Please find the attached document.",
        &["attached", "find"],
    ),
    entry(
        "ご返信が遅くなり申し訳ございません。",
        "I apologize for the late reply.",
        &["apologize for", "late reply"],
    ),
    entry(
        "ご都合のよい日時をお知らせいただけますか。",
        "Could you let me know a date and time that works for you?",
        &["let me know", "work for"],
    ),
    entry(
        "引き続きよろしくお願いいたします。",
        "I look forward to continuing to work with you.",
        &["look forward to -ing"],
    ),
];

const SIMULATION: &[BankProblem] = &[
    entry(
        "窓側の席をお願いできますか。",
        "Could I have a window seat, please?",
        &["window seat"],
    ),
    entry(
        "このシャツの別のサイズはありますか。",
        "Do you have this shirt in a different size?",
        &["in a different size"],
    ),
    entry(
        "少し遅れそうなので、先に始めてください。",
        "I'm running a little late, so please go ahead and start without me.",
        &["run late", "go ahead"],
    ),
    entry(
        "駅への行き方を教えていただけますか。",
        "Could you tell me how to get to the station?",
        &["how to get to"],
    ),
];

/// Offline problem source
#[derive(Debug, Clone, Copy, Default)]
pub struct ProblemBank;

impl ProblemBank {
    /// All entries for a theme
    pub fn entries(&self, difficulty: Difficulty) -> &'static [BankProblem] {
        match difficulty {
            Difficulty::Toeic => TOEIC,
            Difficulty::MiddleSchool => MIDDLE_SCHOOL,
            Difficulty::HighSchool => HIGH_SCHOOL,
            Difficulty::BasicVerbs => BASIC_VERBS,
            Difficulty::BusinessEmail => BUSINESS_EMAIL,
            Difficulty::Simulation => SIMULATION,
        }
    }

    /// Pick a random entry, avoiding sentences in `recent` while any other
    /// entry is still available.
    pub fn pick<R: Rng + ?Sized>(
        &self,
        difficulty: Difficulty,
        recent: &[String],
        rng: &mut R,
    ) -> BankProblem {
        let entries = self.entries(difficulty);
        let fresh: Vec<&BankProblem> = entries
            .iter()
            .filter(|p| !recent.iter().any(|r| r == p.japanese))
            .collect();

        match fresh.choose(rng) {
            Some(problem) => **problem,
            // Every entry is recent; the bank is never empty
            None => *entries.choose(rng).unwrap_or_else(|| &entries[0]),
        }
    }
}
