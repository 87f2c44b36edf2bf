//! Question key and trait aggregation.
//!
//! Every one of the 52 questions feeds exactly one trait. Raw answers are
//! folded into per-trait sums, counts, averages and 0-100 percentages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Framework a question belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Model {
    Mbti,
    Disc,
    Strengths,
    Genius,
}

/// One of the 22 scored dimensions.
///
/// Declaration order is the canonical display order, and `Ord` follows it so
/// that a `BTreeMap<TraitCode, _>` serializes in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TraitCode {
    E,
    I,
    S,
    N,
    T,
    F,
    J,
    P,
    D,
    #[serde(rename = "I_DISC")]
    IDisc,
    #[serde(rename = "S_DISC")]
    SDisc,
    C,
    #[serde(rename = "EXEC")]
    Exec,
    #[serde(rename = "INFL")]
    Infl,
    #[serde(rename = "REL")]
    Rel,
    #[serde(rename = "STRAT")]
    Strat,
    #[serde(rename = "WG_W")]
    WgW,
    #[serde(rename = "WG_I")]
    WgI,
    #[serde(rename = "WG_D")]
    WgD,
    #[serde(rename = "WG_G")]
    WgG,
    #[serde(rename = "WG_E")]
    WgE,
    #[serde(rename = "WG_T")]
    WgT,
}

impl TraitCode {
    pub const ALL: [TraitCode; 22] = [
        TraitCode::E,
        TraitCode::I,
        TraitCode::S,
        TraitCode::N,
        TraitCode::T,
        TraitCode::F,
        TraitCode::J,
        TraitCode::P,
        TraitCode::D,
        TraitCode::IDisc,
        TraitCode::SDisc,
        TraitCode::C,
        TraitCode::Exec,
        TraitCode::Infl,
        TraitCode::Rel,
        TraitCode::Strat,
        TraitCode::WgW,
        TraitCode::WgI,
        TraitCode::WgD,
        TraitCode::WgG,
        TraitCode::WgE,
        TraitCode::WgT,
    ];

    pub const DISC: [TraitCode; 4] = [
        TraitCode::D,
        TraitCode::IDisc,
        TraitCode::SDisc,
        TraitCode::C,
    ];

    pub const STRENGTHS: [TraitCode; 4] = [
        TraitCode::Exec,
        TraitCode::Infl,
        TraitCode::Rel,
        TraitCode::Strat,
    ];

    pub const GENIUS: [TraitCode; 6] = [
        TraitCode::WgW,
        TraitCode::WgI,
        TraitCode::WgD,
        TraitCode::WgG,
        TraitCode::WgE,
        TraitCode::WgT,
    ];

    /// Wire code, e.g. `"I_DISC"` or `"WG_T"`.
    pub fn as_str(self) -> &'static str {
        match self {
            TraitCode::E => "E",
            TraitCode::I => "I",
            TraitCode::S => "S",
            TraitCode::N => "N",
            TraitCode::T => "T",
            TraitCode::F => "F",
            TraitCode::J => "J",
            TraitCode::P => "P",
            TraitCode::D => "D",
            TraitCode::IDisc => "I_DISC",
            TraitCode::SDisc => "S_DISC",
            TraitCode::C => "C",
            TraitCode::Exec => "EXEC",
            TraitCode::Infl => "INFL",
            TraitCode::Rel => "REL",
            TraitCode::Strat => "STRAT",
            TraitCode::WgW => "WG_W",
            TraitCode::WgI => "WG_I",
            TraitCode::WgD => "WG_D",
            TraitCode::WgG => "WG_G",
            TraitCode::WgE => "WG_E",
            TraitCode::WgT => "WG_T",
        }
    }

    /// Human-readable trait name.
    pub fn label(self) -> &'static str {
        match self {
            TraitCode::E => "Extraversion",
            TraitCode::I => "Introversion",
            TraitCode::S => "Sensing",
            TraitCode::N => "Intuition",
            TraitCode::T => "Thinking",
            TraitCode::F => "Feeling",
            TraitCode::J => "Judging",
            TraitCode::P => "Perceiving",
            TraitCode::D => "Dominance",
            TraitCode::IDisc => "Influence",
            TraitCode::SDisc => "Steadiness",
            TraitCode::C => "Conscientiousness",
            TraitCode::Exec => "Executing",
            TraitCode::Infl => "Influencing",
            TraitCode::Rel => "Relationship Building",
            TraitCode::Strat => "Strategic Thinking",
            TraitCode::WgW => "Wonder",
            TraitCode::WgI => "Invention",
            TraitCode::WgD => "Discernment",
            TraitCode::WgG => "Galvanizing",
            TraitCode::WgE => "Enablement",
            TraitCode::WgT => "Tenacity",
        }
    }

    pub fn model(self) -> Model {
        match self {
            TraitCode::E
            | TraitCode::I
            | TraitCode::S
            | TraitCode::N
            | TraitCode::T
            | TraitCode::F
            | TraitCode::J
            | TraitCode::P => Model::Mbti,
            TraitCode::D | TraitCode::IDisc | TraitCode::SDisc | TraitCode::C => Model::Disc,
            TraitCode::Exec | TraitCode::Infl | TraitCode::Rel | TraitCode::Strat => {
                Model::Strengths
            }
            _ => Model::Genius,
        }
    }
}

impl std::fmt::Display for TraitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single row of the question key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionKeyEntry {
    pub id: u8,
    pub model: Model,
    pub trait_code: TraitCode,
}

const fn q(id: u8, model: Model, trait_code: TraitCode) -> QuestionKeyEntry {
    QuestionKeyEntry {
        id,
        model,
        trait_code,
    }
}

pub const TOTAL_QUESTIONS: usize = 52;

/// The fixed 52-question key.
pub const QUESTION_KEY: [QuestionKeyEntry; TOTAL_QUESTIONS] = [
    q(1, Model::Mbti, TraitCode::E),
    q(2, Model::Mbti, TraitCode::I),
    q(3, Model::Mbti, TraitCode::S),
    q(4, Model::Mbti, TraitCode::N),
    q(5, Model::Mbti, TraitCode::T),
    q(6, Model::Mbti, TraitCode::F),
    q(7, Model::Mbti, TraitCode::J),
    q(8, Model::Mbti, TraitCode::P),
    q(9, Model::Mbti, TraitCode::E),
    q(10, Model::Mbti, TraitCode::I),
    q(11, Model::Mbti, TraitCode::S),
    q(12, Model::Mbti, TraitCode::N),
    q(13, Model::Mbti, TraitCode::T),
    q(14, Model::Mbti, TraitCode::F),
    q(15, Model::Mbti, TraitCode::J),
    q(16, Model::Mbti, TraitCode::P),
    q(17, Model::Disc, TraitCode::D),
    q(18, Model::Disc, TraitCode::IDisc),
    q(19, Model::Disc, TraitCode::SDisc),
    q(20, Model::Disc, TraitCode::C),
    q(21, Model::Disc, TraitCode::D),
    q(22, Model::Disc, TraitCode::IDisc),
    q(23, Model::Disc, TraitCode::SDisc),
    q(24, Model::Disc, TraitCode::C),
    q(25, Model::Disc, TraitCode::D),
    q(26, Model::Disc, TraitCode::IDisc),
    q(27, Model::Disc, TraitCode::SDisc),
    q(28, Model::Disc, TraitCode::C),
    q(29, Model::Strengths, TraitCode::Exec),
    q(30, Model::Strengths, TraitCode::Infl),
    q(31, Model::Strengths, TraitCode::Rel),
    q(32, Model::Strengths, TraitCode::Strat),
    q(33, Model::Strengths, TraitCode::Exec),
    q(34, Model::Strengths, TraitCode::Infl),
    q(35, Model::Strengths, TraitCode::Rel),
    q(36, Model::Strengths, TraitCode::Strat),
    q(37, Model::Strengths, TraitCode::Exec),
    q(38, Model::Strengths, TraitCode::Infl),
    q(39, Model::Strengths, TraitCode::Rel),
    q(40, Model::Strengths, TraitCode::Strat),
    q(41, Model::Genius, TraitCode::WgW),
    q(42, Model::Genius, TraitCode::WgI),
    q(43, Model::Genius, TraitCode::WgD),
    q(44, Model::Genius, TraitCode::WgG),
    q(45, Model::Genius, TraitCode::WgE),
    q(46, Model::Genius, TraitCode::WgT),
    q(47, Model::Genius, TraitCode::WgW),
    q(48, Model::Genius, TraitCode::WgI),
    q(49, Model::Genius, TraitCode::WgD),
    q(50, Model::Genius, TraitCode::WgG),
    q(51, Model::Genius, TraitCode::WgE),
    q(52, Model::Genius, TraitCode::WgT),
];

/// Question id -> answer value. `0` means unanswered or invalid.
pub type AnswerSet = BTreeMap<u8, u8>;

/// Per-trait aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitTotal {
    #[serde(rename = "trait")]
    pub trait_code: TraitCode,
    pub label: String,
    pub score: u32,
    pub count: u32,
    pub avg: f64,
    pub pct: f64,
}

impl TraitTotal {
    fn empty(trait_code: TraitCode) -> Self {
        Self {
            trait_code,
            label: trait_code.label().to_string(),
            score: 0,
            count: 0,
            avg: 0.0,
            pct: 0.0,
        }
    }
}

/// Output of [`aggregate_traits`]: one row per trait plus the answered count.
#[derive(Debug, Clone, PartialEq)]
pub struct TraitTotals {
    pub totals: BTreeMap<TraitCode, TraitTotal>,
    pub answered_count: u32,
}

impl TraitTotals {
    /// Percentage for a trait, `0.0` when the trait is missing.
    pub fn pct(&self, code: TraitCode) -> f64 {
        self.totals.get(&code).map(|t| t.pct).unwrap_or(0.0)
    }

    /// Average for a trait, `0.0` when the trait is missing.
    pub fn avg(&self, code: TraitCode) -> f64 {
        self.totals.get(&code).map(|t| t.avg).unwrap_or(0.0)
    }
}

/// Valid Likert value check.
pub fn is_valid_answer(value: u8) -> bool {
    (1..=5).contains(&value)
}

/// Fold answers into per-trait totals.
///
/// Values outside 1..=5 (including the `0` placeholder) are skipped. Every
/// trait appears in the output, with `avg` and `pct` at zero when nothing
/// was answered for it.
pub fn aggregate_traits(answers: &AnswerSet, question_key: &[QuestionKeyEntry]) -> TraitTotals {
    let mut totals: BTreeMap<TraitCode, TraitTotal> = TraitCode::ALL
        .iter()
        .map(|&code| (code, TraitTotal::empty(code)))
        .collect();
    let mut answered_count = 0;

    for question in question_key {
        let value = answers.get(&question.id).copied().unwrap_or(0);
        if !is_valid_answer(value) {
            continue;
        }
        answered_count += 1;

        let row = totals
            .entry(question.trait_code)
            .or_insert_with(|| TraitTotal::empty(question.trait_code));
        row.score += u32::from(value);
        row.count += 1;
    }

    for row in totals.values_mut() {
        if row.count > 0 {
            row.avg = f64::from(row.score) / f64::from(row.count);
            row.pct = (row.avg - 1.0) / 4.0 * 100.0;
        }
    }

    TraitTotals {
        totals,
        answered_count,
    }
}
