//! Framework classifiers: MBTI pairs, DISC/Strengths/Working-Genius rankings
//! and composite archetypes.

use serde::{Deserialize, Serialize};

use crate::scoring::questions::{TraitCode, TraitTotals};

/// A dichotomy whose sides differ by less than this many points is balanced.
pub const MBTI_BALANCE_MARGIN: u32 = 8;

struct Dichotomy {
    left: TraitCode,
    right: TraitCode,
    label: &'static str,
}

const MBTI_DICHOTOMIES: [Dichotomy; 4] = [
    Dichotomy {
        left: TraitCode::E,
        right: TraitCode::I,
        label: "Energy Focus",
    },
    Dichotomy {
        left: TraitCode::S,
        right: TraitCode::N,
        label: "Information Style",
    },
    Dichotomy {
        left: TraitCode::T,
        right: TraitCode::F,
        label: "Decision Lens",
    },
    Dichotomy {
        left: TraitCode::J,
        right: TraitCode::P,
        label: "Execution Preference",
    },
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MbtiPair {
    pub left: TraitCode,
    pub right: TraitCode,
    pub label: String,
    pub left_pct: f64,
    pub right_pct: f64,
    pub winner: TraitCode,
    pub margin: u32,
    pub balanced: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MbtiConfidence {
    Clear,
    Moderate,
    Blended,
}

impl MbtiConfidence {
    fn from_balance_count(count: usize) -> Self {
        match count {
            0 => MbtiConfidence::Clear,
            1 => MbtiConfidence::Moderate,
            _ => MbtiConfidence::Blended,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MbtiConfidence::Clear => "Clear",
            MbtiConfidence::Moderate => "Moderate",
            MbtiConfidence::Blended => "Blended",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MbtiResult {
    #[serde(rename = "type")]
    pub mbti_type: String,
    /// Same as `mbti_type` with `X` in place of balanced letters.
    pub type_display: String,
    pub confidence: MbtiConfidence,
    pub balance_count: u32,
    pub pairs: Vec<MbtiPair>,
}

/// Resolve the four dichotomies. Ties go to the left letter.
pub fn resolve_mbti(totals: &TraitTotals) -> MbtiResult {
    let pairs: Vec<MbtiPair> = MBTI_DICHOTOMIES
        .iter()
        .map(|d| {
            let left_pct = totals.pct(d.left);
            let right_pct = totals.pct(d.right);
            let winner = if left_pct >= right_pct { d.left } else { d.right };
            let margin = (left_pct - right_pct).abs().round() as u32;
            MbtiPair {
                left: d.left,
                right: d.right,
                label: d.label.to_string(),
                left_pct,
                right_pct,
                winner,
                margin,
                balanced: margin < MBTI_BALANCE_MARGIN,
            }
        })
        .collect();

    let mbti_type: String = pairs.iter().map(|p| p.winner.as_str()).collect();
    let type_display: String = pairs
        .iter()
        .map(|p| if p.balanced { "X" } else { p.winner.as_str() })
        .collect();
    let balance_count = pairs.iter().filter(|p| p.balanced).count();

    MbtiResult {
        mbti_type,
        type_display,
        confidence: MbtiConfidence::from_balance_count(balance_count),
        balance_count: balance_count as u32,
        pairs,
    }
}

/// One entry of a framework ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedTrait {
    pub key: TraitCode,
    pub label: String,
    /// Rounded percentage.
    pub pct: u32,
    pub avg: f64,
}

/// Rank traits by rounded pct descending, ties by label ascending.
pub fn rank_traits(keys: &[TraitCode], totals: &TraitTotals) -> Vec<RankedTrait> {
    let mut ranking: Vec<RankedTrait> = keys
        .iter()
        .map(|&key| RankedTrait {
            key,
            label: key.label().to_string(),
            pct: totals.pct(key).round() as u32,
            avg: totals.avg(key),
        })
        .collect();
    ranking.sort_by(|a, b| b.pct.cmp(&a.pct).then_with(|| a.label.cmp(&b.label)));
    ranking
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscResult {
    pub ranking: Vec<RankedTrait>,
    pub primary: Option<RankedTrait>,
    pub secondary: Option<RankedTrait>,
}

pub fn rank_disc(totals: &TraitTotals) -> DiscResult {
    let ranking = rank_traits(&TraitCode::DISC, totals);
    DiscResult {
        primary: ranking.first().cloned(),
        secondary: ranking.get(1).cloned(),
        ranking,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrengthsResult {
    pub ranking: Vec<RankedTrait>,
    pub top_two: Vec<RankedTrait>,
}

pub fn rank_strengths(totals: &TraitTotals) -> StrengthsResult {
    let ranking = rank_traits(&TraitCode::STRENGTHS, totals);
    StrengthsResult {
        top_two: ranking.iter().take(2).cloned().collect(),
        ranking,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeniusResult {
    pub ranking: Vec<RankedTrait>,
    pub top_two: Vec<RankedTrait>,
    /// `[lowest, second lowest]`.
    pub lower_energy_two: Vec<RankedTrait>,
}

pub fn rank_genius(totals: &TraitTotals) -> GeniusResult {
    let ranking = rank_traits(&TraitCode::GENIUS, totals);
    let lower_energy_two = ranking.iter().rev().take(2).cloned().collect();
    GeniusResult {
        top_two: ranking.iter().take(2).cloned().collect(),
        lower_energy_two,
        ranking,
    }
}

struct ArchetypeDef {
    label: &'static str,
    traits: [TraitCode; 5],
    summary: &'static str,
}

const ARCHETYPES: [ArchetypeDef; 4] = [
    ArchetypeDef {
        label: "Systems Builder",
        traits: [
            TraitCode::J,
            TraitCode::C,
            TraitCode::Exec,
            TraitCode::WgD,
            TraitCode::WgT,
        ],
        summary: "Brings structure, consistency, and completion discipline.",
    },
    ArchetypeDef {
        label: "Growth Driver",
        traits: [
            TraitCode::D,
            TraitCode::N,
            TraitCode::Infl,
            TraitCode::WgI,
            TraitCode::WgG,
        ],
        summary: "Creates momentum, pushes change, and influences direction.",
    },
    ArchetypeDef {
        label: "People Integrator",
        traits: [
            TraitCode::F,
            TraitCode::Rel,
            TraitCode::SDisc,
            TraitCode::WgE,
            TraitCode::IDisc,
        ],
        summary: "Builds trust, alignment, and team reliability.",
    },
    ArchetypeDef {
        label: "Strategic Operator",
        traits: [
            TraitCode::Strat,
            TraitCode::T,
            TraitCode::C,
            TraitCode::WgD,
            TraitCode::J,
        ],
        summary: "Combines analytical thinking with operational execution.",
    },
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archetype {
    pub label: String,
    /// Unrounded mean pct of the archetype's five traits.
    pub score: f64,
    pub summary: String,
}

fn average_pct(traits: &[TraitCode], totals: &TraitTotals) -> f64 {
    if traits.is_empty() {
        return 0.0;
    }
    traits.iter().map(|&t| totals.pct(t)).sum::<f64>() / traits.len() as f64
}

/// Score all archetypes, highest first. Equal scores keep declaration order.
pub fn score_archetypes(totals: &TraitTotals) -> Vec<Archetype> {
    let mut archetypes: Vec<Archetype> = ARCHETYPES
        .iter()
        .map(|def| Archetype {
            label: def.label.to_string(),
            score: average_pct(&def.traits, totals),
            summary: def.summary.to_string(),
        })
        .collect();
    archetypes.sort_by(|a, b| b.score.total_cmp(&a.score));
    archetypes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::questions::{AnswerSet, QUESTION_KEY, aggregate_traits};

    fn totals_with(overrides: &[(u8, u8)], base: u8) -> TraitTotals {
        let mut answers: AnswerSet = QUESTION_KEY.iter().map(|q| (q.id, base)).collect();
        for &(id, value) in overrides {
            answers.insert(id, value);
        }
        aggregate_traits(&answers, &QUESTION_KEY)
    }

    #[test]
    fn uniform_answers_are_fully_blended() {
        let mbti = resolve_mbti(&totals_with(&[], 3));
        assert_eq!(mbti.mbti_type, "ESTJ");
        assert_eq!(mbti.type_display, "XXXX");
        assert_eq!(mbti.confidence, MbtiConfidence::Blended);
        assert_eq!(mbti.balance_count, 4);
        for pair in &mbti.pairs {
            assert_eq!(pair.margin, 0);
            assert!(pair.balanced);
            assert_eq!(pair.winner, pair.left);
        }
    }

    #[test]
    fn clear_type_when_every_pair_separates() {
        // I, N, F, P high; E, S, T, J low.
        let overrides: Vec<(u8, u8)> = [2, 10, 4, 12, 6, 14, 8, 16]
            .iter()
            .map(|&id| (id, 5))
            .collect();
        let mbti = resolve_mbti(&totals_with(&overrides, 1));
        assert_eq!(mbti.mbti_type, "INFP");
        assert_eq!(mbti.type_display, "INFP");
        assert_eq!(mbti.confidence, MbtiConfidence::Clear);
        assert!(mbti.pairs.iter().all(|p| p.margin == 100));
    }

    #[test]
    fn margin_threshold_is_strict() {
        // E avg 3.5 (62.5) vs I avg 3.0 (50): margin 13 -> not balanced.
        // S avg 3.0 vs N avg 3.0 -> balanced.
        let mbti = resolve_mbti(&totals_with(&[(1, 4)], 3));
        assert_eq!(mbti.pairs[0].margin, 13);
        assert!(!mbti.pairs[0].balanced);
        assert_eq!(mbti.type_display, "EXXX");
        assert_eq!(mbti.confidence, MbtiConfidence::Blended);
    }

    #[test]
    fn ranking_ties_break_by_label() {
        let disc = rank_disc(&totals_with(&[], 3));
        let labels: Vec<&str> = disc.ranking.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Conscientiousness", "Dominance", "Influence", "Steadiness"]
        );
        assert_eq!(disc.primary.unwrap().key, TraitCode::C);
        assert_eq!(disc.secondary.unwrap().key, TraitCode::D);
    }

    #[test]
    fn ranking_orders_by_rounded_pct() {
        // Steadiness questions 19, 23, 27 high.
        let disc = rank_disc(&totals_with(&[(19, 5), (23, 5), (27, 5)], 2));
        assert_eq!(disc.ranking[0].key, TraitCode::SDisc);
        assert_eq!(disc.ranking[0].pct, 100);
        assert_eq!(disc.ranking[1].pct, 25);
    }

    #[test]
    fn genius_lower_energy_lists_lowest_first() {
        // Wonder lowest (1s), Invention second lowest (2s), rest 4s.
        let totals = totals_with(&[(41, 1), (47, 1), (42, 2), (48, 2)], 4);
        let genius = rank_genius(&totals);
        assert_eq!(genius.ranking.last().unwrap().key, TraitCode::WgW);
        assert_eq!(genius.lower_energy_two[0].key, TraitCode::WgW);
        assert_eq!(genius.lower_energy_two[1].key, TraitCode::WgI);
    }

    #[test]
    fn strengths_top_two() {
        let totals = totals_with(&[(32, 5), (36, 5), (40, 5), (31, 4), (35, 4), (39, 4)], 2);
        let strengths = rank_strengths(&totals);
        let keys: Vec<TraitCode> = strengths.top_two.iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![TraitCode::Strat, TraitCode::Rel]);
    }

    #[test]
    fn archetype_ties_keep_declaration_order() {
        let archetypes = score_archetypes(&totals_with(&[], 3));
        let labels: Vec<&str> = archetypes.iter().map(|a| a.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Systems Builder",
                "Growth Driver",
                "People Integrator",
                "Strategic Operator"
            ]
        );
        assert!(archetypes.iter().all(|a| a.score == 50.0));
    }

    #[test]
    fn archetype_score_is_mean_of_five_traits() {
        // Push Growth Driver traits: D (17,21,25), N (4,12), INFL (30,34,38), WG_I (42,48), WG_G (44,50).
        let ids = [17, 21, 25, 4, 12, 30, 34, 38, 42, 48, 44, 50];
        let overrides: Vec<(u8, u8)> = ids.iter().map(|&id| (id, 5)).collect();
        let archetypes = score_archetypes(&totals_with(&overrides, 1));
        assert_eq!(archetypes[0].label, "Growth Driver");
        assert_eq!(archetypes[0].score, 100.0);
    }
}
