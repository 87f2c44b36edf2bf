//! The assembled multi-framework profile.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::scoring::calibration::{Calibration, KnownAssessments, derive_calibration};
use crate::scoring::frameworks::{
    Archetype, DiscResult, GeniusResult, MbtiResult, StrengthsResult, rank_disc, rank_genius,
    rank_strengths, resolve_mbti, score_archetypes,
};
use crate::scoring::interpretation::{Interpretation, derive_interpretation};
use crate::scoring::questions::{
    AnswerSet, QUESTION_KEY, TOTAL_QUESTIONS, TraitCode, TraitTotal, TraitTotals,
    aggregate_traits,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub answered_count: u32,
    pub total_questions: u32,
    pub completion_pct: u32,
    pub rapid_flag: bool,
    pub trait_totals: BTreeMap<TraitCode, TraitTotal>,
    pub mbti: MbtiResult,
    pub disc: DiscResult,
    pub strengths: StrengthsResult,
    pub working_genius: GeniusResult,
    pub archetypes: Vec<Archetype>,
    pub primary_archetype: Option<Archetype>,
    #[serde(default)]
    pub interpretation: Interpretation,
    #[serde(default)]
    pub calibration: Calibration,
}

/// Build the profile from aggregated traits.
///
/// Calibration is left absent; see [`score_answers`] for the full pipeline.
pub fn build_profile(
    totals: &TraitTotals,
    duration_minutes: f64,
    min_duration_minutes: f64,
) -> Profile {
    let archetypes = score_archetypes(totals);
    let completion = f64::from(totals.answered_count) / TOTAL_QUESTIONS as f64 * 100.0;

    let mut profile = Profile {
        answered_count: totals.answered_count,
        total_questions: TOTAL_QUESTIONS as u32,
        completion_pct: completion.round() as u32,
        rapid_flag: duration_minutes < min_duration_minutes,
        trait_totals: totals.totals.clone(),
        mbti: resolve_mbti(totals),
        disc: rank_disc(totals),
        strengths: rank_strengths(totals),
        working_genius: rank_genius(totals),
        primary_archetype: archetypes.first().cloned(),
        archetypes,
        interpretation: Interpretation::default(),
        calibration: Calibration::absent(KnownAssessments::default()),
    };
    profile.interpretation = derive_interpretation(&profile);
    profile
}

/// Answers in, complete profile (with calibration) out. Pure and deterministic.
pub fn score_answers(
    answers: &AnswerSet,
    duration_minutes: f64,
    min_duration_minutes: f64,
    known: &KnownAssessments,
) -> Profile {
    let totals = aggregate_traits(answers, &QUESTION_KEY);
    let mut profile = build_profile(&totals, duration_minutes, min_duration_minutes);
    profile.calibration = derive_calibration(&profile, known);
    profile
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(value: u8) -> AnswerSet {
        QUESTION_KEY.iter().map(|q| (q.id, value)).collect()
    }

    #[test]
    fn rapid_flag_uses_strict_threshold() {
        let known = KnownAssessments::default();
        assert!(score_answers(&uniform(3), 5.0, 8.0, &known).rapid_flag);
        assert!(!score_answers(&uniform(3), 8.0, 8.0, &known).rapid_flag);
    }

    #[test]
    fn completion_pct_rounds() {
        let mut answers = uniform(4);
        for id in 1..=5 {
            answers.insert(id, 0);
        }
        let profile = score_answers(&answers, 20.0, 8.0, &KnownAssessments::default());
        assert_eq!(profile.answered_count, 47);
        assert_eq!(profile.completion_pct, 90);
        assert!(!profile
            .interpretation
            .risk_flags
            .contains(&"Low completion rate".to_string()));
    }

    #[test]
    fn uniform_profile_risk_flags() {
        let profile = score_answers(&uniform(3), 5.0, 8.0, &KnownAssessments::default());
        assert_eq!(
            profile.interpretation.risk_flags,
            vec![
                "Rapid completion",
                "Multiple balanced MBTI pairs",
                "DISC top style is blended",
                "Working Genius profile is relatively flat",
            ]
        );
    }

    #[test]
    fn no_known_data_means_no_calibration() {
        let profile = score_answers(&uniform(3), 20.0, 8.0, &KnownAssessments::default());
        assert!(!profile.calibration.has_known);
        assert!(profile.calibration.overall.is_none());
        assert!(profile.calibration.mbti_match.is_none());
    }

    #[test]
    fn scoring_is_deterministic() {
        let known = KnownAssessments {
            mbti: "ENTJ".to_string(),
            ..Default::default()
        };
        let a = serde_json::to_string(&score_answers(&uniform(4), 12.0, 8.0, &known)).unwrap();
        let b = serde_json::to_string(&score_answers(&uniform(4), 12.0, 8.0, &known)).unwrap();
        assert_eq!(a, b);
    }
}
