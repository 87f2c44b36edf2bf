//! Narrative interpretation derived from the framework results.

use serde::{Deserialize, Serialize};

use crate::scoring::frameworks::{DiscResult, RankedTrait};
use crate::scoring::profile::Profile;
use crate::scoring::questions::TraitCode;

/// A primary/secondary DISC gap at or below this many points is a blend.
pub const DISC_BLEND_MARGIN: u32 = 8;

/// Working Genius top-to-bottom spread below this is flagged as flat.
const GENIUS_FLAT_SPREAD: u32 = 12;

/// Completion percentage below this is flagged.
const LOW_COMPLETION_PCT: u32 = 90;

const DEFAULT_FIT_TAG: &str = "General Management Potential";

const STRENGTHS_PAIR_LABELS: [(TraitCode, TraitCode, &str); 6] = [
    (TraitCode::Exec, TraitCode::Infl, "Execution Influencer"),
    (TraitCode::Exec, TraitCode::Rel, "Team Builder"),
    (TraitCode::Exec, TraitCode::Strat, "Strategic Executor"),
    (TraitCode::Infl, TraitCode::Rel, "People Mobilizer"),
    (TraitCode::Infl, TraitCode::Strat, "Vision Influencer"),
    (TraitCode::Rel, TraitCode::Strat, "Collaborative Strategist"),
];

const GENIUS_PAIR_LABELS: [(TraitCode, TraitCode, &str); 6] = [
    (TraitCode::WgD, TraitCode::WgI, "Innovation Evaluator"),
    (TraitCode::WgD, TraitCode::WgT, "Quality Finisher"),
    (TraitCode::WgE, TraitCode::WgG, "Team Mobilizer"),
    (TraitCode::WgE, TraitCode::WgT, "Execution Support Engine"),
    (TraitCode::WgG, TraitCode::WgT, "Launch-and-Finish Driver"),
    (TraitCode::WgI, TraitCode::WgW, "Opportunity Inventor"),
];

/// Display name for a primary DISC trait.
pub fn disc_style_name(key: TraitCode) -> Option<&'static str> {
    match key {
        TraitCode::D => Some("Driver"),
        TraitCode::IDisc => Some("Promoter"),
        TraitCode::SDisc => Some("Stabilizer"),
        TraitCode::C => Some("Analyzer"),
        _ => None,
    }
}

/// Role-fit tags in interview priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitTag {
    OpsExecution,
    PeopleLeadership,
    SystemsStrategy,
    ChangeLeadership,
    DeliveryReliability,
}

impl FitTag {
    pub const PRIORITY: [FitTag; 5] = [
        FitTag::OpsExecution,
        FitTag::PeopleLeadership,
        FitTag::SystemsStrategy,
        FitTag::ChangeLeadership,
        FitTag::DeliveryReliability,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FitTag::OpsExecution => "Ops Execution",
            FitTag::PeopleLeadership => "People Leadership",
            FitTag::SystemsStrategy => "Systems Strategy",
            FitTag::ChangeLeadership => "Change Leadership",
            FitTag::DeliveryReliability => "Delivery Reliability",
        }
    }

    pub fn interview_prompt(self) -> &'static str {
        match self {
            FitTag::OpsExecution => {
                "Ask for a project they owned from kickoff to completion with measurable outcomes."
            }
            FitTag::PeopleLeadership => {
                "Probe coaching style, conflict handling, and retention impact on prior teams."
            }
            FitTag::SystemsStrategy => {
                "Ask for a process they redesigned and how they validated improvement."
            }
            FitTag::ChangeLeadership => {
                "Probe how they drove buy-in during a difficult change rollout."
            }
            FitTag::DeliveryReliability => {
                "Validate deadline discipline and escalation behavior when plans slip."
            }
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        Self::PRIORITY.into_iter().find(|tag| tag.label() == label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscStyle {
    pub style_label: String,
    /// Primary pct minus secondary pct, floored at zero.
    pub spread: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interpretation {
    pub profile_type: String,
    pub disc_style: String,
    pub strengths_pattern: String,
    pub working_genius_pattern: String,
    pub fit_tags: Vec<String>,
    pub interview_focus: Vec<String>,
    pub risk_flags: Vec<String>,
}

pub fn classify_disc_style(disc: &DiscResult) -> DiscStyle {
    let Some(primary) = disc.primary.as_ref() else {
        return DiscStyle {
            style_label: "N/A".to_string(),
            spread: 0,
        };
    };
    let secondary_pct = disc.secondary.as_ref().map(|s| s.pct).unwrap_or(0);
    let spread = primary.pct.saturating_sub(secondary_pct);
    let primary_style = disc_style_name(primary.key).unwrap_or(primary.label.as_str());

    if let Some(secondary) = disc.secondary.as_ref()
        && spread <= DISC_BLEND_MARGIN
    {
        let secondary_style = disc_style_name(secondary.key).unwrap_or(secondary.label.as_str());
        return DiscStyle {
            style_label: format!("{primary_style}-{secondary_style} Blend"),
            spread,
        };
    }

    DiscStyle {
        style_label: primary_style.to_string(),
        spread,
    }
}

fn pair_label(top_two: &[RankedTrait], table: &[(TraitCode, TraitCode, &'static str)]) -> String {
    match top_two {
        [] => "N/A".to_string(),
        [only] => only.label.clone(),
        [first, second, ..] => {
            let (a, b) = if first.key.as_str() <= second.key.as_str() {
                (first.key, second.key)
            } else {
                (second.key, first.key)
            };
            table
                .iter()
                .find(|(x, y, _)| *x == a && *y == b)
                .map(|(_, _, label)| (*label).to_string())
                .unwrap_or_else(|| format!("{} + {}", first.label, second.label))
        }
    }
}

pub fn classify_strengths_pattern(top_two: &[RankedTrait]) -> String {
    pair_label(top_two, &STRENGTHS_PAIR_LABELS)
}

pub fn classify_genius_pattern(top_two: &[RankedTrait]) -> String {
    pair_label(top_two, &GENIUS_PAIR_LABELS)
}

/// Evaluate every fit rule independently; falls back to the default tag.
pub fn derive_fit_tags(profile: &Profile) -> Vec<String> {
    let disc_primary = profile.disc.primary.as_ref().map(|p| p.key);
    let strengths: Vec<TraitCode> = profile.strengths.top_two.iter().map(|r| r.key).collect();
    let genius: Vec<TraitCode> = profile.working_genius.top_two.iter().map(|r| r.key).collect();

    let fires = |tag: FitTag| match tag {
        FitTag::OpsExecution => {
            matches!(disc_primary, Some(TraitCode::D | TraitCode::C))
                && strengths.contains(&TraitCode::Exec)
        }
        FitTag::PeopleLeadership => {
            strengths.contains(&TraitCode::Rel) || disc_primary == Some(TraitCode::SDisc)
        }
        FitTag::SystemsStrategy => {
            strengths.contains(&TraitCode::Strat)
                || genius.contains(&TraitCode::WgW)
                || genius.contains(&TraitCode::WgI)
        }
        FitTag::ChangeLeadership => {
            strengths.contains(&TraitCode::Infl) || genius.contains(&TraitCode::WgG)
        }
        FitTag::DeliveryReliability => {
            genius.contains(&TraitCode::WgT) || genius.contains(&TraitCode::WgE)
        }
    };

    let tags: Vec<String> = FitTag::PRIORITY
        .into_iter()
        .filter(|&tag| fires(tag))
        .map(|tag| tag.label().to_string())
        .collect();

    if tags.is_empty() {
        vec![DEFAULT_FIT_TAG.to_string()]
    } else {
        tags
    }
}

/// Up to three interview prompts, in fit-tag priority order.
pub fn derive_interview_focus(fit_tags: &[String]) -> Vec<String> {
    FitTag::PRIORITY
        .into_iter()
        .filter(|tag| fit_tags.iter().any(|t| FitTag::from_label(t) == Some(*tag)))
        .map(|tag| tag.interview_prompt().to_string())
        .take(3)
        .collect()
}

pub fn derive_risk_flags(profile: &Profile, disc_style: &DiscStyle) -> Vec<String> {
    let mut flags = Vec::new();

    if profile.rapid_flag {
        flags.push("Rapid completion".to_string());
    }
    if profile.completion_pct < LOW_COMPLETION_PCT {
        flags.push("Low completion rate".to_string());
    }
    if profile.mbti.balance_count >= 2 {
        flags.push("Multiple balanced MBTI pairs".to_string());
    }
    if disc_style.spread <= DISC_BLEND_MARGIN {
        flags.push("DISC top style is blended".to_string());
    }

    let ranking = &profile.working_genius.ranking;
    if let (Some(top), Some(bottom)) = (ranking.first(), ranking.last())
        && ranking.len() >= 2
    {
        let spread = i64::from(top.pct) - i64::from(bottom.pct);
        if spread < i64::from(GENIUS_FLAT_SPREAD) {
            flags.push("Working Genius profile is relatively flat".to_string());
        }
    }

    flags
}

pub fn derive_interpretation(profile: &Profile) -> Interpretation {
    let disc_style = classify_disc_style(&profile.disc);
    let strengths_pattern = classify_strengths_pattern(&profile.strengths.top_two);
    let working_genius_pattern = classify_genius_pattern(&profile.working_genius.top_two);
    let fit_tags = derive_fit_tags(profile);
    let interview_focus = derive_interview_focus(&fit_tags);
    let risk_flags = derive_risk_flags(profile, &disc_style);

    let archetype = profile
        .primary_archetype
        .as_ref()
        .map(|a| a.label.as_str())
        .unwrap_or("N/A");

    Interpretation {
        profile_type: format!(
            "{archetype} | {} | {strengths_pattern}",
            disc_style.style_label
        ),
        disc_style: disc_style.style_label,
        strengths_pattern,
        working_genius_pattern,
        fit_tags,
        interview_focus,
        risk_flags,
    }
}
