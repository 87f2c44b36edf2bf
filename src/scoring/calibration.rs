//! Alignment between the computed profile and assessment results the
//! candidate already knows about themselves.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::scoring::frameworks::{MbtiResult, RankedTrait};
use crate::scoring::profile::Profile;
use crate::scoring::questions::TraitCode;

const MAX_MBTI_LETTERS: usize = 4;
const MAX_DISC_CHARS: usize = 24;
const MAX_LIST_ITEMS: usize = 8;

const MBTI_LETTERS: &str = "EISNTFJP";

const STRENGTH_ALIASES: [(&str, TraitCode); 19] = [
    ("executing", TraitCode::Exec),
    ("execution", TraitCode::Exec),
    ("achiever", TraitCode::Exec),
    ("discipline", TraitCode::Exec),
    ("responsibility", TraitCode::Exec),
    ("influencing", TraitCode::Infl),
    ("influence", TraitCode::Infl),
    ("communication", TraitCode::Infl),
    ("woo", TraitCode::Infl),
    ("relator", TraitCode::Rel),
    ("empathy", TraitCode::Rel),
    ("developer", TraitCode::Rel),
    ("relationship", TraitCode::Rel),
    ("relationship building", TraitCode::Rel),
    ("strategic", TraitCode::Strat),
    ("strategic thinking", TraitCode::Strat),
    ("intellection", TraitCode::Strat),
    ("learner", TraitCode::Strat),
    ("ideation", TraitCode::Strat),
];

const GENIUS_ALIASES: [(&str, TraitCode); 8] = [
    ("wonder", TraitCode::WgW),
    ("invention", TraitCode::WgI),
    ("invent", TraitCode::WgI),
    ("discernment", TraitCode::WgD),
    ("galvanizing", TraitCode::WgG),
    ("galvanizer", TraitCode::WgG),
    ("enablement", TraitCode::WgE),
    ("tenacity", TraitCode::WgT),
];

/// Self-reported assessment results, normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownAssessments {
    #[serde(default)]
    pub mbti: String,
    #[serde(default)]
    pub disc: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub working_genius: Vec<String>,
}

impl KnownAssessments {
    /// Build from a loosely-typed request payload.
    ///
    /// List fields accept either an array or a comma-separated string.
    /// `genius` is accepted as an alias for `workingGenius`.
    pub fn from_value(raw: &Value) -> Self {
        let field = |name: &str| raw.get(name).filter(|v| !v.is_null());
        let text = |name: &str| field(name).map(value_to_text).unwrap_or_default();

        Self {
            mbti: text("mbti"),
            disc: text("disc"),
            strengths: field("strengths").map(parse_list).unwrap_or_default(),
            working_genius: field("workingGenius")
                .or_else(|| field("genius"))
                .map(parse_list)
                .unwrap_or_default(),
        }
        .normalized()
    }

    /// Apply the canonical normalization. Idempotent.
    pub fn normalized(&self) -> Self {
        let mbti: String = self
            .mbti
            .to_uppercase()
            .chars()
            .filter(|c| c.is_ascii_uppercase())
            .take(MAX_MBTI_LETTERS)
            .collect();
        let disc: String = self
            .disc
            .to_uppercase()
            .chars()
            .filter(|c| c.is_ascii_uppercase() || matches!(c, '-' | '/' | ' '))
            .take(MAX_DISC_CHARS)
            .collect();

        Self {
            mbti,
            disc,
            strengths: clean_list(&self.strengths),
            working_genius: clean_list(&self.working_genius),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mbti.is_empty()
            && self.disc.is_empty()
            && self.strengths.is_empty()
            && self.working_genius.is_empty()
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "true".to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Bool(false) => "false".to_string(),
                other => value_to_text(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        _ => String::new(),
    }
}

fn parse_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(value_to_text).collect(),
        other => value_to_text(other).split(',').map(str::to_string).collect(),
    }
}

fn clean_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .take(MAX_LIST_ITEMS)
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationMeasure {
    pub score: u32,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignmentBand {
    #[serde(rename = "High Alignment")]
    High,
    #[serde(rename = "Moderate Alignment")]
    Moderate,
    #[serde(rename = "Low Alignment")]
    Low,
}

impl AlignmentBand {
    pub fn from_score(score: u32) -> Self {
        if score >= 80 {
            AlignmentBand::High
        } else if score >= 60 {
            AlignmentBand::Moderate
        } else {
            AlignmentBand::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AlignmentBand::High => "High Alignment",
            AlignmentBand::Moderate => "Moderate Alignment",
            AlignmentBand::Low => "Low Alignment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallAlignment {
    pub score: u32,
    pub band: AlignmentBand,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calibration {
    pub has_known: bool,
    pub known: KnownAssessments,
    pub mbti_match: Option<CalibrationMeasure>,
    pub disc_match: Option<CalibrationMeasure>,
    pub strengths_match: Option<CalibrationMeasure>,
    pub genius_match: Option<CalibrationMeasure>,
    pub overall: Option<OverallAlignment>,
}

impl Calibration {
    /// No known data: every measure is null.
    pub fn absent(known: KnownAssessments) -> Self {
        Self {
            has_known: false,
            known,
            ..Self::default()
        }
    }
}

pub fn derive_calibration(profile: &Profile, known: &KnownAssessments) -> Calibration {
    let known = known.normalized();
    if known.is_empty() {
        return Calibration::absent(known);
    }

    let mbti_match = score_mbti_alignment(&profile.mbti, &known.mbti);
    let disc_match = score_disc_alignment(
        profile.disc.primary.as_ref().map(|p| p.key),
        profile.disc.secondary.as_ref().map(|s| s.key),
        &known.disc,
    );
    let strengths_match =
        score_list_alignment(&profile.strengths.top_two, &known.strengths, &STRENGTH_ALIASES);
    let genius_match = score_list_alignment(
        &profile.working_genius.top_two,
        &known.working_genius,
        &GENIUS_ALIASES,
    );

    let scores: Vec<u32> = [&mbti_match, &disc_match, &strengths_match, &genius_match]
        .into_iter()
        .flatten()
        .map(|m| m.score)
        .collect();
    let overall = (!scores.is_empty()).then(|| {
        let mean = scores.iter().map(|&s| f64::from(s)).sum::<f64>() / scores.len() as f64;
        let score = mean.round() as u32;
        OverallAlignment {
            score,
            band: AlignmentBand::from_score(score),
        }
    });

    Calibration {
        has_known: true,
        known,
        mbti_match,
        disc_match,
        strengths_match,
        genius_match,
        overall,
    }
}

/// Letter-by-letter comparison. A mismatched letter on a balanced pair
/// still earns half a point.
pub fn score_mbti_alignment(mbti: &MbtiResult, known: &str) -> Option<CalibrationMeasure> {
    let known: Vec<char> = known.chars().collect();
    if known.len() < 2 {
        return None;
    }
    let predicted: Vec<char> = mbti.mbti_type.chars().collect();
    let len = predicted.len().min(known.len()).min(MAX_MBTI_LETTERS);
    if len == 0 {
        return None;
    }

    let mut matched = 0.0_f64;
    for idx in 0..len {
        if known[idx] == predicted[idx] {
            matched += 1.0;
            continue;
        }
        let balanced = mbti.pairs.get(idx).is_some_and(|p| p.balanced);
        if balanced && MBTI_LETTERS.contains(known[idx]) {
            matched += 0.5;
        }
    }

    let score = (matched / len as f64 * 100.0).round() as u32;
    let shown = (matched * 10.0).round() / 10.0;
    Some(CalibrationMeasure {
        score,
        detail: format!("{shown}/{len} letters aligned"),
    })
}

/// Single-letter DISC tokens present in a free-text value, in D/I/S/C order.
pub fn extract_disc_tokens(value: &str) -> Vec<char> {
    let upper = value.to_uppercase();
    ['D', 'I', 'S', 'C']
        .into_iter()
        .filter(|&c| upper.contains(c))
        .collect()
}

fn disc_letter(key: TraitCode) -> Option<char> {
    match key {
        TraitCode::D => Some('D'),
        TraitCode::IDisc => Some('I'),
        TraitCode::SDisc => Some('S'),
        TraitCode::C => Some('C'),
        _ => None,
    }
}

pub fn score_disc_alignment(
    primary: Option<TraitCode>,
    secondary: Option<TraitCode>,
    known: &str,
) -> Option<CalibrationMeasure> {
    if known.is_empty() {
        return None;
    }
    let tokens = extract_disc_tokens(known);
    if tokens.is_empty() {
        return None;
    }

    let primary = primary.and_then(disc_letter);
    let secondary = secondary.and_then(disc_letter);
    let has = |letter: Option<char>| letter.is_some_and(|l| tokens.contains(&l));

    let score = if has(primary) {
        100
    } else if has(secondary) {
        70
    } else {
        20
    };

    let known_joined: Vec<String> = tokens.iter().map(char::to_string).collect();
    let predicted = match (primary, secondary) {
        (Some(p), Some(s)) => format!("{p}/{s}"),
        (Some(p), None) => p.to_string(),
        (None, _) => String::new(),
    };
    Some(CalibrationMeasure {
        score,
        detail: format!("Known {}, predicted {predicted}", known_joined.join("/")),
    })
}

fn lookup_alias(label: &str, aliases: &[(&str, TraitCode)]) -> Option<TraitCode> {
    let key = label.trim().to_lowercase();
    if key.is_empty() {
        return None;
    }
    aliases
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, code)| *code)
}

/// Every recognized label counts, duplicates included. Matches are capped at
/// the denominator so the score never exceeds 100.
pub fn score_list_alignment(
    predicted_top_two: &[RankedTrait],
    known: &[String],
    aliases: &[(&str, TraitCode)],
) -> Option<CalibrationMeasure> {
    let known_keys: Vec<TraitCode> = known
        .iter()
        .filter_map(|label| lookup_alias(label, aliases))
        .collect();
    if known_keys.is_empty() {
        return None;
    }

    let denom = known_keys.len().min(2);
    let matches = known_keys
        .iter()
        .filter(|key| predicted_top_two.iter().any(|p| p.key == **key))
        .count()
        .min(denom);
    let score = (matches as f64 / denom as f64 * 100.0).round() as u32;

    Some(CalibrationMeasure {
        score,
        detail: format!("{matches}/{denom} top areas aligned"),
    })
}

/// `"<score>% - <detail>"`, or `"N/A"`.
pub fn format_calibration_measure(measure: Option<&CalibrationMeasure>) -> String {
    match measure {
        Some(m) => format!("{}% - {}", m.score, m.detail),
        None => "N/A".to_string(),
    }
}
