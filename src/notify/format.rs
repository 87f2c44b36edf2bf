//! Plain-text rendering of submission notifications.

use crate::scoring::calibration::format_calibration_measure;
use crate::scoring::frameworks::RankedTrait;
use crate::scoring::TOTAL_QUESTIONS;
use crate::store::SubmissionRecord;

const NOT_AVAILABLE: &str = "N/A";

const DISCLAIMER: &str = "Note: This is an internal profile inspired by major frameworks, not an official licensed diagnostic instrument.";

pub fn subject(record: &SubmissionRecord) -> String {
    format!(
        "Personality Submission [{}] - {} - {}",
        record.test_version, record.candidate_name, record.profile.mbti.mbti_type
    )
}

pub fn body(record: &SubmissionRecord) -> String {
    let p = &record.profile;
    let i = &p.interpretation;
    let calibration = &p.calibration;
    let known = record.reported_known();

    let or_na = |s: &str| -> String {
        if s.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            s.to_string()
        }
    };
    let disc_style = or_na(&i.disc_style);
    let strengths_pattern = or_na(&i.strengths_pattern);
    let genius_pattern = or_na(&i.working_genius_pattern);

    let overall = calibration
        .overall
        .as_ref()
        .map(|o| format!("{}% ({})", o.score, o.band.as_str()))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let interview_focus = if i.interview_focus.is_empty() {
        "None".to_string()
    } else {
        i.interview_focus.join(" | ")
    };
    let mbti_display = if p.mbti.type_display.is_empty() {
        &p.mbti.mbti_type
    } else {
        &p.mbti.type_display
    };
    let disc_primary = p
        .disc
        .primary
        .as_ref()
        .map(|t| format!("{} ({}%)", t.label, t.pct))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let primary_archetype = p
        .primary_archetype
        .as_ref()
        .map(|a| format!("{} ({}%)", a.label, a.score.round() as i64))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let mbti_detail = p
        .mbti
        .pairs
        .iter()
        .map(|pair| {
            format!(
                "{}/{} winner {} (margin {}%)",
                pair.left, pair.right, pair.winner, pair.margin
            )
        })
        .collect::<Vec<_>>()
        .join("; ");

    let lines = [
        format!("Submission ID: {}", record.submission_id),
        format!("Candidate: {}", record.candidate_name),
        format!("Candidate Email: {}", record.candidate_email),
        format!("Track: {}", record.role_label),
        format!("Test Version: {}", record.test_version),
        format!("Submitted At: {}", record.submitted_at),
        format!("Duration Minutes: {}", record.duration_minutes),
        format!(
            "Answered: {}/{} ({}%)",
            p.answered_count, TOTAL_QUESTIONS, p.completion_pct
        ),
        format!(
            "Rapid Completion Flag: {}",
            if p.rapid_flag { "Yes" } else { "No" }
        ),
        format!(
            "MBTI-Inspired Type: {} ({})",
            mbti_display,
            p.mbti.confidence.as_str()
        ),
        format!("DISC Primary: {disc_primary}"),
        format!("DISC Style: {disc_style}"),
        format!("Profile Type: {}", or_na(&i.profile_type)),
        format!("Strengths Pattern: {strengths_pattern}"),
        format!("Working Genius Pattern: {genius_pattern}"),
        format!("Fit Tags: {}", format_list(&i.fit_tags, "None")),
        format!("Interview Focus: {interview_focus}"),
        format!("Risk Flags: {}", format_list(&i.risk_flags, "None")),
        format!("Top Strength Domains: {}", labels(&p.strengths.top_two)),
        format!("Top Working Genius: {}", labels(&p.working_genius.top_two)),
        format!(
            "Lower-Energy Genius Areas: {}",
            labels(&p.working_genius.lower_energy_two)
        ),
        format!("Primary Archetype: {primary_archetype}"),
        String::new(),
        "Calibration Against Known Assessments".to_string(),
        format!("Known MBTI: {}", or_na(&known.mbti)),
        format!("Known DISC: {}", or_na(&known.disc)),
        format!("Known Strengths: {}", format_list(&known.strengths, "None")),
        format!(
            "Known Working Genius: {}",
            format_list(&known.working_genius, "None")
        ),
        format!("Overall Alignment: {overall}"),
        format!(
            "MBTI Match: {}",
            format_calibration_measure(calibration.mbti_match.as_ref())
        ),
        format!(
            "DISC Match: {}",
            format_calibration_measure(calibration.disc_match.as_ref())
        ),
        format!(
            "Strengths Match: {}",
            format_calibration_measure(calibration.strengths_match.as_ref())
        ),
        format!(
            "Working Genius Match: {}",
            format_calibration_measure(calibration.genius_match.as_ref())
        ),
        String::new(),
        "Interpretation Notes".to_string(),
        format!("DISC Explanation: {}", explain_disc_style(&disc_style)),
        format!("Strengths Explanation: {}", explain_pattern(&strengths_pattern)),
        format!("Working Genius Explanation: {}", explain_pattern(&genius_pattern)),
        String::new(),
        format!("MBTI Pair Detail: {mbti_detail}"),
        format!("DISC Detail: {}", scored_labels(&p.disc.ranking)),
        format!("Strength Domain Detail: {}", scored_labels(&p.strengths.ranking)),
        format!("Working Genius Detail: {}", scored_labels(&p.working_genius.ranking)),
        String::new(),
        DISCLAIMER.to_string(),
    ];

    lines.join("\n")
}

/// One-sentence reading of a DISC style label.
pub fn explain_disc_style(style: &str) -> &'static str {
    match style {
        "" | NOT_AVAILABLE => "No DISC signal available.",
        s if s.contains("Blend") => {
            "Shows a blended style with adaptable behavior across multiple communication modes."
        }
        "Driver" => "Tends to move quickly, make decisions fast, and push for results.",
        "Promoter" => "Builds momentum through communication and social influence.",
        "Stabilizer" => "Provides consistency, reliability, and calm follow-through.",
        "Analyzer" => "Prioritizes quality, logic, detail, and risk control.",
        _ => "Custom style blend identified.",
    }
}

pub fn explain_pattern(pattern: &str) -> String {
    match pattern {
        "" | NOT_AVAILABLE => "No clear pattern signal available.".to_string(),
        p => format!(
            "Primary pattern indicates a likely preference for {} work.",
            p.to_lowercase()
        ),
    }
}

/// Comma-join non-blank items, or `fallback` when nothing remains.
pub fn format_list(values: &[String], fallback: &str) -> String {
    let clean: Vec<&str> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect();
    if clean.is_empty() {
        fallback.to_string()
    } else {
        clean.join(", ")
    }
}

fn labels(items: &[RankedTrait]) -> String {
    items
        .iter()
        .map(|t| t.label.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn scored_labels(items: &[RankedTrait]) -> String {
    items
        .iter()
        .map(|t| format!("{} {}%", t.label, t.pct))
        .collect::<Vec<_>>()
        .join(", ")
}
