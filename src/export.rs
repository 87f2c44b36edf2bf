//! CSV and JSON exports of stored submissions.

use crate::scoring::calibration::CalibrationMeasure;
use crate::scoring::frameworks::RankedTrait;
use crate::store::SubmissionRecord;

/// Fixed CSV column set, in output order.
pub const CSV_HEADERS: [&str; 44] = [
    "submissionId",
    "receivedAt",
    "submittedAt",
    "testVersion",
    "candidateName",
    "candidateEmail",
    "durationMinutes",
    "answeredCount",
    "totalQuestions",
    "completionPct",
    "rapidFlag",
    "mbtiType",
    "mbtiConfidence",
    "profileType",
    "discStyle",
    "discPrimary",
    "discSecondary",
    "strengthsPattern",
    "strengthTopOne",
    "strengthTopTwo",
    "workingGeniusPattern",
    "geniusTopOne",
    "geniusTopTwo",
    "geniusLowOne",
    "geniusLowTwo",
    "primaryArchetype",
    "primaryArchetypeScore",
    "fitTags",
    "interviewFocus",
    "riskFlags",
    "knownMbti",
    "knownDisc",
    "knownStrengths",
    "knownWorkingGenius",
    "calibrationOverallScore",
    "calibrationOverallBand",
    "calibrationMbtiScore",
    "calibrationMbtiDetail",
    "calibrationDiscScore",
    "calibrationDiscDetail",
    "calibrationStrengthsScore",
    "calibrationStrengthsDetail",
    "calibrationGeniusScore",
    "calibrationGeniusDetail",
];

/// Escape one CSV cell.
///
/// Cells starting with `=`, `+`, `-` or `@` get a leading `'` so spreadsheets
/// do not evaluate them as formulas.
pub fn csv_escape(value: &str) -> String {
    let mut text = value.to_string();
    if text.starts_with(['=', '+', '-', '@']) {
        text.insert(0, '\'');
    }
    if text.contains(['"', ',', '\n']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text
    }
}

/// Render records as CSV. Lines are joined with `\n`, without a trailing
/// newline.
pub fn build_submission_csv(records: &[SubmissionRecord]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(CSV_HEADERS.join(","));
    for record in records {
        let row = csv_row(record);
        debug_assert_eq!(row.len(), CSV_HEADERS.len());
        lines.push(
            row.iter()
                .map(|cell| csv_escape(cell))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    lines.join("\n")
}

/// Render records as a pretty-printed JSON array.
pub fn build_submission_json(records: &[SubmissionRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(records)
}

fn csv_row(record: &SubmissionRecord) -> Vec<String> {
    let p = &record.profile;
    let i = &p.interpretation;
    let c = &p.calibration;
    let known = record.reported_known();

    let label_at = |items: &[RankedTrait], idx: usize| {
        items.get(idx).map(|t| t.label.clone()).unwrap_or_default()
    };
    let score = |m: Option<&CalibrationMeasure>| m.map(|m| m.score.to_string()).unwrap_or_default();
    let detail = |m: Option<&CalibrationMeasure>| m.map(|m| m.detail.clone()).unwrap_or_default();
    let mbti_type = if p.mbti.type_display.is_empty() {
        p.mbti.mbti_type.clone()
    } else {
        p.mbti.type_display.clone()
    };

    vec![
        record.submission_id.clone(),
        record.received_at.clone(),
        record.submitted_at.clone(),
        record.test_version.clone(),
        record.candidate_name.clone(),
        record.candidate_email.clone(),
        record.duration_minutes.to_string(),
        p.answered_count.to_string(),
        p.total_questions.to_string(),
        p.completion_pct.to_string(),
        p.rapid_flag.to_string(),
        mbti_type,
        p.mbti.confidence.as_str().to_string(),
        i.profile_type.clone(),
        i.disc_style.clone(),
        p.disc.primary.as_ref().map(|t| t.label.clone()).unwrap_or_default(),
        p.disc.secondary.as_ref().map(|t| t.label.clone()).unwrap_or_default(),
        i.strengths_pattern.clone(),
        label_at(&p.strengths.top_two, 0),
        label_at(&p.strengths.top_two, 1),
        i.working_genius_pattern.clone(),
        label_at(&p.working_genius.top_two, 0),
        label_at(&p.working_genius.top_two, 1),
        label_at(&p.working_genius.lower_energy_two, 0),
        label_at(&p.working_genius.lower_energy_two, 1),
        p.primary_archetype
            .as_ref()
            .map(|a| a.label.clone())
            .unwrap_or_default(),
        p.primary_archetype
            .as_ref()
            .map(|a| (a.score.round() as i64).to_string())
            .unwrap_or_default(),
        i.fit_tags.join("|"),
        i.interview_focus.join("|"),
        i.risk_flags.join("|"),
        known.mbti.clone(),
        known.disc.clone(),
        known.strengths.join("|"),
        known.working_genius.join("|"),
        c.overall.as_ref().map(|o| o.score.to_string()).unwrap_or_default(),
        c.overall
            .as_ref()
            .map(|o| o.band.as_str().to_string())
            .unwrap_or_default(),
        score(c.mbti_match.as_ref()),
        detail(c.mbti_match.as_ref()),
        score(c.disc_match.as_ref()),
        detail(c.disc_match.as_ref()),
        score(c.strengths_match.as_ref()),
        detail(c.strengths_match.as_ref()),
        score(c.genius_match.as_ref()),
        detail(c.genius_match.as_ref()),
    ]
}
