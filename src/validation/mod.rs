//! Submission payload validation and normalization.
//!
//! Request bodies arrive loosely typed from browser clients, so fields are
//! read from a raw [`serde_json::Value`] with lenient coercion (numbers may be
//! sent as strings, missing answers are simply unanswered) before the strict
//! checks run.

pub mod email;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ScoringConfig;
use crate::error::SubmissionError;
use crate::scoring::{AnswerSet, KnownAssessments, QUESTION_KEY};
use crate::util::{now_rfc3339, truncate_chars};

pub use email::{MAX_EMAIL_LEN, is_valid_email_format, suggest_email_domain_fix};

pub const MAX_NAME_LEN: usize = 120;
pub const MAX_TEST_VERSION_LEN: usize = 60;
pub const DEFAULT_TEST_VERSION: &str = "personality-v1-52q";
pub const PROFILE_LABEL: &str = "Leadership Personality Profile";

/// A validated, normalized submission ready for scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub candidate_name: String,
    pub candidate_email: String,
    pub submitted_at: String,
    pub duration_minutes: f64,
    pub auto_submitted: bool,
    pub test_version: String,
    /// Every question id, with unanswered or invalid values stored as 0.
    pub answers: AnswerSet,
    #[serde(default)]
    pub known_assessments: KnownAssessments,
    pub role_label: String,
}

/// Validate a raw request body.
///
/// Error messages are caller-facing and returned verbatim in 400 responses.
pub fn validate_submission(
    body: &Value,
    config: &ScoringConfig,
) -> Result<Submission, SubmissionError> {
    let field = |name: &str| body.get(name).unwrap_or(&Value::Null);

    let candidate_name = coerce_string(field("candidateName")).trim().to_string();
    let candidate_email = coerce_string(field("candidateEmail"))
        .trim()
        .to_lowercase();
    let submitted_at = match coerce_string(field("submittedAt")).trim() {
        "" => now_rfc3339(),
        other => other.to_string(),
    };
    let duration_minutes = coerce_number(field("durationMinutes"));
    let auto_submitted = is_truthy(field("autoSubmitted"));
    let test_version = normalize_test_version(&coerce_string(field("testVersion")));
    let known_assessments = KnownAssessments::from_value(field("knownAssessments"));

    if candidate_name.is_empty() {
        return Err(SubmissionError::invalid("Missing candidateName"));
    }
    if candidate_name.chars().count() > MAX_NAME_LEN {
        return Err(SubmissionError::invalid("candidateName is too long"));
    }
    if !is_valid_email_format(&candidate_email) {
        return Err(SubmissionError::invalid("Missing or invalid candidateEmail"));
    }
    if candidate_email.chars().count() > MAX_EMAIL_LEN {
        return Err(SubmissionError::invalid("candidateEmail is too long"));
    }
    if !duration_minutes.is_finite()
        || duration_minutes < 0.0
        || duration_minutes > config.max_duration_minutes
    {
        return Err(SubmissionError::invalid("Invalid durationMinutes"));
    }
    if !is_parseable_timestamp(&submitted_at) {
        return Err(SubmissionError::invalid("Invalid submittedAt"));
    }
    if let Some(suggestion) = suggest_email_domain_fix(&candidate_email) {
        return Err(SubmissionError::invalid(format!(
            "Possible candidateEmail typo. Did you mean {suggestion}?"
        )));
    }

    Ok(Submission {
        candidate_name,
        candidate_email,
        submitted_at,
        duration_minutes,
        auto_submitted,
        test_version,
        answers: collect_answers(field("answers")),
        known_assessments,
        role_label: PROFILE_LABEL.to_string(),
    })
}

/// Trim, truncate and restrict to `[A-Za-z0-9._-]`. Empty becomes the default.
pub fn normalize_test_version(raw: &str) -> String {
    let cleaned = truncate_chars(raw.trim(), MAX_TEST_VERSION_LEN);
    if cleaned.is_empty() {
        return DEFAULT_TEST_VERSION.to_string();
    }
    cleaned
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn collect_answers(raw: &Value) -> AnswerSet {
    QUESTION_KEY
        .iter()
        .map(|q| {
            let value = match raw {
                Value::Object(map) => map.get(&q.id.to_string()),
                Value::Array(items) => items.get(usize::from(q.id)),
                _ => None,
            };
            (q.id, value.map(coerce_answer).unwrap_or(0))
        })
        .collect()
}

/// Integers 1..=5 (as numbers or numeric strings) are kept; anything else is 0.
fn coerce_answer(value: &Value) -> u8 {
    let n = coerce_number(value);
    if n.fract() == 0.0 && (1.0..=5.0).contains(&n) {
        n as u8
    } else {
        0
    }
}

fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.as_f64() != Some(0.0) => n.to_string(),
        Value::Bool(true) => "true".to_string(),
        _ => String::new(),
    }
}

/// Numeric coercion for loosely typed fields. Missing values are 0 and
/// unparseable ones are NaN.
fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse().unwrap_or(f64::NAN)
            }
        }
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn is_parseable_timestamp(raw: &str) -> bool {
    DateTime::parse_from_rfc3339(raw).is_ok()
        || NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M").is_ok()
        || NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").is_ok()
        || NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()
}
