//! Append-only submission log.
//!
//! Each accepted submission is written as one JSON line. Reads scan the whole
//! file and skip lines that fail to parse, so a torn or hand-edited line never
//! hides the rest of the log.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::StorageError;
use crate::scoring::{AnswerSet, KnownAssessments, Profile};
use crate::validation::Submission;

/// Upper bound on how many records a single listing may return.
pub const MAX_LIMIT: usize = 5000;

const ID_SUFFIX_LEN: usize = 6;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// One persisted submission: the validated input plus its computed profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub submission_id: String,
    pub received_at: String,
    pub candidate_name: String,
    pub candidate_email: String,
    pub submitted_at: String,
    pub duration_minutes: f64,
    #[serde(default)]
    pub auto_submitted: bool,
    pub test_version: String,
    #[serde(default)]
    pub answers: AnswerSet,
    #[serde(default)]
    pub known_assessments: KnownAssessments,
    #[serde(default)]
    pub role_label: String,
    pub profile: Profile,
}

impl SubmissionRecord {
    pub fn new(
        submission_id: String,
        received_at: String,
        submission: Submission,
        profile: Profile,
    ) -> Self {
        let Submission {
            candidate_name,
            candidate_email,
            submitted_at,
            duration_minutes,
            auto_submitted,
            test_version,
            answers,
            known_assessments,
            role_label,
        } = submission;

        Self {
            submission_id,
            received_at,
            candidate_name,
            candidate_email,
            submitted_at,
            duration_minutes,
            auto_submitted,
            test_version,
            answers,
            known_assessments,
            role_label,
            profile,
        }
    }

    /// Known assessments as reported in exports and emails: the calibrated
    /// copy when present, else the stored input.
    pub fn reported_known(&self) -> KnownAssessments {
        let calibration = &self.profile.calibration;
        if calibration.has_known {
            calibration.known.clone()
        } else {
            self.known_assessments.normalized()
        }
    }
}

/// Persistence for submission records.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Append one record. Concurrent appends never interleave.
    async fn append(&self, record: &SubmissionRecord) -> Result<(), StorageError>;

    /// The newest `limit` records, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<SubmissionRecord>, StorageError>;
}

/// NDJSON file implementation of [`SubmissionStore`].
pub struct JsonlSubmissionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlSubmissionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl SubmissionStore for JsonlSubmissionStore {
    async fn append(&self, record: &SubmissionRecord) -> Result<(), StorageError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        file.flush().await.map_err(|e| self.io_error(e))?;

        tracing::debug!(
            submission_id = %record.submission_id,
            path = %self.path.display(),
            "Appended submission"
        );
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<SubmissionRecord>, StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        let mut records = Vec::new();
        for (index, line) in raw.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<SubmissionRecord>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::debug!(line = index + 1, error = %e, "Skipping unparseable submission line");
                }
            }
        }

        let skip = records.len().saturating_sub(limit);
        Ok(records.into_iter().skip(skip).rev().collect())
    }
}

/// Keep only records whose test version matches exactly. An empty filter
/// keeps everything.
pub fn filter_by_test_version(
    records: Vec<SubmissionRecord>,
    test_version: &str,
) -> Vec<SubmissionRecord> {
    let wanted = test_version.trim();
    if wanted.is_empty() {
        return records;
    }
    records
        .into_iter()
        .filter(|r| r.test_version.trim() == wanted)
        .collect()
}

/// Parse a listing limit. Missing, non-numeric or non-positive values fall
/// back to `fallback`; fractional values are floored; the result is capped at
/// [`MAX_LIMIT`].
pub fn parse_limit(raw: Option<&str>, fallback: usize) -> usize {
    let parsed = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|n| n.is_finite() && *n > 0.0);

    match parsed {
        Some(n) => (n.floor() as usize).min(MAX_LIMIT),
        None => fallback,
    }
}

/// `pers_<unix millis>_<6 base-36 chars>`.
pub fn create_submission_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
        .collect();
    format!("pers_{}_{suffix}", Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::score_answers;
    use crate::validation::PROFILE_LABEL;

    fn sample_record(id: &str, test_version: &str) -> SubmissionRecord {
        let answers: AnswerSet = (1..=52).map(|id| (id, 4)).collect();
        let known = KnownAssessments::default();
        let profile = score_answers(&answers, 15.0, 8.0, &known);
        let submission = Submission {
            candidate_name: "Grace Hopper".to_string(),
            candidate_email: "grace@example.com".to_string(),
            submitted_at: "2026-01-05T09:00:00.000Z".to_string(),
            duration_minutes: 15.0,
            auto_submitted: false,
            test_version: test_version.to_string(),
            answers,
            known_assessments: known,
            role_label: PROFILE_LABEL.to_string(),
        };
        SubmissionRecord::new(
            id.to_string(),
            "2026-01-05T09:00:01.000Z".to_string(),
            submission,
            profile,
        )
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlSubmissionStore::new(dir.path().join("none.ndjson"));
        assert!(store.recent(50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_creates_parent_dirs_and_reads_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlSubmissionStore::new(dir.path().join("nested/data/subs.ndjson"));

        for id in ["a", "b", "c"] {
            store.append(&sample_record(id, "v1")).await.unwrap();
        }

        let ids: Vec<_> = store
            .recent(2)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.submission_id)
            .collect();
        assert_eq!(ids, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn unparseable_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subs.ndjson");
        let store = JsonlSubmissionStore::new(&path);
        store.append(&sample_record("first", "v1")).await.unwrap();

        let mut raw = tokio::fs::read_to_string(&path).await.unwrap();
        raw.push_str("{not json\n\n");
        tokio::fs::write(&path, raw).await.unwrap();
        store.append(&sample_record("second", "v1")).await.unwrap();

        let records = store.recent(10).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].submission_id, "second");
    }

    #[tokio::test]
    async fn record_round_trips_through_the_log() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlSubmissionStore::new(dir.path().join("subs.ndjson"));
        let record = sample_record("pers_1_abcdef", "v1");
        store.append(&record).await.unwrap();
        let read = store.recent(1).await.unwrap();
        pretty_assertions::assert_eq!(read, vec![record]);
    }

    #[tokio::test]
    async fn concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(JsonlSubmissionStore::new(dir.path().join("subs.ndjson")));

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .append(&sample_record(&format!("id-{i}"), "v1"))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.recent(MAX_LIMIT).await.unwrap().len(), 16);
    }

    #[test]
    fn filter_applies_exact_match() {
        let records = vec![sample_record("a", "v1"), sample_record("b", "v2")];
        let filtered = filter_by_test_version(records.clone(), " v2 ");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].submission_id, "b");
        assert_eq!(filter_by_test_version(records, "").len(), 2);
    }

    #[test]
    fn limit_parsing() {
        assert_eq!(parse_limit(None, 50), 50);
        assert_eq!(parse_limit(Some("abc"), 50), 50);
        assert_eq!(parse_limit(Some("0"), 50), 50);
        assert_eq!(parse_limit(Some("-3"), 50), 50);
        assert_eq!(parse_limit(Some("12.9"), 50), 12);
        assert_eq!(parse_limit(Some("999999"), 50), MAX_LIMIT);
    }

    #[test]
    fn submission_id_shape() {
        let id = create_submission_id();
        let parts: Vec<_> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "pers");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), ID_SUFFIX_LEN);
        assert!(parts[2].chars().all(|c| c.is_ascii_alphanumeric() && !c.is_ascii_uppercase()));
    }
}
