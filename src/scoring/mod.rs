//! Scoring and interpretation engine.
//!
//! Pure, synchronous and side-effect free: raw answers are aggregated into
//! trait percentages, classified under each framework, interpreted into
//! labels and flags, and optionally calibrated against self-reported results.

pub mod calibration;
pub mod frameworks;
pub mod interpretation;
pub mod profile;
pub mod questions;

pub use calibration::{Calibration, CalibrationMeasure, KnownAssessments, derive_calibration};
pub use interpretation::Interpretation;
pub use profile::{Profile, build_profile, score_answers};
pub use questions::{AnswerSet, QUESTION_KEY, TOTAL_QUESTIONS, TraitCode, aggregate_traits};
