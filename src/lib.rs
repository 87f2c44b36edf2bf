//! Leadership personality assessment service.
//!
//! Scores 52-question Likert submissions into a multi-framework profile
//! (MBTI-, DISC-, Strengths- and Working-Genius-inspired), interprets and
//! calibrates it, stores the result and notifies reviewers by email.

pub mod config;
pub mod error;
pub mod export;
pub mod notify;
pub mod scoring;
pub mod store;
pub mod util;
pub mod validation;
pub mod web;

pub use config::Config;
pub use error::{Error, Result};
