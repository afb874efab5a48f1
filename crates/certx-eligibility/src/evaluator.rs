use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use certx_core::constants::DEFAULT_LEDGER_TIMEOUT_MS;
use certx_core::error::CertxError;
use certx_core::records::QuizAttemptOutcome;
use certx_core::types::{CourseId, Timestamp, UserId};
use certx_ledger::{bounded, CompletionLedger, LedgerError, QuizResultLedger};

const COMPLETION_LEDGER: &str = "completion ledger";
const QUIZ_LEDGER: &str = "quiz ledger";

/// Verdict of the certificate gate for one (user, course).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligibility {
    pub eligible: bool,
    /// 0..=100. Never 100 while a lesson is still missing.
    pub completion_percentage: u8,
    pub has_passed_any_quiz: bool,
    pub completed_lessons: u32,
    pub total_lessons: u32,
    /// When both gates became satisfied, if the ledgers carry timestamps.
    pub eligible_since: Option<Timestamp>,
}

impl Eligibility {
    /// The caller-facing rejection for an ineligible verdict.
    pub fn to_error(&self) -> CertxError {
        CertxError::NotEligible {
            completion_percentage: self.completion_percentage,
            has_passed_any_quiz: self.has_passed_any_quiz,
            completed_lessons: self.completed_lessons,
            total_lessons: self.total_lessons,
        }
    }
}

/// Share of lessons completed, rounded half up.
///
/// Zero lessons is 0%. A partially completed course is capped at 99% so that
/// rounding can never satisfy the 100% gate.
pub fn completion_percentage(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total) as u64;
    let total = total as u64;
    let rounded = (200 * completed + total) / (2 * total);
    if completed < total {
        rounded.min(99) as u8
    } else {
        100
    }
}

/// Stateless evaluator over the completion and quiz ledgers.
///
/// Every evaluation reads fresh data; nothing is cached.
pub struct EligibilityEvaluator {
    completions: Arc<dyn CompletionLedger>,
    quizzes: Arc<dyn QuizResultLedger>,
    ledger_timeout: Duration,
}

impl EligibilityEvaluator {
    pub fn new(completions: Arc<dyn CompletionLedger>, quizzes: Arc<dyn QuizResultLedger>) -> Self {
        Self {
            completions,
            quizzes,
            ledger_timeout: Duration::from_millis(DEFAULT_LEDGER_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, ledger_timeout: Duration) -> Self {
        self.ledger_timeout = ledger_timeout;
        self
    }

    pub async fn evaluate(&self, user_id: &UserId, course_id: &CourseId) -> Result<Eligibility, CertxError> {
        let t = self.ledger_timeout;
        let (lessons, completed, quizzes) = tokio::try_join!(
            bounded(COMPLETION_LEDGER, t, self.completions.list_lesson_units(course_id)),
            bounded(COMPLETION_LEDGER, t, self.completions.list_completed(user_id, course_id)),
            bounded(QUIZ_LEDGER, t, self.quizzes.list_quizzes(course_id)),
        )
        .map_err(|e| self.unavailable(user_id, course_id, e))?;

        let attempts: Vec<QuizAttemptOutcome> = try_join_all(
            quizzes
                .iter()
                .map(|q| bounded(QUIZ_LEDGER, t, self.quizzes.list_attempts(user_id, &q.quiz_id))),
        )
        .await
        .map_err(|e| self.unavailable(user_id, course_id, e))?
        .into_iter()
        .flatten()
        .collect();

        // Only lessons still listed for the course count; a completion of a
        // removed lesson is ignored.
        let current: HashSet<&str> = lessons.iter().map(String::as_str).collect();
        let mut seen = HashSet::new();
        let relevant: Vec<_> = completed
            .iter()
            .filter(|r| current.contains(r.lesson_unit_id.as_str()))
            .filter(|r| seen.insert(r.lesson_unit_id.as_str()))
            .collect();

        let total_lessons = current.len() as u32;
        let completed_lessons = relevant.len() as u32;
        let pct = completion_percentage(completed_lessons, total_lessons);
        let first_pass = attempts.iter().filter(|a| a.passed).map(|a| a.completed_at).min();
        let has_passed_any_quiz = first_pass.is_some();
        let eligible = pct == 100 && has_passed_any_quiz;

        // Unknown if any relevant completion lacks a timestamp.
        let eligible_since = if eligible {
            let stamps: Option<Vec<Timestamp>> = relevant.iter().map(|r| r.completed_at).collect();
            let last_lesson = stamps.and_then(|v| v.into_iter().max());
            match (last_lesson, first_pass) {
                (Some(lesson), Some(pass)) => Some(lesson.max(pass)),
                _ => None,
            }
        } else {
            None
        };

        let verdict = Eligibility {
            eligible,
            completion_percentage: pct,
            has_passed_any_quiz,
            completed_lessons,
            total_lessons,
            eligible_since,
        };
        debug!(
            user_id = %user_id,
            course_id = %course_id,
            eligible,
            completion_percentage = pct,
            has_passed_any_quiz,
            "eligibility evaluated"
        );
        Ok(verdict)
    }

    fn unavailable(&self, user_id: &UserId, course_id: &CourseId, e: LedgerError) -> CertxError {
        warn!(user_id = %user_id, course_id = %course_id, error = %e, "eligibility ledger unavailable");
        e.into()
    }
}
