use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use certx_core::records::{CompletionRecord, CourseSummary, Quiz, QuizAttemptOutcome, StudentProfile};
use certx_core::types::{CourseId, LessonUnitId, QuizId, UserId};

use crate::error::LedgerError;
use crate::traits::{CompletionLedger, Directory, QuizResultLedger};

/// Upstream ledgers reached over the course platform's JSON API.
///
/// Routes (all `GET`, relative to `base_url`):
///   courses/{course}/lessons                    → [lesson_unit_id]
///   users/{user}/courses/{course}/completions   → [CompletionRecord]
///   courses/{course}/quizzes                    → [Quiz]
///   users/{user}/quizzes/{quiz}/attempts        → [QuizAttemptOutcome]
///   users/{user}                                → StudentProfile (404 = unknown)
///   courses/{course}                            → CourseSummary (404 = unknown)
pub struct HttpLedger {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpLedger {
    /// `timeout` bounds every request end to end.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LedgerError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| LedgerError::malformed("ledger api", format!("bad base url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(LedgerError::malformed("ledger api", "base url cannot carry a path"));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::unavailable("ledger api", e.to_string()))?;
        Ok(Self { base_url, client })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// GET and decode; `Ok(None)` on 404.
    async fn get_json<T: DeserializeOwned>(
        &self,
        ledger: &'static str,
        segments: &[&str],
    ) -> Result<Option<T>, LedgerError> {
        let url = self.url(segments);
        debug!(%url, ledger, "ledger request");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LedgerError::unavailable(ledger, e.to_string()))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => resp
                .json::<T>()
                .await
                .map(Some)
                .map_err(|e| LedgerError::malformed(ledger, e.to_string())),
            s => Err(LedgerError::unavailable(ledger, format!("HTTP {s}"))),
        }
    }
}

#[async_trait]
impl CompletionLedger for HttpLedger {
    async fn list_lesson_units(&self, course_id: &CourseId) -> Result<Vec<LessonUnitId>, LedgerError> {
        Ok(self
            .get_json("completion ledger", &["courses", course_id.as_str(), "lessons"])
            .await?
            .unwrap_or_default())
    }

    async fn list_completed(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Vec<CompletionRecord>, LedgerError> {
        Ok(self
            .get_json(
                "completion ledger",
                &["users", user_id.as_str(), "courses", course_id.as_str(), "completions"],
            )
            .await?
            .unwrap_or_default())
    }
}

#[async_trait]
impl QuizResultLedger for HttpLedger {
    async fn list_quizzes(&self, course_id: &CourseId) -> Result<Vec<Quiz>, LedgerError> {
        Ok(self
            .get_json("quiz ledger", &["courses", course_id.as_str(), "quizzes"])
            .await?
            .unwrap_or_default())
    }

    async fn list_attempts(
        &self,
        user_id: &UserId,
        quiz_id: &QuizId,
    ) -> Result<Vec<QuizAttemptOutcome>, LedgerError> {
        Ok(self
            .get_json("quiz ledger", &["users", user_id.as_str(), "quizzes", quiz_id, "attempts"])
            .await?
            .unwrap_or_default())
    }
}

#[async_trait]
impl Directory for HttpLedger {
    async fn student(&self, user_id: &UserId) -> Result<Option<StudentProfile>, LedgerError> {
        self.get_json("directory", &["users", user_id.as_str()]).await
    }

    async fn course(&self, course_id: &CourseId) -> Result<Option<CourseSummary>, LedgerError> {
        self.get_json("directory", &["courses", course_id.as_str()]).await
    }
}
