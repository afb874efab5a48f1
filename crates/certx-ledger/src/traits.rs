use async_trait::async_trait;

use certx_core::records::{CompletionRecord, CourseSummary, Quiz, QuizAttemptOutcome, StudentProfile};
use certx_core::types::{CourseId, LessonUnitId, QuizId, UserId};

use crate::error::LedgerError;

/// Which lesson units exist, and which of them a learner has finished.
#[async_trait]
pub trait CompletionLedger: Send + Sync {
    /// Every lesson unit currently belonging to `course_id`.
    async fn list_lesson_units(&self, course_id: &CourseId) -> Result<Vec<LessonUnitId>, LedgerError>;

    /// Completion records of `user_id` in `course_id`.
    async fn list_completed(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Vec<CompletionRecord>, LedgerError>;
}

/// Quizzes and scored attempts.
#[async_trait]
pub trait QuizResultLedger: Send + Sync {
    async fn list_quizzes(&self, course_id: &CourseId) -> Result<Vec<Quiz>, LedgerError>;

    async fn list_attempts(
        &self,
        user_id: &UserId,
        quiz_id: &QuizId,
    ) -> Result<Vec<QuizAttemptOutcome>, LedgerError>;
}

/// Display data copied onto certificates at issuance.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn student(&self, user_id: &UserId) -> Result<Option<StudentProfile>, LedgerError>;

    async fn course(&self, course_id: &CourseId) -> Result<Option<CourseSummary>, LedgerError>;
}
