//! Records owned by upstream systems. Certx only ever reads these.

use serde::{Deserialize, Serialize};

use crate::types::{AttemptId, CourseId, LessonUnitId, QuizId, Timestamp, UserId};

/// One finished lesson unit. Existence of the record means "completed".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub lesson_unit_id: LessonUnitId,
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
}

/// A quiz belonging to a course.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub quiz_id: QuizId,
    pub course_id: CourseId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub min_pass_points: u32,
}

/// A scored quiz attempt. `passed` is fixed when the attempt is scored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAttemptOutcome {
    pub user_id: UserId,
    pub quiz_id: QuizId,
    pub attempt_id: AttemptId,
    pub score: u32,
    pub min_pass_points: u32,
    pub passed: bool,
    pub completed_at: Timestamp,
}

/// Display information about a learner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub user_id: UserId,
    pub display_name: String,
}

/// Display information about a course.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSummary {
    pub course_id: CourseId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
}
