use serde::{Deserialize, Serialize};
use std::path::Path;

use certx_core::records::{CompletionRecord, QuizAttemptOutcome, StudentProfile};
use certx_core::types::{CourseId, LessonUnitId, QuizId};

/// Seed data for a [`crate::MemoryLedger`], usually loaded from a JSON file
/// passed to a development node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerFixtures {
    #[serde(default)]
    pub students: Vec<StudentProfile>,
    #[serde(default)]
    pub courses: Vec<CourseFixture>,
    #[serde(default)]
    pub completions: Vec<CompletionRecord>,
    #[serde(default)]
    pub attempts: Vec<QuizAttemptOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseFixture {
    pub course_id: CourseId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub lessons: Vec<LessonUnitId>,
    #[serde(default)]
    pub quizzes: Vec<QuizFixture>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizFixture {
    pub quiz_id: QuizId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub min_pass_points: u32,
}

impl LedgerFixtures {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_fixture_file() {
        let json = r#"{
            "students": [{"user_id": "u1", "display_name": "Ada"}],
            "courses": [{
                "course_id": "rust-101",
                "title": "Rust 101",
                "lessons": ["l1", "l2"],
                "quizzes": [{"quiz_id": "q1", "min_pass_points": 7}]
            }],
            "completions": [
                {"user_id": "u1", "course_id": "rust-101", "lesson_unit_id": "l1"}
            ]
        }"#;
        let f = LedgerFixtures::from_json(json).unwrap();
        assert_eq!(f.students[0].display_name, "Ada");
        assert_eq!(f.courses[0].lessons.len(), 2);
        assert_eq!(f.courses[0].quizzes[0].min_pass_points, 7);
        assert_eq!(f.completions[0].completed_at, None);
        assert!(f.attempts.is_empty());
    }
}
