use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use certx_core::records::{CompletionRecord, CourseSummary, Quiz, QuizAttemptOutcome, StudentProfile};
use certx_core::types::{CourseId, LessonUnitId, QuizId, Timestamp, UserId};

use crate::error::LedgerError;
use crate::fixtures::LedgerFixtures;
use crate::traits::{CompletionLedger, Directory, QuizResultLedger};

#[derive(Default)]
struct Inner {
    students: HashMap<UserId, StudentProfile>,
    courses: HashMap<CourseId, CourseSummary>,
    lessons: HashMap<CourseId, Vec<LessonUnitId>>,
    quizzes: HashMap<CourseId, Vec<Quiz>>,
    /// (user, course) → lesson → record. Keyed by lesson so a repeated
    /// completion never produces a duplicate.
    completions: HashMap<(UserId, CourseId), BTreeMap<LessonUnitId, CompletionRecord>>,
    attempts: HashMap<(UserId, QuizId), Vec<QuizAttemptOutcome>>,
}

/// In-process implementation of every upstream ledger.
///
/// Availability can be switched off to exercise the outage paths of the
/// services built on top.
#[derive(Default)]
pub struct MemoryLedger {
    inner: RwLock<Inner>,
    unavailable: AtomicBool,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixtures(fixtures: &LedgerFixtures) -> Self {
        let ledger = Self::new();
        for s in &fixtures.students {
            ledger.add_student(s.user_id.clone(), &s.display_name);
        }
        for c in &fixtures.courses {
            ledger.add_course(CourseSummary {
                course_id: c.course_id.clone(),
                title: c.title.clone(),
                description: c.description.clone(),
                level: c.level.clone(),
            });
            for lesson in &c.lessons {
                ledger.add_lesson(&c.course_id, lesson);
            }
            for q in &c.quizzes {
                ledger.add_quiz(Quiz {
                    quiz_id: q.quiz_id.clone(),
                    course_id: c.course_id.clone(),
                    title: q.title.clone(),
                    min_pass_points: q.min_pass_points,
                });
            }
        }
        for r in &fixtures.completions {
            ledger.record_completion(&r.user_id, &r.course_id, &r.lesson_unit_id, r.completed_at);
        }
        for a in &fixtures.attempts {
            ledger.record_attempt(a.clone());
        }
        ledger
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_available(&self, ledger: &'static str) -> Result<(), LedgerError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LedgerError::unavailable(ledger, "in-memory ledger switched off"));
        }
        Ok(())
    }

    /// Simulate an upstream outage (`false`) or recovery (`true`).
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    // ── Mutators (upstream systems own these in production) ──────────────────

    pub fn add_student(&self, user_id: UserId, display_name: &str) {
        self.write().students.insert(
            user_id.clone(),
            StudentProfile { user_id, display_name: display_name.to_string() },
        );
    }

    pub fn add_course(&self, summary: CourseSummary) {
        self.write().courses.insert(summary.course_id.clone(), summary);
    }

    /// Change a course title, as an instructor editing the catalog would.
    pub fn rename_course(&self, course_id: &CourseId, title: &str) {
        if let Some(c) = self.write().courses.get_mut(course_id) {
            c.title = title.to_string();
        }
    }

    pub fn rename_student(&self, user_id: &UserId, display_name: &str) {
        if let Some(s) = self.write().students.get_mut(user_id) {
            s.display_name = display_name.to_string();
        }
    }

    pub fn add_lesson(&self, course_id: &CourseId, lesson: &str) {
        let mut inner = self.write();
        let lessons = inner.lessons.entry(course_id.clone()).or_default();
        if !lessons.iter().any(|l| l == lesson) {
            lessons.push(lesson.to_string());
        }
    }

    pub fn add_quiz(&self, quiz: Quiz) {
        self.write().quizzes.entry(quiz.course_id.clone()).or_default().push(quiz);
    }

    pub fn record_completion(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        lesson: &str,
        completed_at: Option<Timestamp>,
    ) {
        let record = CompletionRecord {
            user_id: user_id.clone(),
            course_id: course_id.clone(),
            lesson_unit_id: lesson.to_string(),
            completed_at,
        };
        self.write()
            .completions
            .entry((user_id.clone(), course_id.clone()))
            .or_default()
            .entry(lesson.to_string())
            .or_insert(record);
    }

    pub fn record_attempt(&self, attempt: QuizAttemptOutcome) {
        self.write()
            .attempts
            .entry((attempt.user_id.clone(), attempt.quiz_id.clone()))
            .or_default()
            .push(attempt);
    }
}

#[async_trait]
impl CompletionLedger for MemoryLedger {
    async fn list_lesson_units(&self, course_id: &CourseId) -> Result<Vec<LessonUnitId>, LedgerError> {
        self.check_available("completion ledger")?;
        Ok(self.read().lessons.get(course_id).cloned().unwrap_or_default())
    }

    async fn list_completed(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Vec<CompletionRecord>, LedgerError> {
        self.check_available("completion ledger")?;
        Ok(self
            .read()
            .completions
            .get(&(user_id.clone(), course_id.clone()))
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl QuizResultLedger for MemoryLedger {
    async fn list_quizzes(&self, course_id: &CourseId) -> Result<Vec<Quiz>, LedgerError> {
        self.check_available("quiz ledger")?;
        Ok(self.read().quizzes.get(course_id).cloned().unwrap_or_default())
    }

    async fn list_attempts(
        &self,
        user_id: &UserId,
        quiz_id: &QuizId,
    ) -> Result<Vec<QuizAttemptOutcome>, LedgerError> {
        self.check_available("quiz ledger")?;
        Ok(self
            .read()
            .attempts
            .get(&(user_id.clone(), quiz_id.clone()))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl Directory for MemoryLedger {
    async fn student(&self, user_id: &UserId) -> Result<Option<StudentProfile>, LedgerError> {
        self.check_available("directory")?;
        Ok(self.read().students.get(user_id).cloned())
    }

    async fn course(&self, course_id: &CourseId) -> Result<Option<CourseSummary>, LedgerError> {
        self.check_available("directory")?;
        Ok(self.read().courses.get(course_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_completion_is_recorded_once() {
        let ledger = MemoryLedger::new();
        let (u, c) = (UserId::new("u"), CourseId::new("c"));
        ledger.record_completion(&u, &c, "l1", Some(1));
        ledger.record_completion(&u, &c, "l1", Some(2));
        let done = ledger.list_completed(&u, &c).await.unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].completed_at, Some(1));
    }

    #[tokio::test]
    async fn outage_is_reported_not_hidden() {
        let ledger = MemoryLedger::new();
        ledger.set_available(false);
        let err = ledger.list_quizzes(&CourseId::new("c")).await.unwrap_err();
        assert!(matches!(err, LedgerError::Unavailable { .. }));
        ledger.set_available(true);
        assert!(ledger.list_quizzes(&CourseId::new("c")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rename_changes_live_directory_view() {
        let ledger = MemoryLedger::new();
        let c = CourseId::new("c");
        ledger.add_course(CourseSummary { course_id: c.clone(), title: "Old".into(), description: None, level: None });
        ledger.rename_course(&c, "New");
        assert_eq!(ledger.course(&c).await.unwrap().unwrap().title, "New");
    }
}
