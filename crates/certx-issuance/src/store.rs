use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use certx_core::certificate::{Certificate, CertificateStatus};
use certx_core::error::CertxError;
use certx_core::types::{CertificateId, CourseId, Timestamp, UserId};
use certx_eligibility::EligibilityEvaluator;
use certx_ledger::{bounded, Directory};
use certx_state::{InsertOutcome, StateDb};

use crate::config::IssuanceConfig;

const DIRECTORY: &str = "directory";

/// Result of an issuance request. Asking twice is not an error: the second
/// call reports the certificate the first one created.
#[derive(Clone, Debug, PartialEq)]
pub enum IssueOutcome {
    Created(Certificate),
    Existing(Certificate),
}

impl IssueOutcome {
    pub fn certificate(&self) -> &Certificate {
        match self {
            IssueOutcome::Created(c) | IssueOutcome::Existing(c) => c,
        }
    }

    pub fn into_certificate(self) -> Certificate {
        match self {
            IssueOutcome::Created(c) | IssueOutcome::Existing(c) => c,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, IssueOutcome::Created(_))
    }
}

/// Issues and administers certificates.
///
/// The only writer of certificate rows. At most one certificate exists per
/// (user, course); the state database enforces it transactionally.
pub struct CertificateStore {
    db: Arc<StateDb>,
    evaluator: EligibilityEvaluator,
    directory: Arc<dyn Directory>,
    config: IssuanceConfig,
}

impl CertificateStore {
    pub fn new(
        db: Arc<StateDb>,
        evaluator: EligibilityEvaluator,
        directory: Arc<dyn Directory>,
        config: IssuanceConfig,
    ) -> Self {
        let evaluator = evaluator.with_timeout(config.ledger_timeout);
        Self { db, evaluator, directory, config }
    }

    pub fn config(&self) -> &IssuanceConfig {
        &self.config
    }

    // ── Issuance ─────────────────────────────────────────────────────────────

    /// Issue the certificate for (user, course) if the learner is eligible,
    /// or return the one already issued.
    pub async fn issue(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        now: Timestamp,
    ) -> Result<IssueOutcome, CertxError> {
        if user_id.as_str().trim().is_empty() || course_id.as_str().trim().is_empty() {
            return Err(CertxError::InvalidInput("user_id and course_id are required".into()));
        }

        let t = self.config.ledger_timeout;
        let (eligibility, student, course) = tokio::try_join!(
            self.evaluator.evaluate(user_id, course_id),
            async { Ok::<_, CertxError>(bounded(DIRECTORY, t, self.directory.student(user_id)).await?) },
            async { Ok::<_, CertxError>(bounded(DIRECTORY, t, self.directory.course(course_id)).await?) },
        )?;

        let student = student.ok_or_else(|| CertxError::NotFound(format!("student {user_id}")))?;
        let course = course.ok_or_else(|| CertxError::NotFound(format!("course {course_id}")))?;

        if !eligibility.eligible {
            info!(
                user_id = %user_id,
                course_id = %course_id,
                completion_percentage = eligibility.completion_percentage,
                has_passed_any_quiz = eligibility.has_passed_any_quiz,
                "certificate refused: not eligible"
            );
            return Err(eligibility.to_error());
        }

        let cert = Certificate {
            certificate_id: CertificateId::generate(),
            user_id: user_id.clone(),
            course_id: course_id.clone(),
            student_name: student.display_name,
            course_name: course.title,
            course_description: course.description,
            course_level: course.level,
            completion_date: eligibility.eligible_since.map_or(now, |t| t.min(now)),
            issue_date: now,
            expires_at: self.config.validity_secs.map(|secs| now + secs),
            status: CertificateStatus::Active,
            metadata: BTreeMap::new(),
        };

        match self.db.insert_certificate_if_absent(&cert)? {
            InsertOutcome::Inserted => {
                info!(
                    certificate_id = %cert.certificate_id,
                    user_id = %user_id,
                    course_id = %course_id,
                    "certificate issued"
                );
                Ok(IssueOutcome::Created(cert))
            }
            InsertOutcome::Existing(existing) => Ok(IssueOutcome::Existing(with_effective_status(existing, now))),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    /// Look up a certificate by its public id. Malformed ids are reported as
    /// not found.
    pub fn get_by_id(&self, certificate_id: &str, now: Timestamp) -> Result<Certificate, CertxError> {
        let id = parse_id(certificate_id)?;
        self.db
            .get_certificate(&id)?
            .map(|c| with_effective_status(c, now))
            .ok_or_else(|| not_found(certificate_id))
    }

    /// Every certificate held by `user_id`, newest first.
    pub fn list_for_user(&self, user_id: &UserId, now: Timestamp) -> Result<Vec<Certificate>, CertxError> {
        Ok(self
            .db
            .list_certificates_for_user(user_id)?
            .into_iter()
            .map(|c| with_effective_status(c, now))
            .collect())
    }

    // ── Administration ───────────────────────────────────────────────────────

    /// Administrative status change: `active → revoked` or `active → expired`.
    /// Re-applying the current status is a no-op.
    pub fn set_status(
        &self,
        certificate_id: &str,
        status: CertificateStatus,
        now: Timestamp,
    ) -> Result<Certificate, CertxError> {
        let id = parse_id(certificate_id)?;
        let cert = self.db.update_certificate(&id, |cert| {
            cert.effective_status(now).check_transition(status)?;
            cert.status = status;
            Ok(())
        })?;
        info!(certificate_id = %id, status = %status, "certificate status set");
        Ok(cert)
    }

    /// Attach a metadata entry. Existing keys are never overwritten.
    pub fn annotate(
        &self,
        certificate_id: &str,
        key: &str,
        value: &str,
        now: Timestamp,
    ) -> Result<Certificate, CertxError> {
        let id = parse_id(certificate_id)?;
        let cert = self.db.update_certificate(&id, |cert| cert.add_metadata(key, value))?;
        debug!(certificate_id = %id, key, "certificate annotated");
        Ok(with_effective_status(cert, now))
    }
}

fn parse_id(certificate_id: &str) -> Result<CertificateId, CertxError> {
    CertificateId::from_b58(certificate_id).map_err(|_| not_found(certificate_id))
}

fn not_found(certificate_id: &str) -> CertxError {
    CertxError::NotFound(format!("certificate {}", certificate_id.trim()))
}

fn with_effective_status(mut cert: Certificate, now: Timestamp) -> Certificate {
    cert.status = cert.effective_status(now);
    cert
}
