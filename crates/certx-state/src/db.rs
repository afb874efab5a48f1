use certx_core::anchor::{CertificateAnchor, MintLease};
use certx_core::certificate::Certificate;
use certx_core::constants::STATE_SCHEMA_VERSION;
use certx_core::error::CertxError;
use certx_core::types::{CertificateId, CourseId, Timestamp, UserId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Transactional;
use std::path::Path;
use tracing::{debug, warn};

const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Result of a create-only write.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome<T> {
    /// The row did not exist and was written.
    Inserted,
    /// A row already existed; it is returned untouched.
    Existing(T),
}

/// Persistent state database backed by sled (pure-Rust, no C dependencies).
///
/// Named trees (analogous to column families):
///   certificates          — CertificateId bytes          → bincode(Certificate)
///   certificate_subjects  — bincode((user_id, course_id)) → CertificateId bytes
///   anchors               — CertificateId bytes          → bincode(CertificateAnchor)
///   mint_leases           — CertificateId bytes          → bincode(MintLease)
///   meta                  — utf8 key bytes               → raw bytes
///
/// `certificate_subjects` is the uniqueness index for (user, course). It is
/// only ever written in the same transaction as the certificate row.
pub struct StateDb {
    _db: sled::Db,
    certificates: sled::Tree,
    subjects: sled::Tree,
    anchors: sled::Tree,
    mint_leases: sled::Tree,
    meta: sled::Tree,
}

impl StateDb {
    /// Open or create the state database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CertxError> {
        let db = sled::open(path).map_err(storage)?;
        Self::from_db(db)
    }

    /// Open a throwaway database that is deleted when dropped.
    pub fn temporary() -> Result<Self, CertxError> {
        let db = sled::Config::new().temporary(true).open().map_err(storage)?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, CertxError> {
        let certificates = db.open_tree("certificates").map_err(storage)?;
        let subjects     = db.open_tree("certificate_subjects").map_err(storage)?;
        let anchors      = db.open_tree("anchors").map_err(storage)?;
        let mint_leases  = db.open_tree("mint_leases").map_err(storage)?;
        let meta         = db.open_tree("meta").map_err(storage)?;
        let state = Self { _db: db, certificates, subjects, anchors, mint_leases, meta };
        state.check_schema()?;
        Ok(state)
    }

    fn check_schema(&self) -> Result<(), CertxError> {
        match self.get_meta(SCHEMA_VERSION_KEY)? {
            None => self.put_meta(SCHEMA_VERSION_KEY, &STATE_SCHEMA_VERSION.to_le_bytes()),
            Some(raw) => {
                let found = <[u8; 4]>::try_from(raw.as_slice())
                    .map(u32::from_le_bytes)
                    .map_err(|_| CertxError::Storage("corrupt schema version".into()))?;
                if found != STATE_SCHEMA_VERSION {
                    return Err(CertxError::Storage(format!(
                        "unsupported schema version {found}, expected {STATE_SCHEMA_VERSION}"
                    )));
                }
                Ok(())
            }
        }
    }

    // ── Certificates ──────────────────────────────────────────────────────────

    pub fn get_certificate(&self, id: &CertificateId) -> Result<Option<Certificate>, CertxError> {
        match self.certificates.get(id.as_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Write `cert` unless a certificate already exists for its (user, course).
    ///
    /// The index lookup and both writes run in one serializable transaction,
    /// so concurrent callers for the same subject converge on a single row.
    pub fn insert_certificate_if_absent(
        &self,
        cert: &Certificate,
    ) -> Result<InsertOutcome<Certificate>, CertxError> {
        let key = subject_key(&cert.user_id, &cert.course_id)?;
        let row = encode(cert)?;
        let id = *cert.certificate_id.as_bytes();

        let outcome = (&self.certificates, &self.subjects)
            .transaction(|(certs, subjects)| {
                if let Some(existing_id) = subjects.get(&key)? {
                    let existing = certs.get(&existing_id)?.ok_or_else(|| {
                        ConflictableTransactionError::Abort(CertxError::Storage(
                            "subject index points at a missing certificate".into(),
                        ))
                    })?;
                    let cert: Certificate = decode(&existing).map_err(ConflictableTransactionError::Abort)?;
                    return Ok(InsertOutcome::Existing(cert));
                }
                subjects.insert(key.as_slice(), &id[..])?;
                certs.insert(&id[..], row.as_slice())?;
                Ok(InsertOutcome::Inserted)
            })
            .map_err(tx_error)?;

        if let InsertOutcome::Existing(ref existing) = outcome {
            debug!(
                certificate_id = %existing.certificate_id,
                user_id = %cert.user_id,
                course_id = %cert.course_id,
                "certificate already present for subject"
            );
        }
        Ok(outcome)
    }

    /// Read-modify-write a certificate in one transaction. `apply` may reject
    /// the change; nothing is written in that case.
    pub fn update_certificate<F>(&self, id: &CertificateId, apply: F) -> Result<Certificate, CertxError>
    where
        F: Fn(&mut Certificate) -> Result<(), CertxError>,
    {
        let key = *id.as_bytes();
        self.certificates
            .transaction(|certs| {
                let bytes = certs.get(&key[..])?.ok_or_else(|| {
                    ConflictableTransactionError::Abort(CertxError::NotFound(format!("certificate {id}")))
                })?;
                let mut cert: Certificate =
                    decode(&bytes).map_err(ConflictableTransactionError::Abort)?;
                apply(&mut cert).map_err(ConflictableTransactionError::Abort)?;
                let row = encode(&cert).map_err(ConflictableTransactionError::Abort)?;
                certs.insert(&key[..], row)?;
                Ok(cert)
            })
            .map_err(tx_error)
    }

    /// All certificates held by `user_id`, newest first.
    pub fn list_certificates_for_user(&self, user_id: &UserId) -> Result<Vec<Certificate>, CertxError> {
        let prefix = bincode::serialize(user_id.as_str())
            .map_err(|e| CertxError::Serialization(e.to_string()))?;
        let mut out = Vec::new();
        for item in self.subjects.scan_prefix(prefix) {
            let (_, id_bytes) = item.map_err(storage)?;
            let id = CertificateId::from_key(&id_bytes)?;
            match self.get_certificate(&id)? {
                Some(cert) if cert.user_id == *user_id => out.push(cert),
                Some(_) => {}
                None => warn!(certificate_id = %id, "subject index points at a missing certificate"),
            }
        }
        out.sort_by(|a, b| b.issue_date.cmp(&a.issue_date));
        Ok(out)
    }

    pub fn certificate_count(&self) -> usize {
        self.certificates.len()
    }

    // ── Anchors ───────────────────────────────────────────────────────────────

    pub fn get_anchor(&self, id: &CertificateId) -> Result<Option<CertificateAnchor>, CertxError> {
        match self.anchors.get(id.as_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Create-only write: an anchor is never replaced once stored.
    pub fn insert_anchor_if_absent(
        &self,
        anchor: &CertificateAnchor,
    ) -> Result<InsertOutcome<CertificateAnchor>, CertxError> {
        let row = encode(anchor)?;
        let swapped = self
            .anchors
            .compare_and_swap(anchor.certificate_id.as_bytes(), None as Option<&[u8]>, Some(row))
            .map_err(storage)?;
        match swapped {
            Ok(()) => Ok(InsertOutcome::Inserted),
            Err(conflict) => {
                let current = conflict.current.ok_or_else(|| {
                    CertxError::Storage("anchor compare-and-swap conflict without a value".into())
                })?;
                Ok(InsertOutcome::Existing(decode(&current)?))
            }
        }
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    // ── Mint leases ───────────────────────────────────────────────────────────

    /// Take the mint lease for `id`. Returns `false` while another live lease
    /// is held; a stale lease is replaced.
    pub fn try_acquire_mint_lease(&self, id: &CertificateId, now: Timestamp) -> Result<bool, CertxError> {
        let key = *id.as_bytes();
        let lease = encode(&MintLease::new(*id, now))?;
        self.mint_leases
            .transaction(|leases| {
                if let Some(bytes) = leases.get(&key[..])? {
                    let held: MintLease = decode(&bytes).map_err(ConflictableTransactionError::Abort)?;
                    if !held.is_stale(now) {
                        return Ok(false);
                    }
                    warn!(certificate_id = %id, acquired_at = held.acquired_at, "replacing stale mint lease");
                }
                leases.insert(&key[..], lease.as_slice())?;
                Ok(true)
            })
            .map_err(tx_error)
    }

    pub fn release_mint_lease(&self, id: &CertificateId) -> Result<(), CertxError> {
        self.mint_leases.remove(id.as_bytes()).map_err(storage)?;
        Ok(())
    }

    // ── Meta ──────────────────────────────────────────────────────────────────

    pub fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), CertxError> {
        self.meta
            .insert(key.as_bytes(), value)
            .map_err(storage)?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, CertxError> {
        self.meta
            .get(key.as_bytes())
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(storage)
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), CertxError> {
        self._db.flush().map_err(storage)?;
        Ok(())
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn storage(e: sled::Error) -> CertxError {
    CertxError::Storage(e.to_string())
}

fn tx_error(e: TransactionError<CertxError>) -> CertxError {
    match e {
        TransactionError::Abort(inner) => inner,
        TransactionError::Storage(e) => storage(e),
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CertxError> {
    bincode::serialize(value).map_err(|e| CertxError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CertxError> {
    bincode::deserialize(bytes).map_err(|e| CertxError::Serialization(e.to_string()))
}

/// `bincode((user, course))`. bincode writes a length prefix per string, so the
/// encoding of `user` alone is a prefix of every key for that user.
fn subject_key(user_id: &UserId, course_id: &CourseId) -> Result<Vec<u8>, CertxError> {
    encode(&(user_id.as_str(), course_id.as_str()))
}
