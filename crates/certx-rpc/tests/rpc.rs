use std::sync::Arc;

use jsonrpsee::rpc_params;
use jsonrpsee::server::MethodsError;
use jsonrpsee::server::RpcModule;

use certx_anchor::{AnchorConfig, LedgerAnchorService, SimulatedMintingNetwork};
use certx_core::records::{CourseSummary, Quiz, QuizAttemptOutcome};
use certx_core::types::{CourseId, UserId};
use certx_core::verification::VerificationResult;
use certx_eligibility::EligibilityEvaluator;
use certx_issuance::{CertificateStore, IssuanceConfig};
use certx_ledger::MemoryLedger;
use certx_rpc::api::CertxApiServer;
use certx_rpc::server::{INVALID_PARAMS, INVALID_TRANSITION, MINT_FAILED, NOT_ELIGIBLE};
use certx_rpc::{RpcCertificate, RpcIssueResult, RpcMintResult, RpcServer, RpcServerState, RpcServiceInfo};
use certx_state::StateDb;
use certx_verify::VerificationService;

const ADDR: &str = "addr_test1qpz4k8xv0u2";

struct Node {
    ledger: Arc<MemoryLedger>,
    network: Arc<SimulatedMintingNetwork>,
    module: RpcModule<RpcServer>,
}

fn node() -> Node {
    let ledger = Arc::new(MemoryLedger::new());
    let course = CourseId::new("rust-101");
    ledger.add_student(UserId::new("ada"), "Ada Lovelace");
    ledger.add_course(CourseSummary { course_id: course.clone(), title: "Rust 101".into(), description: None, level: None });
    ledger.add_lesson(&course, "l1");
    ledger.add_lesson(&course, "l2");
    ledger.add_quiz(Quiz { quiz_id: "q1".into(), course_id: course, title: "Final".into(), min_pass_points: 5 });

    let db = Arc::new(StateDb::temporary().unwrap());
    let network = Arc::new(SimulatedMintingNetwork::new());
    let evaluator = EligibilityEvaluator::new(ledger.clone(), ledger.clone());
    let state = Arc::new(RpcServerState {
        db: db.clone(),
        store: Arc::new(CertificateStore::new(db.clone(), evaluator, ledger.clone(), IssuanceConfig::default())),
        verifier: Arc::new(VerificationService::new(db.clone()).with_explorer(network.clone(), std::time::Duration::from_secs(1))),
        anchors: Arc::new(LedgerAnchorService::new(db, network.clone(), AnchorConfig::default()).unwrap()),
    });
    Node { ledger, network, module: RpcServer::new(state).into_rpc() }
}

impl Node {
    fn make_eligible(&self) {
        let (u, c) = (UserId::new("ada"), CourseId::new("rust-101"));
        self.ledger.record_completion(&u, &c, "l1", Some(10));
        self.ledger.record_completion(&u, &c, "l2", Some(20));
        self.ledger.record_attempt(QuizAttemptOutcome {
            user_id: u,
            quiz_id: "q1".into(),
            attempt_id: "a1".into(),
            score: 8,
            min_pass_points: 5,
            passed: true,
            completed_at: 30,
        });
    }

    async fn issue(&self) -> RpcIssueResult {
        self.module
            .call("certx_issueCertificate", rpc_params!["ada", "rust-101"])
            .await
            .unwrap()
    }
}

fn error_code(err: MethodsError) -> i32 {
    match err {
        MethodsError::JsonRpc(obj) => obj.code(),
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn ineligible_issue_reports_progress() {
    let node = node();
    node.ledger.record_completion(&UserId::new("ada"), &CourseId::new("rust-101"), "l1", None);

    let err = node
        .module
        .call::<_, RpcIssueResult>("certx_issueCertificate", rpc_params!["ada", "rust-101"])
        .await
        .unwrap_err();
    let MethodsError::JsonRpc(obj) = err else { panic!("expected a JSON-RPC error") };
    assert_eq!(obj.code(), NOT_ELIGIBLE);
    let data: serde_json::Value = serde_json::from_str(obj.data().unwrap().get()).unwrap();
    assert_eq!(data["code"], "NOT_ELIGIBLE");
    assert_eq!(data["completion_percentage"], 50);
    assert_eq!(data["has_passed_any_quiz"], false);
}

#[tokio::test]
async fn issue_get_list_round_trip() {
    let node = node();
    node.make_eligible();

    let first = node.issue().await;
    let second = node.issue().await;
    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.certificate.certificate_id, second.certificate.certificate_id);
    assert_eq!(first.certificate.status, "active");

    let id = first.certificate.certificate_id.clone();
    let fetched: Option<RpcCertificate> = node.module.call("certx_getCertificate", rpc_params![id.clone()]).await.unwrap();
    assert_eq!(fetched.unwrap().student_name, "Ada Lovelace");

    let missing: Option<RpcCertificate> =
        node.module.call("certx_getCertificate", rpc_params!["nope"]).await.unwrap();
    assert!(missing.is_none());

    let listed: Vec<RpcCertificate> = node.module.call("certx_listCertificates", rpc_params!["ada"]).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].certificate_id, id);
}

#[tokio::test]
async fn revoke_then_verify() {
    let node = node();
    node.make_eligible();
    let id = node.issue().await.certificate.certificate_id;

    let ok: VerificationResult = node.module.call("certx_verifyCertificate", rpc_params![id.clone()]).await.unwrap();
    assert!(ok.verified);

    let revoked: RpcCertificate = node
        .module
        .call("certx_setCertificateStatus", rpc_params![id.clone(), "revoked"])
        .await
        .unwrap();
    assert_eq!(revoked.status, "revoked");

    let err = node
        .module
        .call::<_, RpcCertificate>("certx_setCertificateStatus", rpc_params![id.clone(), "active"])
        .await
        .unwrap_err();
    assert_eq!(error_code(err), INVALID_TRANSITION);

    let verdict: VerificationResult = node.module.call("certx_verifyCertificate", rpc_params![id]).await.unwrap();
    assert!(!verdict.verified);
    assert_eq!(verdict.status.map(|s| s.to_string()).as_deref(), Some("revoked"));
}

#[tokio::test]
async fn mint_is_idempotent_and_visible_in_verification() {
    let node = node();
    node.make_eligible();
    let id = node.issue().await.certificate.certificate_id;

    let first: RpcMintResult = node.module.call("certx_mintAnchor", rpc_params![id.clone(), ADDR]).await.unwrap();
    let second: RpcMintResult = node.module.call("certx_mintAnchor", rpc_params![id.clone(), ADDR]).await.unwrap();
    assert!(first.minted);
    assert!(!second.minted);
    assert_eq!(first.anchor, second.anchor);

    let verdict: VerificationResult = node.module.call("certx_verifyCertificate", rpc_params![id]).await.unwrap();
    let anchor = verdict.anchor.unwrap();
    assert_eq!(anchor.tx_hash, first.anchor.tx_hash);
    assert_eq!(anchor.chain_corroborated, Some(true));

    let info: RpcServiceInfo = node.module.call("certx_getServiceInfo", rpc_params![]).await.unwrap();
    assert_eq!(info.certificate_count, 1);
    assert_eq!(info.anchor_count, 1);
    assert!(info.chain_explorer);
}

#[tokio::test]
async fn failed_mint_reports_a_generic_retryable_error() {
    let node = node();
    node.make_eligible();
    let id = node.issue().await.certificate.certificate_id;

    node.network.fail_next(1);
    let err = node
        .module
        .call::<_, RpcMintResult>("certx_mintAnchor", rpc_params![id.clone(), ADDR])
        .await
        .unwrap_err();
    let MethodsError::JsonRpc(obj) = err else { panic!("expected a JSON-RPC error") };
    assert_eq!(obj.code(), MINT_FAILED);
    assert!(obj.message().contains("try again"));
    assert!(!obj.message().contains("simulated network failure"), "transport detail leaked: {}", obj.message());
    let data: serde_json::Value = serde_json::from_str(obj.data().unwrap().get()).unwrap();
    assert_eq!(data["code"], "MINT_FAILED");
    assert_eq!(data["retryable"], true);
    assert!(!data.to_string().contains("simulated"));

    let retried: RpcMintResult = node.module.call("certx_mintAnchor", rpc_params![id, ADDR]).await.unwrap();
    assert!(retried.minted);
}

#[tokio::test]
async fn annotations_are_write_once() {
    let node = node();
    node.make_eligible();
    let id = node.issue().await.certificate.certificate_id;

    let cert: RpcCertificate = node
        .module
        .call("certx_annotateCertificate", rpc_params![id.clone(), "cohort", "2024-spring"])
        .await
        .unwrap();
    assert_eq!(cert.metadata.get("cohort").map(String::as_str), Some("2024-spring"));

    let err = node
        .module
        .call::<_, RpcCertificate>("certx_annotateCertificate", rpc_params![id.clone(), "cohort", "other"])
        .await
        .unwrap_err();
    assert_eq!(error_code(err), INVALID_PARAMS);

    let verdict: VerificationResult = node.module.call("certx_verifyCertificate", rpc_params![id]).await.unwrap();
    assert!(verdict.verified);
}
