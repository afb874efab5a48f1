//! End-to-end smoke test for certx-node.
//!
//! Starts a real node process against a fixture ledger, issues and mints a
//! certificate via JSON-RPC, and verifies it through the REST API.
//!
//! Run with:
//!   cargo test -p certx-node --test smoke

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use serde_json::{json, Value};

// ── Node lifecycle ────────────────────────────────────────────────────────────

struct NodeGuard {
    child: Child,
    data_dir: PathBuf,
}

impl Drop for NodeGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}

/// Find a free TCP port on loopback.
fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

// ── RPC helpers ───────────────────────────────────────────────────────────────

async fn rpc_raw(client: &reqwest::Client, url: &str, method: &str, params: Value) -> Value {
    let body = json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1
    });
    client
        .post(url)
        .json(&body)
        .send()
        .await
        .unwrap_or_else(|e| panic!("RPC call {method} failed: {e}"))
        .json()
        .await
        .expect("parse RPC JSON")
}

async fn rpc_call(client: &reqwest::Client, url: &str, method: &str, params: Value) -> Value {
    let json = rpc_raw(client, url, method, params).await;
    if let Some(err) = json.get("error") {
        panic!("RPC error from {method}: {err}");
    }
    json["result"].clone()
}

/// Poll until the RPC server responds or the timeout elapses.
async fn wait_for_rpc(client: &reqwest::Client, url: &str, timeout: Duration) -> bool {
    let body = json!({
        "jsonrpc": "2.0",
        "method": "certx_getServiceInfo",
        "params": [],
        "id": 1
    });
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(resp) = client.post(url).json(&body).send().await {
            if resp.status().is_success() {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    false
}

/// Poll until the REST API answers `/health`.
async fn wait_for_http(client: &reqwest::Client, base: &str, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(resp) = client.get(format!("{base}/health")).send().await {
            if resp.status().is_success() {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    false
}

fn fixtures() -> Value {
    json!({
        "students": [
            {"user_id": "ada", "display_name": "Ada Lovelace"},
            {"user_id": "bob", "display_name": "Bob"}
        ],
        "courses": [{
            "course_id": "rust-101",
            "title": "Rust 101",
            "level": "beginner",
            "lessons": ["l1", "l2", "l3"],
            "quizzes": [{"quiz_id": "q1", "title": "Final", "min_pass_points": 5}]
        }],
        "completions": [
            {"user_id": "ada", "course_id": "rust-101", "lesson_unit_id": "l1", "completed_at": 1700000000},
            {"user_id": "ada", "course_id": "rust-101", "lesson_unit_id": "l2", "completed_at": 1700000100},
            {"user_id": "ada", "course_id": "rust-101", "lesson_unit_id": "l3", "completed_at": 1700000200},
            {"user_id": "bob", "course_id": "rust-101", "lesson_unit_id": "l1"}
        ],
        "attempts": [{
            "user_id": "ada",
            "quiz_id": "q1",
            "attempt_id": "a1",
            "score": 8,
            "min_pass_points": 5,
            "passed": true,
            "completed_at": 1700000300
        }]
    })
}

// ── Smoke test ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn smoke_issue_mint_and_verify() {
    // ── 1. Prepare temp dir and fixtures ──────────────────────────────────────
    let data_dir = std::env::temp_dir().join(format!("certx_e2e_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&data_dir);
    std::fs::create_dir_all(&data_dir).unwrap();

    let fixtures_path = data_dir.join("ledger.json");
    std::fs::write(&fixtures_path, fixtures().to_string()).unwrap();

    // ── 2. Start node ─────────────────────────────────────────────────────────
    let rpc_port = free_port();
    let http_port = free_port();
    let rpc_url = format!("http://127.0.0.1:{rpc_port}");
    let http_url = format!("http://127.0.0.1:{http_port}");

    let node_bin = env!("CARGO_BIN_EXE_certx-node");
    let child = Command::new(node_bin)
        .args([
            "--data-dir",        data_dir.join("state").to_str().unwrap(),
            "--rpc-addr",        &format!("127.0.0.1:{rpc_port}"),
            "--http-port",       &http_port.to_string(),
            "--ledger-fixtures", fixtures_path.to_str().unwrap(),
            "--validity-days",   "365",
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn certx-node");

    let _guard = NodeGuard { child, data_dir };

    // ── 3. Wait for both servers ──────────────────────────────────────────────
    let http = reqwest::Client::new();
    assert!(
        wait_for_rpc(&http, &rpc_url, Duration::from_secs(20)).await,
        "certx-node RPC did not become ready within 20 seconds"
    );
    assert!(
        wait_for_http(&http, &http_url, Duration::from_secs(10)).await,
        "certx-node REST API did not become ready within 10 seconds"
    );

    // ── 4. Bob has not finished the course ────────────────────────────────────
    let refused = rpc_raw(&http, &rpc_url, "certx_issueCertificate", json!(["bob", "rust-101"])).await;
    assert_eq!(refused["error"]["data"]["code"], "NOT_ELIGIBLE");
    assert_eq!(refused["error"]["data"]["completion_percentage"], 33);

    // ── 5. Ada gets a certificate, once ───────────────────────────────────────
    let first = rpc_call(&http, &rpc_url, "certx_issueCertificate", json!(["ada", "rust-101"])).await;
    assert_eq!(first["created"], true);
    let cert = &first["certificate"];
    assert_eq!(cert["student_name"], "Ada Lovelace");
    assert_eq!(cert["completion_date"], 1700000300);
    assert!(cert["expires_at"].is_i64());

    let second = rpc_call(&http, &rpc_url, "certx_issueCertificate", json!(["ada", "rust-101"])).await;
    assert_eq!(second["created"], false);
    assert_eq!(second["certificate"]["certificate_id"], cert["certificate_id"]);
    let id = cert["certificate_id"].as_str().unwrap().to_string();

    // ── 6. Mint through the simulated network ─────────────────────────────────
    let minted = rpc_call(
        &http,
        &rpc_url,
        "certx_mintAnchor",
        json!([id, "addr_test1qsmoke000"]),
    )
    .await;
    assert_eq!(minted["minted"], true);

    // ── 7. Public verification over REST ──────────────────────────────────────
    let resp = http
        .get(format!("{http_url}/verify-certificate/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let verdict: Value = resp.json().await.unwrap();
    assert_eq!(verdict["verified"], true);
    assert_eq!(verdict["anchor"]["tx_hash"], minted["anchor"]["tx_hash"]);
    assert_eq!(verdict["anchor"]["chain_corroborated"], true);

    // ── 8. Revocation is visible to verifiers ─────────────────────────────────
    rpc_call(&http, &rpc_url, "certx_setCertificateStatus", json!([id, "revoked"])).await;
    let resp = http
        .get(format!("{http_url}/verify-certificate/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let verdict: Value = resp.json().await.unwrap();
    assert_eq!(verdict["status"], "revoked");

    let info = rpc_call(&http, &rpc_url, "certx_getServiceInfo", json!([])).await;
    assert_eq!(info["certificate_count"], 1);
    assert_eq!(info["anchor_count"], 1);
    assert_eq!(info["validity_secs"], 365 * 86_400);
}
