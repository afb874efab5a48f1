use anyhow::{bail, Context};
use serde_json::{json, Value};

use certx_core::verification::VerificationResult;
use certx_rpc::{RpcAnchor, RpcCertificate, RpcIssueResult, RpcMintResult, RpcServiceInfo};

/// JSON-RPC 2.0 client used by the CLI to talk to a running node.
///
/// Uses raw HTTP POST with serde_json rather than the jsonrpsee client so the
/// binary only needs the response types from `certx-rpc`.
pub struct CertxRpcClient {
    url: String,
    client: reqwest::Client,
}

impl CertxRpcClient {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Call a JSON-RPC method and return the `result` field.
    async fn call(&self, method: &str, params: Value) -> anyhow::Result<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("connecting to node at {}", self.url))?;

        let json: Value = resp.json().await.context("parsing RPC response")?;

        if let Some(err) = json.get("error") {
            bail!("{}", describe_error(err));
        }

        Ok(json["result"].clone())
    }

    async fn call_typed<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> anyhow::Result<T> {
        let result = self.call(method, params).await?;
        serde_json::from_value(result).with_context(|| format!("parsing {method} response"))
    }

    pub async fn issue_certificate(&self, user_id: &str, course_id: &str) -> anyhow::Result<RpcIssueResult> {
        self.call_typed("certx_issueCertificate", json!([user_id, course_id]))
            .await
    }

    pub async fn get_certificate(&self, certificate_id: &str) -> anyhow::Result<Option<RpcCertificate>> {
        self.call_typed("certx_getCertificate", json!([certificate_id]))
            .await
    }

    pub async fn list_certificates(&self, user_id: &str) -> anyhow::Result<Vec<RpcCertificate>> {
        self.call_typed("certx_listCertificates", json!([user_id]))
            .await
    }

    pub async fn set_status(&self, certificate_id: &str, status: &str) -> anyhow::Result<RpcCertificate> {
        self.call_typed("certx_setCertificateStatus", json!([certificate_id, status]))
            .await
    }

    pub async fn annotate(&self, certificate_id: &str, key: &str, value: &str) -> anyhow::Result<RpcCertificate> {
        self.call_typed("certx_annotateCertificate", json!([certificate_id, key, value]))
            .await
    }

    pub async fn verify(&self, certificate_id: &str) -> anyhow::Result<VerificationResult> {
        self.call_typed("certx_verifyCertificate", json!([certificate_id]))
            .await
    }

    pub async fn mint_anchor(&self, certificate_id: &str, destination: &str) -> anyhow::Result<RpcMintResult> {
        self.call_typed("certx_mintAnchor", json!([certificate_id, destination]))
            .await
    }

    pub async fn get_anchor(&self, certificate_id: &str) -> anyhow::Result<Option<RpcAnchor>> {
        self.call_typed("certx_getAnchor", json!([certificate_id]))
            .await
    }

    pub async fn service_info(&self) -> anyhow::Result<RpcServiceInfo> {
        self.call_typed("certx_getServiceInfo", json!([])).await
    }
}

/// Render a JSON-RPC error object as one line, including the node's error
/// code and, for refused issuance, the learner's progress.
fn describe_error(err: &Value) -> String {
    let message = err["message"].as_str().unwrap_or("unknown error");
    let data = &err["data"];
    let Some(code) = data["code"].as_str() else {
        return format!("RPC error: {message}");
    };

    let mut line = format!("{message} [{code}]");
    if let (Some(done), Some(total)) = (data["completed_lessons"].as_u64(), data["total_lessons"].as_u64()) {
        line.push_str(&format!(
            " (lessons {done}/{total}, {}%, quiz passed: {})",
            data["completion_percentage"].as_u64().unwrap_or(0),
            data["has_passed_any_quiz"].as_bool().unwrap_or(false),
        ));
    }
    if data["retryable"].as_bool() == Some(true) {
        line.push_str(" - retry later");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_not_eligible_with_progress() {
        let err = json!({
            "code": -32010,
            "message": "not eligible",
            "data": {
                "code": "NOT_ELIGIBLE",
                "retryable": false,
                "completed_lessons": 4,
                "total_lessons": 5,
                "completion_percentage": 80,
                "has_passed_any_quiz": true
            }
        });
        assert_eq!(
            describe_error(&err),
            "not eligible [NOT_ELIGIBLE] (lessons 4/5, 80%, quiz passed: true)"
        );
    }

    #[test]
    fn marks_retryable_errors() {
        let err = json!({
            "code": -32011,
            "message": "a dependency is temporarily unavailable, try again later",
            "data": {"code": "DEPENDENCY_UNAVAILABLE", "retryable": true}
        });
        assert!(describe_error(&err).ends_with("[DEPENDENCY_UNAVAILABLE] - retry later"));
    }

    #[test]
    fn falls_back_for_protocol_errors() {
        let err = json!({"code": -32601, "message": "Method not found"});
        assert_eq!(describe_error(&err), "RPC error: Method not found");
    }
}
