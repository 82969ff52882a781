//! Backend client facade.
//!
//! Everything the gateway knows about its collaborators lives here: the
//! per-project Graph API (`graph`), the infrastructure-provisioning API
//! (`provision`), and the URL fetch utility (`fetch`). All requests carry a
//! bounded deadline and surface failures through the gateway error taxonomy;
//! raw backend error bodies never cross this boundary.

pub mod fetch;
pub mod graph;
pub mod provision;
pub mod retry;

use serde_json::Value;

use crate::error::GatewayError;
use retry::{with_retry, RetryPolicy};

/// Translate an error-class HTTP status into the gateway taxonomy.
///
/// 4xx responses are definitive backend decisions (`BackendRejected`); 5xx
/// responses are treated as transient (`BackendUnavailable`) so the retry
/// policy can apply to idempotent reads.
async fn check_status(
    operation: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, GatewayError> {
    let status = resp.status();
    if status.is_client_error() {
        return Err(GatewayError::BackendRejected {
            status: status.as_u16(),
            message: reject_summary(status.as_u16()).to_string(),
        });
    }
    if status.is_server_error() {
        return Err(GatewayError::BackendUnavailable {
            message: format!("{operation}: backend returned status {}", status.as_u16()),
        });
    }
    Ok(resp)
}

/// Safe summary for a rejected request. The backend's own error body may leak
/// internal details, so only the status class is reported.
fn reject_summary(status: u16) -> &'static str {
    match status {
        401 | 403 => "authentication rejected by backend",
        404 => "resource not found",
        409 => "conflict with existing resource",
        422 | 400 => "backend validation failed",
        429 => "backend rate limit exceeded",
        _ => "request rejected",
    }
}

/// Issue a request (rebuilt per attempt) under the given retry policy and
/// decode the JSON body.
pub(crate) async fn request_json(
    operation: &'static str,
    policy: &RetryPolicy,
    build: impl Fn() -> reqwest::RequestBuilder,
) -> Result<Value, GatewayError> {
    with_retry(policy, operation, || {
        let request = build();
        async move {
            let resp = request
                .send()
                .await
                .map_err(|e| GatewayError::from_reqwest(operation, e))?;
            let resp = check_status(operation, resp).await?;
            resp.json::<Value>()
                .await
                .map_err(|e| GatewayError::from_reqwest(operation, e))
        }
    })
    .await
}
