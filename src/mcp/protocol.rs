//! MCP protocol response helpers.

use rmcp::model::CallToolResult;
use serde::Serialize;

/// Single-item response that serializes as the raw inner value.
///
/// Use this for tool responses that return one object. The inner value is
/// serialized directly without wrapping.
///
/// # Example
///
/// ```ignore
/// let outcome = SearchOutcome { nodes, total, query };
/// Response(outcome).into()
/// ```
pub struct Response<T>(pub T);

impl<T: Serialize> Serialize for Response<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T: Serialize> From<Response<T>> for Result<CallToolResult, rmcp::model::ErrorData> {
    fn from(response: Response<T>) -> Self {
        Ok(CallToolResult::success(vec![rmcp::model::Content::json(
            serde_json::to_value(&response.0).unwrap(),
        )
        .unwrap()]))
    }
}
