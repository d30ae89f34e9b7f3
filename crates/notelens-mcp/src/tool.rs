//! The `analyze_images_feature` tool.

use notelens_core::{analyze_post, Config, PostInput};
use serde_json::Value;
use tracing::info;

use crate::server::{JsonRpcError, METHOD_NOT_FOUND};

/// Name of the single exposed tool.
pub const TOOL_NAME: &str = "analyze_images_feature";

/// Tool definition returned by `tools/list`.
pub fn definition() -> Value {
    serde_json::json!({
        "name": TOOL_NAME,
        "description": "Analyze and summarize the images of a Xiaohongshu (RED note) post: location, composition, and whether each picture is a map.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "red_note": {
                    "type": "string",
                    "description": "Full text content of the post"
                },
                "urls": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Image URLs (or local paths) in post order"
                },
                "api_key": {
                    "type": "string",
                    "description": "Optional Gemini API key for this call"
                }
            },
            "required": ["red_note", "urls"]
        }
    })
}

/// Handle `tools/call`.
///
/// Analysis failures are not JSON-RPC errors: they come back as text with
/// `isError: true`.
pub async fn handle_tool_call(
    config: &Config,
    params: Option<Value>,
) -> Result<Value, JsonRpcError> {
    let params = params.ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;

    let name = params["name"]
        .as_str()
        .ok_or_else(|| JsonRpcError::invalid_params("Missing tool name"))?;

    if name != TOOL_NAME {
        return Err(JsonRpcError {
            code: METHOD_NOT_FOUND,
            message: format!("Unknown tool: {}", name),
        });
    }

    let args = params.get("arguments").cloned().unwrap_or(serde_json::json!({}));
    let post: PostInput = serde_json::from_value(args)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid arguments: {}", e)))?;

    let outcome = analyze_post(config, &post).await;
    info!(images = post.urls.len(), is_error = outcome.is_error(), "Tool call finished");

    Ok(serde_json::json!({
        "content": [{
            "type": "text",
            "text": outcome.render()
        }],
        "isError": outcome.is_error()
    }))
}
