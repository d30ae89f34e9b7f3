//! MCP server implementation.
//!
//! Line-delimited JSON-RPC 2.0 over stdio. Requests are read one line at a
//! time; `tools/call` runs on its own task so a slow analysis does not block
//! `ping` or a cancellation, and every response goes through a single writer.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use notelens_core::Config;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::tool;

/// Name reported in `serverInfo`.
pub const SERVER_NAME: &str = "analyzeimage";

const PROTOCOL_VERSION: &str = "2024-11-05";

pub(crate) const PARSE_ERROR: i32 = -32700;
pub(crate) const METHOD_NOT_FOUND: i32 = -32601;
pub(crate) const INVALID_PARAMS: i32 = -32602;

/// JSON-RPC request structure.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[serde(default)]
    #[allow(dead_code)]
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

/// JSON-RPC response structure.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcError {
    pub(crate) fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: INVALID_PARAMS,
            message: message.into(),
        }
    }
}

impl JsonRpcResponse {
    fn from_result(id: Option<Value>, result: Result<Value, JsonRpcError>) -> Self {
        let (result, error) = match result {
            Ok(value) => (Some(value), None),
            Err(error) => (None, Some(error)),
        };
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result,
            error,
        }
    }
}

/// Abort handles of running tool calls, keyed by serialized request id.
///
/// Each call also gets a server-side sequence number so a finished call only
/// removes its own entry when a client reuses an id.
#[derive(Clone, Default)]
struct InFlight(Arc<Mutex<HashMap<String, (u64, AbortHandle)>>>);

impl InFlight {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, (u64, AbortHandle)>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Track a call through an already held guard. A duplicate id keeps the
    /// call registered first.
    fn register(
        running: &mut HashMap<String, (u64, AbortHandle)>,
        key: String,
        seq: u64,
        handle: AbortHandle,
    ) -> bool {
        match running.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert((seq, handle));
                true
            }
            Entry::Occupied(slot) => {
                warn!(request_id = %slot.key(), "Duplicate request id, call cannot be cancelled");
                false
            }
        }
    }

    fn finish(&self, key: &str, seq: u64) {
        let mut running = self.lock();
        if running.get(key).is_some_and(|(owner, _)| *owner == seq) {
            running.remove(key);
        }
    }

    fn cancel(&self, key: &str) -> bool {
        match self.lock().remove(key) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lock().len()
    }
}

/// Run the MCP server over stdio.
pub async fn run_stdio(config: Arc<Config>) -> anyhow::Result<()> {
    serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), config).await
}

/// Serve requests from `reader` until end of input, answering on `writer`.
///
/// In-flight tool calls are awaited before returning so none of their
/// responses are lost.
pub async fn serve<R, W>(mut reader: R, writer: W, config: Arc<Config>) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let writer_task = tokio::spawn(write_responses(writer, rx));
    let in_flight = InFlight::default();
    let mut calls = JoinSet::new();
    let mut next_seq: u64 = 0;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = buf.trim_ascii();
        if line.is_empty() {
            continue;
        }
        while calls.try_join_next().is_some() {}

        // Undecodable bytes are reported like any other malformed JSON
        let request: JsonRpcRequest = match serde_json::from_slice(line) {
            Ok(r) => r,
            Err(e) => {
                let error = JsonRpcError {
                    code: PARSE_ERROR,
                    message: format!("Parse error: {}", e),
                };
                let _ = tx.send(JsonRpcResponse::from_result(None, Err(error)));
                continue;
            }
        };
        let JsonRpcRequest {
            id, method, params, ..
        } = request;

        // JSON-RPC 2.0: notifications (no id) must not receive responses
        let Some(id) = id else {
            handle_notification(&method, params.as_ref(), &in_flight);
            continue;
        };

        if method != "tools/call" {
            let _ = tx.send(JsonRpcResponse::from_result(Some(id), handle_request(&method)));
            continue;
        }

        let key = id.to_string();
        let seq = next_seq;
        next_seq += 1;
        let tx = tx.clone();
        let config = Arc::clone(&config);
        let registry = in_flight.clone();
        let task_key = key.clone();

        // Held across spawn so a fast call cannot finish before it is registered
        let mut running = in_flight.lock();
        let handle = calls.spawn(async move {
            let result = tool::handle_tool_call(&config, params).await;
            registry.finish(&task_key, seq);
            let _ = tx.send(JsonRpcResponse::from_result(Some(id), result));
        });
        InFlight::register(&mut running, key, seq, handle);
    }

    debug!(pending = calls.len(), "Input closed, draining tool calls");
    while calls.join_next().await.is_some() {}
    drop(tx);
    writer_task.await?;

    Ok(())
}

fn handle_request(method: &str) -> Result<Value, JsonRpcError> {
    match method {
        "initialize" => Ok(handle_initialize()),
        "tools/list" => Ok(serde_json::json!({ "tools": [tool::definition()] })),
        "ping" => Ok(serde_json::json!({})),
        _ => Err(JsonRpcError {
            code: METHOD_NOT_FOUND,
            message: format!("Method not found: {}", method),
        }),
    }
}

fn handle_initialize() -> Value {
    serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        },
        "capabilities": {
            "tools": {}
        }
    })
}

fn handle_notification(method: &str, params: Option<&Value>, in_flight: &InFlight) {
    match method {
        "notifications/initialized" => debug!("Client initialized"),
        "notifications/cancelled" => {
            let Some(request_id) = params.and_then(|p| p.get("requestId")) else {
                warn!("Cancellation without requestId");
                return;
            };
            if in_flight.cancel(&request_id.to_string()) {
                info!(request_id = %request_id, "Cancelled tool call");
            } else {
                debug!(request_id = %request_id, "Nothing to cancel");
            }
        }
        other => debug!(method = other, "Ignoring notification"),
    }
}

async fn write_responses<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<JsonRpcResponse>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        if let Err(e) = write_response(&mut writer, &response).await {
            warn!(error = %e, "Failed to write response, closing output");
            break;
        }
    }
}

/// Write a JSON-RPC response as one line.
async fn write_response<W>(writer: &mut W, response: &JsonRpcResponse) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let json = serde_json::to_string(response).map_err(std::io::Error::other)?;
    writer.write_all(format!("{}\n", json).as_bytes()).await?;
    writer.flush().await
}
