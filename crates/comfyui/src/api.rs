//! REST client for the ComfyUI prompt-submission endpoint.
//!
//! Wraps the ComfyUI `POST /prompt` API using [`reqwest`], carrying the
//! same `{output, workflow}` pair the editor hands to its queue
//! function.

use serde::{Deserialize, Serialize};

/// The execution payload and workflow metadata submitted together.
///
/// `output` is the API-format prompt (node ID → `{ class_type, inputs }`);
/// `workflow` is the editor's serialized graph, embedded in the request
/// so the backend can stamp it into generated images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptPayload {
    /// API-format prompt, keyed by node ID.
    pub output: serde_json::Value,
    /// Serialized editor workflow.
    pub workflow: serde_json::Value,
}

/// Response returned by the ComfyUI `/prompt` endpoint after
/// successfully queuing a workflow.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    /// Server-assigned identifier for the queued prompt.
    pub prompt_id: String,
    /// Position in the execution queue.
    pub number: i64,
}

/// Errors from the ComfyUI REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ComfyUIApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// ComfyUI returned a non-2xx status code.
    #[error("ComfyUI API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

/// HTTP client for a single ComfyUI instance.
///
/// Generates a unique `client_id` (UUID v4) at construction so that
/// ComfyUI can address progress messages back to this client.
pub struct ComfyUIApi {
    client: reqwest::Client,
    api_url: String,
    client_id: String,
}

impl ComfyUIApi {
    /// Create a new API client for a ComfyUI instance.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://host:8188`.
    pub fn new(api_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            client_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Create an API client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across multiple instances).
    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self {
            client,
            api_url,
            client_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Client ID sent with every submission.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Submit a prompt for execution.
    ///
    /// Sends a `POST /prompt` request. `number` carries the editor's
    /// queue-position semantics: `-1` queues at the front, any other
    /// nonzero value is forwarded as an explicit position, and `0`
    /// (the default) lets the server append.
    pub async fn submit_prompt(
        &self,
        number: i64,
        payload: &PromptPayload,
    ) -> Result<SubmitResponse, ComfyUIApiError> {
        let body = build_submit_body(number, payload, &self.client_id);

        let response = self
            .client
            .post(format!("{}/prompt", self.api_url))
            .json(&body)
            .send()
            .await?;

        let submitted: SubmitResponse = Self::parse_response(response).await?;
        tracing::info!(
            prompt_id = %submitted.prompt_id,
            queue_number = submitted.number,
            "Prompt queued",
        );
        Ok(submitted)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`ComfyUIApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ComfyUIApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ComfyUIApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ComfyUIApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Build the `/prompt` request body.
///
/// The workflow rides along under `extra_data.extra_pnginfo` so the
/// backend embeds it into output image metadata.
fn build_submit_body(
    number: i64,
    payload: &PromptPayload,
    client_id: &str,
) -> serde_json::Value {
    let mut body = serde_json::json!({
        "client_id": client_id,
        "prompt": payload.output,
        "extra_data": {
            "extra_pnginfo": { "workflow": payload.workflow }
        },
    });
    if number == -1 {
        body["front"] = serde_json::json!(true);
    } else if number != 0 {
        body["number"] = serde_json::json!(number);
    }
    body
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
