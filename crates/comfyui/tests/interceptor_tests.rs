//! Integration tests for the noise-injection queue decorator.
//!
//! Exercises the full path a real submission takes: live graph snapshot
//! → parameter resolution → prompt mutation → forwarding to the wrapped
//! queue, including error propagation from the wrapped side.

use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use noiseinject_core::graph::Graph;
use noiseinject_comfyui::api::{ComfyUIApiError, PromptPayload, SubmitResponse};
use noiseinject_comfyui::interceptor::{NoiseInjectionQueue, QueuePrompt, SharedGraph};
use serde_json::json;

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// Inner queue that records forwarded arguments and returns a canned
/// response.
struct RecordingQueue {
    calls: Mutex<Vec<(i64, PromptPayload, serde_json::Value)>>,
}

impl RecordingQueue {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl QueuePrompt for RecordingQueue {
    async fn queue_prompt(
        &self,
        number: i64,
        payload: PromptPayload,
        options: serde_json::Value,
    ) -> Result<SubmitResponse, ComfyUIApiError> {
        self.calls.lock().unwrap().push((number, payload, options));
        Ok(SubmitResponse {
            prompt_id: "integration-prompt".to_string(),
            number: 3,
        })
    }
}

/// Inner queue that always fails, for error-propagation checks.
struct FailingQueue;

#[async_trait]
impl QueuePrompt for FailingQueue {
    async fn queue_prompt(
        &self,
        _number: i64,
        _payload: PromptPayload,
        _options: serde_json::Value,
    ) -> Result<SubmitResponse, ComfyUIApiError> {
        Err(ComfyUIApiError::ApiError {
            status: 500,
            body: "backend exploded".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Serialized editor snapshot: SamplerCustomAdvanced fed by a
/// RandomNoise node (`noise_seed = 42`) and an EmptyLatentImage node
/// (`batch_size = 4`).
fn advanced_sampler_snapshot() -> Graph {
    let value = json!({
        "nodes": [
            {
                "id": 1,
                "type": "RandomNoise",
                "widgets": [ { "name": "noise_seed", "value": 42 } ]
            },
            {
                "id": 2,
                "type": "EmptyLatentImage",
                "widgets": [
                    { "name": "width", "value": 1024 },
                    { "name": "height", "value": 1024 },
                    { "name": "batch_size", "value": 4 }
                ]
            },
            {
                "id": 3,
                "type": "SamplerCustomAdvanced",
                "inputs": [
                    { "name": "noise", "link": 10 },
                    { "name": "latent_image", "link": 11 }
                ]
            }
        ],
        "links": {
            "10": { "origin_id": 1 },
            "11": { "origin_id": 2 }
        }
    });
    Graph::from_value(&value).expect("fixture snapshot should parse")
}

/// API-format prompt with one target node among ordinary nodes.
fn prompt_payload() -> PromptPayload {
    PromptPayload {
        output: json!({
            "3": {
                "class_type": "SamplerCustomAdvanced",
                "inputs": { "noise": ["1", 0], "latent_image": ["2", 0] }
            },
            "7": {
                "class_type": "ConditioningNoiseInjection",
                "inputs": { "conditioning": ["6", 0], "strength": 0.35 }
            },
            "9": {
                "class_type": "SaveImage",
                "inputs": { "images": ["8", 0] }
            }
        }),
        workflow: json!({ "nodes": [], "links": {} }),
    }
}

fn injecting_queue(inner: RecordingQueue) -> NoiseInjectionQueue<RecordingQueue> {
    NoiseInjectionQueue::new(
        inner,
        Arc::new(SharedGraph::new(advanced_sampler_snapshot())),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// The target node's inputs gain both injected keys with the values
/// resolved from the live graph, not from the payload.
#[tokio::test]
async fn target_node_receives_resolved_params() {
    let queue = injecting_queue(RecordingQueue::new());

    queue
        .queue_prompt(0, prompt_payload(), json!({}))
        .await
        .unwrap();

    let calls = queue.inner().calls.lock().unwrap();
    let output = &calls[0].1.output;
    assert_eq!(output["7"]["inputs"]["seed_from_js"], json!(42));
    assert_eq!(output["7"]["inputs"]["batch_size_from_js"], json!(4));
    // Pre-existing inputs on the target node survive.
    assert_eq!(output["7"]["inputs"]["strength"], json!(0.35));
}

/// Entries of other class types compare equal before and after.
#[tokio::test]
async fn non_target_nodes_are_untouched() {
    let queue = injecting_queue(RecordingQueue::new());
    let original = prompt_payload();

    queue
        .queue_prompt(0, prompt_payload(), json!({}))
        .await
        .unwrap();

    let calls = queue.inner().calls.lock().unwrap();
    let output = &calls[0].1.output;
    assert_eq!(output["3"], original.output["3"]);
    assert_eq!(output["9"], original.output["9"]);
}

/// `number` and `options` reach the wrapped queue exactly as given.
#[tokio::test]
async fn number_and_options_forwarded_unchanged() {
    let queue = injecting_queue(RecordingQueue::new());
    let options = json!({ "front": false, "client": "abc" });

    queue
        .queue_prompt(-1, prompt_payload(), options.clone())
        .await
        .unwrap();

    let calls = queue.inner().calls.lock().unwrap();
    assert_eq!(calls[0].0, -1);
    assert_eq!(calls[0].2, options);
}

/// The wrapped queue's successful response is returned unchanged.
#[tokio::test]
async fn inner_response_propagates_unchanged() {
    let queue = injecting_queue(RecordingQueue::new());

    let response = queue
        .queue_prompt(0, prompt_payload(), json!({}))
        .await
        .unwrap();

    assert_eq!(response.prompt_id, "integration-prompt");
    assert_eq!(response.number, 3);
}

/// The wrapped queue's failure propagates unchanged; interception never
/// converts or swallows it.
#[tokio::test]
async fn inner_error_propagates_unchanged() {
    let queue = NoiseInjectionQueue::new(
        FailingQueue,
        Arc::new(SharedGraph::new(advanced_sampler_snapshot())),
    );

    let result = queue.queue_prompt(0, prompt_payload(), json!({})).await;

    assert_matches!(
        result,
        Err(ComfyUIApiError::ApiError { status: 500, ref body }) if body == "backend exploded"
    );
}

/// A prompt with no target nodes passes through with its output intact.
#[tokio::test]
async fn prompt_without_targets_passes_through_intact() {
    let queue = injecting_queue(RecordingQueue::new());
    let payload = PromptPayload {
        output: json!({
            "9": { "class_type": "SaveImage", "inputs": { "images": ["8", 0] } }
        }),
        workflow: json!({}),
    };
    let original = payload.output.clone();

    queue.queue_prompt(0, payload, json!({})).await.unwrap();

    let calls = queue.inner().calls.lock().unwrap();
    assert_eq!(calls[0].1.output, original);
}
