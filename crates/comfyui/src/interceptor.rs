//! Parameter-injecting decorator around the prompt queue.
//!
//! [`QueuePrompt`] models the host editor's outgoing-request function:
//! same arguments, same asynchronous result. [`NoiseInjectionQueue`]
//! wraps any implementation of it, resolving the current workflow
//! parameters from a live graph snapshot and writing them into the
//! prompt before every forwarded call. Installed once at setup instead
//! of mutating a shared global at runtime.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use noiseinject_core::graph::Graph;
use noiseinject_core::inject::inject_params;
use noiseinject_core::resolver::resolve_workflow_params;

use crate::api::{ComfyUIApi, ComfyUIApiError, PromptPayload, SubmitResponse};

// ---------------------------------------------------------------------------
// QueuePrompt
// ---------------------------------------------------------------------------

/// The host's asynchronous prompt-queue capability.
///
/// `number` carries queue-position semantics, `payload` is the
/// `{output, workflow}` pair, and `options` is opaque host data passed
/// through to the transport untouched.
#[async_trait]
pub trait QueuePrompt: Send + Sync {
    async fn queue_prompt(
        &self,
        number: i64,
        payload: PromptPayload,
        options: serde_json::Value,
    ) -> Result<SubmitResponse, ComfyUIApiError>;
}

#[async_trait]
impl QueuePrompt for ComfyUIApi {
    /// Submit over HTTP. The REST transport has no representation for
    /// the host's options object, so it is accepted and dropped here.
    async fn queue_prompt(
        &self,
        number: i64,
        payload: PromptPayload,
        _options: serde_json::Value,
    ) -> Result<SubmitResponse, ComfyUIApiError> {
        self.submit_prompt(number, &payload).await
    }
}

// ---------------------------------------------------------------------------
// GraphSource
// ---------------------------------------------------------------------------

/// Supplies the *current* graph at interception time.
///
/// The payload may already contain a serialized graph, but parameter
/// resolution must see the live editor state, so the interceptor asks
/// for a fresh snapshot on every call.
pub trait GraphSource: Send + Sync {
    fn snapshot(&self) -> Graph;
}

/// Stock [`GraphSource`] for a host that replaces the snapshot as the
/// user edits the graph.
#[derive(Clone, Default)]
pub struct SharedGraph(Arc<RwLock<Graph>>);

impl SharedGraph {
    pub fn new(graph: Graph) -> Self {
        Self(Arc::new(RwLock::new(graph)))
    }

    /// Replace the stored snapshot with the host's latest graph state.
    pub fn set(&self, graph: Graph) {
        let mut guard = match self.0.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = graph;
    }
}

impl GraphSource for SharedGraph {
    fn snapshot(&self) -> Graph {
        match self.0.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// NoiseInjectionQueue
// ---------------------------------------------------------------------------

/// Decorator that injects resolved sampler parameters into every
/// outgoing prompt before delegating to the wrapped queue.
///
/// Each call recomputes the parameters from a fresh graph snapshot, so
/// repeated submissions always reflect the current editor state.
/// Resolution and injection are infallible; the only errors surfaced
/// are those of the wrapped queue, propagated unchanged.
pub struct NoiseInjectionQueue<Q> {
    inner: Q,
    graph: Arc<dyn GraphSource>,
}

impl<Q: QueuePrompt> NoiseInjectionQueue<Q> {
    /// Wrap `inner`, resolving parameters from `graph` on every call.
    pub fn new(inner: Q, graph: Arc<dyn GraphSource>) -> Self {
        Self { inner, graph }
    }

    /// The wrapped queue implementation.
    pub fn inner(&self) -> &Q {
        &self.inner
    }
}

#[async_trait]
impl<Q: QueuePrompt> QueuePrompt for NoiseInjectionQueue<Q> {
    async fn queue_prompt(
        &self,
        number: i64,
        mut payload: PromptPayload,
        options: serde_json::Value,
    ) -> Result<SubmitResponse, ComfyUIApiError> {
        let snapshot = self.graph.snapshot();
        let params = resolve_workflow_params(&snapshot);
        let injected = inject_params(&mut payload.output, &params);
        tracing::debug!(
            seed = params.seed,
            batch_size = params.batch_size,
            injected,
            "Prompt intercepted",
        );
        self.inner.queue_prompt(number, payload, options).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
