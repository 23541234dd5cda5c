//! Sampler detection and parameter resolution.
//!
//! Scans the graph for the active sampler node and resolves the seed
//! and latent batch size implied by its input wiring. Resolution is a
//! pure read-only pass over the snapshot: every lookup failure falls
//! back to a default, so it can never abort the surrounding request.

use crate::graph::{Graph, Node};

// ---------------------------------------------------------------------------
// Node class constants
// ---------------------------------------------------------------------------

/// Advanced custom sampler node class (primary detection target).
pub const SAMPLER_CUSTOM_ADVANCED_CLASS: &str = "SamplerCustomAdvanced";

/// Standard KSampler node class (fallback detection target).
pub const KSAMPLER_CLASS: &str = "KSampler";

/// Advanced KSampler node class (fallback detection target).
pub const KSAMPLER_ADVANCED_CLASS: &str = "KSamplerAdvanced";

/// Widget names that can carry a seed, in candidate order. Lookup is
/// presence-based over the node's stored widget order, so this order
/// only matters when neither widget exists.
pub const SEED_WIDGET_NAMES: &[&str] = &["seed", "noise_seed"];

/// Seed used when no sampler or seed widget is found.
pub const DEFAULT_SEED: i64 = 0;

/// Batch size used when no latent source or batch widget is found.
pub const DEFAULT_BATCH_SIZE: i64 = 1;

// ---------------------------------------------------------------------------
// Resolved parameters
// ---------------------------------------------------------------------------

/// Parameters resolved from the active sampler's wiring.
///
/// Transient: recomputed fresh on every outgoing request and discarded
/// after injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowParams {
    /// Seed feeding the sampler (0 when unresolved).
    pub seed: i64,
    /// Batch size of the latent source (1 when unresolved).
    pub batch_size: i64,
}

impl Default for WorkflowParams {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve the seed and batch size implied by the first active sampler.
///
/// Traverses `graph.nodes` in stored order and stops at the first
/// qualifying node:
///
/// - A `SamplerCustomAdvanced` node always qualifies. Its seed comes
///   from the node feeding its `noise` input (widget `seed` or
///   `noise_seed` on that node).
/// - A `KSampler`/`KSamplerAdvanced` node qualifies only when its
///   `model` input is actually linked. Its seed comes from its own
///   `seed`/`noise_seed` widget.
///
/// For either kind the batch size comes from the `batch_size` widget of
/// the node feeding the sampler's `latent_image` input. Anything that
/// cannot be resolved keeps its default.
pub fn resolve_workflow_params(graph: &Graph) -> WorkflowParams {
    for node in &graph.nodes {
        match node.node_type.as_str() {
            SAMPLER_CUSTOM_ADVANCED_CLASS => {
                tracing::debug!(node_id = node.id, "Found SamplerCustomAdvanced");
                return resolve_from_sampler(graph, node, true);
            }
            KSAMPLER_CLASS | KSAMPLER_ADVANCED_CLASS => {
                // Connectivity check: an unwired KSampler left on the
                // canvas must not shadow the real pipeline.
                if node.has_linked_input("model") {
                    tracing::debug!(node_id = node.id, "Found KSampler");
                    return resolve_from_sampler(graph, node, false);
                }
            }
            _ => {}
        }
    }

    tracing::debug!("No active sampler found, using defaults");
    WorkflowParams::default()
}

/// Resolve both parameters from a qualifying sampler node.
///
/// `seed_via_noise_input` selects where the seed widget lives: on the
/// node feeding the sampler's `noise` input (SamplerCustomAdvanced) or
/// on the sampler itself (KSampler variants).
fn resolve_from_sampler(graph: &Graph, sampler: &Node, seed_via_noise_input: bool) -> WorkflowParams {
    let mut params = WorkflowParams::default();

    let seed_node = if seed_via_noise_input {
        graph.source_node_for_input(sampler, "noise")
    } else {
        Some(sampler)
    };
    if let Some(node) = seed_node {
        if let Some(seed) = seed_from_node(node) {
            params.seed = seed;
        }
    }

    if let Some(latent) = graph.source_node_for_input(sampler, "latent_image") {
        tracing::debug!(
            node_id = latent.id,
            node_type = %latent.node_type,
            "Found latent source",
        );
        params.batch_size = batch_size_from_node(latent);
    }

    tracing::debug!(
        seed = params.seed,
        batch_size = params.batch_size,
        "Resolved workflow params",
    );
    params
}

/// Read a seed from a node's `seed`/`noise_seed` widget, if any.
fn seed_from_node(node: &Node) -> Option<i64> {
    node.first_widget_among(SEED_WIDGET_NAMES)
        .and_then(|w| as_integer(&w.value))
}

/// Read a node's `batch_size` widget, defaulting to 1.
fn batch_size_from_node(node: &Node) -> i64 {
    node.widget_value("batch_size")
        .and_then(as_integer)
        .unwrap_or(DEFAULT_BATCH_SIZE)
}

/// Interpret a widget value as an integer.
///
/// Widget values arrive as editor JSON, where numbers are doubles, so
/// exact-integral floats are accepted alongside integers. Anything else
/// counts as absent.
fn as_integer(value: &serde_json::Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    match value.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < (i64::MAX as f64) => Some(f as i64),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
