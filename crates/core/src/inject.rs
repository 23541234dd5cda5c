//! Injection of resolved parameters into an outgoing prompt.
//!
//! The API-format prompt (`output`) is an object mapping node ID to
//! `{ class_type, inputs }`. Injection adds exactly two keys to the
//! `inputs` of entries whose class is [`TARGET_CLASS`]; every other
//! entry is left untouched.

use crate::resolver::WorkflowParams;

/// Node class that receives the injected parameters.
pub const TARGET_CLASS: &str = "ConditioningNoiseInjection";

/// Input key carrying the resolved seed.
pub const SEED_INPUT_KEY: &str = "seed_from_js";

/// Input key carrying the resolved batch size.
pub const BATCH_SIZE_INPUT_KEY: &str = "batch_size_from_js";

/// Write `params` into every [`TARGET_CLASS`] entry of the prompt.
///
/// Returns the number of entries injected. A missing `inputs` object on
/// a target entry is created rather than skipped, so injection never
/// fails; a non-object `output` is left alone entirely.
pub fn inject_params(output: &mut serde_json::Value, params: &WorkflowParams) -> usize {
    let Some(entries) = output.as_object_mut() else {
        return 0;
    };

    let mut injected = 0;
    for (node_id, node_data) in entries.iter_mut() {
        let is_target = node_data
            .get("class_type")
            .and_then(|v| v.as_str())
            .is_some_and(|class| class == TARGET_CLASS);
        if !is_target {
            continue;
        }

        let Some(data) = node_data.as_object_mut() else {
            continue;
        };
        let inputs = data
            .entry("inputs")
            .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
        if let Some(inputs) = inputs.as_object_mut() {
            inputs.insert(SEED_INPUT_KEY.to_string(), params.seed.into());
            inputs.insert(BATCH_SIZE_INPUT_KEY.to_string(), params.batch_size.into());
            tracing::debug!(
                node_id = %node_id,
                seed = params.seed,
                batch_size = params.batch_size,
                "Injected params into node",
            );
            injected += 1;
        }
    }
    injected
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
