//! Typed snapshot of the editor's node graph.
//!
//! Mirrors the litegraph object model the editor exposes at runtime:
//! an ordered node list plus a link table keyed by link ID. The graph
//! is externally owned; this crate only ever reads it. All lookups are
//! presence-based — a missing slot, widget, link, or node is a normal
//! answer (`None`), never an error.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{LinkId, NodeId};

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// A named input slot on a node, optionally bound to a link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSlot {
    /// Slot name (e.g. `"model"`, `"noise"`, `"latent_image"`).
    pub name: String,
    /// ID of the link feeding this slot, if connected.
    #[serde(default)]
    pub link: Option<LinkId>,
}

/// A named, user-editable scalar value attached to a node.
///
/// Distinct from linked inputs: widget values live on the node itself
/// and are set directly in the editor UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Widget {
    /// Widget name (e.g. `"seed"`, `"batch_size"`).
    pub name: String,
    /// Current value. Kept as raw JSON since widget types vary.
    pub value: serde_json::Value,
}

/// A single node in the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Editor-assigned node ID.
    pub id: NodeId,
    /// Node class name (e.g. `"KSampler"`, `"EmptyLatentImage"`).
    #[serde(rename = "type")]
    pub node_type: String,
    /// Input slots in slot order.
    #[serde(default)]
    pub inputs: Vec<InputSlot>,
    /// Widget values in widget order.
    #[serde(default)]
    pub widgets: Vec<Widget>,
}

/// A directed edge connecting one node's output to another's input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    /// ID of the node whose output feeds this link.
    pub origin_id: NodeId,
    /// Output slot index on the origin node.
    #[serde(default)]
    pub origin_slot: u32,
    /// ID of the node whose input this link feeds.
    #[serde(default)]
    pub target_id: NodeId,
    /// Input slot index on the target node.
    #[serde(default)]
    pub target_slot: u32,
}

/// A read-only snapshot of the editor's graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    /// Nodes in the editor's stored order. Traversal order matters:
    /// first-match sampler detection relies on it.
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Link table keyed by link ID.
    #[serde(default)]
    pub links: HashMap<LinkId, Link>,
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

impl Node {
    /// Value of the widget with the given name, if present.
    pub fn widget_value(&self, name: &str) -> Option<&serde_json::Value> {
        self.widgets.iter().find(|w| w.name == name).map(|w| &w.value)
    }

    /// First widget (in stored widget order) whose name is one of `names`.
    ///
    /// Preserves presence-based lookup order: when a node carries both a
    /// `seed` and a `noise_seed` widget, whichever appears first in the
    /// node's widget list wins.
    pub fn first_widget_among<'a>(&'a self, names: &[&str]) -> Option<&'a Widget> {
        self.widgets.iter().find(|w| names.contains(&w.name.as_str()))
    }

    /// The input slot with the given name, if present.
    pub fn input_slot(&self, name: &str) -> Option<&InputSlot> {
        self.inputs.iter().find(|i| i.name == name)
    }

    /// Whether the named input slot exists and is bound to a link.
    pub fn has_linked_input(&self, name: &str) -> bool {
        self.input_slot(name).is_some_and(|i| i.link.is_some())
    }
}

impl Graph {
    /// Look up a node by its editor-assigned ID.
    pub fn node_by_id(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Resolve the node feeding the named input slot of `node`.
    ///
    /// Follows slot → link → origin node. Returns `None` when the slot
    /// is absent, unlinked, the link ID is not in the link table, or the
    /// origin node no longer exists.
    pub fn source_node_for_input(&self, node: &Node, input_name: &str) -> Option<&Node> {
        let link_id = node.input_slot(input_name)?.link?;
        let link = self.links.get(&link_id)?;
        self.node_by_id(link.origin_id)
    }

    /// Parse a serialized graph snapshot.
    ///
    /// The expected shape matches [`Graph`]'s serde representation:
    ///
    /// ```json
    /// {
    ///   "nodes": [ { "id": 3, "type": "KSampler", "inputs": [...], "widgets": [...] } ],
    ///   "links": { "9": { "origin_id": 5 } }
    /// }
    /// ```
    pub fn from_value(value: &serde_json::Value) -> Result<Graph, CoreError> {
        if !value.is_object() {
            return Err(CoreError::Validation(
                "Graph snapshot must be an object".to_string(),
            ));
        }
        serde_json::from_value(value.clone())
            .map_err(|e| CoreError::Validation(format!("Invalid graph snapshot: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
