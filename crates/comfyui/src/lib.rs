//! ComfyUI-facing layer for noise-injection parameter forwarding.
//!
//! Provides the REST submission client, the [`QueuePrompt`] seam that
//! models the host's outgoing-request function, and the injecting
//! decorator installed around it at setup.
//!
//! [`QueuePrompt`]: interceptor::QueuePrompt

pub mod api;
pub mod interceptor;
