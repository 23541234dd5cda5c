//! Core domain logic for ConditioningNoiseInjection parameter injection.
//!
//! Provides the typed graph snapshot model, the sampler parameter
//! resolver, and the prompt payload injector. Everything in this crate
//! is pure in-memory computation with no I/O, so it can be exercised by
//! both the ComfyUI-facing layer and tests without a running backend.

pub mod error;
pub mod graph;
pub mod inject;
pub mod resolver;
pub mod types;
