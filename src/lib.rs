//! Nexagen - scaffold and assemble multi-agent automation projects.
//!
//! The crate drives a multi-stage build pipeline: discover agent tool
//! manifests, synthesize a standardized agent card per agent via an external
//! text-generation service, materialize the generated source artifacts from
//! templates, and optionally wrap the assembled system as a single MCP agent.
#![deny(unsafe_code)]

pub mod cards;
pub mod discovery;
pub mod exec;
pub mod finalize;
pub mod llm;
pub mod manifest;
pub mod pipeline;
pub mod project;
pub mod templates;
