//! Investor Persona Agents
//!
//! Agents that turn a company's financial data, news or study material into
//! structured analysis through a text-generation model:
//! - Persona agents analyse a ticker in the style of a well-known investor
//! - Utility and education agents summarise news and tutor from sources
//! - A registry discovers agents, exposes their metadata and runs them
//!
//! EXECUTION:
//! VALIDATE → RUN (bounded by timeout) → FINALIZE

pub mod agent;
pub mod agents;
pub mod config;
pub mod error;
pub mod gemini;
pub mod models;
pub mod outcome;
pub mod persona;
pub mod registry;

pub use error::{AgentError, Result};

// Re-export common types
pub use agent::Agent;
pub use models::*;
pub use registry::{global_registry, AgentMetadata, AgentRegistry};
