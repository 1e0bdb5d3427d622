//! Multi-criteria candidate ranking: deterministic, explainable ordering of job responses.
//!
//! The engine lives in [`ranking`]; the remaining modules host it as an HTTP service.

pub mod config;
pub mod errors;
pub mod llm_client;
pub mod ranking;
pub mod routes;
pub mod state;
pub mod store;
