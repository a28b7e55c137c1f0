//! seek - Generate personalized learning plans with an LLM
//!
//! Normalizes a learner profile, then asks a language model for three pieces
//! of content in parallel: a micro-lesson roadmap, a multiple-choice quiz and a
//! personalized explanation. Every response is schema-checked and retried until
//! it validates; the plan is returned only if all three succeed. Supports
//! OpenAI, OpenAI-compatible endpoints (Ollama, gateways) and Anthropic.

pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod profile;
pub mod util;

pub use config::Config;
pub use error::PlanError;
pub use pipeline::{LearningPlan, PlanOrchestrator};
pub use profile::{LearnerProfile, LearningStyle, RawProfile};
