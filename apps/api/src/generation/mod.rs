// Content-pack generation: prompt building, candidate fallback, normalization.
// All model calls go through llm_client; no direct provider calls here.

pub mod aliases;
pub mod generator;
pub mod handlers;
pub mod normalizer;
pub mod prompts;
pub mod style;
pub mod tone;
