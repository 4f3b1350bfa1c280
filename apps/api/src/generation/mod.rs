// LinkedIn post generation.
// All model calls go through llm_client; history comes from memory::retrieval.

pub mod generator;
pub mod handlers;
pub mod prompts;
