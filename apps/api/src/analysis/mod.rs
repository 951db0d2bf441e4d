//! The job-eligibility analysis pipeline:
//! Context Assembler → Prompt Builder → LLM Gateway → Response Parser &
//! Coercer → append-only Analysis Store.

pub mod coerce;
pub mod context;
pub mod dream_job;
pub mod handlers;
pub mod parser;
pub mod pipeline;
pub mod prompts;
