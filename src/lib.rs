//! Email Optimizer — drafts a professional email from a topic and refines it
//! against an LLM-scored rubric.

pub mod config;
pub mod error;
pub mod llm;
pub mod optimizer;
pub mod web;
