pub mod agent;
pub mod config;
pub mod error;
pub mod format;
pub mod llm;
pub mod output;
pub mod shutdown;
pub mod validate;
pub mod workflow;
